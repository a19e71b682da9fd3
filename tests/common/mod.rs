//! Shared test doubles: a clock-scripted connectivity probe and a
//! recording power backend. Both are driven by a `SimulatedTimeSource`,
//! so whole phases elapse instantly.

#![allow(dead_code)]

use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use dozr::net::{ConnectivityProbe, ConnectivityState, InterfaceClass};
use dozr::power::PowerAction;
use dozr::time_source::TimeSource;

/// Probe whose answer is a pure function of the simulated wall clock.
pub struct ClockedProbe {
    clock: Arc<dyn TimeSource>,
    is_connected: Box<dyn Fn(DateTime<Local>) -> bool + Send + Sync>,
    probes: Mutex<Vec<DateTime<Local>>>,
}

impl ClockedProbe {
    pub fn new(
        clock: Arc<dyn TimeSource>,
        is_connected: impl Fn(DateTime<Local>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            clock,
            is_connected: Box::new(is_connected),
            probes: Mutex::new(Vec::new()),
        }
    }

    pub fn always_connected(clock: Arc<dyn TimeSource>) -> Self {
        Self::new(clock, |_| true)
    }

    /// Connected before `at`, disconnected from `at` on.
    pub fn disconnecting_at(clock: Arc<dyn TimeSource>, at: DateTime<Local>) -> Self {
        Self::new(clock, move |now| now < at)
    }

    /// Disconnected before `at`, connected from `at` on.
    pub fn reconnecting_at(clock: Arc<dyn TimeSource>, at: DateTime<Local>) -> Self {
        Self::new(clock, move |now| now >= at)
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }

    pub fn probe_times(&self) -> Vec<DateTime<Local>> {
        self.probes.lock().unwrap().clone()
    }
}

impl ConnectivityProbe for ClockedProbe {
    fn probe(&self, _class: InterfaceClass) -> ConnectivityState {
        let now = self.clock.now();
        self.probes.lock().unwrap().push(now);
        if (self.is_connected)(now) {
            ConnectivityState {
                connected: true,
                interfaces: BTreeSet::from(["eth0".to_string()]),
            }
        } else {
            ConnectivityState::disconnected()
        }
    }
}

// Lets a test keep a handle on the probe after boxing it for the
// controller. (A newtype rather than an impl on `Arc<ClockedProbe>`
// directly, which the orphan rule forbids here.)
pub struct SharedProbe(pub Arc<ClockedProbe>);

impl ConnectivityProbe for SharedProbe {
    fn probe(&self, class: InterfaceClass) -> ConnectivityState {
        self.0.probe(class)
    }
}

/// Everything a power backend was asked to do.
#[derive(Debug, Default)]
pub struct PowerLog {
    pub machine_sleeps: Vec<Duration>,
    pub process_waits: Vec<Duration>,
}

/// Power backend that records requests and advances the simulated clock
/// instead of suspending anything.
pub struct RecordingPower {
    clock: Arc<dyn TimeSource>,
    log: Arc<Mutex<PowerLog>>,
}

impl RecordingPower {
    pub fn new(clock: Arc<dyn TimeSource>) -> (Self, Arc<Mutex<PowerLog>>) {
        let log = Arc::new(Mutex::new(PowerLog::default()));
        (
            Self {
                clock,
                log: log.clone(),
            },
            log,
        )
    }
}

impl PowerAction for RecordingPower {
    fn sleep_machine_for(&mut self, duration: Duration) -> Result<()> {
        self.log.lock().unwrap().machine_sleeps.push(duration);
        self.clock.sleep(duration);
        Ok(())
    }

    fn suspend_process_for(&mut self, duration: Duration) {
        self.log.lock().unwrap().process_waits.push(duration);
        self.clock.sleep(duration);
    }
}
