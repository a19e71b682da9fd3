//! Debounced connectivity waiting bounded by a phase window.
//!
//! `ConnectivityWaiter` polls the probe while "now" remains inside the
//! active window, idling between polls with one of two strategies, and
//! returns as soon as the desired link state is observed or the window is
//! exited. The wait is the controller's suspension point: the running flag
//! is re-checked around every idle so shutdown signals are honored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::constants::{BOUNDARY_POLL_INTERVAL_SECS, REASSOCIATION_GRACE_SECS};
use crate::net::{ConnectivityProbe, InterfaceClass};
use crate::phase::{TimeWindow, offset_from_midnight};
use crate::power::PowerAction;
use crate::time_source::TimeSource;

/// The link state a wait is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Connected,
    Disconnected,
}

impl LinkTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkTarget::Connected => "connected",
            LinkTarget::Disconnected => "disconnected",
        }
    }

    fn matches(&self, connected: bool) -> bool {
        match self {
            LinkTarget::Connected => connected,
            LinkTarget::Disconnected => !connected,
        }
    }
}

/// How to pass time between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleStrategy {
    /// Block the calling thread. Keeps the host responsive; used near
    /// boundaries and throughout the night phase.
    SuspendProcess,
    /// Suspend the machine with a wake timer, then allow a fixed grace
    /// delay for the network stack to re-associate before the next probe.
    /// Used for long passive waits to save power.
    SleepMachine,
}

/// Polls connectivity within a window, idling between polls.
pub struct ConnectivityWaiter<'a> {
    probe: &'a dyn ConnectivityProbe,
    power: &'a mut dyn PowerAction,
    clock: &'a Arc<dyn TimeSource>,
    running: &'a Arc<AtomicBool>,
    class: InterfaceClass,
    poll_timeout: Duration,
    idle_interval: Duration,
    debug: bool,
}

impl<'a> ConnectivityWaiter<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        probe: &'a dyn ConnectivityProbe,
        power: &'a mut dyn PowerAction,
        clock: &'a Arc<dyn TimeSource>,
        running: &'a Arc<AtomicBool>,
        class: InterfaceClass,
        poll_timeout: Duration,
        idle_interval: Duration,
        debug: bool,
    ) -> Self {
        Self {
            probe,
            power,
            clock,
            running,
            class,
            poll_timeout,
            idle_interval,
            debug,
        }
    }

    /// Wait until the probed state equals `target` or `window` is exited.
    ///
    /// Returns `true` on a matching transition, `false` when the window
    /// expired (or shutdown was requested) first.
    ///
    /// Interval selection follows the boundary-sensitivity policy: within
    /// `poll_timeout` of the window end a short fixed interval with
    /// process-level idling is used regardless of `idle`; farther out,
    /// `interval_override` (or the configured idle interval, or a single
    /// blocking wait to the edge of the boundary zone) applies with the
    /// caller's strategy.
    pub fn wait_for(
        &mut self,
        target: LinkTarget,
        idle: IdleStrategy,
        window: &TimeWindow,
        interval_override: Option<Duration>,
    ) -> bool {
        let mut previous: Option<bool> = None;

        while self.running.load(Ordering::SeqCst) {
            let now = offset_from_midnight(self.clock.now());
            if !window.contains(now) {
                log_decorated!(
                    "{} ended without turning {}",
                    window.name,
                    target.as_str()
                );
                return false;
            }

            let state = self.probe.probe(self.class);
            if target.matches(state.connected) {
                match previous {
                    Some(was_connected) => log_decorated!(
                        "Connectivity changed: {} → {}",
                        if was_connected { "connected" } else { "disconnected" },
                        state.as_str()
                    ),
                    None => log_decorated!("Connectivity already {}", state.as_str()),
                }
                if self.debug && !state.interfaces.is_empty() {
                    log_indented!(
                        "Interfaces up: {}",
                        state.interfaces.iter().cloned().collect::<Vec<_>>().join(", ")
                    );
                }
                return true;
            }
            previous = Some(state.connected);

            let remaining = window.until_end(now);
            let (interval, strategy) = self.idle_plan(remaining, idle, interval_override);
            if self.debug {
                log_indented!(
                    "Still {}; idling {}s ({:?})",
                    state.as_str(),
                    interval.as_secs(),
                    strategy
                );
            }
            self.idle_for(interval, strategy);
        }

        false
    }

    /// Choose the next idle interval and strategy.
    fn idle_plan(
        &self,
        remaining: Duration,
        idle: IdleStrategy,
        interval_override: Option<Duration>,
    ) -> (Duration, IdleStrategy) {
        let boundary_interval = Duration::from_secs(BOUNDARY_POLL_INTERVAL_SECS);

        if remaining <= self.poll_timeout {
            // Near the boundary: short aggressive polls, never a machine
            // sleep we might not wake from in time.
            return (boundary_interval.min(remaining), IdleStrategy::SuspendProcess);
        }

        // Far from the boundary the idle never reaches into the
        // boundary-sensitivity zone.
        let to_zone = remaining - self.poll_timeout;
        let interval = interval_override.unwrap_or(if self.idle_interval.is_zero() {
            to_zone
        } else {
            self.idle_interval
        });

        (interval.min(to_zone), idle)
    }

    fn idle_for(&mut self, interval: Duration, strategy: IdleStrategy) {
        match strategy {
            IdleStrategy::SuspendProcess => self.power.suspend_process_for(interval),
            IdleStrategy::SleepMachine => {
                if let Err(e) = self.power.sleep_machine_for(interval) {
                    log_warning!("Machine sleep failed ({e}); blocking in-process instead");
                    self.power.suspend_process_for(interval);
                } else {
                    // Give the link a moment to come back before probing.
                    self.power
                        .suspend_process_for(Duration::from_secs(REASSOCIATION_GRACE_SECS));
                }
            }
        }
    }
}
