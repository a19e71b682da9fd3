//! The phase controller: the top-level reconciliation loop.
//!
//! Every iteration classifies "now" into NIGHT, MORNING, or NEITHER and
//! reconciles the machine's power state with that classification:
//!
//! - NIGHT watches for the link to drop, then suspends the machine until
//!   the morning window opens.
//! - MORNING watches for the link to return; an early return keeps the
//!   machine awake (with a notification) until the night window.
//! - NEITHER bridges the gap to whichever phase starts next: sleeping
//!   toward morning, staying awake (announcing it once) toward night.
//!
//! Decisions are computed by pure functions returning an [`Action`], then
//! executed separately, so every scheduling branch is testable without a
//! probe or a power backend. Nothing in the loop panics or propagates an
//! error; failures degrade to logged fallbacks and the loop continues
//! until shutdown is requested.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::config::Config;
use crate::constants::NO_ACTION_IDLE_SECS;
use crate::net::{ConnectivityProbe, InterfaceClass};
use crate::notify::Notifier;
use crate::phase::{PhaseClock, TimeWindow, format_offset, nearest_phase_between};
use crate::power::{self, PowerAction};
use crate::time_source::TimeSource;
use crate::waiter::{ConnectivityWaiter, IdleStrategy, LinkTarget};

/// Where "now" falls relative to the two configured windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Night,
    Morning,
    Neither,
}

/// One scheduling decision, decoupled from its execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Suspend the machine until the next occurrence of this offset.
    SleepUntil(Duration),
    /// Block in-process until the next occurrence of this offset.
    SuspendUntil(Duration),
    /// Send a message, then block until the offset. `persistent` selects
    /// bounded-retry delivery over a single best-effort attempt.
    NotifyAndSuspend {
        text: String,
        until: Duration,
        persistent: bool,
    },
    /// Nothing to do this iteration.
    None,
}

/// Classify an offset against the two windows. NIGHT wins a (validated
/// impossible) overlap by being checked first.
pub fn classify(now: Duration, night: &TimeWindow, morning: &TimeWindow) -> Phase {
    if night.contains(now) {
        Phase::Night
    } else if morning.contains(now) {
        Phase::Morning
    } else {
        Phase::Neither
    }
}

/// Decision for the night phase, after the wait has resolved.
pub fn decide_night(disconnected: bool, morning: &TimeWindow) -> Action {
    if disconnected {
        Action::SleepUntil(morning.start())
    } else {
        Action::None
    }
}

/// Decision for the morning phase, after the wait has resolved.
pub fn decide_morning(reconnected: bool, night: &TimeWindow) -> Action {
    if reconnected {
        Action::NotifyAndSuspend {
            text: early_return_message(night.start()),
            until: night.start(),
            persistent: true,
        }
    } else {
        Action::None
    }
}

/// Decision for time outside both windows.
///
/// Toward morning the machine sleeps; toward night it stays awake,
/// announcing that once per dwell (`awake_announced` is the once-guard).
pub fn decide_neither(
    now: Duration,
    night: &TimeWindow,
    morning: &TimeWindow,
    awake_announced: bool,
) -> Action {
    match nearest_phase_between(now, night, morning) {
        Some((next, _)) if std::ptr::eq(next, morning) => Action::SleepUntil(morning.start()),
        Some((next, _)) if std::ptr::eq(next, night) => {
            if awake_announced {
                Action::SuspendUntil(night.start())
            } else {
                Action::NotifyAndSuspend {
                    text: awake_message(night.start()),
                    until: night.start(),
                    persistent: false,
                }
            }
        }
        _ => Action::None,
    }
}

fn awake_message(night_start: Duration) -> String {
    format!(
        "*dozr*: awake and idle until the night phase at {}",
        format_offset(night_start)
    )
}

fn early_return_message(night_start: Duration) -> String {
    format!(
        "*dozr*: connectivity returned during the morning phase; staying awake until {}",
        format_offset(night_start)
    )
}

/// Mutable controller state carried across iterations.
#[derive(Debug, Default)]
pub struct ControllerState {
    /// Most recent machine suspend according to the system record.
    pub last_sleep_time: Option<DateTime<Local>>,
    /// Most recent machine suspend this process initiated.
    pub last_sleep_time_by_program: Option<DateTime<Local>>,
    /// Whether the "awake" announcement went out during the current
    /// pre-night dwell. Cleared on every entry into the night phase.
    pub wake_up_message_sent: bool,
}

/// The reconciliation loop and its collaborators.
pub struct Controller {
    night: TimeWindow,
    morning: TimeWindow,
    class: InterfaceClass,
    poll_timeout: Duration,
    idle_interval: Duration,
    debug: bool,
    probe: Box<dyn ConnectivityProbe>,
    power: Box<dyn PowerAction>,
    notifier: Notifier,
    clock: Arc<dyn TimeSource>,
    phases: PhaseClock,
    running: Arc<AtomicBool>,
    state: ControllerState,
}

impl Controller {
    pub fn new(
        config: &Config,
        probe: Box<dyn ConnectivityProbe>,
        power: Box<dyn PowerAction>,
        notifier: Notifier,
        clock: Arc<dyn TimeSource>,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let state = ControllerState {
            last_sleep_time: power.last_machine_sleep(),
            ..ControllerState::default()
        };

        Ok(Self {
            night: config.night_window()?,
            morning: config.morning_window()?,
            class: config.connection(),
            poll_timeout: config.poll_timeout(),
            idle_interval: config.idle_interval(),
            debug: config.debug(),
            probe,
            power,
            notifier,
            phases: PhaseClock::new(clock.clone()),
            clock,
            running,
            state,
        })
    }

    #[cfg(feature = "testing-support")]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Run iterations until shutdown is requested.
    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            self.run_iteration();
        }
    }

    /// One classify → wait → decide → execute pass.
    pub fn run_iteration(&mut self) {
        let now = self.phases.current_offset();
        match classify(now, &self.night, &self.morning) {
            Phase::Night => self.handle_night(),
            Phase::Morning => self.handle_morning(),
            Phase::Neither => self.handle_neither(now),
        }
    }

    fn handle_night(&mut self) {
        // A fresh night phase resets the pre-night announcement guard.
        self.state.wake_up_message_sent = false;

        log_block_start!("{}: watching for disconnection", self.night);
        let disconnected = self.wait_for(LinkTarget::Disconnected, IdleStrategy::SuspendProcess);
        let action = decide_night(disconnected, &self.morning);
        self.execute(action);
    }

    fn handle_morning(&mut self) {
        log_block_start!("{}: watching for reconnection", self.morning);
        // Nothing useful happens while the link is down, so long idles may
        // suspend the machine entirely.
        let reconnected = self.wait_for(LinkTarget::Connected, IdleStrategy::SleepMachine);
        let action = decide_morning(reconnected, &self.night);
        self.execute(action);
    }

    fn handle_neither(&mut self, now: Duration) {
        let action = decide_neither(now, &self.night, &self.morning, self.state.wake_up_message_sent);
        if action == Action::None {
            // With validated disjoint windows this is unreachable; idle
            // briefly rather than spin or crash.
            log_pipe!();
            log_warning!(
                "Time {} matched neither a phase nor a gap; idling {}s",
                format_offset(now),
                NO_ACTION_IDLE_SECS
            );
            self.power
                .suspend_process_for(Duration::from_secs(NO_ACTION_IDLE_SECS));
            return;
        }
        self.execute(action);
    }

    fn wait_for(&mut self, target: LinkTarget, idle: IdleStrategy) -> bool {
        let window = match target {
            LinkTarget::Disconnected => &self.night,
            LinkTarget::Connected => &self.morning,
        };
        let mut waiter = ConnectivityWaiter::new(
            self.probe.as_ref(),
            self.power.as_mut(),
            &self.clock,
            &self.running,
            self.class,
            self.poll_timeout,
            self.idle_interval,
            self.debug,
        );
        waiter.wait_for(target, idle, window, None)
    }

    /// Execute a decision. Never propagates errors; a failed machine
    /// suspend degrades to an in-process wait.
    fn execute(&mut self, action: Action) {
        let now = self.phases.current_offset();
        match action {
            Action::None => {}
            Action::SleepUntil(target) => {
                log_block_start!("Suspending machine until {}", format_offset(target));
                self.state.last_sleep_time_by_program = Some(self.clock.now());
                if let Err(e) = power::sleep_machine_until(self.power.as_mut(), now, target) {
                    log_pipe!();
                    log_warning!("Machine suspend failed ({e}); blocking in-process instead");
                    power::suspend_until(self.power.as_mut(), now, target);
                }
                // Prefer the system's own record of the suspend; fall back
                // to our initiation timestamp when the record is missing.
                self.state.last_sleep_time = self
                    .power
                    .last_machine_sleep()
                    .or(self.state.last_sleep_time_by_program);
                if self.debug
                    && let Some(at) = self.state.last_sleep_time
                {
                    log_indented!("Last machine suspend recorded at {}", at.format("%H:%M:%S"));
                }
            }
            Action::SuspendUntil(target) => {
                log_block_start!("Staying awake until {}", format_offset(target));
                power::suspend_until(self.power.as_mut(), now, target);
            }
            Action::NotifyAndSuspend {
                text,
                until,
                persistent,
            } => {
                if persistent {
                    self.notifier.notify_with_retry(&text);
                } else if let Err(e) = self.notifier.notify(&text) {
                    log_pipe!();
                    log_warning!("Notification failed: {e}");
                }
                self.state.wake_up_message_sent = true;
                log_block_start!("Staying awake until {}", format_offset(until));
                power::suspend_until(self.power.as_mut(), now, until);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hours: u64, minutes: u64) -> Duration {
        Duration::from_secs(hours * 3600 + minutes * 60)
    }

    fn night() -> TimeWindow {
        TimeWindow::new("NIGHT PHASE", hm(22, 0), hm(6, 0))
    }

    fn morning() -> TimeWindow {
        TimeWindow::new("MORNING PHASE", hm(6, 0), hm(8, 0))
    }

    #[test]
    fn classification_covers_the_day() {
        let (n, m) = (night(), morning());
        assert_eq!(classify(hm(23, 0), &n, &m), Phase::Night);
        assert_eq!(classify(hm(2, 0), &n, &m), Phase::Night);
        assert_eq!(classify(hm(6, 0), &n, &m), Phase::Morning);
        assert_eq!(classify(hm(7, 59), &n, &m), Phase::Morning);
        assert_eq!(classify(hm(8, 0), &n, &m), Phase::Neither);
        assert_eq!(classify(hm(15, 0), &n, &m), Phase::Neither);
    }

    #[test]
    fn night_disconnect_sleeps_until_morning_start() {
        assert_eq!(
            decide_night(true, &morning()),
            Action::SleepUntil(hm(6, 0))
        );
    }

    #[test]
    fn night_without_disconnect_does_nothing() {
        assert_eq!(decide_night(false, &morning()), Action::None);
    }

    #[test]
    fn morning_reconnect_notifies_persistently_and_stays_awake() {
        match decide_morning(true, &night()) {
            Action::NotifyAndSuspend {
                until, persistent, ..
            } => {
                assert_eq!(until, hm(22, 0));
                assert!(persistent);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn pre_night_gap_announces_once_then_just_waits() {
        let (n, m) = (night(), morning());
        // 20:00, announcement not yet sent
        match decide_neither(hm(20, 0), &n, &m, false) {
            Action::NotifyAndSuspend {
                until, persistent, ..
            } => {
                assert_eq!(until, hm(22, 0));
                assert!(!persistent);
            }
            other => panic!("unexpected action: {other:?}"),
        }
        // Already announced: plain wait
        assert_eq!(
            decide_neither(hm(20, 0), &n, &m, true),
            Action::SuspendUntil(hm(22, 0))
        );
    }

    #[test]
    fn pre_morning_gap_sleeps_toward_morning() {
        let n = TimeWindow::new("NIGHT PHASE", hm(22, 0), hm(5, 0));
        let m = morning();
        assert_eq!(
            decide_neither(hm(5, 30), &n, &m, false),
            Action::SleepUntil(hm(6, 0))
        );
    }

    #[test]
    fn inside_a_phase_the_gap_decision_is_none() {
        let (n, m) = (night(), morning());
        assert_eq!(decide_neither(hm(23, 0), &n, &m, false), Action::None);
    }
}
