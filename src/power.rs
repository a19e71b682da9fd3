//! Power primitives: machine suspend with a wake timer, process blocking.
//!
//! Two primitives exist — suspend the whole machine until a wall-clock
//! offset, or block the calling thread until one — and both are
//! wraparound-aware: a target offset that is "now" or already behind wraps
//! to the next day's occurrence instead of failing.
//!
//! Machine suspend goes through `rtcwake`, which programs the RTC alarm and
//! enters S3 in one step. Construction with `real = false` substitutes a
//! short delay for the suspend so the control flow can be exercised without
//! actually sleeping the host.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, TimeZone};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::SECONDS_PER_DAY;
use crate::phase::forward_distance;
use crate::time_source::TimeSource;

/// Interface contract for the two power primitives.
pub trait PowerAction {
    /// Suspend the machine with a hardware wake timer set `duration` ahead.
    fn sleep_machine_for(&mut self, duration: Duration) -> Result<()>;

    /// Block the calling thread for `duration`.
    fn suspend_process_for(&mut self, duration: Duration);

    /// Timestamp of the most recent machine suspend according to the
    /// system record, if one can be determined.
    fn last_machine_sleep(&self) -> Option<DateTime<Local>> {
        None
    }
}

/// Seconds of forward travel from `now` to `target` on the 24-hour circle.
///
/// A zero distance (target is exactly "now", or an already-elapsed offset
/// normalized onto it) wraps to a full 24h cycle: callers always mean "the
/// next occurrence of `target`", never "don't sleep".
pub fn until_offset(now: Duration, target: Duration) -> Duration {
    let distance = forward_distance(now, target);
    if distance.is_zero() {
        Duration::from_secs(SECONDS_PER_DAY)
    } else {
        distance
    }
}

/// Sleep the machine until the next occurrence of wall-clock `target`.
pub fn sleep_machine_until(
    power: &mut dyn PowerAction,
    now: Duration,
    target: Duration,
) -> Result<()> {
    power.sleep_machine_for(until_offset(now, target))
}

/// Block the process until the next occurrence of wall-clock `target`.
pub fn suspend_until(power: &mut dyn PowerAction, now: Duration, target: Duration) {
    power.suspend_process_for(until_offset(now, target));
}

/// `PowerAction` implementation backed by `rtcwake` and the time source.
pub struct RtcWake {
    clock: Arc<dyn TimeSource>,
    real: bool,
}

impl RtcWake {
    pub fn new(clock: Arc<dyn TimeSource>, real: bool) -> Self {
        Self { clock, real }
    }
}

impl PowerAction for RtcWake {
    fn sleep_machine_for(&mut self, duration: Duration) -> Result<()> {
        let duration = if duration.is_zero() {
            Duration::from_secs(SECONDS_PER_DAY)
        } else {
            duration
        };

        if !self.real {
            log_decorated!(
                "Dry run: skipping machine suspend for {}s",
                duration.as_secs()
            );
            self.clock.sleep(duration.min(Duration::from_secs(2)));
            return Ok(());
        }

        let secs = duration.as_secs().to_string();
        let status = Command::new("rtcwake")
            .args(["-m", "mem", "-s", &secs])
            .status()
            .context("Failed to invoke rtcwake")?;

        if !status.success() {
            bail!("rtcwake exited with status {status}");
        }

        Ok(())
    }

    fn suspend_process_for(&mut self, duration: Duration) {
        self.clock.sleep(duration);
    }

    fn last_machine_sleep(&self) -> Option<DateTime<Local>> {
        // Newest suspend entry from the journal for this boot; any failure
        // here just means we don't know.
        let output = Command::new("journalctl")
            .args(["-b", "-t", "systemd-sleep", "-o", "short-unix", "-n", "1", "-q"])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let timestamp = stdout.split_whitespace().next()?.parse::<f64>().ok()?;
        Local.timestamp_opt(timestamp as i64, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hours: u64, minutes: u64) -> Duration {
        Duration::from_secs(hours * 3600 + minutes * 60)
    }

    #[test]
    fn until_offset_forward_same_day() {
        assert_eq!(until_offset(hm(20, 0), hm(22, 0)), hm(2, 0));
    }

    #[test]
    fn until_offset_wraps_past_midnight() {
        assert_eq!(until_offset(hm(23, 30), hm(6, 0)), hm(6, 30));
    }

    #[test]
    fn until_offset_zero_distance_wraps_to_full_day() {
        assert_eq!(
            until_offset(hm(6, 0), hm(6, 0)),
            Duration::from_secs(SECONDS_PER_DAY)
        );
    }
}
