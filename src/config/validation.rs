//! Configuration validation.
//!
//! Prevents impossible schedules before the controller ever runs:
//! out-of-range time values, degenerate windows, and overlapping
//! NIGHT/MORNING phases are all fatal at load time rather than runtime
//! ambiguities.

use anyhow::Result;

use super::Config;
use crate::constants::*;
use crate::phase::TimeWindow;

/// Comprehensive configuration validation.
pub fn validate_config(config: &Config) -> Result<()> {
    // Parsing the windows performs the range and format checks on each
    // phase time; the name tags are the ones used in error messages.
    let night = config.night.to_window(NIGHT_PHASE_NAME)?;
    let morning = config.morning.to_window(MORNING_PHASE_NAME)?;

    for window in [&night, &morning] {
        if window.start() == window.end() {
            anyhow::bail!(
                "{} start and end are both {}. A zero-length phase is never active; \
                give the window a positive duration or remove it.",
                window.name,
                crate::phase::format_offset(window.start())
            );
        }
    }

    // Overlapping phases would leave the gap-window classification with no
    // consistent answer, so they are rejected outright.
    if windows_overlap(&night, &morning) {
        anyhow::bail!(
            "Phase windows overlap: {night} and {morning}. \
            NIGHT and MORNING must be disjoint; adjust the start/end times so \
            one phase finishes before the other begins."
        );
    }

    if let Some(timeout) = config.poll_timeout
        && !(MINIMUM_POLL_TIMEOUT_SECS..=MAXIMUM_POLL_TIMEOUT_SECS).contains(&timeout)
    {
        anyhow::bail!(
            "poll_timeout ({} seconds) must be between {} and {} seconds",
            timeout,
            MINIMUM_POLL_TIMEOUT_SECS,
            MAXIMUM_POLL_TIMEOUT_SECS
        );
    }

    if let Some(interval) = config.idle_interval
        && interval > MAXIMUM_IDLE_INTERVAL_SECS
    {
        anyhow::bail!(
            "idle_interval ({} seconds) must not exceed {} seconds (use 0 for a full blocking wait)",
            interval,
            MAXIMUM_IDLE_INTERVAL_SECS
        );
    }

    // One credential without the other is almost certainly a mistake.
    if config.bot_token.is_some() != config.chat_id.is_some() {
        anyhow::bail!(
            "Notification credentials are incomplete: both bot_token and chat_id \
            must be set, or neither."
        );
    }

    Ok(())
}

/// Check whether two circular windows overlap.
///
/// Each window is split at midnight into linear segments, then segments
/// are compared pairwise.
pub(crate) fn windows_overlap(a: &TimeWindow, b: &TimeWindow) -> bool {
    let segments = |w: &TimeWindow| -> Vec<(u64, u64)> {
        let (start, end) = (w.start().as_secs(), w.end().as_secs());
        if start <= end {
            vec![(start, end)]
        } else {
            vec![(start, SECONDS_PER_DAY), (0, end)]
        }
    };

    for (a_start, a_end) in segments(a) {
        for (b_start, b_end) in segments(b) {
            if a_start < b_end && b_start < a_end {
                return true;
            }
        }
    }

    false
}
