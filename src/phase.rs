//! Circular time windows and phase classification.
//!
//! All phase arithmetic runs over a circular 24-hour domain of offsets from
//! local midnight. A naive linear before/after comparison breaks for
//! windows that span midnight (e.g. `22:00 → 06:00`), so containment and
//! distance queries are expressed in terms of forward travel around the
//! circle.
//!
//! The "neither phase" classification reuses containment on synthetic gap
//! windows (end of one phase → start of the other) instead of introducing
//! a second comparison algorithm.

use chrono::{DateTime, Local, Timelike};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::SECONDS_PER_DAY;
use crate::time_source::TimeSource;

/// A named half-open time range `[start, end)` over the 24-hour circle.
///
/// `end < start` means the window wraps past midnight. `start == end` is a
/// degenerate window that contains nothing; configuration validation
/// rejects it before one can reach the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub name: String,
    start: Duration,
    end: Duration,
}

impl TimeWindow {
    /// Construct a window, normalizing both offsets into the 24-hour domain.
    pub fn new(name: impl Into<String>, start: Duration, end: Duration) -> Self {
        Self {
            name: name.into(),
            start: Duration::from_secs(start.as_secs() % SECONDS_PER_DAY),
            end: Duration::from_secs(end.as_secs() % SECONDS_PER_DAY),
        }
    }

    /// Offset of the window start from midnight.
    pub fn start(&self) -> Duration {
        self.start
    }

    /// Offset of the window end from midnight (exclusive).
    pub fn end(&self) -> Duration {
        self.end
    }

    /// Whether the window spans the midnight boundary.
    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    /// Test whether offset `t` falls inside the window.
    ///
    /// `start` is in, `end` is out. Handles midnight wraparound.
    pub fn contains(&self, t: Duration) -> bool {
        match self.start.cmp(&self.end) {
            Ordering::Less => t >= self.start && t < self.end,
            Ordering::Greater => t >= self.start || t < self.end,
            // start == end, empty range
            Ordering::Equal => false,
        }
    }

    /// Forward distance around the circle from `t` to the window start.
    pub fn until_start(&self, t: Duration) -> Duration {
        forward_distance(t, self.start)
    }

    /// Forward distance around the circle from `t` to the window end.
    pub fn until_end(&self, t: Duration) -> Duration {
        forward_distance(t, self.end)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{} → {})",
            self.name,
            format_offset(self.start),
            format_offset(self.end)
        )
    }
}

/// Format an offset from midnight as `HH:MM:SS`.
pub fn format_offset(t: Duration) -> String {
    let secs = t.as_secs() % SECONDS_PER_DAY;
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Minimal non-negative forward travel from `from` to `to` around the
/// 24-hour circle. Zero when the offsets coincide.
pub fn forward_distance(from: Duration, to: Duration) -> Duration {
    let from = from.as_secs() % SECONDS_PER_DAY;
    let to = to.as_secs() % SECONDS_PER_DAY;
    Duration::from_secs((to + SECONDS_PER_DAY - from) % SECONDS_PER_DAY)
}

/// Wall-clock offset from local midnight, truncated to whole seconds.
pub fn offset_from_midnight(now: DateTime<Local>) -> Duration {
    Duration::from_secs(u64::from(now.num_seconds_from_midnight()))
}

/// Which boundary of a window a distance query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// Return the first window containing `now`, in argument order.
pub fn phase_containing<'a>(now: Duration, windows: &'a [TimeWindow]) -> Option<&'a TimeWindow> {
    windows.iter().find(|w| w.contains(now))
}

/// Return the window whose chosen boundary is soonest after `now`,
/// measured by minimal forward distance around the circle, together with
/// that distance. Ties are broken by argument order: the first window with
/// the minimal distance wins.
pub fn nearest_boundary<'a>(
    now: Duration,
    windows: &'a [TimeWindow],
    boundary: Boundary,
) -> Option<(&'a TimeWindow, Duration)> {
    windows
        .iter()
        .map(|w| {
            let distance = match boundary {
                Boundary::Start => w.until_start(now),
                Boundary::End => w.until_end(now),
            };
            (w, distance)
        })
        .min_by_key(|(_, distance)| *distance)
}

/// Classify "neither phase" time via complementary gap windows.
///
/// Constructs the two gaps `(end of a → start of b)` and
/// `(end of b → start of a)` and returns the phase that follows whichever
/// gap contains `now`, paired with the forward distance to that phase's
/// start. Returns `None` when `now` falls in neither gap; with validated
/// non-overlapping phases that only happens if `now` is inside a phase,
/// and callers treat it as an invariant violation rather than crashing.
pub fn nearest_phase_between<'a>(
    now: Duration,
    a: &'a TimeWindow,
    b: &'a TimeWindow,
) -> Option<(&'a TimeWindow, Duration)> {
    let gap_to_b = TimeWindow::new(format!("GAP BEFORE {}", b.name), a.end, b.start);
    if gap_to_b.contains(now) {
        return Some((b, b.until_start(now)));
    }

    let gap_to_a = TimeWindow::new(format!("GAP BEFORE {}", a.name), b.end, a.start);
    if gap_to_a.contains(now) {
        return Some((a, a.until_start(now)));
    }

    None
}

/// Clock over the configured phase windows.
///
/// Thin wrapper binding the pure classification functions to an injected
/// time source, so the controller asks one object "where are we".
pub struct PhaseClock {
    clock: Arc<dyn TimeSource>,
}

impl PhaseClock {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self { clock }
    }

    /// Current wall-clock offset from local midnight.
    pub fn current_offset(&self) -> Duration {
        offset_from_midnight(self.clock.now())
    }

    /// The first configured window containing "now", if any.
    pub fn current_phase<'a>(&self, windows: &'a [TimeWindow]) -> Option<&'a TimeWindow> {
        phase_containing(self.current_offset(), windows)
    }

    /// Nearest upcoming/enclosing phase when "now" is in neither window.
    pub fn nearest_phase_between<'a>(
        &self,
        a: &'a TimeWindow,
        b: &'a TimeWindow,
    ) -> Option<(&'a TimeWindow, Duration)> {
        nearest_phase_between(self.current_offset(), a, b)
    }
}
