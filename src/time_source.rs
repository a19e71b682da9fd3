//! Time source abstraction supporting both real and simulated time.
//!
//! All time queries and idle waits in dozr go through a `TimeSource` so the
//! waiter and controller can be driven deterministically in tests without a
//! real clock. The simulated source is fast-forward only: `sleep` advances
//! the simulated wall clock instantly and returns.

use chrono::{DateTime, Duration as ChronoDuration, Local};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

/// Global time source instance, defaults to `RealTimeSource`.
///
/// The global is only consulted by the logger (timestamp prefixes) and by
/// components constructed without an explicit source; everything on the
/// control path holds an injected `Arc<dyn TimeSource>`.
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time operations.
pub trait TimeSource: Send + Sync {
    /// Get the current local time.
    fn now(&self) -> DateTime<Local>;

    /// Sleep for the specified duration (or simulate it).
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a simulated time source.
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation backed by the system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Simulated time source for tests and accelerated runs.
///
/// `sleep` advances the simulated clock by exactly the requested duration
/// without blocking, so a full night phase can be traversed in microseconds.
pub struct SimulatedTimeSource {
    current: Mutex<DateTime<Local>>,
}

impl SimulatedTimeSource {
    /// Create a simulated source starting at `start_time`.
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start_time),
        }
    }

    /// Create a simulated source starting at the given time of day today.
    pub fn at_time_of_day(hour: u32, minute: u32, second: u32) -> Self {
        let today = Local::now().date_naive();
        let naive = today
            .and_hms_opt(hour, minute, second)
            .expect("valid time of day");
        let start = naive
            .and_local_timezone(Local)
            .earliest()
            .expect("resolvable local time");
        Self::new(start)
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap()
    }

    fn sleep(&self, duration: StdDuration) {
        let mut current = self.current.lock().unwrap();
        *current += ChronoDuration::milliseconds(duration.as_millis() as i64);
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Initialize the global time source (call once at startup).
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Check if the global time source has been initialized.
pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

/// Get the current time from the global time source.
pub fn now() -> DateTime<Local> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

/// Sleep using the global time source.
pub fn sleep(duration: StdDuration) {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .sleep(duration)
}

/// Check if we're running against a simulated clock.
pub fn is_simulated() -> bool {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .is_simulated()
}
