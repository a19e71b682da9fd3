//! Application-wide constants and defaults.

/// Seconds in a full 24-hour cycle.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Minutes in a full 24-hour cycle.
pub const MINUTES_PER_DAY: u64 = 1_440;

/// Name tag attached to the night window at config load.
pub const NIGHT_PHASE_NAME: &str = "NIGHT PHASE";

/// Name tag attached to the morning window at config load.
pub const MORNING_PHASE_NAME: &str = "MORNING PHASE";

/// Default boundary-sensitivity timeout in seconds.
///
/// Within this many seconds of the active window's end the waiter switches
/// to the short aggressive poll interval.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 500;

/// Hard limits for the configurable poll timeout.
pub const MINIMUM_POLL_TIMEOUT_SECS: u64 = 10;
pub const MAXIMUM_POLL_TIMEOUT_SECS: u64 = 21_600;

/// Short poll interval used near a window boundary.
pub const BOUNDARY_POLL_INTERVAL_SECS: u64 = 60;

/// Default fixed idle interval in seconds; 0 means "use a full blocking
/// wait up to the boundary-sensitivity zone" instead of a capped interval.
pub const DEFAULT_IDLE_INTERVAL_SECS: u64 = 0;

/// Hard upper limit for the configurable idle interval.
pub const MAXIMUM_IDLE_INTERVAL_SECS: u64 = SECONDS_PER_DAY;

/// Grace delay after a machine sleep, giving the network stack time to
/// re-associate before the next connectivity probe.
pub const REASSOCIATION_GRACE_SECS: u64 = 20;

/// Idle applied when an iteration produced no action (invariant violation
/// fallback), so the loop cannot spin hot.
pub const NO_ACTION_IDLE_SECS: u64 = 60;

/// Maximum notification text length; longer messages are truncated.
pub const NOTIFY_MAX_LEN: usize = 1_000;

/// Bounded retry policy for transient notification failures.
pub const NOTIFY_MAX_ATTEMPTS: u32 = 8;
pub const NOTIFY_INITIAL_BACKOFF_SECS: u64 = 2;

/// Default connection class when the config omits one.
pub const DEFAULT_CONNECTION: crate::net::InterfaceClass = crate::net::InterfaceClass::Any;

/// Exit code for fatal errors (configuration, lock conflicts).
pub const EXIT_FAILURE: i32 = 1;
