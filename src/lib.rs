//! # dozr Library
//!
//! Internal library for the dozr binary, a connectivity-driven sleep
//! scheduler: during a configured night window it waits for the network
//! link to drop and then suspends the machine; during a configured morning
//! window it waits for the link to return and keeps the machine awake.
//!
//! The library exists to enable testing of the scheduling internals and to
//! keep CLI dispatch (main.rs) separate from application logic.
//!
//! ## Architecture
//!
//! - **Entry point**: the `Dozr` struct owns startup, locking, and signal
//!   wiring.
//! - **Core logic**: `controller` runs the classify → wait → decide →
//!   execute loop; `waiter` does the bounded connectivity polling.
//! - **Domain**: `phase` holds the circular time-window arithmetic, `net`
//!   the sysfs connectivity probe, `power` the rtcwake/process-wait
//!   primitives.
//! - **Infrastructure**: TOML configuration, Telegram notifications,
//!   signal handling, lock file, logging, and the pluggable time source.

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod config;
pub mod constants;
pub mod controller;
pub mod lock;
pub mod net;
pub mod notify;
pub mod phase;
pub mod power;
pub mod signals;
pub mod time_source;
pub mod waiter;

mod dozr;

// Re-export for binary
pub use dozr::Dozr;
