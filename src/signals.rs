//! Signal handling for cooperative shutdown.
//!
//! SIGINT, SIGTERM, and SIGHUP all clear the shared running flag; the
//! control loop and the waiters re-check the flag around every idle and
//! wind down on their own instead of being torn out of a suspend.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

/// Signal handling state shared between threads.
pub struct SignalState {
    /// Cleared when a termination signal arrives.
    pub running: Arc<AtomicBool>,
}

/// Set up signal handling for the application.
///
/// Spawns a background thread that watches for termination signals and
/// clears the running flag on the first one it sees.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = running.clone();
    thread::spawn(move || {
        for sig in signals.forever() {
            if debug_enabled {
                log_pipe!();
                log_debug!("Received signal {sig}, requesting shutdown");
            }
            running_clone.store(false, Ordering::SeqCst);
            // One signal is enough; the loop exits at its next flag check.
            break;
        }
    });

    Ok(SignalState { running })
}
