//! Application coordinator that manages the complete lifecycle of dozr.
//!
//! Handles resource acquisition, initialization, and orchestration of the
//! controller: configuration loading, lock file management for
//! single-instance enforcement, signal handler setup, and collaborator
//! construction.
//!
//! The `Dozr` struct uses a builder pattern to support different startup
//! contexts:
//! - Normal startup: `Dozr::new(debug_enabled).run()`
//! - Dry run: `Dozr::new(debug_enabled).dry_run().run()`
//! - Tests: `Dozr::new(true).without_lock().without_headers().run()`

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    config::Config,
    constants::EXIT_FAILURE,
    controller::Controller,
    lock,
    net::SysfsProbe,
    notify::Notifier,
    power::RtcWake,
    signals::setup_signal_handler,
    time_source::{self, RealTimeSource, TimeSource},
};

/// Builder for configuring and running the dozr application.
pub struct Dozr {
    debug_enabled: bool,
    dry_run: bool,
    create_lock: bool,
    show_headers: bool,
}

impl Dozr {
    /// Create a new runner with defaults matching a normal run.
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            dry_run: false,
            create_lock: true,
            show_headers: true,
        }
    }

    /// Log suspend decisions without executing them.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Skip lock file creation (tests and supervised restarts).
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Skip the version header.
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Execute the application with the configured settings.
    ///
    /// Loads and validates configuration, enforces single-instance
    /// operation, installs signal handlers, then hands control to the
    /// reconciliation loop until shutdown is requested.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        let clock: Arc<dyn TimeSource> = Arc::new(RealTimeSource);
        if !time_source::is_initialized() {
            time_source::init_time_source(clock.clone());
        }

        // Configuration problems are user errors, not crashes: report the
        // full chain and exit non-zero.
        let mut config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{e:?}");
                std::process::exit(EXIT_FAILURE);
            }
        };
        // --debug wins over the config file.
        if self.debug_enabled {
            config.debug = Some(true);
        }
        let debug_enabled = config.debug();

        let _lock = if self.create_lock {
            match lock::acquire_lock()? {
                Some(lock) => Some(lock),
                None => {
                    log_end!();
                    std::process::exit(EXIT_FAILURE);
                }
            }
        } else {
            None
        };

        let signal_state = setup_signal_handler(debug_enabled)?;

        config.log_config();
        if self.dry_run {
            log_block_start!("Dry run: suspend commands will be logged, not executed");
        }

        let probe = SysfsProbe::new();
        let power = RtcWake::new(clock.clone(), !self.dry_run);
        let notifier = Notifier::from_config(&config, clock.clone())
            .context("Failed to initialize notifications")?;

        let mut controller = Controller::new(
            &config,
            Box::new(probe),
            Box::new(power),
            notifier,
            clock,
            signal_state.running.clone(),
        )?;

        if self.create_lock {
            log_block_start!("Lock acquired, starting dozr...");
        } else {
            log_block_start!("Starting dozr...");
        }
        controller.run();

        log_block_start!("Shutting down dozr...");
        log_end!();

        Ok(())
    }
}
