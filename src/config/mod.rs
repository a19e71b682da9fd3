//! Configuration system for dozr with validation and defaults.
//!
//! Configuration is a TOML file, searched for at
//! `$XDG_CONFIG_HOME/dozr/dozr.toml` (or the directory passed with
//! `--config`). A default file is generated on first run.
//!
//! ```toml
//! connection = "any"   # Interface class to watch: "any", "wired", "wireless"
//! poll_timeout = 500   # Seconds before a phase end to switch to aggressive polling
//! idle_interval = 0    # Fixed poll interval in seconds (0 = full blocking wait)
//!
//! # bot_token = ""     # Telegram bot credentials; omit to disable notifications
//! # chat_id = ""
//!
//! [night]
//! start = "22:00"      # Phase times accept "HH:MM", "HH:MM:SS", or minute counts
//! end = "06:00"
//!
//! [morning]
//! start = "06:00"
//! end = "08:00"
//! ```
//!
//! ## Validation
//!
//! Malformed or out-of-range time values, degenerate windows
//! (`start == end`), and overlapping NIGHT/MORNING windows are fatal
//! configuration errors: the process logs the problem and exits non-zero
//! rather than guessing at a schedule.

pub mod loading;
pub mod validation;

use anyhow::{Context, Result, bail};
use chrono::{NaiveTime, Timelike};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::*;
use crate::net::InterfaceClass;
use crate::phase::TimeWindow;

// Re-export public API
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// A phase boundary, accepted either as a minute count since midnight or
/// as an `"HH:MM"` / `"HH:MM:SS"` string. Both forms normalize to the same
/// offset.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PhaseTime {
    Minutes(u64),
    Clock(String),
}

impl PhaseTime {
    /// Normalize to an offset from midnight, validated to `[0, 24h)`.
    pub fn to_offset(&self) -> Result<Duration> {
        match self {
            PhaseTime::Minutes(minutes) => {
                if *minutes >= MINUTES_PER_DAY {
                    bail!(
                        "Phase time ({} minutes) is out of range; must be below {} (24:00)",
                        minutes,
                        MINUTES_PER_DAY
                    );
                }
                Ok(Duration::from_secs(minutes * 60))
            }
            PhaseTime::Clock(text) => {
                let parsed = NaiveTime::parse_from_str(text, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
                    .with_context(|| {
                        format!(
                            "Invalid phase time '{text}'. Use HH:MM, HH:MM:SS, or a minute count below 1440"
                        )
                    })?;
                Ok(Duration::from_secs(u64::from(
                    parsed.num_seconds_from_midnight(),
                )))
            }
        }
    }
}

/// One configured phase window.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PhaseConfig {
    pub start: PhaseTime,
    pub end: PhaseTime,
}

impl PhaseConfig {
    /// Build the named `TimeWindow`; the name tag is attached here, once,
    /// during load.
    pub fn to_window(&self, name: &str) -> Result<TimeWindow> {
        let start = self
            .start
            .to_offset()
            .with_context(|| format!("Invalid start for {name}"))?;
        let end = self
            .end
            .to_offset()
            .with_context(|| format!("Invalid end for {name}"))?;
        Ok(TimeWindow::new(name, start, end))
    }
}

/// Configuration structure for dozr.
///
/// Most fields are optional and fall back to defaults; the two phase
/// windows are required.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Interface class the connectivity probe watches.
    pub connection: Option<InterfaceClass>,

    /// The night phase window (watch for disconnection).
    pub night: PhaseConfig,
    /// The morning phase window (watch for reconnection).
    pub morning: PhaseConfig,

    /// Telegram bot credentials; both must be present for notifications.
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,

    /// Boundary-sensitivity timeout in seconds (default 500).
    pub poll_timeout: Option<u64>,
    /// Fixed idle interval in seconds; 0 disables the cap and idles all
    /// the way to the boundary-sensitivity zone in one wait.
    pub idle_interval: Option<u64>,

    /// Verbose probe/waiter logging.
    pub debug: Option<bool>,
}

impl Config {
    /// Load configuration using the module's load function.
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load from a specific path.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        load_from_path(path)
    }

    pub fn connection(&self) -> InterfaceClass {
        self.connection.unwrap_or(DEFAULT_CONNECTION)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS))
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval.unwrap_or(DEFAULT_IDLE_INTERVAL_SECS))
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn night_window(&self) -> Result<TimeWindow> {
        self.night.to_window(NIGHT_PHASE_NAME)
    }

    pub fn morning_window(&self) -> Result<TimeWindow> {
        self.morning.to_window(MORNING_PHASE_NAME)
    }

    /// Whether both notification credentials are present and non-empty.
    pub fn notifications_configured(&self) -> bool {
        matches!(
            (self.bot_token.as_deref(), self.chat_id.as_deref()),
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty()
        )
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        log_indented!("Connection class: {}", self.connection().as_str());

        // Windows were validated during load; display falls back to the
        // raw values only if something slipped through.
        if let (Ok(night), Ok(morning)) = (self.night_window(), self.morning_window()) {
            log_indented!("{}", night);
            log_indented!("{}", morning);
        }

        log_indented!("Poll timeout: {} seconds", self.poll_timeout().as_secs());
        let idle = self.idle_interval();
        if idle.is_zero() {
            log_indented!("Idle interval: full blocking wait");
        } else {
            log_indented!("Idle interval: {} seconds", idle.as_secs());
        }
        if self.notifications_configured() {
            log_indented!("Notifications: Telegram");
        } else {
            log_indented!("Notifications: disabled");
        }
    }
}

#[cfg(test)]
mod tests;
