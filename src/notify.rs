//! Telegram notifications.
//!
//! Notifications are strictly best-effort: when no credentials are
//! configured every send is a silent no-op, and delivery failures never
//! propagate into the control loop. Retry is bounded and only applies to
//! transient transport failures (connect/timeout); a rejected request is
//! given up on immediately.

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::constants::{NOTIFY_INITIAL_BACKOFF_SECS, NOTIFY_MAX_ATTEMPTS, NOTIFY_MAX_LEN};
use crate::time_source::TimeSource;

const API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

struct Credentials {
    bot_token: String,
    chat_id: String,
}

/// Failure classification for one delivery attempt.
#[derive(Debug)]
enum SendError {
    /// Network-level failure that may clear up on its own.
    Transient(String),
    /// The API rejected the request; retrying would not help.
    Permanent(String),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Transient(msg) => write!(f, "transient send failure: {msg}"),
            SendError::Permanent(msg) => write!(f, "send rejected: {msg}"),
        }
    }
}

impl std::error::Error for SendError {}

/// Best-effort Telegram message sender.
pub struct Notifier {
    credentials: Option<Credentials>,
    client: reqwest::blocking::Client,
    clock: Arc<dyn TimeSource>,
}

impl Notifier {
    /// Build a notifier from the loaded configuration. Credentials that are
    /// absent or empty leave the notifier disabled.
    pub fn from_config(config: &Config, clock: Arc<dyn TimeSource>) -> Result<Self> {
        let credentials = if config.notifications_configured() {
            // notifications_configured() guarantees both are present.
            Some(Credentials {
                bot_token: config.bot_token.clone().unwrap_or_default(),
                chat_id: config.chat_id.clone().unwrap_or_default(),
            })
        } else {
            None
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for notifications")?;

        Ok(Self {
            credentials,
            client,
            clock,
        })
    }

    /// A notifier that never sends anything.
    pub fn disabled(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            credentials: None,
            client: reqwest::blocking::Client::new(),
            clock,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send one message. No-op `Ok` when unconfigured; a single attempt
    /// otherwise.
    pub fn notify(&self, text: &str) -> Result<()> {
        match self.send(text) {
            Ok(()) | Err(None) => Ok(()),
            Err(Some(e)) => Err(anyhow!("{e}")),
        }
    }

    /// Send one message, retrying transient transport failures with
    /// exponential backoff up to a fixed attempt budget.
    ///
    /// Returns whether the message was delivered.
    pub fn notify_with_retry(&self, text: &str) -> bool {
        let mut backoff = Duration::from_secs(NOTIFY_INITIAL_BACKOFF_SECS);

        for attempt in 1..=NOTIFY_MAX_ATTEMPTS {
            match self.send(text) {
                Ok(()) | Err(None) => return true,
                Err(Some(SendError::Permanent(msg))) => {
                    log_pipe!();
                    log_warning!("Notification rejected, not retrying: {msg}");
                    return false;
                }
                Err(Some(SendError::Transient(msg))) => {
                    if attempt == NOTIFY_MAX_ATTEMPTS {
                        log_pipe!();
                        log_warning!(
                            "Giving up on notification after {NOTIFY_MAX_ATTEMPTS} attempts: {msg}"
                        );
                        return false;
                    }
                    log_indented!(
                        "Notification attempt {attempt} failed ({msg}); retrying in {}s",
                        backoff.as_secs()
                    );
                    self.clock.sleep(backoff);
                    backoff = backoff.saturating_mul(2);
                }
            }
        }

        false
    }

    /// One delivery attempt. `Err(None)` means "unconfigured, nothing to do".
    fn send(&self, text: &str) -> std::result::Result<(), Option<SendError>> {
        let Some(credentials) = &self.credentials else {
            return Err(None);
        };

        let text = truncate_message(text);
        let url = format!("{API_BASE}/bot{}/sendMessage", credentials.bot_token);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("chat_id", credentials.chat_id.as_str()),
                ("parse_mode", "Markdown"),
                ("text", &text),
            ])
            .send()
            .map_err(|e| Some(classify(&e)))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .map_err(|e| Some(SendError::Permanent(format!("unreadable response: {e}"))))?;

        if body.get("ok").and_then(serde_json::Value::as_bool) == Some(true) {
            Ok(())
        } else {
            let description = body
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no description");
            Err(Some(SendError::Permanent(format!(
                "HTTP {status}: {description}"
            ))))
        }
    }
}

fn classify(e: &reqwest::Error) -> SendError {
    if e.is_connect() || e.is_timeout() {
        SendError::Transient(e.to_string())
    } else {
        SendError::Permanent(e.to_string())
    }
}

/// Cap message length, respecting character boundaries.
fn truncate_message(text: &str) -> String {
    text.chars().take(NOTIFY_MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::SimulatedTimeSource;

    #[test]
    fn unconfigured_notifier_is_a_silent_no_op() {
        let clock: Arc<dyn TimeSource> = Arc::new(SimulatedTimeSource::at_time_of_day(12, 0, 0));
        let notifier = Notifier::disabled(clock);
        assert!(!notifier.is_configured());
        assert!(notifier.notify("hello").is_ok());
        assert!(notifier.notify_with_retry("hello"));
    }

    #[test]
    fn long_messages_are_truncated() {
        let long = "x".repeat(NOTIFY_MAX_LEN + 500);
        assert_eq!(truncate_message(&long).chars().count(), NOTIFY_MAX_LEN);
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let long = "é".repeat(NOTIFY_MAX_LEN + 1);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), NOTIFY_MAX_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn short_messages_pass_through_unchanged() {
        assert_eq!(truncate_message("wake up"), "wake up");
    }
}
