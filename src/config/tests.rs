use super::validation::{validate_config, windows_overlap};
use super::*;
use serial_test::serial;
use std::time::Duration;

fn phase(start: &str, end: &str) -> PhaseConfig {
    PhaseConfig {
        start: PhaseTime::Clock(start.to_string()),
        end: PhaseTime::Clock(end.to_string()),
    }
}

fn base_config() -> Config {
    Config {
        connection: None,
        night: phase("22:00", "06:00"),
        morning: phase("06:00", "08:00"),
        bot_token: None,
        chat_id: None,
        poll_timeout: None,
        idle_interval: None,
        debug: None,
    }
}

#[test]
fn minutes_and_clock_forms_normalize_identically() {
    // 22:00 == 1320 minutes
    let from_clock = PhaseTime::Clock("22:00".to_string()).to_offset().unwrap();
    let from_minutes = PhaseTime::Minutes(1320).to_offset().unwrap();
    assert_eq!(from_clock, from_minutes);
    assert_eq!(from_clock, Duration::from_secs(22 * 3600));
}

#[test]
fn clock_form_accepts_seconds() {
    let offset = PhaseTime::Clock("06:30:15".to_string()).to_offset().unwrap();
    assert_eq!(offset, Duration::from_secs(6 * 3600 + 30 * 60 + 15));
}

#[test]
fn out_of_range_clock_is_rejected() {
    assert!(PhaseTime::Clock("25:00".to_string()).to_offset().is_err());
    assert!(PhaseTime::Clock("24:00".to_string()).to_offset().is_err());
    assert!(PhaseTime::Clock("garbage".to_string()).to_offset().is_err());
}

#[test]
fn out_of_range_minutes_are_rejected() {
    assert!(PhaseTime::Minutes(1440).to_offset().is_err());
    assert!(PhaseTime::Minutes(10_000).to_offset().is_err());
    assert!(PhaseTime::Minutes(1439).to_offset().is_ok());
}

#[test]
fn out_of_range_night_start_is_fatal_not_clamped() {
    let mut config = base_config();
    config.night = PhaseConfig {
        start: PhaseTime::Clock("25:00".to_string()),
        end: PhaseTime::Clock("06:00".to_string()),
    };
    assert!(validate_config(&config).is_err());

    config.night = PhaseConfig {
        start: PhaseTime::Minutes(1500),
        end: PhaseTime::Clock("06:00".to_string()),
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn valid_config_passes_validation() {
    assert!(validate_config(&base_config()).is_ok());
}

#[test]
fn degenerate_window_is_rejected() {
    let mut config = base_config();
    config.morning = phase("06:00", "06:00");
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("zero-length"));
}

#[test]
fn overlapping_phases_are_rejected() {
    let mut config = base_config();
    config.morning = phase("05:00", "08:00"); // overlaps night's tail
    assert!(validate_config(&config).is_err());
}

#[test]
fn adjacent_phases_are_allowed() {
    // Morning starting exactly at night's (exclusive) end does not overlap.
    assert!(validate_config(&base_config()).is_ok());
}

#[test]
fn windows_overlap_handles_wraparound() {
    let night = TimeWindow::new(
        "n",
        Duration::from_secs(22 * 3600),
        Duration::from_secs(6 * 3600),
    );
    let early = TimeWindow::new(
        "m",
        Duration::from_secs(5 * 3600),
        Duration::from_secs(8 * 3600),
    );
    let late = TimeWindow::new(
        "m",
        Duration::from_secs(6 * 3600),
        Duration::from_secs(8 * 3600),
    );
    assert!(windows_overlap(&night, &early));
    assert!(!windows_overlap(&night, &late));
}

#[test]
fn incomplete_notification_credentials_are_rejected() {
    let mut config = base_config();
    config.bot_token = Some("123:abc".to_string());
    assert!(validate_config(&config).is_err());

    config.chat_id = Some("42".to_string());
    assert!(validate_config(&config).is_ok());
    assert!(config.notifications_configured());
}

#[test]
fn empty_credentials_do_not_count_as_configured() {
    let mut config = base_config();
    config.bot_token = Some(String::new());
    config.chat_id = Some(String::new());
    assert!(!config.notifications_configured());
}

#[test]
fn poll_timeout_range_is_enforced() {
    let mut config = base_config();
    config.poll_timeout = Some(5);
    assert!(validate_config(&config).is_err());
    config.poll_timeout = Some(500);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn defaults_apply_when_fields_are_omitted() {
    let config = base_config();
    assert_eq!(config.connection().as_str(), "any");
    assert_eq!(config.poll_timeout(), Duration::from_secs(500));
    assert!(config.idle_interval().is_zero());
    assert!(!config.debug());
}

#[test]
fn toml_accepts_both_time_forms() {
    let toml_text = r#"
        connection = "wireless"
        [night]
        start = 1320
        end = "06:00"
        [morning]
        start = "06:00"
        end = 480
    "#;
    let config: Config = toml::from_str(toml_text).unwrap();
    assert!(validate_config(&config).is_ok());

    let night = config.night_window().unwrap();
    assert_eq!(night.start(), Duration::from_secs(22 * 3600));
    assert_eq!(night.end(), Duration::from_secs(6 * 3600));
    let morning = config.morning_window().unwrap();
    assert_eq!(morning.end(), Duration::from_secs(8 * 3600));
}

#[test]
fn missing_phase_table_fails_to_parse() {
    let toml_text = r#"connection = "any""#;
    assert!(toml::from_str::<Config>(toml_text).is_err());
}

#[test]
fn generated_default_config_loads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dozr.toml");
    loading::create_default_config(&path).unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.poll_timeout, Some(500));
    assert_eq!(config.idle_interval, Some(0));
    assert!(config.night_window().is_ok());
}

#[test]
#[serial]
fn custom_config_dir_redirects_the_path() {
    // set_config_dir uses a process-wide OnceLock; keep this the only
    // test that touches it.
    let dir = tempfile::tempdir().unwrap();
    set_config_dir(Some(dir.path().to_string_lossy().into_owned())).unwrap();
    let path = get_config_path().unwrap();
    assert_eq!(path, dir.path().join("dozr.toml"));
}
