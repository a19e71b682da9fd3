//! Connectivity probing via per-interface link state.
//!
//! The probe enumerates network interfaces, filters them to the configured
//! class by kernel naming convention, and reports each one up or down from
//! its carrier signal. An unreadable interface is reported down rather
//! than raised; the controller must keep looping whatever the kernel does.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Which kind of interfaces a probe should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceClass {
    /// Any non-loopback interface.
    Any,
    /// Ethernet-style interfaces (`eth*`, `en*`, `em*`).
    Wired,
    /// Wireless interfaces (`wl*`).
    Wireless,
}

impl InterfaceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceClass::Any => "any",
            InterfaceClass::Wired => "wired",
            InterfaceClass::Wireless => "wireless",
        }
    }

    /// Whether an interface name belongs to this class.
    ///
    /// Classification follows kernel naming conventions; loopback is never
    /// part of any class.
    pub fn matches(&self, name: &str) -> bool {
        if name == "lo" {
            return false;
        }
        let wired = name.starts_with("en") || name.starts_with("eth") || name.starts_with("em");
        let wireless = name.starts_with("wl");
        match self {
            InterfaceClass::Any => true,
            InterfaceClass::Wired => wired,
            InterfaceClass::Wireless => wireless,
        }
    }
}

/// A fresh connectivity snapshot; never cached between probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityState {
    /// True when at least one matching interface reports link-up.
    pub connected: bool,
    /// The matching interfaces currently reporting link-up.
    pub interfaces: BTreeSet<String>,
}

impl ConnectivityState {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            interfaces: BTreeSet::new(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        if self.connected {
            "connected"
        } else {
            "disconnected"
        }
    }
}

/// Interface contract for connectivity probing.
pub trait ConnectivityProbe {
    /// Report whether the host is currently connected through any
    /// interface of `class`, and through which ones.
    fn probe(&self, class: InterfaceClass) -> ConnectivityState;
}

/// Probe backed by `/sys/class/net/<if>/carrier`.
pub struct SysfsProbe {
    root: PathBuf,
}

impl SysfsProbe {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/sys/class/net"),
        }
    }

    /// Probe rooted at a custom directory (tests point this at a tempdir).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn link_up(&self, name: &str) -> bool {
        // carrier reads fail with EINVAL while an interface is down;
        // either way that interface is not connectivity.
        match std::fs::read_to_string(self.root.join(name).join("carrier")) {
            Ok(contents) => contents.trim() == "1",
            Err(_) => false,
        }
    }
}

impl Default for SysfsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityProbe for SysfsProbe {
    fn probe(&self, class: InterfaceClass) -> ConnectivityState {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            // No sysfs at all still means "not connected", not a crash.
            Err(_) => return ConnectivityState::disconnected(),
        };

        let mut up = BTreeSet::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if class.matches(&name) && self.link_up(&name) {
                up.insert(name);
            }
        }

        ConnectivityState {
            connected: !up.is_empty(),
            interfaces: up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn interface_class_matching() {
        assert!(InterfaceClass::Wired.matches("eth0"));
        assert!(InterfaceClass::Wired.matches("enp3s0"));
        assert!(InterfaceClass::Wired.matches("em1"));
        assert!(!InterfaceClass::Wired.matches("wlan0"));
        assert!(InterfaceClass::Wireless.matches("wlan0"));
        assert!(InterfaceClass::Wireless.matches("wlp2s0"));
        assert!(!InterfaceClass::Wireless.matches("eth0"));
        assert!(InterfaceClass::Any.matches("eth0"));
        assert!(InterfaceClass::Any.matches("wlp2s0"));
        assert!(InterfaceClass::Any.matches("tun0"));
    }

    #[test]
    fn loopback_is_never_matched() {
        assert!(!InterfaceClass::Any.matches("lo"));
        assert!(!InterfaceClass::Wired.matches("lo"));
        assert!(!InterfaceClass::Wireless.matches("lo"));
    }

    #[test]
    fn missing_sysfs_root_reports_disconnected() {
        let probe = SysfsProbe::with_root("/nonexistent/dozr-test");
        let state = probe.probe(InterfaceClass::Any);
        assert!(!state.connected);
        assert!(state.interfaces.is_empty());
    }

    #[test]
    fn carrier_files_drive_link_state() {
        let dir = tempfile::tempdir().unwrap();
        for (name, carrier) in [("eth0", "1"), ("wlan0", "0")] {
            let ifdir = dir.path().join(name);
            fs::create_dir(&ifdir).unwrap();
            fs::write(ifdir.join("carrier"), carrier).unwrap();
        }
        // Interface without a readable carrier file counts as down.
        fs::create_dir(dir.path().join("enp3s0")).unwrap();

        let probe = SysfsProbe::with_root(dir.path());

        let any = probe.probe(InterfaceClass::Any);
        assert!(any.connected);
        assert_eq!(any.interfaces.iter().collect::<Vec<_>>(), vec!["eth0"]);

        let wireless = probe.probe(InterfaceClass::Wireless);
        assert!(!wireless.connected);
    }
}
