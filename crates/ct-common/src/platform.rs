//! Platform identity for census and upload metadata.
//!
//! Collected once per run and reused in two places: the `device_name`
//! section of the census document, and the provenance fields attached to
//! every bulk-uploaded artifact.

use serde::{Deserialize, Serialize};

/// Identifying information about the host this agent runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Operating system name (e.g. "linux").
    pub os: String,
    /// Kernel or OS release string.
    pub os_version: String,
    /// CPU architecture (e.g. "x86_64").
    pub arch: String,
    /// Host name, empty if it cannot be determined.
    pub hostname: String,
    /// Agent version that produced this snapshot.
    pub agent_version: String,
}

impl PlatformInfo {
    /// Detect platform identity for the current host.
    pub fn detect(agent_version: &str) -> Self {
        PlatformInfo {
            os: std::env::consts::OS.to_string(),
            os_version: read_os_version(),
            arch: std::env::consts::ARCH.to_string(),
            hostname: read_hostname(),
            agent_version: agent_version.to_string(),
        }
    }

    /// Human-oriented device name, e.g. `linux 6.1.0 (x86_64)`.
    ///
    /// When the version string already starts with the OS name only the
    /// version and architecture are rendered, mirroring how vendor-prefixed
    /// model strings are collapsed.
    pub fn device_name(&self) -> String {
        if self
            .os_version
            .to_lowercase()
            .starts_with(&self.os.to_lowercase())
        {
            format!("{} ({})", self.os_version, self.arch)
        } else {
            format!("{} {} ({})", self.os, self.os_version, self.arch)
        }
    }
}

/// Kernel release, from /proc/sys/kernel/osrelease where available.
fn read_os_version() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Host name, from /proc/sys/kernel/hostname or the HOSTNAME variable.
fn read_hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_default()
}
