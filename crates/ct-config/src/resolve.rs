//! Asset directory resolution.
//!
//! Resolution order: CLI argument → environment variable → XDG config
//! directory → system config directory.

use std::path::{Path, PathBuf};

/// Environment variable naming an explicit assets directory.
pub const ENV_ASSETS_DIR: &str = "CENSUS_TAKER_ASSETS_DIR";

/// System-wide assets location.
const SYSTEM_ASSETS_DIR: &str = "/etc/census-taker/assets";

/// Subdirectory under the XDG config dir.
const XDG_SUBDIR: &str = "census-taker/assets";

/// Where the assets directory was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,
    /// Set via `CENSUS_TAKER_ASSETS_DIR`.
    Environment,
    /// Found in the XDG config directory.
    XdgConfig,
    /// Found in /etc/census-taker/assets.
    SystemConfig,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
        }
    }
}

/// Resolve the assets directory.
///
/// Returns `None` when no candidate directory exists; the CLI argument, when
/// given, is trusted without an existence check so that a typo surfaces as a
/// missing-asset error rather than a silent fallback.
pub fn resolve_assets_dir(cli: Option<&Path>) -> Option<(PathBuf, ConfigSource)> {
    if let Some(dir) = cli {
        return Some((dir.to_path_buf(), ConfigSource::CliArgument));
    }

    if let Ok(dir) = std::env::var(ENV_ASSETS_DIR) {
        if !dir.is_empty() {
            return Some((PathBuf::from(dir), ConfigSource::Environment));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let candidate = config_dir.join(XDG_SUBDIR);
        if candidate.is_dir() {
            return Some((candidate, ConfigSource::XdgConfig));
        }
    }

    let system = PathBuf::from(SYSTEM_ASSETS_DIR);
    if system.is_dir() {
        return Some((system, ConfigSource::SystemConfig));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_argument_wins() {
        let (dir, source) = resolve_assets_dir(Some(Path::new("/tmp/assets"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/assets"));
        assert_eq!(source, ConfigSource::CliArgument);
    }

    #[test]
    fn test_cli_argument_not_checked_for_existence() {
        let missing = Path::new("/definitely/not/a/real/assets/dir");
        let (dir, _) = resolve_assets_dir(Some(missing)).unwrap();
        assert_eq!(dir, missing);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ConfigSource::Environment.to_string(), "environment variable");
        assert_eq!(ConfigSource::SystemConfig.to_string(), "system config");
    }
}
