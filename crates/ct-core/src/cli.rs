//! Command-line interface.

use crate::logging::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// Device census agent: collects a host snapshot and delivers it to the
/// collection endpoint.
#[derive(Parser, Debug)]
#[command(name = "census")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Assets directory with endpoint and store configuration.
    ///
    /// Falls back to CENSUS_TAKER_ASSETS_DIR, then the XDG config dir, then
    /// /etc/census-taker/assets.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Override the census endpoint host.
    #[arg(long)]
    pub host: Option<String>,

    /// Directory for the plaintext audit copy (default: system temp dir).
    #[arg(long)]
    pub audit_dir: Option<PathBuf>,

    /// Property-lister command line, e.g. "getprop" or "/opt/lister --all".
    ///
    /// Overrides the property_lister asset and the platform default.
    #[arg(long)]
    pub property_lister: Option<String>,

    /// Skip the bulk artifact upload stage.
    #[arg(long)]
    pub skip_upload: bool,

    /// Skip endpoint delivery; collect and write the audit copy only.
    #[arg(long)]
    pub skip_deliver: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,

    /// Base log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Increase verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Warnings and errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Effective log level after applying -v/-q to the base level.
    pub fn effective_log_level(&self) -> String {
        if self.quiet {
            return "warn".to_string();
        }
        match self.verbose {
            0 => self.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }
}
