//! Key-value property provider.
//!
//! Invokes an external property-listing command and parses lines of the
//! form `[key]: [value]`. The property set is foundational, so an inability
//! to run the configured lister is fatal to the run; malformed individual
//! lines are merely skipped. Hosts without a property service configure no
//! lister and carry no section.

use ct_common::{CensusBuilder, Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::process::Command;
use tracing::{debug, warn};

/// Section name owned by this provider.
pub const SECTION: &str = "system_properties";

/// External lister configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyListerConfig {
    /// Command to invoke.
    pub command: String,
    /// Arguments passed to the command.
    pub args: Vec<String>,
}

impl PropertyListerConfig {
    /// Build from whitespace-split command-line tokens; `None` when empty.
    pub fn from_command_line(tokens: &[String]) -> Option<Self> {
        let (command, args) = tokens.split_first()?;
        Some(PropertyListerConfig {
            command: command.clone(),
            args: args.to_vec(),
        })
    }

    /// The lister this platform ships with, if any.
    ///
    /// Only Android carries a property service out of the box; elsewhere the
    /// deployment has to name a lister explicitly or the section is omitted.
    pub fn platform_default() -> Option<Self> {
        if cfg!(target_os = "android") {
            Some(PropertyListerConfig {
                command: "getprop".to_string(),
                args: Vec::new(),
            })
        } else {
            None
        }
    }
}

/// Run the lister and insert the parsed property map.
pub fn collect(census: &mut CensusBuilder, config: &PropertyListerConfig) -> Result<()> {
    let output = Command::new(&config.command)
        .args(&config.args)
        .output()
        .map_err(|err| {
            Error::PropertyLister(format!("failed to run {}: {err}", config.command))
        })?;

    if !output.status.success() {
        return Err(Error::PropertyLister(format!(
            "{} exited with {}",
            config.command, output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let properties = parse_properties(&stdout);
    debug!(count = properties.len(), "parsed properties");

    census.insert_serialized(SECTION, &properties)?;
    Ok(())
}

/// Parse `[key]: [value]` lines into a map. Lines that do not match,
/// including empty-valued properties, are skipped.
pub fn parse_properties(output: &str) -> BTreeMap<String, String> {
    // The pattern is infallible; compiled per call because the provider
    // runs once per snapshot.
    let pattern = match Regex::new(r"^\[(.+)\]: \[(.+)\]$") {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!(error = %err, "property pattern failed to compile");
            return BTreeMap::new();
        }
    };

    let mut properties = BTreeMap::new();
    for line in output.lines() {
        if let Some(caps) = pattern.captures(line) {
            properties.insert(caps[1].to_string(), caps[2].to_string());
        }
    }
    properties
}
