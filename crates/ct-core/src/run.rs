//! Run orchestration.
//!
//! One run is strictly sequential: resolve configuration, collect every
//! provider into the census builder, deliver the document, then upload
//! configured artifacts. The machine-readable run report goes to stdout;
//! everything else is logged.

use crate::cli::Cli;
use crate::exit_codes::ExitCode;
use ct_collect::{device, environment, filesystem, properties, sysctl, PropertyListerConfig};
use ct_common::{CensusBuilder, Error, PlatformInfo, Result, RunId};
use ct_config::{resolve_assets_dir, AgentConfig};
use ct_deliver::{
    audit_only, deliver, upload_all, DeliveryOptions, HttpObjectStore, TracingSink, UploadSummary,
};
use ct_scan::{HarvestSpec, ScanPlan};
use serde::Serialize;
use tracing::{error, info, warn};

/// Machine-readable summary of one run, printed to stdout.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub delivered: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadSummary>,
}

/// Execute one census run and map the outcome to an exit code.
pub fn run(cli: &Cli) -> ExitCode {
    match execute(cli) {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => error!(%err, "failed to render run report"),
            }
            ExitCode::Success
        }
        Err(err) => {
            error!(category = %err.category(), %err, "run failed");
            ExitCode::from_error(&err)
        }
    }
}

fn execute(cli: &Cli) -> Result<RunReport> {
    let (assets_dir, source) = resolve_assets_dir(cli.assets.as_deref())
        .ok_or_else(|| Error::Config("no assets directory found".to_string()))?;
    info!(dir = %assets_dir.display(), %source, "resolved assets directory");

    let mut config = AgentConfig::load(&assets_dir)?;
    if let Some(host) = &cli.host {
        config = config.with_host(host.clone());
    }
    if let Some(dir) = &cli.audit_dir {
        config = config.with_audit_dir(dir.clone());
    }
    config.validate()?;

    let run_id = RunId::new();
    let platform = PlatformInfo::detect(env!("CARGO_PKG_VERSION"));
    info!(%run_id, host = %platform.hostname, "census run starting");

    let lister = resolve_property_lister(
        cli.property_lister.as_deref(),
        config.property_lister.as_deref(),
    );
    let document = collect_census(&platform, lister.as_ref())?;

    let mut options = DeliveryOptions::new(
        config.endpoint.host.clone(),
        config.endpoint.shared_secret.clone(),
    );
    options.audit_dir = config.audit_dir.clone();
    options.run_id = run_id.clone();

    let outcome = if cli.skip_deliver {
        info!("endpoint delivery skipped, writing audit copy only");
        audit_only(&document, &options)?
    } else {
        deliver(&document, &options, &mut TracingSink)?
    };

    let upload = match (&config.bulk_store, cli.skip_upload) {
        (Some(store_config), false) => {
            let store = HttpObjectStore::new(
                store_config.endpoint.clone(),
                store_config.bucket.clone(),
                &store_config.access_key,
                &store_config.secret_key,
            );
            Some(upload_all(&store_config.upload_paths, &store, &platform))
        }
        (Some(_), true) => {
            info!("artifact upload skipped");
            None
        }
        (None, _) => None,
    };

    Ok(RunReport {
        run_id,
        delivered: outcome.delivered,
        attempts: outcome.attempts,
        audit_path: outcome.audit_path.map(|p| p.display().to_string()),
        upload,
    })
}

/// Pick the property lister: CLI flag, then the configured asset, then the
/// platform default. `None` means the host has no property service and the
/// section is omitted.
fn resolve_property_lister(
    cli: Option<&str>,
    configured: Option<&[String]>,
) -> Option<PropertyListerConfig> {
    if let Some(raw) = cli {
        let tokens: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
        return PropertyListerConfig::from_command_line(&tokens);
    }
    if let Some(tokens) = configured {
        return PropertyListerConfig::from_command_line(tokens);
    }
    PropertyListerConfig::platform_default()
}

/// Run every provider into one census document.
///
/// The software inventory sections require a host package service and are
/// populated only by embedders that wire a `HostInventory` implementation;
/// the standalone binary collects the remaining sections.
fn collect_census(
    platform: &PlatformInfo,
    lister: Option<&PropertyListerConfig>,
) -> Result<ct_common::CensusDocument> {
    let mut census = CensusBuilder::new();

    device::collect(&mut census, platform)?;
    environment::collect(&mut census)?;
    match lister {
        Some(lister) => properties::collect(&mut census, lister)?,
        None => warn!("no property lister for this host, section omitted"),
    }
    sysctl::collect(&mut census)?;

    let metadata = ct_scan::platform_metadata();
    filesystem::collect(
        &mut census,
        &ScanPlan::default_linux(),
        &HarvestSpec::default_linux(),
        &metadata,
    )?;

    let document = census.build();
    info!(sections = document.len(), "census assembled");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_lister_wins_over_configured() {
        let configured = vec!["/opt/lister".to_string()];
        let lister = resolve_property_lister(Some("getprop --all"), Some(&configured)).unwrap();
        assert_eq!(lister.command, "getprop");
        assert_eq!(lister.args, vec!["--all"]);
    }

    #[test]
    fn test_configured_lister_used_without_cli() {
        let configured = vec!["/opt/lister".to_string(), "--all".to_string()];
        let lister = resolve_property_lister(None, Some(&configured)).unwrap();
        assert_eq!(lister.command, "/opt/lister");
    }

    #[cfg(not(target_os = "android"))]
    #[test]
    fn test_unconfigured_lister_omitted_not_fatal() {
        // A host without a property service resolves to no lister, so the
        // run omits the section instead of failing to spawn a command that
        // does not exist on this platform.
        assert!(resolve_property_lister(None, None).is_none());
    }
}
