//! Agent configuration assembled from asset files.

use crate::asset_names;
use ct_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary delivery endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Endpoint host. May carry an explicit `http://` or `https://` prefix;
    /// bare hosts are delivered over plain HTTP for legacy-client
    /// compatibility.
    pub host: String,
    /// Shared secret for the Authorization header, newlines stripped.
    pub shared_secret: String,
}

/// Bulk object store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkStoreConfig {
    /// Gateway endpoint URL.
    pub endpoint: String,
    /// Access credential, passed through opaquely.
    pub access_key: String,
    /// Secret credential, passed through opaquely.
    pub secret_key: String,
    /// Bucket name.
    pub bucket: String,
    /// Local paths slated for upload.
    pub upload_paths: Vec<PathBuf>,
}

/// Full agent configuration for one run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Primary census delivery endpoint.
    pub endpoint: EndpointConfig,
    /// Bulk store, absent when the deployment ships no store assets.
    pub bulk_store: Option<BulkStoreConfig>,
    /// Property-lister command line tokens, when the deployment names one.
    pub property_lister: Option<Vec<String>>,
    /// Directory for the plaintext audit copy; system temp dir when unset.
    pub audit_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Load configuration from an assets directory.
    ///
    /// The endpoint host and shared secret are required. Store assets are
    /// all-or-nothing: when any of them is missing the bulk-upload stage is
    /// disabled with a warning rather than failing the run.
    pub fn load(assets_dir: &Path) -> Result<Self> {
        let host = read_required(assets_dir, asset_names::SERVER_HOSTNAME)?;
        let shared_secret = read_required(assets_dir, asset_names::SERVER_PASSWORD)?;

        let endpoint = EndpointConfig {
            host,
            shared_secret,
        };

        let bulk_store = load_bulk_store(assets_dir);
        if bulk_store.is_none() {
            warn!("bulk store assets incomplete or absent, artifact upload disabled");
        }

        let property_lister = read_optional(assets_dir, asset_names::PROPERTY_LISTER)
            .map(|raw| raw.split_whitespace().map(str::to_string).collect());

        let config = AgentConfig {
            endpoint,
            bulk_store,
            property_lister,
            audit_dir: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the audit directory.
    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_dir = Some(dir.into());
        self
    }

    /// Override the endpoint host (CLI `--host`).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host = host.into();
        self
    }

    /// Semantic validation of loaded values.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.host.is_empty() {
            return Err(Error::Config("endpoint host is empty".to_string()));
        }
        if self.endpoint.shared_secret.is_empty() {
            return Err(Error::Config("shared secret is empty".to_string()));
        }
        if let Some(tokens) = &self.property_lister {
            if tokens.is_empty() {
                return Err(Error::Config(
                    "property lister asset names no command".to_string(),
                ));
            }
        }
        if let Some(store) = &self.bulk_store {
            if store.bucket.is_empty() {
                return Err(Error::Config("store bucket name is empty".to_string()));
            }
            for path in &store.upload_paths {
                if !path.is_absolute() {
                    return Err(Error::Config(format!(
                        "upload path is not absolute: {}",
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn load_bulk_store(assets_dir: &Path) -> Option<BulkStoreConfig> {
    let endpoint = read_optional(assets_dir, asset_names::STORE_ENDPOINT)?;
    let access_key = read_optional(assets_dir, asset_names::STORE_ACCESS_KEY)?;
    let secret_key = read_optional(assets_dir, asset_names::STORE_SECRET_KEY)?;
    let bucket = read_optional(assets_dir, asset_names::STORE_BUCKET_NAME)?;
    let path_list = read_optional(assets_dir, asset_names::UPLOAD_PATH_LIST)?;

    let upload_paths: Vec<PathBuf> = path_list
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect();

    Some(BulkStoreConfig {
        endpoint,
        access_key,
        secret_key,
        bucket,
        upload_paths,
    })
}

/// Read an asset file, stripping newlines from single-value assets.
fn read_asset(assets_dir: &Path, name: &str) -> std::io::Result<String> {
    let path = assets_dir.join(name);
    let raw = std::fs::read_to_string(&path)?;
    debug!(asset = name, "loaded asset");
    // Multi-value assets keep their internal newlines; single-value assets
    // carry a trailing newline from how they are provisioned.
    if name == asset_names::UPLOAD_PATH_LIST || name == asset_names::PROPERTY_LISTER {
        Ok(raw)
    } else {
        Ok(raw.replace('\n', ""))
    }
}

fn read_required(assets_dir: &Path, name: &str) -> Result<String> {
    read_asset(assets_dir, name).map_err(|_| Error::MissingAsset {
        name: name.to_string(),
    })
}

fn read_optional(assets_dir: &Path, name: &str) -> Option<String> {
    read_asset(assets_dir, name).ok()
}
