//! Census Taker configuration loading.
//!
//! All secrets and store wiring reach the core as opaque strings supplied by
//! the deployment: a directory of small single-value asset files, one value
//! per file. This crate resolves the asset directory (CLI → environment →
//! XDG config → system config), reads the assets, and produces a validated
//! [`AgentConfig`].

pub mod agent;
pub mod resolve;

pub use agent::{AgentConfig, BulkStoreConfig, EndpointConfig};
pub use resolve::{resolve_assets_dir, ConfigSource};

/// Asset file names inside the assets directory.
pub mod asset_names {
    /// Shared secret sent in the Authorization header of the census POST.
    pub const SERVER_PASSWORD: &str = "server_password";
    /// Census endpoint host, optionally prefixed with `http://` or `https://`.
    pub const SERVER_HOSTNAME: &str = "server_hostname";
    /// Bulk store access credential.
    pub const STORE_ACCESS_KEY: &str = "store_access_key";
    /// Bulk store secret credential.
    pub const STORE_SECRET_KEY: &str = "store_secret_key";
    /// Bulk store bucket name.
    pub const STORE_BUCKET_NAME: &str = "store_bucket_name";
    /// Bulk store gateway endpoint URL.
    pub const STORE_ENDPOINT: &str = "store_endpoint";
    /// Newline-separated list of local paths to upload.
    pub const UPLOAD_PATH_LIST: &str = "upload_path_list";
    /// Whitespace-separated property-lister command line, for hosts whose
    /// property service is not the platform default.
    pub const PROPERTY_LISTER: &str = "property_lister";
}
