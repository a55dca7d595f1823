//! Software inventory provider.
//!
//! Installed-software metadata comes from a host collaborator behind the
//! [`HostInventory`] trait: shared library names, platform features,
//! permission definitions reachable through packages and permission groups,
//! and registered content-provider components. The census core only
//! aggregates; enumeration is the collaborator's problem.
//!
//! Failure handling is per item throughout: a failed group lookup or an
//! unavailable sub-query is logged and skipped, never fatal.

use ct_common::{CensusBuilder, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

/// Section names owned by this provider.
pub const LIBRARIES_SECTION: &str = "system_shared_libraries";
pub const FEATURES_SECTION: &str = "features";
pub const PERMISSIONS_SECTION: &str = "permissions";
pub const PROVIDERS_SECTION: &str = "providers";

/// Errors surfaced by host inventory implementations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

/// A platform feature; unnamed features exist and are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    /// Feature name, absent for anonymous version-only features.
    pub name: Option<String>,
}

/// One permission definition as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionInfo {
    /// Package that defines the permission.
    pub package: String,
    /// Permission name.
    pub name: String,
    /// Protection level bits.
    pub protection_level: u32,
    /// Permission flags.
    pub flags: u32,
}

/// An installed package and the permissions it defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Package name.
    pub name: String,
    /// Permissions defined by this package.
    pub permissions: Vec<PermissionInfo>,
}

/// A registered content-provider component.
///
/// Path- and URI-permission patterns arrive pre-rendered to strings; the
/// census does not interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentProviderInfo {
    /// Authority the provider answers for.
    pub authority: String,
    /// Whether the provider may run in multiple processes.
    pub multiprocess: bool,
    /// Whether URI permission grants are allowed.
    pub grant_uri_permissions: bool,
    /// Initialization order hint.
    pub init_order: i32,
    /// Permission required to read, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_permission: Option<String>,
    /// Permission required to write, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_permission: Option<String>,
    /// Provider flags.
    pub flags: u32,
    /// Rendered path-permission descriptions.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub path_permissions: Vec<String>,
    /// Rendered URI-permission pattern descriptions.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub uri_permission_patterns: Vec<String>,
}

/// Host collaborator API for installed-software metadata.
pub trait HostInventory {
    /// Names of shared system libraries.
    fn shared_libraries(&self) -> std::result::Result<Vec<String>, InventoryError>;

    /// Available platform features.
    fn features(&self) -> std::result::Result<Vec<FeatureInfo>, InventoryError>;

    /// Installed packages with their permission definitions.
    fn installed_packages(&self) -> std::result::Result<Vec<PackageInfo>, InventoryError>;

    /// All known permission group names.
    fn permission_groups(&self) -> std::result::Result<Vec<String>, InventoryError>;

    /// Permissions belonging to one group.
    fn permissions_in_group(
        &self,
        group: &str,
    ) -> std::result::Result<Vec<PermissionInfo>, InventoryError>;

    /// Registered content-provider components.
    fn content_providers(&self) -> std::result::Result<Vec<ContentProviderInfo>, InventoryError>;
}

/// Deduplicated, serialization-ready permission record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionRecord {
    /// Defining package.
    pub package: String,
    /// Permission name.
    pub name: String,
    /// Protection level bits.
    pub protection_level: u32,
    /// Permission flags.
    pub flags: u32,
}

impl From<&PermissionInfo> for PermissionRecord {
    fn from(info: &PermissionInfo) -> Self {
        PermissionRecord {
            package: info.package.clone(),
            name: info.name.clone(),
            protection_level: info.protection_level,
            flags: info.flags,
        }
    }
}

/// Aggregate the host inventory into the census.
pub fn collect(census: &mut CensusBuilder, inventory: &dyn HostInventory) -> Result<()> {
    census.insert_serialized(LIBRARIES_SECTION, &collect_libraries(inventory))?;
    census.insert_serialized(FEATURES_SECTION, &collect_features(inventory))?;
    census.insert_serialized(PERMISSIONS_SECTION, &collect_permissions(inventory))?;
    census.insert_serialized(PROVIDERS_SECTION, &collect_providers(inventory))?;
    Ok(())
}

fn collect_libraries(inventory: &dyn HostInventory) -> Vec<String> {
    match inventory.shared_libraries() {
        Ok(libraries) => libraries,
        Err(err) => {
            warn!(error = %err, "shared library enumeration failed");
            Vec::new()
        }
    }
}

fn collect_features(inventory: &dyn HostInventory) -> Vec<String> {
    match inventory.features() {
        Ok(features) => features.into_iter().filter_map(|f| f.name).collect(),
        Err(err) => {
            warn!(error = %err, "feature enumeration failed");
            Vec::new()
        }
    }
}

/// Union of per-package and per-group permissions, deduplicated by record.
fn collect_permissions(inventory: &dyn HostInventory) -> BTreeSet<PermissionRecord> {
    let mut records = BTreeSet::new();

    match inventory.installed_packages() {
        Ok(packages) => {
            for package in &packages {
                records.extend(package.permissions.iter().map(PermissionRecord::from));
            }
        }
        Err(err) => warn!(error = %err, "package enumeration failed"),
    }

    match inventory.permission_groups() {
        Ok(groups) => {
            for group in &groups {
                match inventory.permissions_in_group(group) {
                    Ok(permissions) => {
                        records.extend(permissions.iter().map(PermissionRecord::from));
                    }
                    Err(err) => {
                        warn!(group = %group, error = %err, "group lookup failed, skipping");
                    }
                }
            }
        }
        Err(err) => warn!(error = %err, "permission group enumeration failed"),
    }

    records
}

fn collect_providers(inventory: &dyn HostInventory) -> Vec<ContentProviderInfo> {
    match inventory.content_providers() {
        Ok(providers) => providers,
        Err(err) => {
            warn!(error = %err, "content provider enumeration failed");
            Vec::new()
        }
    }
}

/// Fixed inventory for tests and embedders without a live collaborator.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    /// Shared library names.
    pub libraries: Vec<String>,
    /// Features, possibly unnamed.
    pub features: Vec<FeatureInfo>,
    /// Installed packages.
    pub packages: Vec<PackageInfo>,
    /// Permission groups and their members.
    pub groups: Vec<(String, Vec<PermissionInfo>)>,
    /// Group names whose lookup should fail.
    pub failing_groups: BTreeSet<String>,
    /// Content providers.
    pub providers: Vec<ContentProviderInfo>,
}

impl HostInventory for StaticInventory {
    fn shared_libraries(&self) -> std::result::Result<Vec<String>, InventoryError> {
        Ok(self.libraries.clone())
    }

    fn features(&self) -> std::result::Result<Vec<FeatureInfo>, InventoryError> {
        Ok(self.features.clone())
    }

    fn installed_packages(&self) -> std::result::Result<Vec<PackageInfo>, InventoryError> {
        Ok(self.packages.clone())
    }

    fn permission_groups(&self) -> std::result::Result<Vec<String>, InventoryError> {
        Ok(self.groups.iter().map(|(name, _)| name.clone()).collect())
    }

    fn permissions_in_group(
        &self,
        group: &str,
    ) -> std::result::Result<Vec<PermissionInfo>, InventoryError> {
        if self.failing_groups.contains(group) {
            return Err(InventoryError::Lookup(format!("group not found: {group}")));
        }
        self.groups
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, permissions)| permissions.clone())
            .ok_or_else(|| InventoryError::Lookup(format!("group not found: {group}")))
    }

    fn content_providers(
        &self,
    ) -> std::result::Result<Vec<ContentProviderInfo>, InventoryError> {
        Ok(self.providers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(package: &str, name: &str) -> PermissionInfo {
        PermissionInfo {
            package: package.to_string(),
            name: name.to_string(),
            protection_level: 1,
            flags: 0,
        }
    }

    fn sample_inventory() -> StaticInventory {
        StaticInventory {
            libraries: vec!["libfoo.so".to_string(), "libbar.so".to_string()],
            features: vec![
                FeatureInfo {
                    name: Some("hw.camera".to_string()),
                },
                FeatureInfo { name: None },
                FeatureInfo {
                    name: Some("hw.nfc".to_string()),
                },
            ],
            packages: vec![PackageInfo {
                name: "com.example.app".to_string(),
                permissions: vec![permission("com.example.app", "NET")],
            }],
            groups: vec![
                (
                    "network".to_string(),
                    // Same permission reachable via both routes.
                    vec![permission("com.example.app", "NET"), permission("sys", "RAW")],
                ),
                ("storage".to_string(), vec![permission("sys", "WRITE")]),
            ],
            failing_groups: BTreeSet::new(),
            providers: vec![ContentProviderInfo {
                authority: "com.example.provider".to_string(),
                multiprocess: false,
                grant_uri_permissions: true,
                init_order: 0,
                read_permission: Some("READ".to_string()),
                write_permission: None,
                flags: 0,
                path_permissions: vec!["/data/*,READ,WRITE".to_string()],
                uri_permission_patterns: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_unnamed_features_skipped() {
        let features = collect_features(&sample_inventory());
        assert_eq!(features, vec!["hw.camera", "hw.nfc"]);
    }

    #[test]
    fn test_permissions_deduplicated_across_routes() {
        let records = collect_permissions(&sample_inventory());
        // NET appears via package and group but is recorded once.
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .any(|r| r.name == "NET" && r.package == "com.example.app"));
    }

    #[test]
    fn test_failed_group_lookup_skipped() {
        let mut inventory = sample_inventory();
        inventory.failing_groups.insert("network".to_string());

        let records = collect_permissions(&inventory);
        // network members lost except NET (still reachable via package).
        assert!(records.iter().any(|r| r.name == "NET"));
        assert!(!records.iter().any(|r| r.name == "RAW"));
        assert!(records.iter().any(|r| r.name == "WRITE"));
    }

    #[test]
    fn test_collect_populates_all_sections() {
        let mut census = CensusBuilder::new();
        collect(&mut census, &sample_inventory()).unwrap();
        let doc = census.build();

        assert!(doc.section(LIBRARIES_SECTION).is_some());
        assert!(doc.section(FEATURES_SECTION).is_some());
        assert!(doc.section(PERMISSIONS_SECTION).is_some());
        let providers = doc.section(PROVIDERS_SECTION).unwrap();
        assert_eq!(
            providers[0].get("authority").and_then(|v| v.as_str()),
            Some("com.example.provider")
        );
        // Absent optional fields are omitted from the serialized form.
        assert!(providers[0].get("write_permission").is_none());
    }
}
