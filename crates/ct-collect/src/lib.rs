//! Census providers.
//!
//! Each provider populates one or more provider-owned sections of the
//! census document through a shared [`CensusBuilder`](ct_common::CensusBuilder).
//! Section-name ownership is mutually exclusive across providers:
//!
//! | provider | sections |
//! |---|---|
//! | [`device`] | `device_name` |
//! | [`environment`] | `environment_variables` |
//! | [`properties`] | `system_properties` |
//! | [`sysctl`] | `sysctl` |
//! | [`filesystem`] | `file_permissions`, `small_files` |
//! | [`software`] | `system_shared_libraries`, `features`, `permissions`, `providers` |
//!
//! Only the property provider can fail the run (its external lister is
//! foundational); everything else degrades per item.

pub mod device;
pub mod environment;
pub mod filesystem;
pub mod properties;
pub mod software;
pub mod sysctl;

pub use properties::PropertyListerConfig;
pub use software::{
    ContentProviderInfo, FeatureInfo, HostInventory, InventoryError, PackageInfo,
    PermissionInfo, PermissionRecord, StaticInventory,
};
