//! Filesystem census provider.
//!
//! Glue over `ct-scan`: runs the scan plan into `file_permissions` and the
//! harvest spec into `small_files`.

use ct_common::{CensusBuilder, Result};
use ct_scan::{HarvestSpec, PathMetadata, ScanPlan};
use tracing::info;

/// Section name for scan results.
pub const PERMISSIONS_SECTION: &str = "file_permissions";

/// Section name for harvested file contents.
pub const SMALL_FILES_SECTION: &str = "small_files";

/// Run both filesystem collections into the census.
pub fn collect(
    census: &mut CensusBuilder,
    plan: &ScanPlan,
    harvest: &HarvestSpec,
    provider: &dyn PathMetadata,
) -> Result<()> {
    let entries = plan.scan_all(provider);
    info!(entries = entries.len(), "filesystem scan complete");
    census.insert_serialized(PERMISSIONS_SECTION, &entries)?;

    let record = harvest.harvest();
    info!(files = record.len(), "small-file harvest complete");
    census.insert_serialized(SMALL_FILES_SECTION, &record)?;

    Ok(())
}
