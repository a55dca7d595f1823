//! Census Taker filesystem collection.
//!
//! This crate provides the filesystem half of the census:
//! - Depth-bounded recursive scanning of directory trees, producing one
//!   metadata record per visited node
//! - A pluggable path-metadata provider so POSIX owner/group/mode and
//!   security labels come from one seam
//! - Curated small-file harvesting: a static path list, glob rules, and a
//!   per-process rule, each file read in full and base64-encoded
//!
//! Scanning is cost-bounded by design: broad-but-shallow at high-cardinality
//! roots, narrow-but-deep at high-value subtrees.

pub mod harvest;
pub mod metadata;
pub mod walker;

pub use harvest::{GlobRule, HarvestSpec, ProcHarvestRule, SmallFileRecord};
pub use metadata::{FileMetadata, PathMetadata, PortableMetadata};
pub use walker::{scan, FileEntry, ScanPlan, ScanRoot, DEPTH_UNBOUNDED};

#[cfg(unix)]
pub use metadata::UnixMetadata;

/// Default metadata provider for this platform.
#[cfg(unix)]
pub fn platform_metadata() -> UnixMetadata {
    UnixMetadata
}

/// Default metadata provider for this platform.
#[cfg(not(unix))]
pub fn platform_metadata() -> PortableMetadata {
    PortableMetadata
}
