//! Depth-bounded recursive directory scanning.
//!
//! The scanner reports one [`FileEntry`] per visited node. It is tolerant by
//! construction: entries that vanish mid-scan are skipped, directories that
//! refuse descent still contribute their own entry, and symbolic links are
//! recorded with their target but never followed, so cycles cannot occur.

use crate::metadata::PathMetadata;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sentinel depth meaning "effectively unbounded".
pub const DEPTH_UNBOUNDED: u32 = 1000;

/// Metadata record for one filesystem node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path of the node.
    pub path: String,
    /// Symlink target, present only for symbolic links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
    /// Owning user id.
    pub owner_id: u32,
    /// Owning group id.
    pub group_id: u32,
    /// Reported size; 0 is legitimate for pseudo-filesystem entries.
    pub size_bytes: u64,
    /// POSIX permission and file-type bits.
    pub mode: u32,
    /// Mandatory-access-control label, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_label: Option<String>,
}

/// One root to scan, with its own depth budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRoot {
    /// Directory to scan.
    pub root: PathBuf,
    /// Levels to descend; 1 means immediate children only.
    pub max_depth: u32,
}

impl ScanRoot {
    /// Convenience constructor.
    pub fn new(root: impl Into<PathBuf>, max_depth: u32) -> Self {
        ScanRoot {
            root: root.into(),
            max_depth,
        }
    }
}

/// An ordered set of scan roots with independent depth budgets.
///
/// Roots are scanned independently and their results concatenated; no
/// de-duplication is attempted across roots. The default plan scans broad
/// but shallow at `/` and narrow but deep at configuration-heavy subtrees,
/// cherry-picking a few subtrees of the high-cardinality pseudo-filesystems.
#[derive(Debug, Clone, Default)]
pub struct ScanPlan {
    /// Roots in scan order.
    pub roots: Vec<ScanRoot>,
}

impl ScanPlan {
    /// The default asymmetric-depth plan for a Linux host.
    pub fn default_linux() -> Self {
        ScanPlan {
            roots: vec![
                ScanRoot::new("/", 1),
                ScanRoot::new("/boot", DEPTH_UNBOUNDED),
                ScanRoot::new("/dev", DEPTH_UNBOUNDED),
                ScanRoot::new("/etc", DEPTH_UNBOUNDED),
                ScanRoot::new("/sbin", DEPTH_UNBOUNDED),
                ScanRoot::new("/usr/lib/udev", DEPTH_UNBOUNDED),
                // /proc and /sys are really big, so cherry-pick the subtrees
                // that tend to matter.
                ScanRoot::new("/proc", 1),
                ScanRoot::new("/proc/bus", DEPTH_UNBOUNDED),
                ScanRoot::new("/proc/tty", DEPTH_UNBOUNDED),
                ScanRoot::new("/sys", 2),
                ScanRoot::new("/sys/fs/selinux", DEPTH_UNBOUNDED),
            ],
        }
    }

    /// Scan every root and concatenate the results.
    pub fn scan_all(&self, provider: &dyn PathMetadata) -> Vec<FileEntry> {
        let mut entries = Vec::new();
        for root in &self.roots {
            let before = entries.len();
            scan_into(&root.root, root.max_depth, provider, &mut entries);
            debug!(
                root = %root.root.display(),
                max_depth = root.max_depth,
                entries = entries.len() - before,
                "scanned root"
            );
        }
        entries
    }
}

/// Scan one root, descending at most `max_depth` levels below it.
///
/// Depth 1 reports the root's immediate children only. The root itself is
/// not reported, matching the per-child enumeration contract.
pub fn scan(root: &Path, max_depth: u32, provider: &dyn PathMetadata) -> Vec<FileEntry> {
    let mut entries = Vec::new();
    scan_into(root, max_depth, provider, &mut entries);
    entries
}

fn scan_into(
    dir: &Path,
    depth: u32,
    provider: &dyn PathMetadata,
    entries: &mut Vec<FileEntry>,
) {
    if depth == 0 {
        return;
    }

    let reader = match std::fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(err) => {
            // Permission-denied on descent is not a scan failure; the
            // directory's own entry was reported by its parent.
            debug!(dir = %dir.display(), error = %err, "cannot read directory");
            return;
        }
    };

    for dirent in reader {
        let dirent = match dirent {
            Ok(dirent) => dirent,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "bad directory entry");
                continue;
            }
        };
        let path = dirent.path();

        // Entries may disappear between readdir and lstat on a live
        // filesystem; skip without aborting the traversal.
        let meta = match provider.stat(&path) {
            Ok(meta) => meta,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "stat failed, skipping");
                continue;
            }
        };

        let is_dir = meta.is_dir();
        entries.push(FileEntry {
            path: path.to_string_lossy().into_owned(),
            link_target: meta
                .link_target
                .map(|t| t.to_string_lossy().into_owned()),
            owner_id: meta.owner_id,
            group_id: meta.group_id,
            size_bytes: meta.size_bytes,
            mode: meta.mode,
            security_label: meta.security_label,
        });

        // Symlinks are never followed, even when they point at directories.
        if is_dir && depth > 1 {
            scan_into(&path, depth - 1, provider, entries);
        }
    }
}
