//! Curated small-file harvesting.
//!
//! A harvest spec names the files worth carrying in full inside the census:
//! a static path list, glob rules (with optional exclusion of a sub-pattern),
//! and a dynamic per-process rule for the numeric subdirectories of a
//! process-information root. Every resolved path is read best-effort to end
//! of stream and base64-encoded; unreadable paths are omitted, not errors.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use globset::{Glob, GlobMatcher};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Mapping from harvested path to base64-encoded file content.
pub type SmallFileRecord = BTreeMap<String, String>;

/// Read chunk size. Small because most harvested files are tiny.
const READ_CHUNK: usize = 1024;

/// A glob rule rooted at a directory.
#[derive(Debug, Clone)]
pub struct GlobRule {
    /// Directory the pattern is evaluated under.
    pub root: PathBuf,
    /// Glob pattern relative to `root`; `**` recurses.
    pub pattern: String,
    /// Sub-pattern to exclude from the matches.
    pub exclude: Option<String>,
}

impl GlobRule {
    /// Rule without an exclusion.
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        GlobRule {
            root: root.into(),
            pattern: pattern.into(),
            exclude: None,
        }
    }

    /// Rule excluding a sub-pattern.
    pub fn with_exclude(
        root: impl Into<PathBuf>,
        pattern: impl Into<String>,
        exclude: impl Into<String>,
    ) -> Self {
        GlobRule {
            root: root.into(),
            pattern: pattern.into(),
            exclude: Some(exclude.into()),
        }
    }

    /// Expand the rule into matching file paths.
    fn expand(&self, out: &mut BTreeSet<PathBuf>) {
        let matcher = match compile(&self.pattern) {
            Some(matcher) => matcher,
            None => {
                debug!(pattern = %self.pattern, "invalid glob pattern, skipping rule");
                return;
            }
        };
        let excluder = self.exclude.as_deref().and_then(compile);

        // A pattern without `**` can only match a fixed number of levels
        // below the root, so the walk is bounded accordingly.
        let walker = if self.pattern.contains("**") {
            WalkDir::new(&self.root).follow_links(false)
        } else {
            let levels = self.pattern.split('/').count();
            WalkDir::new(&self.root).follow_links(false).max_depth(levels)
        };

        for dirent in walker.into_iter().filter_map(|e| e.ok()) {
            if !dirent.file_type().is_file() {
                continue;
            }
            let relative = match dirent.path().strip_prefix(&self.root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            if !matcher.is_match(relative) {
                continue;
            }
            if let Some(excluder) = &excluder {
                if excluder.is_match(relative) {
                    continue;
                }
            }
            out.insert(dirent.path().to_path_buf());
        }
    }
}

fn compile(pattern: &str) -> Option<GlobMatcher> {
    Glob::new(pattern).ok().map(|g| g.compile_matcher())
}

/// Per-process harvesting rule.
///
/// For every numeric subdirectory of `proc_root`, each of `file_names` is
/// included. The process list has to be enumerated manually because procfs
/// reports misleading sizes and vanishing entries.
#[derive(Debug, Clone)]
pub struct ProcHarvestRule {
    /// Process-information root, normally `/proc`.
    pub proc_root: PathBuf,
    /// File names collected per process, relative to the pid directory.
    pub file_names: Vec<String>,
}

impl ProcHarvestRule {
    fn expand(&self, out: &mut BTreeSet<PathBuf>) {
        let reader = match std::fs::read_dir(&self.proc_root) {
            Ok(reader) => reader,
            Err(err) => {
                debug!(root = %self.proc_root.display(), error = %err, "cannot enumerate processes");
                return;
            }
        };

        for dirent in reader.filter_map(|e| e.ok()) {
            let name = dirent.file_name();
            let is_pid = name
                .to_str()
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
            if !is_pid {
                continue;
            }
            for file_name in &self.file_names {
                out.insert(dirent.path().join(file_name));
            }
        }
    }
}

/// The full harvesting specification.
#[derive(Debug, Clone, Default)]
pub struct HarvestSpec {
    /// Static absolute paths.
    pub paths: Vec<PathBuf>,
    /// Glob rules.
    pub globs: Vec<GlobRule>,
    /// Optional per-process rule.
    pub proc_rule: Option<ProcHarvestRule>,
}

impl HarvestSpec {
    /// The curated default for a Linux host.
    pub fn default_linux() -> Self {
        let paths = [
            "/proc/cmdline",
            "/proc/config.gz",
            "/proc/consoles",
            "/proc/cpuinfo",
            "/proc/devices",
            "/proc/filesystems",
            "/proc/iomem",
            "/proc/meminfo",
            "/proc/misc",
            "/proc/modules",
            "/proc/mounts",
            "/proc/pagetypeinfo",
            "/proc/slabinfo",
            "/proc/version",
            "/proc/vmallocinfo",
            "/proc/vmstat",
            "/proc/zoneinfo",
            "/proc/bus/input/devices",
            "/proc/net/unix",
            "/proc/self/environ",
            "/proc/self/maps",
            "/proc/tty/drivers",
            "/etc/os-release",
            "/etc/fstab",
            "/etc/sysctl.conf",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect();

        HarvestSpec {
            paths,
            globs: vec![
                GlobRule::new("/etc", "sysctl.d/*.conf"),
                GlobRule::new("/etc", "modprobe.d/*.conf"),
                GlobRule::with_exclude("/sys/fs/selinux", "**", "class/**"),
                GlobRule::new("/sys/module", "**/version"),
            ],
            proc_rule: Some(ProcHarvestRule {
                proc_root: PathBuf::from("/proc"),
                file_names: vec![
                    "cmdline".to_string(),
                    "status".to_string(),
                    "attr/current".to_string(),
                    "attr/fscreate".to_string(),
                ],
            }),
        }
    }

    /// Expand static paths, glob rules, and the process rule into one
    /// deduplicated path set.
    pub fn expand(&self) -> BTreeSet<PathBuf> {
        let mut out: BTreeSet<PathBuf> = self.paths.iter().cloned().collect();
        for rule in &self.globs {
            rule.expand(&mut out);
        }
        if let Some(rule) = &self.proc_rule {
            rule.expand(&mut out);
        }
        out
    }

    /// Read every resolved path and return base64-encoded contents.
    ///
    /// Partial success by design: a path that cannot be read is simply
    /// absent from the record.
    pub fn harvest(&self) -> SmallFileRecord {
        let mut record = SmallFileRecord::new();
        for path in self.expand() {
            match read_all(&path) {
                Ok(bytes) => {
                    record.insert(path.to_string_lossy().into_owned(), BASE64.encode(bytes));
                }
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "unreadable, omitted");
                }
            }
        }
        record
    }
}

/// Read a file to end of stream.
///
/// Reported sizes cannot be trusted: procfs stats everything as zero bytes,
/// so the read loops until no data is returned rather than preallocating
/// from `st_size`.
pub fn read_all(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut contents = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(len) => contents.extend_from_slice(&chunk[..len]),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(contents)
}
