//! Kernel tunable provider.
//!
//! Recursively enumerates a readable tunables tree (normally `/proc/sys`)
//! and reads every regular-file leaf into `path.with.dots → value`.
//! Per-file read errors are logged and skipped; an unreadable tree yields
//! an empty section rather than a failure.

use ct_common::{CensusBuilder, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Section name owned by this provider.
pub const SECTION: &str = "sysctl";

/// Default tunables root.
pub const DEFAULT_ROOT: &str = "/proc/sys";

/// Collect tunables from the default root.
pub fn collect(census: &mut CensusBuilder) -> Result<()> {
    collect_from(census, Path::new(DEFAULT_ROOT))
}

/// Collect tunables from an explicit root.
pub fn collect_from(census: &mut CensusBuilder, root: &Path) -> Result<()> {
    census.insert_serialized(SECTION, &read_tunables(root))?;
    Ok(())
}

/// Walk the tree and read every leaf value, stripping one trailing newline.
pub fn read_tunables(root: &Path) -> BTreeMap<String, String> {
    let mut tunables = BTreeMap::new();

    for dirent in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !dirent.file_type().is_file() {
            continue;
        }
        let relative = match dirent.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let key = relative.to_string_lossy().replace('/', ".");

        match std::fs::read_to_string(dirent.path()) {
            Ok(contents) => {
                let value = contents.strip_suffix('\n').unwrap_or(&contents);
                tunables.insert(key, value.to_string());
            }
            Err(err) => {
                debug!(path = %dirent.path().display(), error = %err, "failed to read tunable");
            }
        }
    }

    tunables
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fake_sys() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("kernel/random")).unwrap();
        fs::create_dir_all(dir.path().join("net/ipv4")).unwrap();
        fs::write(dir.path().join("kernel/ostype"), "Linux\n").unwrap();
        fs::write(dir.path().join("kernel/random/boot_id"), "abcd-1234\n").unwrap();
        fs::write(dir.path().join("net/ipv4/ip_forward"), "0\n").unwrap();
        dir
    }

    #[test]
    fn test_keys_are_dotted() {
        let dir = fake_sys();
        let tunables = read_tunables(dir.path());

        assert_eq!(
            tunables.get("kernel.ostype").map(String::as_str),
            Some("Linux")
        );
        assert_eq!(
            tunables.get("kernel.random.boot_id").map(String::as_str),
            Some("abcd-1234")
        );
        assert_eq!(
            tunables.get("net.ipv4.ip_forward").map(String::as_str),
            Some("0")
        );
    }

    #[test]
    fn test_only_final_newline_stripped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("multiline"), "a\nb\n").unwrap();

        let tunables = read_tunables(dir.path());
        assert_eq!(tunables.get("multiline").map(String::as_str), Some("a\nb"));
    }

    #[test]
    fn test_missing_root_yields_empty_map() {
        let dir = TempDir::new().unwrap();
        let tunables = read_tunables(&dir.path().join("nope"));
        assert!(tunables.is_empty());
    }

    #[test]
    fn test_collect_from_populates_section() {
        let dir = fake_sys();
        let mut census = CensusBuilder::new();
        collect_from(&mut census, dir.path()).unwrap();
        let doc = census.build();

        let section = doc.section(SECTION).unwrap();
        assert_eq!(
            section.get("kernel.ostype").and_then(|v| v.as_str()),
            Some("Linux")
        );
    }
}
