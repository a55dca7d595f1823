//! Path metadata providers.
//!
//! The scanner depends on a narrow `stat a path` capability returning owner,
//! group, size, mode, symlink target, and security label. The Unix provider
//! answers from `lstat` plus the `security.selinux` extended attribute; the
//! portable provider reduces fidelity (no owner/group/label) so the scanner
//! still works on targets without POSIX metadata.

use std::io;
use std::path::{Path, PathBuf};

/// Metadata for a single filesystem node, as seen by `lstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Owning user id.
    pub owner_id: u32,
    /// Owning group id.
    pub group_id: u32,
    /// Reported size in bytes. Pseudo-filesystems legitimately report 0.
    pub size_bytes: u64,
    /// POSIX permission and file-type bits.
    pub mode: u32,
    /// Symlink target, present only for symbolic links.
    pub link_target: Option<PathBuf>,
    /// Mandatory-access-control label, when one exists.
    pub security_label: Option<String>,
}

/// File-type mask and type bits from POSIX `st_mode`.
const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;

impl FileMetadata {
    /// Whether this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    /// Whether this node is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.mode & S_IFMT == S_IFLNK
    }
}

/// Pluggable `stat a path` capability.
pub trait PathMetadata {
    /// Retrieve metadata for `path` without following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileMetadata>;
}

/// Full-fidelity provider for POSIX-like targets.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixMetadata;

#[cfg(unix)]
impl PathMetadata for UnixMetadata {
    fn stat(&self, path: &Path) -> io::Result<FileMetadata> {
        use std::os::unix::fs::MetadataExt;

        let meta = std::fs::symlink_metadata(path)?;
        let link_target = if meta.file_type().is_symlink() {
            // A link whose target cannot be read is still recorded.
            Some(
                std::fs::read_link(path).unwrap_or_else(|_| PathBuf::from("error")),
            )
        } else {
            None
        };

        Ok(FileMetadata {
            owner_id: meta.uid(),
            group_id: meta.gid(),
            size_bytes: meta.size(),
            mode: meta.mode(),
            link_target,
            security_label: security_label(path),
        })
    }
}

/// Read the SELinux context of `path`, without following symlinks.
#[cfg(target_os = "linux")]
fn security_label(path: &Path) -> Option<String> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut buf = [0u8; 256];
    let len = unsafe {
        libc::lgetxattr(
            c_path.as_ptr(),
            c"security.selinux".as_ptr(),
            buf.as_mut_ptr().cast(),
            buf.len(),
        )
    };
    if len <= 0 {
        return None;
    }
    let mut value = buf[..len as usize].to_vec();
    if value.last() == Some(&0) {
        value.pop();
    }
    String::from_utf8(value).ok()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn security_label(_path: &Path) -> Option<String> {
    None
}

/// Reduced-fidelity provider for non-POSIX targets.
///
/// Owner and group are reported as 0 and no security label is available;
/// mode carries only the file-type bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableMetadata;

impl PathMetadata for PortableMetadata {
    fn stat(&self, path: &Path) -> io::Result<FileMetadata> {
        let meta = std::fs::symlink_metadata(path)?;
        let file_type = meta.file_type();

        let mode = if file_type.is_dir() {
            S_IFDIR
        } else if file_type.is_symlink() {
            S_IFLNK
        } else {
            S_IFREG
        };

        let link_target = if file_type.is_symlink() {
            Some(std::fs::read_link(path).unwrap_or_else(|_| PathBuf::from("error")))
        } else {
            None
        };

        Ok(FileMetadata {
            owner_id: 0,
            group_id: 0,
            size_bytes: meta.len(),
            mode,
            link_target,
            security_label: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_type_helpers() {
        let dir = FileMetadata {
            owner_id: 0,
            group_id: 0,
            size_bytes: 0,
            mode: S_IFDIR | 0o755,
            link_target: None,
            security_label: None,
        };
        assert!(dir.is_dir());
        assert!(!dir.is_symlink());

        let link = FileMetadata {
            mode: S_IFLNK | 0o777,
            ..dir.clone()
        };
        assert!(link.is_symlink());
        assert!(!link.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_stat_regular_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");
        std::fs::write(&path, b"hello").unwrap();

        let meta = UnixMetadata.stat(&path).unwrap();
        assert_eq!(meta.size_bytes, 5);
        assert!(!meta.is_dir());
        assert!(!meta.is_symlink());
        assert!(meta.link_target.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_stat_symlink_not_followed() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        let link = dir.path().join("link");
        std::fs::write(&target, b"data").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let meta = UnixMetadata.stat(&link).unwrap();
        assert!(meta.is_symlink());
        assert_eq!(meta.link_target, Some(target));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_stat_missing_path() {
        let dir = TempDir::new().unwrap();
        let err = UnixMetadata.stat(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_portable_stat_directory() {
        let dir = TempDir::new().unwrap();
        let meta = PortableMetadata.stat(dir.path()).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.owner_id, 0);
        assert!(meta.security_label.is_none());
    }
}
