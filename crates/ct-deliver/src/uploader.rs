//! Content-addressed artifact uploads.
//!
//! Each configured local path is hashed with SHA-256 and stored in the bulk
//! store under its digest, with a small JSON metadata object alongside under
//! `<digest>.json`. The digest doubles as the dedup key: if the store already
//! holds the raw object, only the metadata is refreshed. A failure on one
//! artifact never blocks the rest.

use crate::store::ObjectStore;
use ct_common::PlatformInfo;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read buffer for streaming digests.
const DIGEST_BUF_LEN: usize = 1024 * 1024;

/// Descriptive record stored next to each artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMetadata {
    /// Original path of the artifact on the host.
    pub name: String,
    pub os: String,
    pub os_version: String,
    pub arch: String,
    pub hostname: String,
    pub agent_version: String,
}

impl ArtifactMetadata {
    /// Metadata for one artifact on this host.
    pub fn for_path(path: &Path, platform: &PlatformInfo) -> Self {
        ArtifactMetadata {
            name: path.display().to_string(),
            os: platform.os.clone(),
            os_version: platform.os_version.clone(),
            arch: platform.arch.clone(),
            hostname: platform.hostname.clone(),
            agent_version: platform.agent_version.clone(),
        }
    }
}

/// Tally of one upload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    /// Artifacts whose raw bytes were sent to the store.
    pub uploaded: usize,
    /// Artifacts already present remotely; metadata refreshed only.
    pub deduplicated: usize,
    /// Artifacts that could not be processed.
    pub failed: usize,
}

/// SHA-256 of a file's contents as lowercase hex, streamed so large
/// artifacts never load into memory.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; DIGEST_BUF_LEN];
    loop {
        let read = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Upload every configured artifact, isolating per-artifact failures.
pub fn upload_all(
    paths: &[PathBuf],
    store: &dyn ObjectStore,
    platform: &PlatformInfo,
) -> UploadSummary {
    let mut summary = UploadSummary::default();
    for path in paths {
        match upload_one(path, store, platform) {
            Ok(true) => summary.uploaded += 1,
            Ok(false) => summary.deduplicated += 1,
            Err(reason) => {
                warn!(path = %path.display(), %reason, "artifact upload failed");
                summary.failed += 1;
            }
        }
    }
    info!(
        uploaded = summary.uploaded,
        deduplicated = summary.deduplicated,
        failed = summary.failed,
        "artifact upload pass finished"
    );
    summary
}

/// Upload one artifact. Returns whether the raw bytes were sent, or false
/// on a dedup hit. The metadata object is written either way so it always
/// reflects the most recent host that held the artifact.
fn upload_one(
    path: &Path,
    store: &dyn ObjectStore,
    platform: &PlatformInfo,
) -> std::result::Result<bool, String> {
    let digest = sha256_file(path).map_err(|err| format!("digest: {err}"))?;

    let existing = store
        .list_prefix(&digest)
        .map_err(|err| format!("listing: {err}"))?;
    let raw_present = existing.iter().any(|key| key == &digest);

    if raw_present {
        debug!(path = %path.display(), digest, "artifact already stored");
    } else {
        store
            .put_file(&digest, path, "application/octet-stream")
            .map_err(|err| format!("put raw: {err}"))?;
        debug!(path = %path.display(), digest, "artifact stored");
    }

    let metadata = ArtifactMetadata::for_path(path, platform);
    let body =
        serde_json::to_vec(&metadata).map_err(|err| format!("metadata serialize: {err}"))?;
    store
        .put_bytes(&format!("{digest}.json"), &body, "application/json")
        .map_err(|err| format!("put metadata: {err}"))?;

    Ok(!raw_present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use tempfile::TempDir;

    fn test_platform() -> PlatformInfo {
        PlatformInfo {
            os: "linux".to_string(),
            os_version: "6.1.0".to_string(),
            arch: "x86_64".to_string(),
            hostname: "census-host".to_string(),
            agent_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_sha256_file_known_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_upload_stores_raw_and_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("module.bin");
        std::fs::write(&path, b"artifact bytes").unwrap();
        let store = MemoryObjectStore::new();

        let summary = upload_all(&[path.clone()], &store, &test_platform());
        assert_eq!(summary, UploadSummary { uploaded: 1, deduplicated: 0, failed: 0 });

        let digest = sha256_file(&path).unwrap();
        assert_eq!(store.get(&digest).unwrap(), b"artifact bytes");

        let metadata: serde_json::Value =
            serde_json::from_slice(&store.get(&format!("{digest}.json")).unwrap()).unwrap();
        assert_eq!(metadata["name"], path.display().to_string());
        assert_eq!(metadata["hostname"], "census-host");
    }

    #[test]
    fn test_identical_content_uploads_once() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("copy-a");
        let second = dir.path().join("copy-b");
        std::fs::write(&first, b"same bytes").unwrap();
        std::fs::write(&second, b"same bytes").unwrap();
        let store = MemoryObjectStore::new();

        let summary = upload_all(&[first, second], &store, &test_platform());
        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.deduplicated, 1);
        assert_eq!(summary.failed, 0);
        // One raw object plus one metadata object.
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_dedup_hit_still_refreshes_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact");
        std::fs::write(&path, b"payload").unwrap();
        let digest = sha256_file(&path).unwrap();

        let store = MemoryObjectStore::new();
        store.put_bytes(&digest, b"payload", "application/octet-stream").unwrap();

        let summary = upload_all(&[path], &store, &test_platform());
        assert_eq!(summary.deduplicated, 1);
        assert!(store.get(&format!("{digest}.json")).is_some());
    }

    #[test]
    fn test_missing_artifact_counts_as_failed() {
        let store = MemoryObjectStore::new();
        let summary = upload_all(
            &[PathBuf::from("/no/such/artifact")],
            &store,
            &test_platform(),
        );
        assert_eq!(summary.failed, 1);
        assert!(store.is_empty());
    }
}
