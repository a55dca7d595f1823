//! Bulk object store interface.
//!
//! The uploader only needs two operations from the remote store: a prefix
//! listing for dedup checks and a keyed put. [`HttpObjectStore`] speaks to a
//! bucket-scoped HTTP gateway; [`MemoryObjectStore`] backs tests and
//! embedders. Credentials are opaque strings supplied by configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Errors from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("bad listing response: {0}")]
    Listing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-based put/list over a bucket.
pub trait ObjectStore {
    /// List keys starting with `prefix`.
    fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Store a small in-memory object.
    fn put_bytes(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StoreError>;

    /// Store a local file, streamed rather than loaded into memory.
    fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<(), StoreError>;
}

/// Client for a bucket-scoped HTTP object gateway.
///
/// Listing: `GET <endpoint>/<bucket>?prefix=<p>` returning a JSON array of
/// keys. Put: `PUT <endpoint>/<bucket>/<key>`. The credential pair travels
/// opaquely in the Authorization header.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    endpoint: String,
    bucket: String,
    authorization: String,
}

impl HttpObjectStore {
    /// Create a client for one bucket.
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: &str,
        secret_key: &str,
    ) -> Self {
        let endpoint = endpoint.into();
        HttpObjectStore {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            authorization: format!("{access_key}:{secret_key}"),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

impl ObjectStore for HttpObjectStore {
    fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let url = format!("{}/{}?prefix={}", self.endpoint, self.bucket, prefix);
        let response = ureq::get(&url)
            .set("Authorization", &self.authorization)
            .call()
            .map_err(map_ureq)?;

        response
            .into_json::<Vec<String>>()
            .map_err(|err| StoreError::Listing(err.to_string()))
    }

    fn put_bytes(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StoreError> {
        debug!(key, bytes = body.len(), "put object");
        ureq::put(&self.object_url(key))
            .set("Authorization", &self.authorization)
            .set("Content-Type", content_type)
            .send_bytes(body)
            .map_err(map_ureq)?;
        Ok(())
    }

    fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<(), StoreError> {
        debug!(key, path = %path.display(), "put file");
        let file = std::fs::File::open(path)?;
        ureq::put(&self.object_url(key))
            .set("Authorization", &self.authorization)
            .set("Content-Type", content_type)
            .send(file)
            .map_err(map_ureq)?;
        Ok(())
    }
}

fn map_ureq(err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(code, _) => StoreError::Status(code),
        ureq::Error::Transport(transport) => StoreError::Transport(transport.to_string()),
    }
}

/// In-memory store for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Fetch one object's bytes.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| StoreError::Transport("store poisoned".to_string()))?;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn put_bytes(&self, key: &str, body: &[u8], _content_type: &str) -> Result<(), StoreError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StoreError::Transport("store poisoned".to_string()))?;
        objects.insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<(), StoreError> {
        let body = std::fs::read(path)?;
        self.put_bytes(key, &body, content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_put_and_list() {
        let store = MemoryObjectStore::new();
        store.put_bytes("abc123", b"raw", "application/octet-stream").unwrap();
        store.put_bytes("abc123.json", b"{}", "application/json").unwrap();
        store.put_bytes("zzz", b"other", "application/octet-stream").unwrap();

        let listed = store.list_prefix("abc123").unwrap();
        assert_eq!(listed, vec!["abc123", "abc123.json"]);
        assert_eq!(store.get("abc123").unwrap(), b"raw");
    }

    #[test]
    fn test_memory_store_empty_prefix_lists_all() {
        let store = MemoryObjectStore::new();
        store.put_bytes("a", b"1", "t").unwrap();
        store.put_bytes("b", b"2", "t").unwrap();
        assert_eq!(store.list_prefix("").unwrap().len(), 2);
    }

    #[test]
    fn test_http_store_url_shapes() {
        let store = HttpObjectStore::new("http://store.example.net/", "bucket", "AK", "SK");
        assert_eq!(
            store.object_url("deadbeef.json"),
            "http://store.example.net/bucket/deadbeef.json"
        );
    }
}
