//! Census delivery and bulk-artifact upload.
//!
//! Two independent paths leave the host:
//! - [`pipeline`]: the aggregated census document, serialized, zlib-compressed
//!   and POSTed to the collection endpoint with retry; on total failure the
//!   payload degrades to a base64-chunked fallback log channel so it is never
//!   silently lost. A plaintext audit copy is always written locally.
//! - [`uploader`]: configured local artifacts, content-addressed by SHA-256
//!   and deduplicated against the remote store by digest prefix.

pub mod compress;
pub mod pipeline;
pub mod store;
pub mod uploader;

pub use compress::{compress, decompress};
pub use pipeline::{
    audit_only, deliver, CollectingSink, DeliveryOptions, DeliveryOutcome, FallbackSink,
    TracingSink,
    FALLBACK_CHUNK_LEN, MAX_ATTEMPTS, RETRY_DELAY,
};
pub use store::{HttpObjectStore, MemoryObjectStore, ObjectStore, StoreError};
pub use uploader::{upload_all, ArtifactMetadata, UploadSummary};
