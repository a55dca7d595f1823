//! The census delivery pipeline.
//!
//! Serialize → compress → POST with retry → fall back to a durable log
//! channel on exhaustion. An uncompressed audit copy is written locally
//! regardless of delivery outcome, so an operator can always recover the
//! snapshot: either from the endpoint, or by concatenating the fallback
//! chunks, base64-decoding, and inflating.

use crate::compress::compress;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use ct_common::{CensusDocument, Result, RunId};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Total tries: one initial attempt plus four retries.
pub const MAX_ATTEMPTS: u32 = 5;

/// Fixed delay between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Maximum fallback chunk length. Sized so line-oriented sinks do not
/// truncate chunks.
pub const FALLBACK_CHUNK_LEN: usize = 950;

/// Endpoint path the census is POSTed to.
const RESULTS_PATH: &str = "/results/new";

/// Destination sink for the base64 fallback payload.
pub trait FallbackSink {
    /// Receive one chunk, at most [`FALLBACK_CHUNK_LEN`] characters.
    fn emit_chunk(&mut self, chunk: &str);
}

/// Production sink: one error-level log line per chunk under a dedicated
/// target, recoverable from the persistent log stream.
#[derive(Debug, Default)]
pub struct TracingSink;

impl FallbackSink for TracingSink {
    fn emit_chunk(&mut self, chunk: &str) {
        error!(target: "census_fallback", "{chunk}");
    }
}

/// Collecting sink for tests and embedders that persist chunks themselves.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Chunks in emission order.
    pub chunks: Vec<String>,
}

impl FallbackSink for CollectingSink {
    fn emit_chunk(&mut self, chunk: &str) {
        self.chunks.push(chunk.to_string());
    }
}

/// Delivery configuration for one run.
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    /// Endpoint host, optionally prefixed with `http://` or `https://`.
    pub host: String,
    /// Shared secret for the Authorization header.
    pub shared_secret: String,
    /// Directory for the audit copy; system temp dir when unset.
    pub audit_dir: Option<PathBuf>,
    /// Run identity, used in the audit file name.
    pub run_id: RunId,
    /// Total attempts; [`MAX_ATTEMPTS`] in production.
    pub max_attempts: u32,
    /// Delay between attempts; [`RETRY_DELAY`] in production, zero in tests.
    pub retry_delay: Duration,
}

impl DeliveryOptions {
    /// Production options for an endpoint.
    pub fn new(host: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        DeliveryOptions {
            host: host.into(),
            shared_secret: shared_secret.into(),
            audit_dir: None,
            run_id: RunId::new(),
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }
}

/// Outcome of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Whether the endpoint acknowledged the payload with HTTP 200.
    pub delivered: bool,
    /// Attempts actually performed.
    pub attempts: u32,
    /// Location of the audit copy, when it could be written.
    pub audit_path: Option<PathBuf>,
}

/// Deliver the census document.
///
/// Serialization and compression failures are fatal. Delivery exhaustion is
/// not: the compressed payload is emitted to the fallback sink and the
/// outcome reports `delivered: false`.
pub fn deliver(
    document: &CensusDocument,
    options: &DeliveryOptions,
    sink: &mut dyn FallbackSink,
) -> Result<DeliveryOutcome> {
    let json = document.to_json_bytes()?;
    let compressed = compress(&json)?;
    info!(
        raw_bytes = json.len(),
        compressed_bytes = compressed.len(),
        "census payload prepared"
    );

    let url = endpoint_url(&options.host);
    let secret = options.shared_secret.trim_end_matches('\n');

    let mut delivered = false;
    let mut attempts = 0;
    while attempts < options.max_attempts {
        attempts += 1;
        match post_census(&url, secret, &compressed) {
            Ok(()) => {
                info!(attempt = attempts, "census delivered");
                delivered = true;
                break;
            }
            Err(reason) => {
                warn!(attempt = attempts, url = %url, %reason, "delivery attempt failed");
            }
        }
        if attempts < options.max_attempts {
            std::thread::sleep(options.retry_delay);
        }
    }

    if !delivered {
        // The payload must survive with zero connectivity; dump it to the
        // fallback channel in reassemblable chunks.
        let encoded = BASE64.encode(&compressed);
        let chunks = chunk_payload(&encoded, FALLBACK_CHUNK_LEN);
        warn!(chunks = chunks.len(), "delivery exhausted, emitting fallback payload");
        for chunk in chunks {
            sink.emit_chunk(chunk);
        }
    }

    let audit_path = write_audit(&json, options);

    Ok(DeliveryOutcome {
        delivered,
        attempts,
        audit_path,
    })
}

/// Write only the audit copy, never contacting the endpoint. Used for
/// dry runs.
pub fn audit_only(document: &CensusDocument, options: &DeliveryOptions) -> Result<DeliveryOutcome> {
    let json = document.to_json_bytes()?;
    let audit_path = write_audit(&json, options);
    Ok(DeliveryOutcome {
        delivered: false,
        attempts: 0,
        audit_path,
    })
}

/// Build the results URL. Bare hosts go over plain HTTP: the reference
/// endpoint stays reachable by legacy clients without TLS capability, and
/// operators opt into `https://` per endpoint.
pub fn endpoint_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}{RESULTS_PATH}")
    } else {
        format!("http://{host}{RESULTS_PATH}")
    }
}

/// One POST attempt. Anything other than HTTP 200 is a failure.
fn post_census(url: &str, secret: &str, payload: &[u8]) -> std::result::Result<(), String> {
    let response = ureq::post(url)
        .set("Authorization", secret)
        .set("Content-Type", "application/octet-stream")
        .set("Accept", "application/json")
        .send_bytes(payload)
        .map_err(|err| match err {
            ureq::Error::Status(code, _) => format!("status {code}"),
            ureq::Error::Transport(transport) => format!("transport: {transport}"),
        })?;

    if response.status() != 200 {
        return Err(format!("status {}", response.status()));
    }
    Ok(())
}

/// Split a payload into chunks of at most `max_len` bytes, never inside a
/// character. The delivery payload is base64 so every chunk is exactly
/// `max_len` there, but the function stays safe for arbitrary text.
pub fn chunk_payload(payload: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::with_capacity(payload.len().div_ceil(max_len));
    let mut rest = payload;
    while !rest.is_empty() {
        let mut end = rest.len().min(max_len);
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // max_len is smaller than the next character; emit it whole.
            end = rest
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Write the uncompressed document to a uniquely named, world-readable
/// audit file. Failure is logged, never fatal.
fn write_audit(json: &[u8], options: &DeliveryOptions) -> Option<PathBuf> {
    let dir = options
        .audit_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let name = format!(
        "device_census_{}_{}.json",
        Utc::now().format("%Y%m%d%H%M%S"),
        options.run_id.short()
    );
    let path = dir.join(name);

    if let Err(err) = std::fs::write(&path, json) {
        warn!(path = %path.display(), error = %err, "failed to write audit file");
        return None;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) =
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))
        {
            warn!(path = %path.display(), error = %err, "failed to set audit permissions");
        }
    }

    info!(path = %path.display(), "audit copy written");
    Some(path)
}
