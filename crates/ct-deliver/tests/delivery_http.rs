//! End-to-end delivery tests against a local HTTP endpoint.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ct_common::CensusBuilder;
use ct_deliver::{decompress, deliver, CollectingSink, DeliveryOptions, MAX_ATTEMPTS};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

struct TestEndpoint {
    port: u16,
    requests: Arc<AtomicUsize>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

/// Spawn a local endpoint that answers `expected` requests with `status`,
/// recording Authorization headers, then exits.
fn spawn_endpoint(status: u16, expected: usize) -> TestEndpoint {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let requests = Arc::new(AtomicUsize::new(0));
    let auth_headers = Arc::new(Mutex::new(Vec::new()));

    let thread_requests = Arc::clone(&requests);
    let thread_auth = Arc::clone(&auth_headers);
    std::thread::spawn(move || {
        for _ in 0..expected {
            let request = match server.recv() {
                Ok(request) => request,
                Err(_) => return,
            };
            thread_requests.fetch_add(1, Ordering::SeqCst);
            if let Some(header) = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
            {
                thread_auth.lock().unwrap().push(header.value.to_string());
            }
            let response = tiny_http::Response::empty(status);
            let _ = request.respond(response);
        }
    });

    TestEndpoint {
        port,
        requests,
        auth_headers,
    }
}

fn sample_document() -> ct_common::CensusDocument {
    let mut builder = CensusBuilder::new();
    builder.insert("device_name", json!("linux 6.1.0 (x86_64)"));
    builder.insert("sysctl", json!({"kernel.ostype": "Linux"}));
    builder.build()
}

fn test_options(port: u16, audit_dir: &std::path::Path) -> DeliveryOptions {
    DeliveryOptions {
        audit_dir: Some(audit_dir.to_path_buf()),
        retry_delay: Duration::ZERO,
        ..DeliveryOptions::new(format!("http://127.0.0.1:{port}"), "s3cret")
    }
}

#[test]
fn test_successful_delivery_first_attempt() {
    let endpoint = spawn_endpoint(200, 1);
    let audit = TempDir::new().unwrap();
    let document = sample_document();
    let mut sink = CollectingSink::default();

    let outcome = deliver(&document, &test_options(endpoint.port, audit.path()), &mut sink).unwrap();

    assert!(outcome.delivered);
    assert_eq!(outcome.attempts, 1);
    assert!(sink.chunks.is_empty());
    assert_eq!(endpoint.requests.load(Ordering::SeqCst), 1);
    assert_eq!(
        endpoint.auth_headers.lock().unwrap().as_slice(),
        ["s3cret"]
    );

    // Audit copy holds the uncompressed document.
    let path = outcome.audit_path.unwrap();
    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    assert_eq!(written["device_name"], "linux 6.1.0 (x86_64)");
}

#[test]
fn test_exhaustion_falls_back_to_chunked_payload() {
    let endpoint = spawn_endpoint(503, MAX_ATTEMPTS as usize);
    let audit = TempDir::new().unwrap();
    let document = sample_document();
    let mut sink = CollectingSink::default();

    let outcome = deliver(&document, &test_options(endpoint.port, audit.path()), &mut sink).unwrap();

    assert!(!outcome.delivered);
    assert_eq!(outcome.attempts, MAX_ATTEMPTS);
    assert_eq!(endpoint.requests.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);

    // The fallback chunks reassemble into the compressed payload.
    assert!(!sink.chunks.is_empty());
    assert!(sink.chunks.iter().all(|c| c.len() <= 950));
    let compressed = BASE64.decode(sink.chunks.concat()).unwrap();
    let recovered = decompress(&compressed).unwrap();
    assert_eq!(recovered, document.to_json_bytes().unwrap());

    // The audit copy is written even when delivery fails.
    assert!(outcome.audit_path.unwrap().exists());
}

#[test]
fn test_unreachable_endpoint_exhausts_without_server() {
    // Port 1 on loopback refuses the connection immediately.
    let audit = TempDir::new().unwrap();
    let document = sample_document();
    let mut sink = CollectingSink::default();
    let options = DeliveryOptions {
        max_attempts: 2,
        ..test_options(1, audit.path())
    };

    let outcome = deliver(&document, &options, &mut sink).unwrap();

    assert!(!outcome.delivered);
    assert_eq!(outcome.attempts, 2);
    assert!(!sink.chunks.is_empty());
}
