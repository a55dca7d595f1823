//! Payload compression.
//!
//! The wire format is a bare zlib stream: no extra framing beyond what the
//! format itself carries. Compression failure is fatal to delivery, since
//! without a payload there is nothing to send or fall back on.

use ct_common::{Error, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Compress bytes into a zlib stream at the default level.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|err| Error::Compression(err.to_string()))?;
    encoder
        .finish()
        .map_err(|err| Error::Compression(err.to_string()))
}

/// Inflate a zlib stream back into the original bytes.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| Error::Compression(err.to_string()))?;
    Ok(out)
}
