//! Wire encoding of patch text: zlib, then standard base64.

use crate::error::SyncError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub(crate) fn compress(text: &str) -> Result<String, SyncError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let bytes = encoder.finish()?;
    Ok(STANDARD.encode(bytes))
}

pub(crate) fn decompress(encoded: &str) -> Result<String, SyncError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    let mut decoder = ZlibDecoder::new(bytes.as_slice());
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}
