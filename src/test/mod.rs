//! Shared functionality for unit tests.
//!
//! Factories for the binary blobs the rebuild core consumes, so individual tests can craft
//! inputs without repeating encoding details.

use std::io::Write;

/// Encodes a compilation-options blob from key/value pairs.
pub(crate) fn options_blob(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut blob = Vec::new();
    for (key, value) in pairs {
        blob.extend_from_slice(key.as_bytes());
        blob.push(0);
        blob.extend_from_slice(value.as_bytes());
        blob.push(0);
    }
    blob
}

/// Encodes one metadata-reference record.
pub(crate) fn reference_record(
    name: &str,
    aliases: &str,
    flags: u8,
    timestamp: i32,
    image_size: i32,
    mvid: [u8; 16],
) -> Vec<u8> {
    let mut record = Vec::new();
    record.extend_from_slice(name.as_bytes());
    record.push(0);
    record.extend_from_slice(aliases.as_bytes());
    record.push(0);
    record.push(flags);
    record.extend_from_slice(&timestamp.to_le_bytes());
    record.extend_from_slice(&image_size.to_le_bytes());
    record.extend_from_slice(&mvid);
    record
}

/// Raw-deflate compression, matching the embedded-source payload encoding.
pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_blob_layout() {
        let blob = options_blob(&[("language", "C#")]);
        assert_eq!(blob, b"language\0C#\0");
    }

    #[test]
    fn deflate_roundtrip() {
        use std::io::Read;

        let compressed = deflate(b"payload");
        let mut decoder = flate2::read::DeflateDecoder::new(compressed.as_slice());
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, b"payload");
    }
}
