//! Source file descriptors and embedded source decoding.
//!
//! Every document of the original compile unit is described by a [`SourceFileInfo`]: its
//! recorded path, hash algorithm, hash bytes, text encoding, and whether the PDB carries the
//! source text itself. Embedded source is stored either raw or deflate-compressed behind a
//! four byte uncompressed-size header; [`decode_embedded_source`] validates the declared
//! length exactly and keeps a hash of the compressed payload for later cross-validation.

use std::io::Read;

use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::{metadata::guids, Error, Result};

/// Document hash algorithm recorded in the Portable PDB.
///
/// Unrecognized algorithm GUIDs map to [`HashAlgorithm::None`]; that is a degradation, not
/// a failure, because hash validation is only possible for algorithms this library knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// No (or unrecognized) hash algorithm
    None,
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Maps a hash-algorithm GUID from a document row to its algorithm.
    #[must_use]
    pub fn from_guid(guid: uguid::Guid) -> HashAlgorithm {
        if guid == guids::HASH_ALGORITHM_SHA1 {
            HashAlgorithm::Sha1
        } else if guid == guids::HASH_ALGORITHM_SHA256 {
            HashAlgorithm::Sha256
        } else {
            HashAlgorithm::None
        }
    }

    /// Computes the digest of `data` under this algorithm.
    ///
    /// Returns [`None`] for [`HashAlgorithm::None`], where no checksum can be computed.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Option<Vec<u8>> {
        match self {
            HashAlgorithm::None => None,
            HashAlgorithm::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(data);
                Some(hasher.finalize().to_vec())
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                Some(hasher.finalize().to_vec())
            }
        }
    }
}

/// Descriptor of one source file of the original compile unit.
///
/// The recorded hash binds the descriptor to its content: a resolved source text whose
/// checksum differs is fatal for the whole rebuild.
#[derive(Debug, Clone)]
pub struct SourceFileInfo {
    /// Document rid within the PDB (1-based)
    pub document_rid: u32,
    /// The path the compiler recorded for this document
    pub original_path: String,
    /// Hash algorithm of the recorded hash
    pub hash_algorithm: HashAlgorithm,
    /// The recorded content hash
    pub hash: Vec<u8>,
    /// Text encoding name from the compilation options, when one was recorded
    pub encoding: Option<String>,
    /// `true` if the PDB carries the document's text as embedded source
    pub has_embedded_source: bool,
}

/// A resolved source text ready to be fed to the compiler service.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// The source content
    pub text: String,
    /// Encoding name the text should be re-encoded with, UTF-8 when absent
    pub encoding: Option<String>,
}

impl SourceText {
    /// Creates a source text from its content.
    #[must_use]
    pub fn new(text: impl Into<String>, encoding: Option<String>) -> SourceText {
        SourceText {
            text: text.into(),
            encoding,
        }
    }

    /// Computes this text's checksum under the given algorithm.
    ///
    /// Returns [`None`] for [`HashAlgorithm::None`].
    #[must_use]
    pub fn checksum(&self, algorithm: HashAlgorithm) -> Option<Vec<u8>> {
        algorithm.digest(self.text.as_bytes())
    }
}

/// Source text materialized from an embedded-source blob.
#[derive(Debug, Clone)]
pub struct EmbeddedSourceFile {
    /// The decoded source content
    pub text: SourceText,
    /// Hash of the compressed payload; present only when compression was used
    pub compressed_hash: Option<Vec<u8>>,
}

/// Decodes an embedded-source blob.
///
/// The first four bytes are the uncompressed size. A size of zero means the remaining bytes
/// are the literal source content; a non-zero size means the remaining bytes are a raw
/// deflate stream that must decompress to exactly that many bytes.
///
/// # Arguments
/// * `blob` - The embedded-source custom-debug-information payload
/// * `hash_algorithm` - The owning document's hash algorithm, used for the compressed hash
///
/// # Errors
/// Returns [`Error::CorruptEmbeddedSource`] if the header declares a negative size,
/// decompression fails, or the decompressed length does not match the declared size.
/// Returns [`crate::Error::OutOfBounds`] if the blob is shorter than its header.
pub fn decode_embedded_source(
    blob: &[u8],
    hash_algorithm: HashAlgorithm,
) -> Result<EmbeddedSourceFile> {
    let mut parser = crate::file::parser::Parser::new(blob);
    let uncompressed_size = parser.read_le::<i32>()?;

    if uncompressed_size < 0 {
        return Err(Error::CorruptEmbeddedSource(format!(
            "negative uncompressed size {uncompressed_size}"
        )));
    }

    let payload = parser.remaining();

    if uncompressed_size == 0 {
        let text = std::str::from_utf8(payload)
            .map_err(|e| Error::CorruptEmbeddedSource(format!("text is not UTF-8: {e}")))?;

        return Ok(EmbeddedSourceFile {
            text: SourceText::new(text, None),
            compressed_hash: None,
        });
    }

    let mut decoded = Vec::with_capacity(uncompressed_size as usize);
    let mut decoder = flate2::read::DeflateDecoder::new(payload);
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| Error::CorruptEmbeddedSource(format!("decompression failed: {e}")))?;

    if decoded.len() != uncompressed_size as usize {
        return Err(Error::CorruptEmbeddedSource(format!(
            "decompressed to {} bytes, declared {}",
            decoded.len(),
            uncompressed_size
        )));
    }

    let text = String::from_utf8(decoded)
        .map_err(|e| Error::CorruptEmbeddedSource(format!("text is not UTF-8: {e}")))?;

    Ok(EmbeddedSourceFile {
        text: SourceText::new(text, None),
        compressed_hash: hash_algorithm.digest(payload),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::deflate as compress;

    #[test]
    fn raw_embedded_source() {
        let mut blob = 0i32.to_le_bytes().to_vec();
        blob.extend_from_slice(b"class C {}");

        let decoded = decode_embedded_source(&blob, HashAlgorithm::Sha256).unwrap();
        assert_eq!(decoded.text.text, "class C {}");
        assert!(decoded.compressed_hash.is_none());
    }

    #[test]
    fn compressed_embedded_source_roundtrip() {
        let original = "class Widget\n{\n    public int Size { get; set; }\n}\n";
        let compressed = compress(original.as_bytes());

        let mut blob = (original.len() as i32).to_le_bytes().to_vec();
        blob.extend_from_slice(&compressed);

        let decoded = decode_embedded_source(&blob, HashAlgorithm::Sha256).unwrap();
        assert_eq!(decoded.text.text, original);
        assert_eq!(
            decoded.compressed_hash,
            HashAlgorithm::Sha256.digest(&compressed)
        );
    }

    #[test]
    fn length_mismatch_is_corrupt() {
        let compressed = compress(b"short");
        let mut blob = 500i32.to_le_bytes().to_vec();
        blob.extend_from_slice(&compressed);

        assert!(matches!(
            decode_embedded_source(&blob, HashAlgorithm::Sha1),
            Err(Error::CorruptEmbeddedSource(_))
        ));
    }

    #[test]
    fn garbage_stream_is_corrupt() {
        let mut blob = 16i32.to_le_bytes().to_vec();
        blob.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);

        assert!(matches!(
            decode_embedded_source(&blob, HashAlgorithm::Sha1),
            Err(Error::CorruptEmbeddedSource(_))
        ));
    }

    #[test]
    fn negative_size_is_corrupt() {
        let blob = (-1i32).to_le_bytes().to_vec();

        assert!(matches!(
            decode_embedded_source(&blob, HashAlgorithm::Sha1),
            Err(Error::CorruptEmbeddedSource(_))
        ));
    }

    #[test]
    fn truncated_header_is_out_of_bounds() {
        assert!(matches!(
            decode_embedded_source(&[0x01, 0x02], HashAlgorithm::None),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn hash_algorithm_guid_mapping() {
        use crate::metadata::guids;

        assert_eq!(
            HashAlgorithm::from_guid(guids::HASH_ALGORITHM_SHA1),
            HashAlgorithm::Sha1
        );
        assert_eq!(
            HashAlgorithm::from_guid(guids::HASH_ALGORITHM_SHA256),
            HashAlgorithm::Sha256
        );
        assert_eq!(
            HashAlgorithm::from_guid(uguid::guid!("00000000-0000-0000-0000-000000000001")),
            HashAlgorithm::None
        );
    }

    #[test]
    fn checksum_matches_direct_digest() {
        let text = SourceText::new("Module Program\nEnd Module\n", None);

        assert_eq!(
            text.checksum(HashAlgorithm::Sha1),
            HashAlgorithm::Sha1.digest(text.text.as_bytes())
        );
        assert!(text.checksum(HashAlgorithm::None).is_none());
    }
}
