//! Well-known GUID registry for Portable PDB debug metadata.
//!
//! Custom debug information records, document hash algorithms and source languages are all
//! keyed by fixed GUIDs defined by the Portable PDB specification. This module is the
//! compiled-in, read-only registry of every GUID this library recognizes; there is no
//! runtime-mutable registration.
//!
//! # References
//!
//! - [Portable PDB Format - CustomDebugInformation](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#customdebuginformation-table-0x37)

use uguid::{guid, Guid};

/// Custom debug information kind: compilation options key/value blob.
///
/// Attached to the module definition; carries the flattened compiler configuration the
/// original build recorded.
pub const CDI_COMPILATION_OPTIONS: Guid = guid!("b5feec05-8cd0-4a83-96da-466284bb4bd8");

/// Custom debug information kind: metadata reference records.
///
/// Attached to the module definition; one fixed-layout record per referenced image.
pub const CDI_METADATA_REFERENCES: Guid = guid!("7e4d4708-096e-4c5c-aeda-cb10ba6a740d");

/// Custom debug information kind: embedded source.
///
/// Attached to a document; carries the (optionally deflate-compressed) source text.
pub const CDI_EMBEDDED_SOURCE: Guid = guid!("0e8a571b-6926-466e-b4ad-8ab04611f5fe");

/// Custom debug information kind: source link JSON.
///
/// Attached to the module definition; passed through opaquely during re-emission.
pub const CDI_SOURCE_LINK: Guid = guid!("cc110556-a091-4d38-9fec-25ab9a351a6a");

/// Document hash algorithm: SHA-1.
pub const HASH_ALGORITHM_SHA1: Guid = guid!("ff1816ec-aa5e-4d10-87f7-6f4963833460");

/// Document hash algorithm: SHA-256.
pub const HASH_ALGORITHM_SHA256: Guid = guid!("8829d00f-11b8-4213-878b-770e8597ac16");

/// Document source language: C#.
pub const LANGUAGE_CSHARP: Guid = guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1");

/// Document source language: Visual Basic.
pub const LANGUAGE_VISUAL_BASIC: Guid = guid!("3a12d0b8-c26c-11d0-b442-00a0244a1dd2");

/// Document source language: F#.
///
/// Recognized for document classification only; F# assemblies are not rebuildable by this
/// library.
pub const LANGUAGE_FSHARP: Guid = guid!("ab4f38c9-b6e6-43ba-be3b-58080b2ccce3");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_distinct() {
        let all = [
            CDI_COMPILATION_OPTIONS,
            CDI_METADATA_REFERENCES,
            CDI_EMBEDDED_SOURCE,
            CDI_SOURCE_LINK,
            HASH_ALGORITHM_SHA1,
            HASH_ALGORITHM_SHA256,
            LANGUAGE_CSHARP,
            LANGUAGE_VISUAL_BASIC,
            LANGUAGE_FSHARP,
        ];

        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn source_link_guid_bytes() {
        // First bytes of the on-disk little-endian layout.
        let bytes = CDI_SOURCE_LINK.to_bytes();
        assert_eq!(&bytes[..4], &[0x56, 0x05, 0x11, 0xCC]);
    }
}
