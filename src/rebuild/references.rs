//! Metadata reference descriptors decoded from Portable PDB debug metadata.
//!
//! The compiler records every metadata reference of the original compilation as a fixed
//! binary record: NUL-terminated name, NUL-terminated comma-separated extern-alias list, a
//! packed flag byte, timestamp, image size, and the referenced module's MVID. A record with
//! aliases expands into one descriptor per alias.
//!
//! The alias literal `global` is normalized to "no alias": that is how the compiler records
//! the un-aliased default reference, and the asymmetry is preserved here deliberately rather
//! than treating `global` as a real alias.

use bitflags::bitflags;

use crate::{file::parser::Parser, Error, Result};

bitflags! {
    /// The packed flag byte of a metadata-reference record.
    ///
    /// Any set bit outside this set is a format violation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReferenceFlags: u8 {
        /// The reference is an assembly; clear means a standalone module
        const ASSEMBLY = 0x01;
        /// Interop types are embedded into the referencing compilation
        const EMBED_INTEROP_TYPES = 0x02;
    }
}

/// Kind of a referenced metadata image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataImageKind {
    /// A full assembly with its own identity
    Assembly,
    /// A standalone module
    Module,
}

/// Descriptor of one metadata reference of the original compilation.
///
/// Multiple descriptors may share the same name and MVID with different aliases; the
/// resolver receives one descriptor per alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReferenceInfo {
    /// File name of the referenced image
    pub name: String,
    /// Module version id of the referenced build
    pub mvid: uguid::Guid,
    /// Extern alias this descriptor was recorded under, [`None`] for the default scope
    pub extern_alias: Option<String>,
    /// Whether the reference is an assembly or a module
    pub kind: MetadataImageKind,
    /// Whether interop types were embedded from this reference
    pub embed_interop_types: bool,
    /// COFF timestamp of the referenced image
    pub timestamp: i32,
    /// Size in bytes of the referenced image
    pub image_size: i32,
}

/// Parses a metadata-reference-info blob into its expanded descriptor list.
///
/// # Arguments
/// * `blob` - The raw custom-debug-information payload
///
/// # Errors
/// Returns [`Error::UnexpectedReferenceFlags`] if a record's flag byte has undefined bits
/// set, and a malformed/out-of-bounds error if a record is truncated.
pub fn parse_metadata_references(blob: &[u8]) -> Result<Vec<MetadataReferenceInfo>> {
    let mut parser = Parser::new(blob);
    let mut references = Vec::new();

    while parser.has_more_data() {
        let name = parser.read_null_terminated_utf8()?;
        let alias_list = parser.read_null_terminated_utf8()?;

        let raw_flags = parser.read_le::<u8>()?;
        let Some(flags) = ReferenceFlags::from_bits(raw_flags) else {
            return Err(Error::UnexpectedReferenceFlags(raw_flags));
        };

        let timestamp = parser.read_le::<i32>()?;
        let image_size = parser.read_le::<i32>()?;
        let mvid = parser.read_guid()?;

        let kind = if flags.contains(ReferenceFlags::ASSEMBLY) {
            MetadataImageKind::Assembly
        } else {
            MetadataImageKind::Module
        };
        let embed_interop_types = flags.contains(ReferenceFlags::EMBED_INTEROP_TYPES);

        let build = |extern_alias: Option<String>| MetadataReferenceInfo {
            name: name.clone(),
            mvid,
            extern_alias,
            kind,
            embed_interop_types,
            timestamp,
            image_size,
        };

        if alias_list.is_empty() {
            references.push(build(None));
        } else {
            for alias in alias_list.split(',') {
                // The compiler records the un-aliased default reference under the literal
                // alias "global"; normalize it to "no alias".
                let extern_alias = if alias == "global" {
                    None
                } else {
                    Some(alias.to_string())
                };
                references.push(build(extern_alias));
            }
        }
    }

    Ok(references)
}
