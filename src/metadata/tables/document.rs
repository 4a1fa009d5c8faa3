//! Document table (0x30) row reader for the Portable PDB format.
//!
//! Each document row describes one source file of the original compilation: its name (a
//! composite blob of path parts), the hash algorithm GUID, the hash bytes, and the source
//! language GUID.
//!
//! # References
//!
//! - [Portable PDB Format - Document Table](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#document-table-0x30)

use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        streams::{TableId, TableInfo},
        tables::RowRead,
        token::Token,
    },
    Result,
};

/// One raw row of the Document table.
pub struct DocumentRaw {
    /// Row id (1-based)
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// `#Blob` index of the composite document name
    pub name: u32,
    /// `#GUID` index of the hash algorithm
    pub hash_algorithm: u32,
    /// `#Blob` index of the document hash
    pub hash: u32,
    /// `#GUID` index of the source language
    pub language: u32,
}

impl RowRead for DocumentRaw {
    const TABLE: TableId = TableId::Document;

    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self> {
        Ok(DocumentRaw {
            rid,
            token: Token::new(0x3000_0000 + rid),
            name: read_le_at_dyn(data, offset, info.is_large_blob())?,
            hash_algorithm: read_le_at_dyn(data, offset, info.is_large_guid())?,
            hash: read_le_at_dyn(data, offset, info.is_large_blob())?,
            language: read_le_at_dyn(data, offset, info.is_large_guid())?,
        })
    }
}

/// Decodes a composite document name blob into a path string.
///
/// The blob starts with a single separator byte (possibly zero for no separator), followed
/// by a sequence of compressed `#Blob` indexes; each indexed blob is a UTF-8 path part.
///
/// # Arguments
/// * `name_blob` - The document name blob
/// * `blob_heap` - The `#Blob` heap the parts live in
///
/// # Errors
/// Returns an error if a part index is out of bounds or a part is not valid UTF-8.
pub fn decode_document_name(
    name_blob: &[u8],
    blob_heap: &crate::metadata::streams::Blob<'_>,
) -> Result<String> {
    if name_blob.is_empty() {
        return Ok(String::new());
    }

    let mut parser = crate::file::parser::Parser::new(name_blob);
    let separator = parser.read_le::<u8>()?;

    let mut name = String::new();
    let mut first = true;
    while parser.has_more_data() {
        let part_index = parser.read_compressed_uint()? as usize;

        if !first && separator != 0 {
            name.push(char::from(separator));
        }
        first = false;

        // Index 0 is the empty part, e.g. a path starting with the separator.
        if part_index != 0 {
            let part = blob_heap.get(part_index)?;
            let part = std::str::from_utf8(part)
                .map_err(|e| malformed_error!("Document name part is not UTF-8: {}", e))?;
            name.push_str(part);
        }
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::streams::Blob;

    #[test]
    fn composite_name_with_separator() {
        // Heap: [0][3]"src"[7]"Program.cs"
        let mut heap = vec![0u8];
        heap.push(3);
        heap.extend_from_slice(b"src");
        heap.push(10);
        heap.extend_from_slice(b"Program.cs");
        let blob = Blob::from(&heap).unwrap();

        // Separator '/', parts: empty (leading slash), "src", "Program.cs"
        let name_blob = [b'/', 0x00, 0x01, 0x05];
        let name = decode_document_name(&name_blob, &blob).unwrap();
        assert_eq!(name, "/src/Program.cs");
    }

    #[test]
    fn single_part_name() {
        let mut heap = vec![0u8];
        heap.push(8);
        heap.extend_from_slice(b"Types.cs");
        let blob = Blob::from(&heap).unwrap();

        let name_blob = [b'\\', 0x01];
        let name = decode_document_name(&name_blob, &blob).unwrap();
        assert_eq!(name, "Types.cs");
    }

    #[test]
    fn empty_name_blob() {
        let heap = [0u8, 0x00];
        let blob = Blob::from(&heap).unwrap();
        assert_eq!(decode_document_name(&[], &blob).unwrap(), "");
    }
}
