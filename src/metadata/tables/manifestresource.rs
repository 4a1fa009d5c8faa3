//! ManifestResource table (0x28) row reader.
//!
//! Embedded resources (implementation index of zero) are located via the CLR header's
//! resources directory plus this row's offset; the rebuild re-emits them byte for byte.

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{CodedIndexKind, TableId, TableInfo},
        tables::RowRead,
        token::Token,
    },
    Result,
};

/// Visibility flag: the resource is exported from the assembly.
pub const MANIFEST_RESOURCE_PUBLIC: u32 = 0x0001;

/// Visibility flag: the resource is private to the assembly.
pub const MANIFEST_RESOURCE_PRIVATE: u32 = 0x0002;

/// One raw row of the ManifestResource table.
pub struct ManifestResourceRaw {
    /// Row id (1-based)
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Byte offset of the resource data within the resources directory
    pub data_offset: u32,
    /// Visibility flags
    pub flags: u32,
    /// `#Strings` index of the resource name
    pub name: u32,
    /// Raw Implementation coded index; zero for embedded resources
    pub implementation: u32,
}

impl RowRead for ManifestResourceRaw {
    const TABLE: TableId = TableId::ManifestResource;

    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self> {
        Ok(ManifestResourceRaw {
            rid,
            token: Token::new(0x2800_0000 + rid),
            data_offset: read_le_at::<u32>(data, offset)?,
            flags: read_le_at::<u32>(data, offset)?,
            name: read_le_at_dyn(data, offset, info.is_large_str())?,
            implementation: read_le_at_dyn(
                data,
                offset,
                info.is_large_coded(CodedIndexKind::Implementation),
            )?,
        })
    }
}
