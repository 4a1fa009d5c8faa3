//! Assembly table (0x20) row reader.
//!
//! An image has at most one Assembly row; its public-key blob is what the rebuild surfaces
//! for signing verification. Pure module images have none.

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{TableId, TableInfo},
        tables::RowRead,
        token::Token,
    },
    Result,
};

/// One raw row of the Assembly table.
pub struct AssemblyRaw {
    /// Row id (1-based)
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Hash algorithm id used for file hashes
    pub hash_alg_id: u32,
    /// Major version
    pub major_version: u16,
    /// Minor version
    pub minor_version: u16,
    /// Build number
    pub build_number: u16,
    /// Revision number
    pub revision_number: u16,
    /// Assembly flags bitmask
    pub flags: u32,
    /// `#Blob` index of the public key, nil if unsigned
    pub public_key: u32,
    /// `#Strings` index of the assembly name
    pub name: u32,
    /// `#Strings` index of the culture string
    pub culture: u32,
}

impl RowRead for AssemblyRaw {
    const TABLE: TableId = TableId::Assembly;

    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self> {
        Ok(AssemblyRaw {
            rid,
            token: Token::new(0x2000_0000 + rid),
            hash_alg_id: read_le_at::<u32>(data, offset)?,
            major_version: read_le_at::<u16>(data, offset)?,
            minor_version: read_le_at::<u16>(data, offset)?,
            build_number: read_le_at::<u16>(data, offset)?,
            revision_number: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u32>(data, offset)?,
            public_key: read_le_at_dyn(data, offset, info.is_large_blob())?,
            name: read_le_at_dyn(data, offset, info.is_large_str())?,
            culture: read_le_at_dyn(data, offset, info.is_large_str())?,
        })
    }
}
