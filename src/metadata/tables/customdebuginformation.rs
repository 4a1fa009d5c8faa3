//! CustomDebugInformation table (0x37) row reader for the Portable PDB format.
//!
//! Custom debug information records are GUID-tagged blobs attached to metadata entities.
//! The rebuild consumes four kinds, all addressed through this table: compilation options
//! and metadata references (attached to the module), embedded source (attached to
//! documents), and source link (attached to the module).
//!
//! # References
//!
//! - [Portable PDB Format - CustomDebugInformation Table](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#customdebuginformation-table-0x37)

use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        streams::{CodedIndexKind, TableId, TableInfo},
        tables::RowRead,
        token::Token,
    },
    Result,
};

/// One raw row of the CustomDebugInformation table.
pub struct CustomDebugInformationRaw {
    /// Row id (1-based)
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Raw HasCustomDebugInformation coded index of the owning entity
    pub parent: u32,
    /// `#GUID` index of the record kind
    pub kind: u32,
    /// `#Blob` index of the record payload
    pub value: u32,
}

impl CustomDebugInformationRaw {
    /// Decodes the parent coded index into its table and row id.
    ///
    /// # Errors
    /// Returns an error if the tag selects an unused slot.
    pub fn parent_entity(&self) -> Result<(TableId, u32)> {
        CodedIndexKind::HasCustomDebugInformation.decode(self.parent)
    }
}

impl RowRead for CustomDebugInformationRaw {
    const TABLE: TableId = TableId::CustomDebugInformation;

    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self> {
        Ok(CustomDebugInformationRaw {
            rid,
            token: Token::new(0x3700_0000 + rid),
            parent: read_le_at_dyn(
                data,
                offset,
                info.is_large_coded(CodedIndexKind::HasCustomDebugInformation),
            )?,
            kind: read_le_at_dyn(data, offset, info.is_large_guid())?,
            value: read_le_at_dyn(data, offset, info.is_large_blob())?,
        })
    }
}
