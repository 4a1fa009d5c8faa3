//! Module table (0x00) row reader.
//!
//! The module definition anchors the custom-debug-information records the rebuild reads:
//! compilation options, metadata references and source link are all attached to it. Its MVID
//! uniquely identifies the build being verified.

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{TableId, TableInfo},
        tables::RowRead,
        token::Token,
    },
    Result,
};

/// One raw row of the Module table.
pub struct ModuleRaw {
    /// Row id (1-based)
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Generation, reserved, always 0
    pub generation: u16,
    /// `#Strings` index of the module name
    pub name: u32,
    /// `#GUID` index of the module version id
    pub mvid: u32,
    /// `#GUID` index, edit-and-continue id
    pub enc_id: u32,
    /// `#GUID` index, edit-and-continue base id
    pub enc_base_id: u32,
}

impl RowRead for ModuleRaw {
    const TABLE: TableId = TableId::Module;

    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self> {
        Ok(ModuleRaw {
            rid,
            token: Token::new(rid),
            generation: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, info.is_large_str())?,
            mvid: read_le_at_dyn(data, offset, info.is_large_guid())?,
            enc_id: read_le_at_dyn(data, offset, info.is_large_guid())?,
            enc_base_id: read_le_at_dyn(data, offset, info.is_large_guid())?,
        })
    }
}
