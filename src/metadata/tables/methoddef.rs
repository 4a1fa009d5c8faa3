//! MethodDef table (0x06) row reader.

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{TableId, TableInfo},
        tables::RowRead,
        token::Token,
    },
    Result,
};

/// One raw row of the MethodDef table.
pub struct MethodDefRaw {
    /// Row id (1-based)
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// RVA of the method body
    pub rva: u32,
    /// Implementation attributes bitmask
    pub impl_flags: u16,
    /// Method attributes bitmask
    pub flags: u16,
    /// `#Strings` index of the method name
    pub name: u32,
    /// `#Blob` index of the method signature
    pub signature: u32,
    /// First param rid owned by this method
    pub param_list: u32,
}

impl RowRead for MethodDefRaw {
    const TABLE: TableId = TableId::MethodDef;

    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self> {
        Ok(MethodDefRaw {
            rid,
            token: Token::new(0x0600_0000 + rid),
            rva: read_le_at::<u32>(data, offset)?,
            impl_flags: read_le_at::<u16>(data, offset)?,
            flags: read_le_at::<u16>(data, offset)?,
            name: read_le_at_dyn(data, offset, info.is_large_str())?,
            signature: read_le_at_dyn(data, offset, info.is_large_blob())?,
            param_list: read_le_at_dyn(data, offset, info.is_large_index(TableId::Param))?,
        })
    }
}
