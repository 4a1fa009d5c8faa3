//! TypeDef table (0x02) row reader.
//!
//! Type definitions are walked to find the declaring type of the recorded debug entry point:
//! a method rid belongs to the last type whose method list starts at or before it.

use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        streams::{CodedIndexKind, TableId, TableInfo},
        tables::RowRead,
        token::Token,
    },
    Result,
};

/// One raw row of the TypeDef table.
pub struct TypeDefRaw {
    /// Row id (1-based)
    pub rid: u32,
    /// Metadata token of this row
    pub token: Token,
    /// Type attributes bitmask
    pub flags: u32,
    /// `#Strings` index of the type name
    pub name: u32,
    /// `#Strings` index of the type namespace
    pub namespace: u32,
    /// Raw TypeDefOrRef coded index of the base type
    pub extends: u32,
    /// First field rid owned by this type
    pub field_list: u32,
    /// First method rid owned by this type
    pub method_list: u32,
}

impl RowRead for TypeDefRaw {
    const TABLE: TableId = TableId::TypeDef;

    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self> {
        Ok(TypeDefRaw {
            rid,
            token: Token::new(0x0200_0000 + rid),
            flags: read_le_at::<u32>(data, offset)?,
            name: read_le_at_dyn(data, offset, info.is_large_str())?,
            namespace: read_le_at_dyn(data, offset, info.is_large_str())?,
            extends: read_le_at_dyn(
                data,
                offset,
                info.is_large_coded(CodedIndexKind::TypeDefOrRef),
            )?,
            field_list: read_le_at_dyn(data, offset, info.is_large_index(TableId::Field))?,
            method_list: read_le_at_dyn(data, offset, info.is_large_index(TableId::MethodDef))?,
        })
    }
}
