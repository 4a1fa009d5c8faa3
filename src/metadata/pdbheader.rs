//! `#Pdb` stream header parsing for Portable PDB files.
//!
//! The `#Pdb` stream carries the PDB identity, the entry-point token the compiler recorded,
//! and the row counts of every type-system table the PDB's own tables reference. Those
//! external row counts are required to size coded indexes in the PDB's `#~` stream
//! correctly, since the referenced tables physically live in the PE image.
//!
//! # References
//!
//! - [Portable PDB Format - #Pdb stream](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#pdb-stream)

use crate::{
    file::parser::Parser,
    metadata::{streams::TableId, token::Token},
    Error::OutOfBounds,
    Result,
};

/// The parsed `#Pdb` stream header.
pub struct PdbHeader {
    /// The 20-byte PDB identity (GUID + timestamp)
    pub id: [u8; 20],
    /// The recorded entry-point token; nil when the image has no entry point
    pub entry_point: Token,
    /// Row counts of the type-system tables referenced by this PDB
    pub referenced_table_rows: Vec<(TableId, u32)>,
}

impl PdbHeader {
    /// Reads a [`PdbHeader`] from the `#Pdb` stream bytes.
    ///
    /// # Arguments
    /// * `data` - The complete stream bytes
    ///
    /// # Errors
    /// Returns an error if the stream is truncated or references an unknown table.
    pub fn read(data: &[u8]) -> Result<PdbHeader> {
        if data.len() < 32 {
            return Err(OutOfBounds);
        }

        let mut id = [0u8; 20];
        id.copy_from_slice(&data[..20]);

        let mut parser = Parser::new(data);
        parser.advance_by(20)?;

        let entry_point = Token::new(parser.read_le::<u32>()?);
        let referenced = parser.read_le::<u64>()?;

        let mut referenced_table_rows = Vec::with_capacity(referenced.count_ones() as usize);
        for bit in 0..64u8 {
            if referenced & (1u64 << bit) == 0 {
                continue;
            }

            let Some(table) = TableId::from_id(bit) else {
                return Err(malformed_error!(
                    "#Pdb stream references unknown table 0x{:02X}",
                    bit
                ));
            };

            referenced_table_rows.push((table, parser.read_le::<u32>()?));
        }

        Ok(PdbHeader {
            id,
            entry_point,
            referenced_table_rows,
        })
    }
}
