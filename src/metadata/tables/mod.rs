//! Raw row readers for the metadata tables the rebuild core consumes.
//!
//! Only the tables that participate in rebuild verification are decoded here: the module
//! definition (MVID and custom-debug-information parent), the assembly definition (public
//! key), type and method definitions (entry-point resolution), manifest resources, and the
//! Portable PDB's document and custom-debug-information tables.
//!
//! Each row type carries its rid, its metadata token and the raw heap/table indexes exactly
//! as stored on disk; heap resolution happens in the layers above.

mod assembly;
mod customdebuginformation;
mod document;
mod manifestresource;
mod methoddef;
mod module;
mod typedef;

pub use assembly::AssemblyRaw;
pub use customdebuginformation::CustomDebugInformationRaw;
pub use document::{decode_document_name, DocumentRaw};
pub use manifestresource::ManifestResourceRaw;
pub use methoddef::MethodDefRaw;
pub use module::ModuleRaw;
pub use typedef::TypeDefRaw;

use crate::{
    metadata::streams::{TableId, TableInfo},
    Result,
};

/// Trait for metadata table rows that can be decoded from the packed tables stream.
pub(crate) trait RowRead: Sized {
    /// The table this row type belongs to.
    const TABLE: TableId;

    /// Decodes one row at `offset`, advancing it past the row.
    fn read_row(data: &[u8], offset: &mut usize, rid: u32, info: &TableInfo) -> Result<Self>;
}
