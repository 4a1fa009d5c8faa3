//! ECMA-335 metadata parsing for .NET images and Portable PDBs.
//!
//! The rebuild core reads two metadata directories per assembly: the PE image's own metadata
//! (module, assembly, type and method definitions, manifest resources) and the Portable
//! PDB's metadata (documents and custom debug information). Both share the same physical
//! layout, parsed here into a [`MetadataImage`].
//!
//! # Key Components
//!
//! - [`MetadataImage`] - One parsed metadata directory: root, heaps, tables, `#Pdb` header
//! - [`root::Root`] / [`streams`] - The stream directory and individual stream parsers
//! - [`tables`] - Raw row readers for the tables the rebuild consumes
//! - [`guids`] - The compiled-in well-known GUID registry
//! - [`cor20header::Cor20Header`] - The CLR header locating metadata and resources
//! - [`pdbheader::PdbHeader`] - PDB identity, entry point and external row counts

pub mod cor20header;
pub mod guids;
pub mod pdbheader;
pub mod root;
pub mod streams;
pub mod tables;
pub mod token;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        pdbheader::PdbHeader,
        root::Root,
        streams::{Blob, GuidHeap, Strings, TablesHeader},
    },
    Result,
};

/// One parsed metadata directory: stream directory, heaps and tables.
///
/// Works for both a PE image's metadata and a standalone Portable PDB; for the latter, the
/// `#Pdb` stream is parsed first so that the external type-system row counts participate in
/// table index sizing.
pub struct MetadataImage<'a> {
    root: Root,
    strings: Option<Strings<'a>>,
    blob: Option<Blob<'a>>,
    guids: Option<GuidHeap<'a>>,
    tables: Option<TablesHeader<'a>>,
    pdb: Option<PdbHeader>,
}

impl<'a> MetadataImage<'a> {
    /// Parses a metadata directory from its raw bytes.
    ///
    /// # Arguments
    /// * `data` - The metadata bytes, beginning with the `BSJB` magic
    ///
    /// # Errors
    /// Returns an error if the root, a stream header, or any present stream is malformed.
    /// The uncompressed `#-` tables stream is not supported.
    pub fn parse(data: &'a [u8]) -> Result<MetadataImage<'a>> {
        let root = Root::read(data)?;

        if root.stream("#-").is_some() {
            return Err(crate::Error::NotSupported);
        }

        let slice_of = |name: &str| -> Result<Option<&'a [u8]>> {
            match root.stream(name) {
                Some(header) => {
                    let start = header.offset as usize;
                    let end = start + header.size as usize;
                    if end > data.len() {
                        return Err(out_of_bounds_error!());
                    }
                    Ok(Some(&data[start..end]))
                }
                None => Ok(None),
            }
        };

        let pdb = match slice_of("#Pdb")? {
            Some(bytes) => Some(PdbHeader::read(bytes)?),
            None => None,
        };

        let external_rows: &[_] = match &pdb {
            Some(header) => &header.referenced_table_rows,
            None => &[],
        };

        let tables = match slice_of("#~")? {
            Some(bytes) => Some(TablesHeader::from(bytes, external_rows)?),
            None => None,
        };

        let strings = match slice_of("#Strings")? {
            Some(bytes) if !bytes.is_empty() => Some(Strings::from(bytes)?),
            _ => None,
        };

        let blob = match slice_of("#Blob")? {
            Some(bytes) if !bytes.is_empty() => Some(Blob::from(bytes)?),
            _ => None,
        };

        let guids = match slice_of("#GUID")? {
            Some(bytes) if bytes.len() >= 16 => Some(GuidHeap::from(bytes)?),
            _ => None,
        };

        Ok(MetadataImage {
            root,
            strings,
            blob,
            guids,
            tables,
            pdb,
        })
    }

    /// Locates and parses the metadata directory of a loaded PE image.
    ///
    /// # Arguments
    /// * `file` - The loaded PE image
    ///
    /// # Errors
    /// Returns an error if the CLR header or metadata root cannot be located or parsed.
    pub fn from_pe(file: &'a File) -> Result<(Cor20Header, MetadataImage<'a>)> {
        let (clr_rva, clr_size) = file.clr();
        let clr_offset = file.rva_to_offset(clr_rva)?;
        let cor20 = Cor20Header::read(file.data_slice(clr_offset, clr_size)?)?;

        let metadata_offset = file.rva_to_offset(cor20.meta_data_rva as usize)?;
        let metadata = file.data_slice(metadata_offset, cor20.meta_data_size as usize)?;

        Ok((cor20, MetadataImage::parse(metadata)?))
    }

    /// Returns the metadata root.
    #[must_use]
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Returns the `#Strings` heap.
    ///
    /// # Errors
    /// Returns an error if the image has no string heap.
    pub fn strings(&self) -> Result<&Strings<'a>> {
        self.strings
            .as_ref()
            .ok_or_else(|| malformed_error!("Image has no #Strings heap"))
    }

    /// Returns the `#Blob` heap.
    ///
    /// # Errors
    /// Returns an error if the image has no blob heap.
    pub fn blob(&self) -> Result<&Blob<'a>> {
        self.blob
            .as_ref()
            .ok_or_else(|| malformed_error!("Image has no #Blob heap"))
    }

    /// Returns the `#GUID` heap.
    ///
    /// # Errors
    /// Returns an error if the image has no GUID heap.
    pub fn guids(&self) -> Result<&GuidHeap<'a>> {
        self.guids
            .as_ref()
            .ok_or_else(|| malformed_error!("Image has no #GUID heap"))
    }

    /// Returns the parsed tables stream.
    ///
    /// # Errors
    /// Returns an error if the image has no tables stream.
    pub fn tables(&self) -> Result<&TablesHeader<'a>> {
        self.tables
            .as_ref()
            .ok_or_else(|| malformed_error!("Image has no #~ tables stream"))
    }

    /// Returns the `#Pdb` stream header, present only for Portable PDB metadata.
    #[must_use]
    pub fn pdb_header(&self) -> Option<&PdbHeader> {
        self.pdb.as_ref()
    }
}
