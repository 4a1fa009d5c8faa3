//! PE file abstraction for rebuild verification.
//!
//! This module provides the [`crate::file::File`] type, a read-only wrapper over a Portable
//! Executable image that exposes exactly the surface a deterministic rebuild needs: RVA
//! translation, data-directory access, the debug directory (including extraction of an
//! embedded Portable PDB), the raw Win32 resource payload, and the optional-header fields
//! that must be pinned during re-emission.
//!
//! # Architecture
//!
//! - **Backend system** - Pluggable data sources behind the [`crate::file::Backend`] trait:
//!   memory-mapped files ([`physical::Physical`]) and in-memory buffers ([`memory::Memory`])
//! - **PE format parsing** - Headers, sections and data directories via goblin
//! - **Address translation** - RVA to file offset conversion for metadata and resources
//! - **Debug directory** - `IMAGE_DEBUG_DIRECTORY` walking and embedded-PDB decompression
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use dotrebuild::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("MyAssembly.dll"))?;
//!
//! let (clr_rva, clr_size) = file.clr();
//! println!("CLR header at RVA 0x{:x}, size: {} bytes", clr_rva, clr_size);
//!
//! if let Some(pdb) = file.embedded_pdb()? {
//!     println!("Embedded Portable PDB: {} bytes", pdb.len());
//! }
//! # Ok::<(), dotrebuild::Error>(())
//! ```
//!
//! # References
//!
//! - Microsoft PE/COFF Specification
//! - ECMA-335 6th Edition, Partition II - PE File Format

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::io::Read;
use std::path::Path;

use crate::{
    Error::{Empty, GoblinErr},
    Result,
};
use goblin::pe::{
    data_directories::DataDirectoryType, header::Header, optional_header::OptionalHeader,
    section_table::SectionTable, PE,
};
use memory::Memory;
use ouroboros::self_referencing;
use physical::Physical;

/// Debug directory entry type for CodeView records.
pub const DEBUG_TYPE_CODEVIEW: u32 = 2;

/// Debug directory entry type for an embedded Portable PDB.
pub const DEBUG_TYPE_EMBEDDED_PORTABLE_PDB: u32 = 17;

/// Magic prefix of an embedded Portable PDB payload, `b"MPDB"` in little-endian.
pub const EMBEDDED_PDB_MAGIC: u32 = 0x4244_504D;

/// Signature of a CodeView `RSDS` debug record, `b"RSDS"` in little-endian.
pub const CODEVIEW_SIGNATURE: u32 = 0x5344_5352;

/// `IMAGE_DLLCHARACTERISTICS_HIGH_ENTROPY_VA`.
const DLL_CHARACTERISTICS_HIGH_ENTROPY_VA: u16 = 0x0020;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of PE data, allowing for both in-memory and on-disk
/// representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// One parsed `IMAGE_DEBUG_DIRECTORY` entry.
///
/// The rebuild core cares about two entry types: [`DEBUG_TYPE_CODEVIEW`] records carrying the
/// PDB identity, and [`DEBUG_TYPE_EMBEDDED_PORTABLE_PDB`] records carrying a compressed
/// Portable PDB image.
#[derive(Debug, Clone, Copy)]
pub struct DebugDirectoryEntry {
    /// Reserved, must be zero
    pub characteristics: u32,
    /// Time and date the debug data was created
    pub time_date_stamp: u32,
    /// Major version number of the debug data format
    pub major_version: u16,
    /// Minor version number of the debug data format
    pub minor_version: u16,
    /// Format of the debugging information
    pub entry_type: u32,
    /// Size of the debug data, not including the debug directory itself
    pub size_of_data: u32,
    /// RVA of the debug data when loaded
    pub address_of_raw_data: u32,
    /// File offset of the debug data
    pub pointer_to_raw_data: u32,
}

#[self_referencing]
/// Represents a loaded PE image containing a .NET assembly.
///
/// This struct wraps the parsed PE and provides methods for accessing the headers, sections
/// and data directories that participate in rebuild verification, and for converting between
/// address spaces. It supports loading from both files and memory buffers. The image is only
/// ever read; re-emission goes to a caller-owned stream.
///
/// # Examples
///
/// ```rust,no_run
/// use dotrebuild::File;
/// use std::path::Path;
///
/// let file = File::from_file(Path::new("MyAssembly.dll"))?;
/// println!("Loaded PE with {} sections", file.sections().count());
///
/// let (clr_rva, clr_size) = file.clr();
/// println!("CLR runtime header: RVA=0x{:x}, size={}", clr_rva, clr_size);
/// # Ok::<(), dotrebuild::Error>(())
/// ```
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// The parsed PE structure, referencing the data.
    #[borrows(data)]
    #[not_covariant]
    pe: PE<'this>,
}

impl File {
    /// Loads a PE file from the given path.
    ///
    /// The file is memory-mapped for efficient access and validated to carry a CLR runtime
    /// header.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the PE file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a valid PE, or does not contain
    /// .NET metadata.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a PE file from a memory buffer.
    ///
    /// # Arguments
    ///
    /// * `data` - The bytes of the PE file.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty, is not a valid PE, or does not contain .NET
    /// metadata.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    /// Internal loader for any backend.
    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        File::try_new(data, |data| {
            let data = data.as_ref();
            match PE::parse(data.data()) {
                Ok(pe) => match pe.header.optional_header {
                    Some(optional_header) => {
                        if optional_header
                            .data_directories
                            .get_clr_runtime_header()
                            .is_none()
                        {
                            Err(malformed_error!(
                                "File does not have a CLR runtime header directory"
                            ))
                        } else {
                            Ok(pe)
                        }
                    }
                    None => Err(malformed_error!("File does not have an OptionalHeader")),
                },
                Err(error) => Err(GoblinErr(error)),
            }
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw bytes of the loaded image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.with_data(|data| data.data())
    }

    /// Returns a slice of the file data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The offset to start the slice from.
    /// * `len` - The length of the slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.with_data(|data| data.data_slice(offset, len))
    }

    /// Returns a reference to the PE header.
    #[must_use]
    pub fn header(&self) -> &Header {
        self.with_pe(|pe| &pe.header)
    }

    /// Returns a reference to the optional header, if present.
    ///
    /// This is always `Some` for valid .NET assemblies since they require an optional header
    /// to define data directories.
    #[must_use]
    pub fn header_optional(&self) -> &Option<OptionalHeader> {
        self.with_pe(|pe| &pe.header.optional_header)
    }

    /// Returns the RVA and size (in bytes) of the CLR runtime header.
    ///
    /// # Panics
    ///
    /// Panics if the CLR runtime header is missing, which cannot happen for a successfully
    /// loaded [`File`].
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        self.with_pe(|pe| {
            let optional_header = pe.header.optional_header.unwrap();
            let clr_dir = optional_header
                .data_directories
                .get_clr_runtime_header()
                .unwrap();

            (clr_dir.virtual_address as usize, clr_dir.size as usize)
        })
    }

    /// Returns an iterator over the section headers of the PE file.
    pub fn sections(&self) -> impl Iterator<Item = &SectionTable> {
        self.with_pe(|pe| pe.sections.iter())
    }

    /// Returns the RVA and size of a specific data directory entry.
    ///
    /// # Arguments
    /// * `dir_type` - The type of data directory to retrieve
    ///
    /// # Returns
    /// - `Some((rva, size))` if the directory exists with non-zero address and size
    /// - `None` if the directory doesn't exist or has zero address/size
    ///
    /// # Panics
    ///
    /// Panics if the PE file has no optional header, which cannot happen for a successfully
    /// loaded [`File`].
    #[must_use]
    pub fn get_data_directory(&self, dir_type: DataDirectoryType) -> Option<(u32, u32)> {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .unwrap()
                .data_directories
                .dirs()
                .find(|(directory_type, directory)| {
                    *directory_type == dir_type
                        && directory.virtual_address != 0
                        && directory.size != 0
                })
                .map(|(_, directory)| (directory.virtual_address, directory.size))
        })
    }

    /// Converts a relative virtual address to a file offset.
    ///
    /// # Arguments
    ///
    /// * `rva` - The relative virtual address to convert.
    ///
    /// # Errors
    ///
    /// Returns an error if the RVA does not fall inside any section of the image.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        self.with_pe(|pe| {
            let rva_u32 = u32::try_from(rva)
                .map_err(|_| malformed_error!("RVA too large to fit in u32: {}", rva))?;

            for section in &pe.sections {
                let Some(section_max) = section.virtual_address.checked_add(section.virtual_size)
                else {
                    return Err(malformed_error!(
                        "Section malformed, causing integer overflow - {} + {}",
                        section.virtual_address,
                        section.virtual_size
                    ));
                };

                if rva_u32 >= section.virtual_address && rva_u32 < section_max {
                    let delta = (rva_u32 - section.virtual_address) as usize;
                    return Ok(section.pointer_to_raw_data as usize + delta);
                }
            }

            Err(malformed_error!(
                "RVA 0x{:X} is not backed by any section",
                rva
            ))
        })
    }

    /// Returns the major and minor subsystem version from the optional header.
    ///
    /// Re-emission pins these so the rebuilt image reproduces the original's values.
    #[must_use]
    pub fn subsystem_version(&self) -> (u16, u16) {
        self.with_pe(|pe| {
            let windows_fields = pe.header.optional_header.unwrap().windows_fields;
            (
                windows_fields.major_subsystem_version,
                windows_fields.minor_subsystem_version,
            )
        })
    }

    /// Returns whether the image was linked with high-entropy virtual address support.
    #[must_use]
    pub fn high_entropy_va(&self) -> bool {
        self.with_pe(|pe| {
            let windows_fields = pe.header.optional_header.unwrap().windows_fields;
            windows_fields.dll_characteristics & DLL_CHARACTERISTICS_HIGH_ENTROPY_VA != 0
        })
    }

    /// Returns the raw Win32 resource directory bytes, if the image has any.
    ///
    /// The payload is passed through opaquely during re-emission; its internal structure is
    /// not interpreted here.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource directory RVA cannot be mapped into the file.
    pub fn win32_resources(&self) -> Result<Option<&[u8]>> {
        let Some((rva, size)) = self.get_data_directory(DataDirectoryType::ResourceTable) else {
            return Ok(None);
        };

        let offset = self.rva_to_offset(rva as usize)?;
        Ok(Some(self.data_slice(offset, size as usize)?))
    }

    /// Parses the entries of the PE debug directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is truncated or its size is not a whole number of
    /// 28-byte entries.
    pub fn debug_directory(&self) -> Result<Vec<DebugDirectoryEntry>> {
        const ENTRY_SIZE: usize = 28;

        let Some((rva, size)) = self.get_data_directory(DataDirectoryType::DebugTable) else {
            return Ok(Vec::new());
        };

        if size as usize % ENTRY_SIZE != 0 {
            return Err(malformed_error!(
                "Debug directory size {} is not a multiple of {}",
                size,
                ENTRY_SIZE
            ));
        }

        let offset = self.rva_to_offset(rva as usize)?;
        let data = self.data_slice(offset, size as usize)?;

        let mut entries = Vec::with_capacity(size as usize / ENTRY_SIZE);
        let mut parser = parser::Parser::new(data);
        while parser.has_more_data() {
            entries.push(DebugDirectoryEntry {
                characteristics: parser.read_le::<u32>()?,
                time_date_stamp: parser.read_le::<u32>()?,
                major_version: parser.read_le::<u16>()?,
                minor_version: parser.read_le::<u16>()?,
                entry_type: parser.read_le::<u32>()?,
                size_of_data: parser.read_le::<u32>()?,
                address_of_raw_data: parser.read_le::<u32>()?,
                pointer_to_raw_data: parser.read_le::<u32>()?,
            });
        }

        Ok(entries)
    }

    /// Returns `true` if the image carries an embedded Portable PDB debug entry.
    pub fn has_embedded_pdb(&self) -> Result<bool> {
        Ok(self
            .debug_directory()?
            .iter()
            .any(|entry| entry.entry_type == DEBUG_TYPE_EMBEDDED_PORTABLE_PDB))
    }

    /// Reads the PDB identity GUID from the CodeView debug entry, if the image has one.
    ///
    /// The GUID equals the first 16 bytes of the Portable PDB's own id, which lets a caller
    /// cross-check a standalone PDB against the image it belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the CodeView record is truncated or does not carry the `RSDS`
    /// signature.
    pub fn codeview_pdb_id(&self) -> Result<Option<uguid::Guid>> {
        let Some(entry) = self
            .debug_directory()?
            .into_iter()
            .find(|entry| entry.entry_type == DEBUG_TYPE_CODEVIEW)
        else {
            return Ok(None);
        };

        let data = self.data_slice(
            entry.pointer_to_raw_data as usize,
            entry.size_of_data as usize,
        )?;

        let mut parser = parser::Parser::new(data);
        let signature = parser.read_le::<u32>()?;
        if signature != CODEVIEW_SIGNATURE {
            return Err(malformed_error!(
                "CodeView entry has invalid signature 0x{:08X}",
                signature
            ));
        }

        Ok(Some(parser.read_guid()?))
    }

    /// Extracts and decompresses the embedded Portable PDB image, if present.
    ///
    /// The payload starts with the `MPDB` magic and the uncompressed size, followed by a raw
    /// deflate stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is truncated, the magic does not match, decompression
    /// fails, or the decompressed length disagrees with the declared size.
    pub fn embedded_pdb(&self) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self
            .debug_directory()?
            .into_iter()
            .find(|entry| entry.entry_type == DEBUG_TYPE_EMBEDDED_PORTABLE_PDB)
        else {
            return Ok(None);
        };

        let data = self.data_slice(
            entry.pointer_to_raw_data as usize,
            entry.size_of_data as usize,
        )?;

        let mut parser = parser::Parser::new(data);
        let magic = parser.read_le::<u32>()?;
        if magic != EMBEDDED_PDB_MAGIC {
            return Err(malformed_error!(
                "Embedded PDB payload has invalid magic 0x{:08X}",
                magic
            ));
        }

        let uncompressed_size = parser.read_le::<u32>()? as usize;

        let mut decoder = flate2::read::DeflateDecoder::new(parser.remaining());
        let mut image = Vec::with_capacity(uncompressed_size);
        decoder
            .read_to_end(&mut image)
            .map_err(|e| malformed_error!("Embedded PDB decompression failed: {}", e))?;

        if image.len() != uncompressed_size {
            return Err(malformed_error!(
                "Embedded PDB decompressed to {} bytes, expected {}",
                image.len(),
                uncompressed_size
            ));
        }

        Ok(Some(image))
    }
}

pub use parser::Parser;
