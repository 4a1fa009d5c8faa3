//! Physical file backend for memory-mapped I/O.
//!
//! Provides the [`crate::file::physical::Physical`] backend implementing the
//! [`crate::file::Backend`] trait for on-disk PE images. Files are mapped read-only into the
//! process's address space, so large assemblies can be verified without loading the entire
//! image upfront while keeping random access to headers and metadata cheap.

use super::Backend;
use crate::{Error::FileError, Result};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to files on disk.
///
/// The backend is well-suited for reading .NET assemblies, which are typically accessed in a
/// non-sequential pattern when walking headers, sections and metadata streams. All access
/// operations include bounds checking.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// The file is mapped as read-only and shared.
    ///
    /// # Arguments
    /// * `path` - Path to the PE file on disk
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path).map_err(FileError)?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(FileError)?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        if offset_end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
