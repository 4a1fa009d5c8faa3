//! String Heap (`#Strings`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#Strings` heap, which stores NUL-terminated UTF-8 strings
//! referenced by metadata tables (resource names, method names, type names).
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{Error::OutOfBounds, Result};

/// '#Strings' is a heap of NUL-terminated UTF-8 strings, addressed by byte offset.
///
/// Offset 0 is always the empty string; a valid heap therefore starts with a NUL byte.
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` object from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data'    - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns an error if the data is empty or doesn't start with a NUL byte
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Strings heap"));
        }

        Ok(Strings { data })
    }

    /// Returns the string starting at the specified byte offset.
    ///
    /// ## Arguments
    /// * 'index' - The offset within the heap (comes from metadata tables)
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds, the string is unterminated, or the
    /// bytes are not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let tail = &self.data[index..];
        let Some(len) = tail.iter().position(|&b| b == 0) else {
            return Err(malformed_error!(
                "Unterminated string at #Strings offset {}",
                index
            ));
        };

        std::str::from_utf8(&tail[..len])
            .map_err(|e| malformed_error!("Invalid UTF-8 at #Strings offset {}: {}", index, e))
    }
}
