//! Blob Heap (`#Blob`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#Blob` heap, which stores binary data referenced by
//! metadata tables. The rebuild core reads document names, document hashes, public keys and
//! custom-debug-information payloads out of this heap.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// '#Blob' points to streams of bytes. Each valid blob is pointed to by a metadata table
/// index and carries its size encoded as an ECMA-335 compressed integer in its first bytes.
///
/// * If the first byte is 0bbbbbbb, the blob contains bbbbbbb bytes of data.
/// * If the first two bytes are 10bbbbbb and x, the blob contains (bbbbbb << 8 + x) bytes.
/// * If the first four bytes are 110bbbbb, x, y, z, the blob contains
///   (bbbbb << 24 + x << 16 + y << 8 + z) bytes.
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` object from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data'    - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns an error if the data is empty or doesn't start with a NUL byte (invalid blob
    /// heap format)
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get a view into the bytes contained at the provided location.
    ///
    /// ## Arguments
    /// * 'index' - The offset within the heap to be accessed (comes from metadata tables)
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the length prefix points past the
    /// end of the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index > self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        let skip = parser.pos();

        let Some(data_start) = index.checked_add(skip) else {
            return Err(OutOfBounds);
        };

        let Some(data_end) = data_start.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if data_start > self.data.len() || data_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[data_start..data_end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        let data = &[0u8, 0x03, 0x41, 0x42, 0x43, 0x02, 0x44, 0x45];
        let blob = Blob::from(data).unwrap();

        assert_eq!(blob.get(1).unwrap(), &[0x41, 0x42, 0x43]);
        assert_eq!(blob.get(5).unwrap(), &[0x44, 0x45]);
        assert_eq!(blob.get(0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn rejects_bad_start() {
        assert!(Blob::from(&[0x01, 0x41]).is_err());
        assert!(Blob::from(&[]).is_err());
    }

    #[test]
    fn length_prefix_out_of_bounds() {
        let data = &[0u8, 0x7F, 0x41];
        let blob = Blob::from(data).unwrap();
        assert!(blob.get(1).is_err());
    }
}
