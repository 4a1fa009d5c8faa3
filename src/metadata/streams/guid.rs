//! GUID Heap (`#GUID`) for .NET Metadata
//!
//! Provides access to the ECMA-335 `#GUID` heap, which stores 128-bit GUIDs. The rebuild
//! core reads module MVIDs, document hash-algorithm identifiers, document language
//! identifiers and custom-debug-information kinds out of this heap.
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{Error::OutOfBounds, Result};

/// '#GUID' is a heap containing a sequence of 128-bit GUIDs, addressed by 1-based index.
pub struct GuidHeap<'a> {
    data: &'a [u8],
}

impl<'a> GuidHeap<'a> {
    /// Create a `GuidHeap` object from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data'    - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns an error if the data is too small to contain a single GUID (16 bytes)
    pub fn from(data: &'a [u8]) -> Result<GuidHeap<'a>> {
        if data.len() < 16 {
            return Err(malformed_error!("Data for #GUID heap is too small"));
        }

        Ok(GuidHeap { data })
    }

    /// Returns the GUID at the specified 1-based index.
    ///
    /// ## Arguments
    /// * 'index' - The index of the GUID within the heap (comes from metadata tables)
    ///
    /// # Errors
    /// Returns an error if the index is zero or out of bounds.
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index == 0 {
            return Err(OutOfBounds);
        }

        let start = (index - 1) * 16;
        let Some(end) = start.checked_add(16) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let mut buffer = [0u8; 16];
        buffer.copy_from_slice(&self.data[start..end]);

        Ok(uguid::Guid::from_bytes(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: [u8; 32] = [
            0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6, 0x99, 0xbe, 0xa5,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ];

        let guids = GuidHeap::from(&data).unwrap();

        assert_eq!(
            guids.get(1).unwrap(),
            uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5")
        );
        assert_eq!(
            guids.get(2).unwrap(),
            uguid::guid!("AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA")
        );
        assert!(guids.get(3).is_err());
        assert!(guids.get(0).is_err());
    }

    #[test]
    fn rejects_short_heap() {
        assert!(GuidHeap::from(&[0u8; 15]).is_err());
    }
}
