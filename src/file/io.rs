//! Low-level byte order utilities for PE and metadata parsing.
//!
//! This module provides bounds-checked little-endian reads for the primitive types that PE
//! headers and ECMA-335 metadata structures are built from. All access goes through the
//! [`crate::file::io::BinIO`] trait, which converts byte slices into typed values without
//! ever reading past the end of the buffer.
//!
//! # Key Components
//!
//! - [`crate::file::io::BinIO`] - Trait converting fixed-width byte arrays into primitive values
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset, advancing the offset
//! - [`crate::file::io::read_le_at_dyn`] - Read a 2 or 4 byte index depending on heap width
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dotrebuild::file::io::read_le_at;
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let first: u16 = read_le_at(&data, &mut offset)?;  // offset: 0 -> 2
//! let second: u16 = read_le_at(&data, &mut offset)?; // offset: 2 -> 4
//! let third: u32 = read_le_at(&data, &mut offset)?;  // offset: 4 -> 8
//! # Ok::<(), dotrebuild::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All functions return [`crate::Result<T>`] and fail with [`crate::Error::OutOfBounds`] if
//! there are insufficient bytes in the buffer to complete the operation. A failed read never
//! advances the offset.

use crate::Result;

/// Trait for primitive types that can be decoded from little-endian bytes.
///
/// Implemented for the unsigned and signed integer widths that appear in PE headers and
/// metadata tables. The associated `Bytes` array pins the exact on-disk width of each type.
pub trait BinIO: Sized {
    /// The fixed-width byte array this type is decoded from.
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Decode a value from its little-endian byte representation.
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_bin_io {
    ($($t:ty),*) => {
        $(
            impl BinIO for $t {
                type Bytes = [u8; std::mem::size_of::<$t>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$t>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_bin_io!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Read a value of type `T` from the start of `data` in little-endian format.
///
/// # Arguments
/// * `data` - The byte slice to read from
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than the width of `T`.
pub fn read_le<T: BinIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0;
    read_le_at(data, &mut offset)
}

/// Read a value of type `T` at `offset` in little-endian format, advancing `offset` past it.
///
/// # Arguments
/// * `data` - The byte slice to read from
/// * `offset` - The position to read at; advanced by the width of `T` on success
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer bytes than the width of `T` remain. The
/// offset is left unchanged on failure.
pub fn read_le_at<T: BinIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let mut buffer = T::Bytes::default();
    let width = buffer.as_ref().len();

    let Some(end) = offset.checked_add(width) else {
        return Err(out_of_bounds_error!());
    };

    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    buffer.as_mut().copy_from_slice(&data[*offset..end]);
    *offset = end;

    Ok(T::from_le_bytes(buffer))
}

/// Read a 2 or 4 byte unsigned index at `offset`, advancing `offset` past it.
///
/// Metadata table rows store heap and table indexes as either `u16` or `u32` depending on
/// heap sizes and row counts; the `large` flag selects which width to read.
///
/// # Arguments
/// * `data` - The byte slice to read from
/// * `offset` - The position to read at; advanced by 2 or 4 on success
/// * `large` - `true` to read a 4 byte index, `false` for 2 bytes
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if insufficient bytes remain.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, large: bool) -> Result<u32> {
    if large {
        read_le_at::<u32>(data, offset)
    } else {
        Ok(u32::from(read_le_at::<u16>(data, offset)?))
    }
}
