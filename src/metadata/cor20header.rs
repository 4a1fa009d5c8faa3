//! CLR 2.0 (Cor20) header parsing for .NET assemblies.
//!
//! This module defines the [`Cor20Header`] struct, which represents the main header for .NET
//! assemblies as found in the IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR data directory of PE files.
//! The rebuild core reads it to locate the metadata root, the manifest-resources directory and
//! the native entry point token.
//!
//! # Reference
//! - [ECMA-335 II.24](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// The main header of CIL, located at the beginning of the `IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR`
/// data directory of PE files.
///
/// This struct contains all fields defined by the ECMA-335 standard for the CLR 2.0 header.
pub struct Cor20Header {
    /// Size of header in bytes
    pub cb: u32,
    /// The minimum version of runtime required to run this program
    pub major_runtime_version: u16,
    /// The minor portion of the version
    pub minor_runtime_version: u16,
    /// RVA of the `MetaData`
    pub meta_data_rva: u32,
    /// Size of the `MetaData`
    pub meta_data_size: u32,
    /// Flags describing this runtime
    pub flags: u32,
    /// Token for the `MethodDef` or File of the entry point for the image
    pub entry_point_token: u32,
    /// RVA of implementation specific resources
    pub resource_rva: u32,
    /// Size of implementation specific resources
    pub resource_size: u32,
    /// RVA of the hash data for this pe file used by the CLI loader for binding and versioning
    pub strong_name_signature_rva: u32,
    /// Size of the hash data
    pub strong_name_signature_size: u32,
}

impl Cor20Header {
    /// Create a `Cor20Header` object from a sequence of bytes
    ///
    /// # Arguments
    /// * `data` - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns an error if the data is too short to contain a valid CLR header, or if any
    /// field validation fails per ECMA-335 II.24.3.3.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < 72 {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb != 72 {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;
        if major_runtime_version == 0 || major_runtime_version > 10 {
            return Err(malformed_error!(
                "Invalid major runtime version: {}",
                major_runtime_version
            ));
        }

        let meta_data_rva = parser.read_le::<u32>()?;
        if meta_data_rva == 0 {
            return Err(malformed_error!("Metadata RVA cannot be zero"));
        }

        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_size == 0 {
            return Err(malformed_error!("Metadata size cannot be zero"));
        } else if meta_data_size > 0x1000_0000 {
            return Err(malformed_error!(
                "Metadata size {} exceeds reasonable limit (256MB)",
                meta_data_size
            ));
        }

        let flags = parser.read_le::<u32>()?;
        let entry_point_token = parser.read_le::<u32>()?;

        let resource_rva = parser.read_le::<u32>()?;
        let resource_size = parser.read_le::<u32>()?;
        if (resource_rva == 0 && resource_size != 0) || (resource_rva != 0 && resource_size == 0) {
            return Err(malformed_error!("Resource values are invalid"));
        }

        let strong_name_signature_rva = parser.read_le::<u32>()?;
        let strong_name_signature_size = parser.read_le::<u32>()?;
        if (strong_name_signature_rva == 0 && strong_name_signature_size != 0)
            || (strong_name_signature_rva != 0 && strong_name_signature_size == 0)
        {
            return Err(malformed_error!("Strong name values are invalid"));
        }

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
            entry_point_token,
            resource_rva,
            resource_size,
            strong_name_signature_rva,
            strong_name_signature_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x48, 0x00, 0x00, 0x00, // cb = 72 (0x48)
            0x02, 0x00,             // major_runtime_version = 2
            0x05, 0x00,             // minor_runtime_version = 5
            0x00, 0x20, 0x00, 0x00, // meta_data_rva = 0x2000
            0x00, 0x10, 0x00, 0x00, // meta_data_size = 0x1000
            0x01, 0x00, 0x00, 0x00, // flags = ILONLY
            0x01, 0x00, 0x00, 0x06, // entry_point_token = 0x06000001
            0x00, 0x30, 0x00, 0x00, // resource_rva = 0x3000
            0x00, 0x01, 0x00, 0x00, // resource_size = 0x100
            0x00, 0x00, 0x00, 0x00, // strong_name_signature_rva = 0
            0x00, 0x00, 0x00, 0x00, // strong_name_signature_size = 0
            0x00, 0x00, 0x00, 0x00, // code_manager_table_rva (reserved)
            0x00, 0x00, 0x00, 0x00, // code_manager_table_size (reserved)
            0x00, 0x00, 0x00, 0x00, // vtable_fixups_rva
            0x00, 0x00, 0x00, 0x00, // vtable_fixups_size
            0x00, 0x00, 0x00, 0x00, // export_address_table_jmp_rva (reserved)
            0x00, 0x00, 0x00, 0x00, // export_address_table_jmp_size (reserved)
            0x00, 0x00, 0x00, 0x00, // managed_native_header_rva (reserved)
            0x00, 0x00, 0x00, 0x00, // managed_native_header_size (reserved)
        ];

        let parsed_header = Cor20Header::read(&header_bytes).unwrap();

        assert_eq!(parsed_header.cb, 72);
        assert_eq!(parsed_header.major_runtime_version, 2);
        assert_eq!(parsed_header.meta_data_rva, 0x2000);
        assert_eq!(parsed_header.meta_data_size, 0x1000);
        assert_eq!(parsed_header.entry_point_token, 0x0600_0001);
        assert_eq!(parsed_header.resource_rva, 0x3000);
        assert_eq!(parsed_header.resource_size, 0x100);
    }

    #[test]
    fn rejects_wrong_size() {
        let mut header_bytes = [0u8; 72];
        header_bytes[0] = 0x40; // cb = 64

        assert!(Cor20Header::read(&header_bytes).is_err());
    }

    #[test]
    fn rejects_truncated() {
        assert!(matches!(
            Cor20Header::read(&[0u8; 16]),
            Err(crate::Error::OutOfBounds)
        ));
    }
}
