use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into three groups: binary-format failures raised while parsing the PE
/// image or Portable PDB, rebuild-contract failures raised while reconstructing or
/// cross-validating the original compiler invocation, and failures reported by the external
/// compiler service during re-emission.
///
/// # Error Categories
///
/// ## Binary Parsing Errors
/// - [`Error::OutOfBounds`] - A fixed-width read ran past the end of the data
/// - [`Error::Malformed`] - Corrupted or invalid binary structure
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## Rebuild Reconstruction Errors
/// - [`Error::MissingCompilationOptions`] - The PDB carries no compilation-options blob
/// - [`Error::InvalidCompilationOptions`] - The options blob is structurally invalid
/// - [`Error::MissingRequiredOption`] - A required option key is absent or ambiguous
/// - [`Error::UnknownOrMissingLanguage`] / [`Error::UnsupportedLanguage`] - Language tag problems
/// - [`Error::UnrecognizedOptimizationLevel`] / [`Error::UnrecognizedOption`] - Present but
///   unparseable closed-set option values
/// - [`Error::UnsupportedOption`] - An option whose semantics this library refuses to guess
///
/// ## Cross-Validation and Emission Errors
/// - [`Error::SourceHashMismatch`] / [`Error::ReferenceMetadataMismatch`] - Resolved artifacts
///   disagree with their descriptors
/// - [`Error::CorruptEmbeddedSource`] / [`Error::CorruptResourceTable`] /
///   [`Error::UnexpectedReferenceFlags`] - Binary invariants violated beyond truncation
/// - [`Error::CompilationHadErrors`] - The compiler service reported error diagnostics
///
/// # Examples
///
/// ```rust,no_run
/// use dotrebuild::{Error, File};
/// use std::path::Path;
///
/// match File::from_file(Path::new("assembly.dll")) {
///     Ok(pe) => println!("Loaded PE image"),
///     Err(Error::NotSupported) => eprintln!("File format is not supported"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An out of bound access was attempted while parsing.
    ///
    /// A fixed-width read (integer, GUID, byte) was requested with fewer bytes remaining than
    /// the field requires. The read never returns a partially-read value.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The data is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// This file type or feature is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// The PDB carries no compilation-options custom debug information.
    ///
    /// This is the primary rebuild gate: without the options blob the original compiler
    /// invocation cannot be reconstructed, and the assembly must be skipped.
    #[error("PDB does not contain a compilation options blob")]
    MissingCompilationOptions,

    /// The compilation-options blob is present but structurally invalid.
    ///
    /// Raised for a dangling key with no value, or an empty key.
    #[error("Invalid compilation options blob: {0}")]
    InvalidCompilationOptions(String),

    /// A required option key is absent, or appears more than once.
    #[error("Required compilation option missing or ambiguous: {0}")]
    MissingRequiredOption(String),

    /// The `language` option key is missing or does not appear exactly once.
    #[error("PDB does not record a unique source language")]
    UnknownOrMissingLanguage,

    /// The recorded source language is not one this library can rebuild.
    #[error("Unsupported source language: {0}")]
    UnsupportedLanguage(String),

    /// The recorded optimization level string is not a known value.
    ///
    /// Absent values receive defaults; present but unparseable values are always fatal.
    #[error("Unrecognized optimization level: {0}")]
    UnrecognizedOptimizationLevel(String),

    /// A closed-set option value is present but not parseable.
    ///
    /// Absent values receive defaults; present but unparseable values are always fatal.
    #[error("Unrecognized value for option '{key}': {value}")]
    UnrecognizedOption {
        /// The option key whose value failed to parse
        key: String,
        /// The unparseable value as recorded in the PDB
        value: String,
    },

    /// An option is recorded whose semantics this library refuses to guess.
    ///
    /// Fails closed rather than silently ignoring the option.
    #[error("Compilation option is not supported: {0}")]
    UnsupportedOption(&'static str),

    /// A resolved source text's checksum does not match the hash recorded in the PDB.
    ///
    /// Indicates a resolver bug or a genuinely different source file. The rebuild must abort
    /// rather than proceed with mismatched inputs.
    #[error("Source hash mismatch for '{0}'")]
    SourceHashMismatch(String),

    /// A resolved metadata reference's identity does not match its descriptor.
    ///
    /// The returned extern alias or embed-interop-types flag disagrees with what the PDB
    /// recorded for this reference.
    #[error("Reference metadata mismatch for '{0}'")]
    ReferenceMetadataMismatch(String),

    /// An embedded-source blob failed to decompress, or its decompressed length does not
    /// match the declared uncompressed size.
    #[error("Corrupt embedded source: {0}")]
    CorruptEmbeddedSource(String),

    /// The manifest-resource table points outside the resources directory, or a resource
    /// length prefix is invalid.
    #[error("Corrupt manifest resource table: {0}")]
    CorruptResourceTable(String),

    /// The packed flag byte of a metadata-reference record has bits set beyond the two
    /// defined ones.
    #[error("Unexpected metadata reference flags: 0x{0:02X}")]
    UnexpectedReferenceFlags(u8),

    /// The compiler service reported error-severity diagnostics during the rebuild compile.
    #[error("Rebuild compilation reported {0} error diagnostic(s)")]
    CompilationHadErrors(usize),

    /// A code path that exists only to satisfy an interface contract was exercised.
    ///
    /// Distinct from user-facing errors: reaching this is a programming error in the caller,
    /// never a data problem.
    #[error("Programming contract violation: {0}")]
    ContractViolation(&'static str),

    /// The operation was cancelled via its cancellation token.
    #[error("Operation was cancelled")]
    Cancelled,
}
