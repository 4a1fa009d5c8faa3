// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # dotrebuild
//!
//! A cross-platform library for verifying deterministic rebuilds of .NET assemblies.
//! Given a compiled PE image and its Portable PDB (embedded or standalone), `dotrebuild`
//! reconstructs the exact compiler invocation that must have produced it - options, sources
//! and references - re-runs the equivalent compilation through a caller-supplied compiler
//! service, and emits a byte-for-byte-comparable output. Built in pure Rust, without
//! requiring Windows or the .NET runtime.
//!
//! ## Features
//!
//! - **Binary-format parsing** - PE headers, ECMA-335 metadata streams and Portable PDB
//!   custom debug information, with strict layout contracts and no tolerance for ambiguity
//! - **Invocation reconstruction** - A complete, semantically faithful compiler
//!   configuration recovered from the flattened options blob, with cross-validation and
//!   explicit failure for anything unparseable
//! - **Deterministic re-emission** - Structural metadata of the original image (resources,
//!   subsystem version, source link, embedded texts) pinned so independent rebuilds match
//! - **Memory safe** - Bounds-checked reads everywhere; corrupt inputs fail with typed
//!   errors instead of reading out of bounds
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotrebuild::prelude::*;
//! use std::path::Path;
//!
//! let pe = File::from_file(Path::new("MyAssembly.dll"))?;
//! let pdb = pe.embedded_pdb()?.expect("assembly has an embedded PDB");
//!
//! let reader = CompilationOptionsReader::new(&pe, &pdb)?;
//! println!("Original language: {}", reader.language_name()?);
//! println!("Source files: {}", reader.source_file_count()?);
//!
//! for reference in reader.metadata_reference_info()? {
//!     println!("Reference: {} ({})", reference.name, reference.mvid);
//! }
//! # Ok::<(), dotrebuild::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `dotrebuild` is organized into three layers:
//!
//! - [`file`] - PE image access: backends, RVA translation, debug directory, embedded-PDB
//!   extraction, and the [`Parser`] cursor every binary format is decoded with
//! - [`metadata`] - ECMA-335 metadata parsing for both the PE image and the Portable PDB:
//!   heaps, tables and the well-known GUID registry
//! - [`rebuild`] - The verification core: options reconstruction
//!   ([`rebuild::reader::CompilationOptionsReader`],
//!   [`rebuild::factory::CompilationFactory`]), artifact resolution and cross-validation,
//!   and deterministic re-emission ([`rebuild::emit::RebuildEmitter`])
//!
//! The compiler itself is out of scope: compilation is an opaque, deterministic service
//! call behind the [`rebuild::emit::CompilerService`] trait, and locating source texts and
//! reference images belongs to the caller's [`rebuild::resolver::ArtifactResolver`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Failures propagate uncaught through
//! the pipeline: there is no internal retry or recovery logic anywhere in this core, and
//! "recovery" is solely the driver's choice to skip an assembly and continue with the next.
//!
//! ```rust,no_run
//! use dotrebuild::{Error, File};
//!
//! match File::from_file(std::path::Path::new("MyAssembly.dll")) {
//!     Ok(pe) => println!("Loaded {} bytes", pe.len()),
//!     Err(Error::NotSupported) => println!("File format not supported"),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed file: {}", message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dotrebuild::prelude::*;
///
/// let pe = File::from_file("MyAssembly.dll".as_ref())?;
/// println!("Embedded PDB present: {}", pe.has_embedded_pdb()?);
/// # Ok::<(), dotrebuild::Error>(())
/// ```
pub mod prelude;

/// Definitions, parsing and mapping of ECMA-335 metadata for PE images and Portable PDBs.
///
/// # Key Components
///
/// - [`metadata::MetadataImage`] - One parsed metadata directory (root, heaps, tables)
/// - [`metadata::streams`] - `#Strings`, `#Blob`, `#GUID` heaps and the `#~` tables stream
/// - [`metadata::tables`] - Raw row readers for the tables the rebuild consumes
/// - [`metadata::guids`] - The compiled-in well-known GUID registry
/// - [`metadata::pdbheader::PdbHeader`] - PDB identity, entry point and external row counts
pub mod metadata;

/// The rebuild verification core: options reconstruction, artifact resolution and
/// deterministic re-emission.
///
/// # Key Components
///
/// - [`rebuild::reader::CompilationOptionsReader`] - Extracts options, sources, references,
///   resources and entry-point information from a PE + PDB pair
/// - [`rebuild::factory::CompilationFactory`] - Rebuilds the compiler configuration with
///   explicit defaults and fail-closed handling of unknown values
/// - [`rebuild::emit::RebuildEmitter`] - Drives the opaque compiler service to emit a
///   byte-comparable image
/// - [`rebuild::RebuildPipeline`] - One assembly's end-to-end rebuild attempt
pub mod rebuild;

/// `dotrebuild` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `dotrebuild` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for binary parsing, invocation reconstruction and re-emission.
pub use error::Error;

/// PE image access and low-level parsing utilities.
///
/// The [`File`] type wraps a loaded PE image; the [`Parser`] cursor decodes metadata
/// streams and debug-information blobs.
pub use file::{parser::Parser, File};
