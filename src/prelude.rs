//! # dotrebuild Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotrebuild library. Import this module to get quick access to the essential
//! types for rebuild verification.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotrebuild operations
pub use crate::Error;

/// The result type used throughout dotrebuild
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// PE image access and low-level parsing utilities
pub use crate::{File, Parser};

/// Single entry point over a PE image and its Portable PDB
pub use crate::rebuild::reader::{CompilationOptionsReader, MainMethodInfo};

/// One assembly's end-to-end rebuild attempt
pub use crate::rebuild::{RebuildPipeline, RebuildStage};

// ================================================================================================
// Invocation Reconstruction
// ================================================================================================

/// Decoded compilation options and their well-known key names
pub use crate::rebuild::options::OptionsTable;

/// Compiler configuration reconstruction
pub use crate::rebuild::factory::{
    CompilationFactory, CompilationOptionsSnapshot, LanguageOptions, OptimizationLevel,
    OutputKind, ParseSettings, PlatformKind, SourceLanguage,
};

// ================================================================================================
// Artifacts and Descriptors
// ================================================================================================

/// Source descriptors, source text and embedded source
pub use crate::rebuild::sources::{
    EmbeddedSourceFile, HashAlgorithm, SourceFileInfo, SourceText,
};

/// Metadata reference descriptors
pub use crate::rebuild::references::{MetadataImageKind, MetadataReferenceInfo};

/// Caller-supplied artifact resolution
pub use crate::rebuild::resolver::{
    ArtifactResolver, RebuildArtifactSet, ResolvedReference, ResolvedSourceText,
};

// ================================================================================================
// Emission
// ================================================================================================

/// The opaque compiler service seam and re-emission driver
pub use crate::rebuild::emit::{
    CancellationToken, CompilerService, Diagnostic, DiagnosticSeverity, EmitOutcome,
    EmitRequest, EmitSettings, ManifestResourceInfo, RebuildEmitter,
};

// ================================================================================================
// Metadata System
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// One parsed metadata directory
pub use crate::metadata::MetadataImage;
