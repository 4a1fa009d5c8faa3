//! Re-emission driver and the opaque compiler service interface.
//!
//! The actual compiler is a black box to this library: it accepts reconstructed options,
//! source texts and references, and produces a binary. This module defines that seam
//! ([`CompilerService`]), the structural metadata forwarded from the original image
//! ([`EmitRequest`] / [`EmitSettings`]), and the [`RebuildEmitter`] that drives one
//! deterministic emission and enforces the diagnostics contract.
//!
//! Determinism is the invariant everything here serves: the same inputs must always produce
//! byte-identical output, so the emitter forwards the original's Win32 resources, subsystem
//! version, high-entropy-VA flag, manifest resources, source link and embedded texts
//! unchanged, and never lets the rebuild's own diagnostics alter what gets written.

use std::io::Write;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    rebuild::factory::{CompilationOptionsSnapshot, ParseSettings, SourceLanguage},
    rebuild::reader::MainMethodInfo,
    rebuild::resolver::ResolvedReference,
    rebuild::sources::SourceText,
    Error, Result,
};

/// Cooperative cancellation signal for the long-running emit call.
///
/// Cloning shares the underlying flag. The core checks the token before and during
/// emission; a partially-written output stream after cancellation is invalid and must be
/// discarded by the caller, who owns the stream.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`Error::Cancelled`] if cancellation has been signalled.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] when cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Severity of one diagnostic reported by the compiler service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    /// Not user-visible
    Hidden,
    /// Informational
    Info,
    /// Warning; never fatal for a rebuild
    Warning,
    /// Error; fails the rebuild
    Error,
}

/// One diagnostic reported by the compiler service during the rebuild compile.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity class
    pub severity: DiagnosticSeverity,
    /// Compiler diagnostic id, e.g. `CS0219`
    pub id: String,
    /// Rendered message
    pub message: String,
}

/// Outcome of one emit call.
#[derive(Debug, Clone)]
pub struct EmitOutcome {
    /// `true` if the service wrote a complete image
    pub success: bool,
    /// Every diagnostic the service reported
    pub diagnostics: Vec<Diagnostic>,
}

impl EmitOutcome {
    /// Counts the error-severity diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }
}

/// How debug information is attached to the rebuilt image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugInformationKind {
    /// Portable PDB embedded into the PE image
    Embedded,
    /// Standalone Portable PDB next to the image
    PortablePdb,
}

/// Structural emit settings pinned from the original image.
#[derive(Debug, Clone, Copy)]
pub struct EmitSettings {
    /// Debug information placement, mirroring the original
    pub debug_information: DebugInformationKind,
    /// High-entropy virtual address flag from the original optional header
    pub high_entropy_va: bool,
    /// Major and minor subsystem version from the original optional header
    pub subsystem_version: (u16, u16),
}

/// One manifest resource of the original image, re-emitted byte for byte.
#[derive(Debug, Clone)]
pub struct ManifestResourceInfo {
    /// Resource name
    pub name: String,
    /// `true` if the resource is exported from the assembly
    pub public: bool,
    /// The raw resource payload
    pub data: Vec<u8>,
}

/// Everything the compiler service needs beyond the compilation itself to reproduce the
/// original image's structure.
pub struct EmitRequest<'a> {
    /// Raw Win32 resource directory bytes of the original image
    pub win32_resources: Option<&'a [u8]>,
    /// Manifest resources of the original image, in table order
    pub manifest_resources: &'a [ManifestResourceInfo],
    /// Source link JSON payload of the original PDB
    pub source_link: Option<&'a [u8]>,
    /// Paths and texts to embed into the rebuilt PDB, in document order
    pub embedded_texts: Vec<(&'a str, &'a SourceText)>,
    /// Debug entry point, set only when an exact type and method match was found
    pub debug_entry_point: Option<&'a MainMethodInfo>,
    /// Structural settings pinned from the original image
    pub settings: EmitSettings,
}

/// The opaque compiler service this library drives.
///
/// Implementations wrap an actual compiler. The service must honor the deterministic-build
/// contract: emitting the same compilation with the same request twice produces
/// byte-identical output.
pub trait CompilerService {
    /// The service's syntax tree type.
    type SyntaxTree;
    /// The service's metadata reference type.
    type Reference;
    /// The service's compilation type.
    type Compilation;

    /// Parses one source text into a syntax tree.
    ///
    /// # Errors
    /// Returns an error if the text cannot be parsed under the given settings.
    fn create_syntax_tree(
        &self,
        path: &str,
        text: &SourceText,
        settings: &ParseSettings,
        language: SourceLanguage,
    ) -> Result<Self::SyntaxTree>;

    /// Builds a compilation from trees, references and the reconstructed options.
    ///
    /// # Errors
    /// Returns an error if the compilation cannot be constructed.
    fn create_compilation(
        &self,
        assembly_name: &str,
        trees: Vec<Self::SyntaxTree>,
        references: Vec<ResolvedReference<Self::Reference>>,
        options: &CompilationOptionsSnapshot,
    ) -> Result<Self::Compilation>;

    /// Emits the compilation into `output`.
    ///
    /// # Errors
    /// Returns an error for infrastructure failures; compilation problems are reported
    /// through the returned [`EmitOutcome`] diagnostics instead.
    fn emit(
        &self,
        compilation: &Self::Compilation,
        request: &EmitRequest<'_>,
        output: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<EmitOutcome>;
}

/// Drives one deterministic emission through a [`CompilerService`].
pub struct RebuildEmitter<'a, S: CompilerService> {
    service: &'a S,
}

impl<'a, S: CompilerService> RebuildEmitter<'a, S> {
    /// Creates an emitter over the given service.
    #[must_use]
    pub fn new(service: &'a S) -> RebuildEmitter<'a, S> {
        RebuildEmitter { service }
    }

    /// Emits `compilation` into `output` and enforces the diagnostics contract.
    ///
    /// Warnings are carried through in the outcome and never fail the rebuild; the original
    /// compile's diagnostics were the ones that mattered, and the rebuild's own diagnostics
    /// must not alter emitted bytes.
    ///
    /// # Errors
    /// Returns [`Error::Cancelled`] if the token is signalled before emission,
    /// [`Error::CompilationHadErrors`] if the service reports error-severity diagnostics or
    /// an unsuccessful emit, and any infrastructure error from the service itself.
    pub fn emit(
        &self,
        compilation: &S::Compilation,
        request: &EmitRequest<'_>,
        output: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<EmitOutcome> {
        cancel.check()?;

        let outcome = self.service.emit(compilation, request, output, cancel)?;

        let errors = outcome.error_count();
        if errors > 0 {
            return Err(Error::CompilationHadErrors(errors));
        }

        if !outcome.success {
            return Err(Error::CompilationHadErrors(0));
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_signals_all_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(token.check().is_ok());
        clone.cancel();

        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn outcome_error_count() {
        let outcome = EmitOutcome {
            success: false,
            diagnostics: vec![
                Diagnostic {
                    severity: DiagnosticSeverity::Warning,
                    id: "CS0219".to_string(),
                    message: "unused variable".to_string(),
                },
                Diagnostic {
                    severity: DiagnosticSeverity::Error,
                    id: "CS0103".to_string(),
                    message: "name does not exist".to_string(),
                },
            ],
        };

        assert_eq!(outcome.error_count(), 1);
    }
}
