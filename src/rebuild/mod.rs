//! Deterministic rebuild reconstruction and re-emission.
//!
//! This module is the core of the library: given a PE image and its Portable PDB, it
//! reconstructs the exact compiler invocation that must have produced the image, re-runs
//! the equivalent compilation through a caller-supplied [`emit::CompilerService`], and
//! writes a byte-comparable output.
//!
//! # Pipeline
//!
//! One rebuild attempt moves through a fixed sequence of stages:
//!
//! ```text
//! Start -> OptionsRead -> ArtifactsResolved -> CompilationBuilt -> Emitted -> {Verified | Failed}
//! ```
//!
//! Any parse or resolve failure before `Emitted` moves directly to `Failed` with a typed
//! reason; there is no retry anywhere in this core. Recovery is solely the driver's choice
//! to skip the assembly and continue with the next one. Byte-comparing the emitted image
//! against the original is the driver's job; [`RebuildPipeline::mark_verified`] records its
//! verdict.
//!
//! # Key Components
//!
//! - [`reader::CompilationOptionsReader`] - Extracts everything the rebuild needs from the
//!   PE image and PDB
//! - [`options::OptionsTable`] - The decoded compilation-options key/value pairs
//! - [`factory::CompilationFactory`] - Reconstructs compiler options and builds trees and
//!   compilations
//! - [`resolver::ArtifactResolver`] - Caller-supplied source and reference resolution
//! - [`emit::RebuildEmitter`] - Drives the compiler service's deterministic emission
//! - [`RebuildPipeline`] - Ties the stages together for one assembly

pub mod emit;
pub mod factory;
pub mod options;
pub mod reader;
pub mod references;
pub mod resolver;
pub mod sources;

use std::cell::Cell;
use std::io::Write;

use crate::{
    rebuild::{
        emit::{CancellationToken, CompilerService, EmitOutcome, EmitRequest, RebuildEmitter},
        factory::CompilationFactory,
        reader::CompilationOptionsReader,
        resolver::{ArtifactResolver, RebuildArtifactSet},
        sources::SourceText,
    },
    Result,
};

/// The stages of one rebuild attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStage {
    /// Nothing has happened yet
    Start,
    /// Compilation options were read and the factory was built
    OptionsRead,
    /// All sources and references were resolved and validated
    ArtifactsResolved,
    /// The compilation object was constructed
    CompilationBuilt,
    /// A complete image was emitted to the output stream
    Emitted,
    /// The driver byte-compared the output against the original successfully
    Verified,
    /// The attempt failed; terminal for this assembly
    Failed,
}

/// Drives one complete rebuild attempt for a single assembly.
///
/// The pipeline owns no artifacts itself; PE/PDB buffers, the resolver, the compiler
/// service and the output stream all belong to the caller.
pub struct RebuildPipeline<'a, S: CompilerService> {
    reader: &'a CompilationOptionsReader<'a>,
    service: &'a S,
    stage: Cell<RebuildStage>,
}

impl<'a, S: CompilerService> RebuildPipeline<'a, S> {
    /// Creates a pipeline over a reader and a compiler service.
    #[must_use]
    pub fn new(reader: &'a CompilationOptionsReader<'a>, service: &'a S) -> Self {
        RebuildPipeline {
            reader,
            service,
            stage: Cell::new(RebuildStage::Start),
        }
    }

    /// The stage the pipeline has reached.
    #[must_use]
    pub fn stage(&self) -> RebuildStage {
        self.stage.get()
    }

    /// Records the driver's successful byte-comparison verdict.
    ///
    /// Only meaningful after a successful [`RebuildPipeline::run`].
    pub fn mark_verified(&self) {
        if self.stage.get() == RebuildStage::Emitted {
            self.stage.set(RebuildStage::Verified);
        }
    }

    /// Runs the rebuild: reconstruct options, resolve artifacts, compile, emit.
    ///
    /// On failure the pipeline moves to [`RebuildStage::Failed`] and the typed error
    /// propagates to the caller; nothing is retried and the output stream contents are
    /// unspecified only if emission itself began.
    ///
    /// # Arguments
    /// * `resolver` - The caller-supplied artifact resolver
    /// * `output` - The caller-owned stream receiving the rebuilt image
    /// * `cancel` - Cancellation signal honored by the emission step
    ///
    /// # Errors
    /// Propagates every error of the underlying stages; see [`crate::Error`].
    pub fn run<R>(
        &self,
        resolver: &mut R,
        output: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<EmitOutcome>
    where
        R: ArtifactResolver<Reference = S::Reference>,
    {
        let result = self.run_stages(resolver, output, cancel);
        if result.is_err() {
            self.stage.set(RebuildStage::Failed);
        }
        result
    }

    fn run_stages<R>(
        &self,
        resolver: &mut R,
        output: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<EmitOutcome>
    where
        R: ArtifactResolver<Reference = S::Reference>,
    {
        let options = self.reader.compilation_options()?;
        let factory = CompilationFactory::create(&self.reader.assembly_name()?, options)?;
        self.stage.set(RebuildStage::OptionsRead);

        let RebuildArtifactSet {
            sources,
            references,
        } = self.reader.resolve_artifacts(resolver)?;
        self.stage.set(RebuildStage::ArtifactsResolved);

        let trees = factory.create_syntax_trees(self.service, &sources)?;
        let compilation = factory.create_compilation(self.service, trees, references)?;
        self.stage.set(RebuildStage::CompilationBuilt);

        let manifest_resources = self.reader.manifest_resources()?;
        let source_link = self.reader.source_link_utf8()?;
        let win32_resources = self.reader.win32_resources()?;
        let debug_entry_point = self.reader.main_method_info()?;
        let settings = self.reader.emit_settings()?;

        let embedded_texts: Vec<(&str, &SourceText)> = sources
            .iter()
            .filter(|source| source.embeddable)
            .map(|source| (source.info.original_path.as_str(), &source.text))
            .collect();

        let request = EmitRequest {
            win32_resources,
            manifest_resources: &manifest_resources,
            source_link,
            embedded_texts,
            debug_entry_point: debug_entry_point.as_ref(),
            settings,
        };

        let outcome = RebuildEmitter::new(self.service).emit(&compilation, &request, output, cancel)?;
        self.stage.set(RebuildStage::Emitted);

        Ok(outcome)
    }
}
