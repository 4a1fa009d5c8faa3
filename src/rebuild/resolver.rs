//! Artifact resolution interfaces for rebuild verification.
//!
//! The rebuild core never performs file or network I/O itself: turning a source descriptor
//! into text, or a reference descriptor into an actual metadata image, is delegated to a
//! caller-supplied [`ArtifactResolver`]. The core's contribution is cross-validation: every
//! resolved artifact is checked against its descriptor before the compiler service ever
//! sees it, and any mismatch aborts the whole rebuild.

use crate::{
    rebuild::references::MetadataReferenceInfo,
    rebuild::sources::{SourceFileInfo, SourceText},
    Result,
};

/// Caller-supplied resolver mapping descriptors to actual artifacts.
///
/// # Contract
///
/// - The returned source text's checksum under the descriptor's declared algorithm must
///   equal the descriptor's recorded hash.
/// - The returned reference's extern alias and embed-interop-types flag must equal the
///   descriptor's.
///
/// Both contracts are enforced by the core after each call; violations fail the rebuild
/// with [`crate::Error::SourceHashMismatch`] or [`crate::Error::ReferenceMetadataMismatch`].
pub trait ArtifactResolver {
    /// The compiler service's metadata reference type.
    type Reference;

    /// Resolves a source descriptor to its text.
    ///
    /// # Errors
    /// Implementations return an error when the source cannot be located.
    fn resolve_source_text(&mut self, info: &SourceFileInfo) -> Result<SourceText>;

    /// Resolves a reference descriptor to an actual metadata reference.
    ///
    /// # Errors
    /// Implementations return an error when the referenced image cannot be located.
    fn resolve_metadata_reference(
        &mut self,
        info: &MetadataReferenceInfo,
    ) -> Result<ResolvedReference<Self::Reference>>;
}

/// A resolved metadata reference together with the identity the resolver claims for it.
///
/// The claimed alias and interop flag are compared against the descriptor during
/// cross-validation; the reference itself is opaque to this library.
pub struct ResolvedReference<R> {
    /// The compiler service's reference object
    pub reference: R,
    /// The extern alias the resolved reference is bound under
    pub extern_alias: Option<String>,
    /// Whether the resolved reference embeds interop types
    pub embed_interop_types: bool,
}

/// A source descriptor paired with its resolved, validated text.
#[derive(Debug, Clone)]
pub struct ResolvedSourceText {
    /// The descriptor this text was resolved from
    pub info: SourceFileInfo,
    /// The validated source text
    pub text: SourceText,
    /// `true` if this text should be embedded into the rebuilt PDB
    pub embeddable: bool,
}

/// The complete, ordered input set of one rebuild attempt.
///
/// Ordering follows the descriptor order exactly: documents in PDB order, references in
/// record order. Re-emission depends on that stability.
pub struct RebuildArtifactSet<R> {
    /// Resolved sources, one per document of the original compile unit
    pub sources: Vec<ResolvedSourceText>,
    /// Resolved references, one per descriptor (one per alias)
    pub references: Vec<ResolvedReference<R>>,
}
