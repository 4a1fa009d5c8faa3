//! Single entry point over a PE image and its Portable PDB.
//!
//! The [`CompilationOptionsReader`] wraps one loaded PE image plus its Portable PDB metadata
//! (embedded or standalone) and exposes everything a rebuild needs: the recorded compilation
//! options, source-file descriptors, reference descriptors, manifest resources, public key,
//! entry-point information and the source-link payload.
//!
//! The compilation-options blob is the primary gate: a PDB without it cannot be rebuilt, and
//! [`CompilationOptionsReader::compilation_options`] fails with
//! [`Error::MissingCompilationOptions`] so the driver skips the assembly. Parsed blobs are
//! cached for the reader's lifetime; instances are confined to a single task, so the caches
//! need no locking.

use std::cell::{Cell, OnceCell};
use std::collections::HashSet;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        guids,
        streams::TableId,
        tables::{
            decode_document_name, AssemblyRaw, CustomDebugInformationRaw, DocumentRaw,
            ManifestResourceRaw, MethodDefRaw, ModuleRaw, TypeDefRaw,
        },
        token::Token,
        MetadataImage,
    },
    rebuild::{
        emit::{DebugInformationKind, EmitSettings, ManifestResourceInfo},
        options::{keys, OptionsTable},
        references::{parse_metadata_references, MetadataReferenceInfo},
        resolver::{ArtifactResolver, RebuildArtifactSet, ResolvedSourceText},
        sources::{decode_embedded_source, EmbeddedSourceFile, HashAlgorithm, SourceFileInfo},
    },
    Error, Result,
};

/// The only entry-point method name the rebuild will recover.
///
/// Synthesized entry points (top-level statements) are deliberately not guessed at.
pub const WELL_KNOWN_ENTRY_POINT_NAME: &str = "Main";

/// Recovered entry-point information: exact type and method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainMethodInfo {
    /// Namespace-qualified name of the declaring type
    pub type_name: String,
    /// Method name, always [`WELL_KNOWN_ENTRY_POINT_NAME`]
    pub method_name: String,
}

/// Reader over one PE image and its Portable PDB metadata.
///
/// The PE and PDB buffers are supplied externally and must outlive the reader. One instance
/// serves one rebuild attempt; nothing is shared across assemblies.
pub struct CompilationOptionsReader<'a> {
    pe: &'a File,
    cor20: Cor20Header,
    pe_metadata: MetadataImage<'a>,
    pdb: MetadataImage<'a>,
    options: OnceCell<OptionsTable>,
    source_link: OnceCell<Option<Vec<u8>>>,
    options_scans: Cell<u32>,
}

impl<'a> CompilationOptionsReader<'a> {
    /// Creates a reader over a loaded PE image and its Portable PDB bytes.
    ///
    /// For an embedded PDB, extract it first via [`File::embedded_pdb`] and pass the
    /// resulting buffer here; the caller owns both buffers for the reader's lifetime.
    ///
    /// # Arguments
    /// * `pe` - The loaded PE image
    /// * `pdb_data` - The Portable PDB metadata bytes
    ///
    /// # Errors
    /// Returns an error if either metadata directory fails to parse, or if `pdb_data` is
    /// not a Portable PDB (missing `#Pdb` stream).
    pub fn new(pe: &'a File, pdb_data: &'a [u8]) -> Result<CompilationOptionsReader<'a>> {
        let (cor20, pe_metadata) = MetadataImage::from_pe(pe)?;
        let pdb = MetadataImage::parse(pdb_data)?;

        if pdb.pdb_header().is_none() {
            return Err(malformed_error!(
                "Debug metadata does not contain a #Pdb stream"
            ));
        }

        Ok(CompilationOptionsReader {
            pe,
            cor20,
            pe_metadata,
            pdb,
            options: OnceCell::new(),
            source_link: OnceCell::new(),
            options_scans: Cell::new(0),
        })
    }

    /// The 20-byte PDB identity.
    #[must_use]
    pub fn pdb_id(&self) -> &[u8; 20] {
        // Presence was validated during construction.
        &self.pdb.pdb_header().unwrap().id
    }

    /// The entry-point token the compiler recorded, nil when there is none.
    #[must_use]
    pub fn entry_point_token(&self) -> Token {
        self.pdb.pdb_header().unwrap().entry_point
    }

    /// Locates the payload of a custom-debug-information record by parent and kind.
    fn find_custom_debug_info(
        &self,
        parent_table: TableId,
        parent_rid: u32,
        kind: uguid::Guid,
    ) -> Result<Option<&'a [u8]>> {
        let tables = self.pdb.tables()?;
        if !tables.has_table(TableId::CustomDebugInformation) {
            return Ok(None);
        }

        let guid_heap = self.pdb.guids()?;
        let blob_heap = self.pdb.blob()?;

        for row in tables.read_all_rows::<CustomDebugInformationRaw>()? {
            let Ok((table, rid)) = row.parent_entity() else {
                continue;
            };

            if table != parent_table || rid != parent_rid {
                continue;
            }

            if guid_heap.get(row.kind as usize)? != kind {
                continue;
            }

            return Ok(Some(blob_heap.get(row.value as usize)?));
        }

        Ok(None)
    }

    /// Parses the compilation-options blob attached to the module definition.
    fn scan_compilation_options(&self) -> Result<OptionsTable> {
        self.options_scans.set(self.options_scans.get() + 1);

        let Some(blob) =
            self.find_custom_debug_info(TableId::Module, 1, guids::CDI_COMPILATION_OPTIONS)?
        else {
            return Err(Error::MissingCompilationOptions);
        };

        OptionsTable::parse(blob)
    }

    /// Returns the recorded compilation options, parsing them on first access.
    ///
    /// Subsequent calls return the cached table without rescanning the blob.
    ///
    /// # Errors
    /// Returns [`Error::MissingCompilationOptions`] if the PDB carries no options blob, and
    /// [`Error::InvalidCompilationOptions`] if the blob is structurally invalid.
    pub fn compilation_options(&self) -> Result<&OptionsTable> {
        if let Some(cached) = self.options.get() {
            return Ok(cached);
        }

        let parsed = self.scan_compilation_options()?;
        Ok(self.options.get_or_init(|| parsed))
    }

    /// Number of times the options blob has actually been scanned. Test hook.
    #[doc(hidden)]
    #[must_use]
    pub fn options_scan_count(&self) -> u32 {
        self.options_scans.get()
    }

    /// Returns the recorded source language name.
    ///
    /// # Errors
    /// Returns [`Error::UnknownOrMissingLanguage`] unless the `language` key is present
    /// exactly once.
    pub fn language_name(&self) -> Result<&str> {
        self.compilation_options()?
            .try_get_unique(keys::LANGUAGE)
            .ok_or(Error::UnknownOrMissingLanguage)
    }

    /// Returns the number of source files of the original compile unit.
    ///
    /// Document enumeration is bounded to this count; later documents in the PDB are
    /// synthesized and not part of the original sources.
    ///
    /// # Errors
    /// Returns [`Error::MissingRequiredOption`] when the count is absent or ambiguous, and
    /// [`Error::UnrecognizedOption`] when present but not an integer.
    pub fn source_file_count(&self) -> Result<usize> {
        let options = self.compilation_options()?;
        let value = options.get_unique_required(keys::SOURCE_FILE_COUNT)?;

        value.parse().map_err(|_| Error::UnrecognizedOption {
            key: keys::SOURCE_FILE_COUNT.to_string(),
            value: value.to_string(),
        })
    }

    /// The text encoding recorded for this compilation, if any.
    ///
    /// `default-encoding` wins over `fallback-encoding`; absent both, UTF-8 is assumed.
    fn recorded_encoding(&self) -> Result<Option<String>> {
        let options = self.compilation_options()?;
        Ok(options
            .try_get_unique(keys::DEFAULT_ENCODING)
            .or_else(|| options.try_get_unique(keys::FALLBACK_ENCODING))
            .map(str::to_string))
    }

    /// Returns one descriptor per source file of the original compile unit, in document
    /// order.
    ///
    /// Unrecognized hash-algorithm GUIDs degrade to [`HashAlgorithm::None`] rather than
    /// failing; a missing document row for a counted source is fatal.
    ///
    /// # Errors
    /// Returns an error if the source-file count is unavailable or the document table is
    /// shorter than the count.
    pub fn source_text_info(&self) -> Result<Vec<SourceFileInfo>> {
        let count = self.source_file_count()?;
        let encoding = self.recorded_encoding()?;

        let tables = self.pdb.tables()?;
        let document_count = tables.row_count(TableId::Document) as usize;
        if document_count < count {
            return Err(malformed_error!(
                "PDB has {} documents but the compilation recorded {} source files",
                document_count,
                count
            ));
        }

        let blob_heap = self.pdb.blob()?;
        let guid_heap = self.pdb.guids()?;

        let embedded = self.documents_with_embedded_source()?;

        let mut sources = Vec::with_capacity(count);
        for rid in 1..=count as u32 {
            let document: DocumentRaw = tables.read_row(rid)?;

            let name_blob = blob_heap.get(document.name as usize)?;
            let original_path = decode_document_name(name_blob, blob_heap)?;

            let hash_algorithm = if document.hash_algorithm == 0 {
                HashAlgorithm::None
            } else {
                HashAlgorithm::from_guid(guid_heap.get(document.hash_algorithm as usize)?)
            };

            sources.push(SourceFileInfo {
                document_rid: rid,
                original_path,
                hash_algorithm,
                hash: blob_heap.get(document.hash as usize)?.to_vec(),
                encoding: encoding.clone(),
                has_embedded_source: embedded.contains(&rid),
            });
        }

        Ok(sources)
    }

    /// Collects the rids of documents carrying embedded source.
    fn documents_with_embedded_source(&self) -> Result<HashSet<u32>> {
        let tables = self.pdb.tables()?;
        let mut rids = HashSet::new();

        if !tables.has_table(TableId::CustomDebugInformation) {
            return Ok(rids);
        }

        let guid_heap = self.pdb.guids()?;
        for row in tables.read_all_rows::<CustomDebugInformationRaw>()? {
            let Ok((TableId::Document, rid)) = row.parent_entity() else {
                continue;
            };

            if guid_heap.get(row.kind as usize)? == guids::CDI_EMBEDDED_SOURCE {
                rids.insert(rid);
            }
        }

        Ok(rids)
    }

    /// Materializes the embedded source of a document, if the PDB carries one.
    ///
    /// # Arguments
    /// * `info` - The descriptor of the document to resolve
    ///
    /// # Errors
    /// Returns [`Error::CorruptEmbeddedSource`] if decompression fails or the declared
    /// uncompressed size does not match.
    pub fn resolve_embedded_source(
        &self,
        info: &SourceFileInfo,
    ) -> Result<Option<EmbeddedSourceFile>> {
        let Some(blob) = self.find_custom_debug_info(
            TableId::Document,
            info.document_rid,
            guids::CDI_EMBEDDED_SOURCE,
        )?
        else {
            return Ok(None);
        };

        let mut embedded = decode_embedded_source(blob, info.hash_algorithm)?;
        embedded.text.encoding = info.encoding.clone();
        Ok(Some(embedded))
    }

    /// Returns one descriptor per metadata reference of the original compilation, one per
    /// alias, in record order.
    ///
    /// # Errors
    /// Returns [`Error::MissingCompilationOptions`]-class errors if the PDB lacks debug
    /// metadata entirely, and [`Error::UnexpectedReferenceFlags`] for malformed records.
    /// A PDB without a reference blob yields an empty list.
    pub fn metadata_reference_info(&self) -> Result<Vec<MetadataReferenceInfo>> {
        match self.find_custom_debug_info(TableId::Module, 1, guids::CDI_METADATA_REFERENCES)? {
            Some(blob) => parse_metadata_references(blob),
            None => Ok(Vec::new()),
        }
    }

    /// Returns the source-link JSON payload, if the PDB carries one.
    ///
    /// The payload is located once and cached; it is passed through opaquely.
    ///
    /// # Errors
    /// Returns an error only if the PDB metadata is structurally unreadable.
    pub fn source_link_utf8(&self) -> Result<Option<&[u8]>> {
        if let Some(cached) = self.source_link.get() {
            return Ok(cached.as_deref());
        }

        let payload = self
            .find_custom_debug_info(TableId::Module, 1, guids::CDI_SOURCE_LINK)?
            .map(<[u8]>::to_vec);

        Ok(self.source_link.get_or_init(|| payload).as_deref())
    }

    /// Returns the assembly's public key, or [`None`] for module images and unsigned
    /// assemblies.
    ///
    /// # Errors
    /// Returns an error if the assembly row or its blob cannot be read.
    pub fn public_key(&self) -> Result<Option<Vec<u8>>> {
        let tables = self.pe_metadata.tables()?;
        if tables.row_count(TableId::Assembly) == 0 {
            return Ok(None);
        }

        let assembly: AssemblyRaw = tables.read_row(1)?;
        if assembly.public_key == 0 {
            return Ok(None);
        }

        let key = self.pe_metadata.blob()?.get(assembly.public_key as usize)?;
        if key.is_empty() {
            return Ok(None);
        }

        Ok(Some(key.to_vec()))
    }

    /// The name the rebuilt assembly is emitted under.
    ///
    /// The assembly definition's name when present, otherwise the module name with its
    /// extension stripped.
    ///
    /// # Errors
    /// Returns an error if neither an assembly nor a module row can be read.
    pub fn assembly_name(&self) -> Result<String> {
        let tables = self.pe_metadata.tables()?;
        let strings = self.pe_metadata.strings()?;

        if tables.row_count(TableId::Assembly) > 0 {
            let assembly: AssemblyRaw = tables.read_row(1)?;
            return Ok(strings.get(assembly.name as usize)?.to_string());
        }

        let module: ModuleRaw = tables.read_row(1)?;
        let name = strings.get(module.name as usize)?;
        Ok(match name.rsplit_once('.') {
            Some((stem, _extension)) => stem.to_string(),
            None => name.to_string(),
        })
    }

    /// Walks the manifest-resource table and materializes every embedded resource.
    ///
    /// Each resource's data lives in the CLR resources directory at the row's offset,
    /// prefixed by its own length. Every read is bounds-checked against the directory;
    /// linked (non-embedded) resources are not supported.
    ///
    /// # Errors
    /// Returns [`Error::CorruptResourceTable`] for out-of-range offsets or invalid length
    /// prefixes, and [`Error::NotSupported`] for linked resources.
    pub fn manifest_resources(&self) -> Result<Vec<ManifestResourceInfo>> {
        let tables = self.pe_metadata.tables()?;
        let count = tables.row_count(TableId::ManifestResource);
        if count == 0 {
            return Ok(Vec::new());
        }

        if self.cor20.resource_rva == 0 {
            return Err(Error::CorruptResourceTable(
                "manifest resources recorded but the resources directory is empty".to_string(),
            ));
        }

        let directory_offset = self.pe.rva_to_offset(self.cor20.resource_rva as usize)?;
        let directory = self
            .pe
            .data_slice(directory_offset, self.cor20.resource_size as usize)?;

        let strings = self.pe_metadata.strings()?;

        let mut resources = Vec::with_capacity(count as usize);
        for rid in 1..=count {
            let row: ManifestResourceRaw = tables.read_row(rid)?;

            if row.implementation != 0 {
                return Err(Error::NotSupported);
            }

            let offset = row.data_offset as usize;
            if offset + 4 > directory.len() {
                return Err(Error::CorruptResourceTable(format!(
                    "resource offset {} is outside the resources directory",
                    offset
                )));
            }

            let length = i32::from_le_bytes(directory[offset..offset + 4].try_into().unwrap());
            if length < 0 {
                return Err(Error::CorruptResourceTable(format!(
                    "resource at offset {} has negative length {}",
                    offset, length
                )));
            }

            let data_start = offset + 4;
            let Some(data_end) = data_start.checked_add(length as usize) else {
                return Err(Error::CorruptResourceTable(
                    "resource length causes overflow".to_string(),
                ));
            };
            if data_end > directory.len() {
                return Err(Error::CorruptResourceTable(format!(
                    "resource at offset {} runs past the resources directory",
                    offset
                )));
            }

            resources.push(ManifestResourceInfo {
                name: strings.get(row.name as usize)?.to_string(),
                public: row.flags & 0x7 == 0x1,
                data: directory[data_start..data_end].to_vec(),
            });
        }

        Ok(resources)
    }

    /// Recovers the entry point's type and method name, when it can be done exactly.
    ///
    /// Only a method literally named `Main` is recovered; any other recorded entry point
    /// (synthesized top-level-statement entry points included) yields [`None`] rather than
    /// a guess.
    ///
    /// # Errors
    /// Returns an error if the referenced method or type rows cannot be read.
    pub fn main_method_info(&self) -> Result<Option<MainMethodInfo>> {
        let token = self.entry_point_token();
        if token.is_null() || TableId::from_id(token.table()) != Some(TableId::MethodDef) {
            return Ok(None);
        }

        let tables = self.pe_metadata.tables()?;
        let strings = self.pe_metadata.strings()?;

        let method: MethodDefRaw = tables.read_row(token.row())?;
        let method_name = strings.get(method.name as usize)?;
        if method_name != WELL_KNOWN_ENTRY_POINT_NAME {
            return Ok(None);
        }

        // The declaring type is the last one whose method list starts at or before the rid.
        let mut declaring: Option<TypeDefRaw> = None;
        for type_def in tables.read_all_rows::<TypeDefRaw>()? {
            if type_def.method_list <= token.row() {
                declaring = Some(type_def);
            }
        }

        let Some(declaring) = declaring else {
            return Ok(None);
        };

        let type_name = strings.get(declaring.name as usize)?;
        let namespace = strings.get(declaring.namespace as usize)?;
        let type_name = if namespace.is_empty() {
            type_name.to_string()
        } else {
            format!("{namespace}.{type_name}")
        };

        Ok(Some(MainMethodInfo {
            type_name,
            method_name: method_name.to_string(),
        }))
    }

    /// Raw Win32 resource directory bytes of the original image, if any.
    ///
    /// # Errors
    /// Returns an error if the resource directory cannot be mapped into the file.
    pub fn win32_resources(&self) -> Result<Option<&[u8]>> {
        self.pe.win32_resources()
    }

    /// Derives the structural emit settings pinned from the original image.
    ///
    /// # Errors
    /// Returns an error if the debug directory cannot be read.
    pub fn emit_settings(&self) -> Result<EmitSettings> {
        let debug_information = if self.pe.has_embedded_pdb()? {
            DebugInformationKind::Embedded
        } else {
            DebugInformationKind::PortablePdb
        };

        Ok(EmitSettings {
            debug_information,
            high_entropy_va: self.pe.high_entropy_va(),
            subsystem_version: self.pe.subsystem_version(),
        })
    }

    /// Turns every source and reference descriptor into resolved artifacts, validating each
    /// against its descriptor.
    ///
    /// Sources with embedded text are materialized from the PDB directly; everything else
    /// goes through the resolver. Either way the text's checksum must equal the recorded
    /// hash. Resolved references must report the descriptor's alias and interop flag
    /// exactly. Ordering follows descriptor order, and any failure aborts the whole set.
    ///
    /// # Arguments
    /// * `resolver` - The caller-supplied artifact resolver
    ///
    /// # Errors
    /// Returns [`Error::SourceHashMismatch`] / [`Error::ReferenceMetadataMismatch`] on
    /// cross-validation failures, besides any resolver error.
    pub fn resolve_artifacts<R: ArtifactResolver>(
        &self,
        resolver: &mut R,
    ) -> Result<RebuildArtifactSet<R::Reference>> {
        let mut sources = Vec::new();
        for info in self.source_text_info()? {
            let (text, embeddable) = if info.has_embedded_source {
                let embedded = self.resolve_embedded_source(&info)?.ok_or_else(|| {
                    malformed_error!(
                        "Document '{}' lost its embedded source between scans",
                        info.original_path
                    )
                })?;
                (embedded.text, true)
            } else {
                (resolver.resolve_source_text(&info)?, false)
            };

            if let Some(checksum) = text.checksum(info.hash_algorithm) {
                if checksum != info.hash {
                    return Err(Error::SourceHashMismatch(info.original_path));
                }
            }

            sources.push(ResolvedSourceText {
                info,
                text,
                embeddable,
            });
        }

        let mut references = Vec::new();
        for info in self.metadata_reference_info()? {
            let resolved = resolver.resolve_metadata_reference(&info)?;

            if resolved.extern_alias != info.extern_alias
                || resolved.embed_interop_types != info.embed_interop_types
            {
                return Err(Error::ReferenceMetadataMismatch(info.name));
            }

            references.push(resolved);
        }

        Ok(RebuildArtifactSet {
            sources,
            references,
        })
    }
}
