//! Compiler invocation reconstruction from recorded options.
//!
//! The [`CompilationFactory`] turns an [`OptionsTable`] into a complete, deterministic
//! compiler configuration: a [`CompilationOptionsSnapshot`] plus [`ParseSettings`], bound to
//! one of the two supported source languages. Reconstruction follows a strict policy:
//!
//! - Every option has an explicit default used when it is *absent* from the blob.
//! - A value that is *present but unparseable* is always fatal; there is no silent fallback
//!   for data the compiler actually recorded.
//! - A handful of knobs are forced regardless of what was recorded, because the rebuild's
//!   own diagnostics must never alter emitted bytes: concurrent build, deterministic build,
//!   suppressed diagnostics not reported, public-only metadata import, and the maximum
//!   warning level.
//!
//! Language dispatch is a tagged variant ([`LanguageOptions`]), keeping the per-language
//! reconstruction exhaustive and checkable at compile time.

use std::str::FromStr;

use strum::{Display, EnumString};

use crate::{
    rebuild::emit::CompilerService,
    rebuild::options::{keys, OptionsTable},
    rebuild::resolver::{ResolvedReference, ResolvedSourceText},
    Error, Result,
};

/// The maximum warning level; forced so rebuild diagnostics are stable across compiler
/// versions.
pub const MAX_WARNING_LEVEL: u32 = 9999;

/// Highest options-blob format version this library understands.
pub const SUPPORTED_OPTIONS_VERSION: u32 = 2;

/// The two source languages this library can rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// C#
    CSharp,
    /// Visual Basic
    VisualBasic,
}

impl SourceLanguage {
    /// Maps the recorded language name to a supported language.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedLanguage`] for any other recorded name.
    pub fn from_name(name: &str) -> Result<SourceLanguage> {
        match name {
            "C#" => Ok(SourceLanguage::CSharp),
            "Visual Basic" => Ok(SourceLanguage::VisualBasic),
            other => Err(Error::UnsupportedLanguage(other.to_string())),
        }
    }

    /// The language name as the compiler records it.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SourceLanguage::CSharp => "C#",
            SourceLanguage::VisualBasic => "Visual Basic",
        }
    }
}

/// Optimization level of the original compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    /// Unoptimized
    Debug,
    /// Optimized
    Release,
}

/// Parses the recorded optimization string into level and debug-plus mode.
///
/// # Errors
/// Returns [`Error::UnrecognizedOptimizationLevel`] for any value outside the closed set.
pub fn parse_optimization(value: &str) -> Result<(OptimizationLevel, bool)> {
    match value {
        "debug" => Ok((OptimizationLevel::Debug, false)),
        "debug-plus" => Ok((OptimizationLevel::Debug, true)),
        "release" => Ok((OptimizationLevel::Release, false)),
        other => Err(Error::UnrecognizedOptimizationLevel(other.to_string())),
    }
}

/// Target platform of the original compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum PlatformKind {
    /// Any CPU
    AnyCpu,
    /// Any CPU, 32-bit preferred
    AnyCpu32BitPreferred,
    /// ARM
    Arm,
    /// ARM64
    Arm64,
    /// Itanium
    Itanium,
    /// x86
    X86,
    /// x64
    X64,
}

/// Output kind of the original compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum OutputKind {
    /// Console executable
    ConsoleApplication,
    /// Windows executable
    WindowsApplication,
    /// Class library
    DynamicallyLinkedLibrary,
    /// .NET module
    NetModule,
    /// Windows Runtime metadata
    WindowsRuntimeMetadata,
    /// Windows Runtime application
    WindowsRuntimeApplication,
}

/// Nullable context of the original C# compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum NullableContextKind {
    /// Nullable analysis disabled
    Disable,
    /// Warnings only
    Warnings,
    /// Annotations only
    Annotations,
    /// Fully enabled
    Enable,
}

/// Metadata import scope forced during rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataImportKind {
    /// Import public members only
    Public,
}

/// C#-specific reconstructed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSharpOptions {
    /// Preprocessor symbols, blob order
    pub defines: Vec<String>,
    /// Checked arithmetic; absent defaults to `false`
    pub checked: bool,
    /// Unsafe code allowed; absent defaults to `false`
    pub allow_unsafe: bool,
    /// Nullable context; absent defaults to disabled
    pub nullable: NullableContextKind,
}

/// Visual Basic-specific reconstructed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualBasicOptions {
    /// Conditional compilation symbols, blob order
    pub defines: Vec<String>,
    /// Overflow checking; absent defaults to `true`
    pub checked: bool,
    /// Option Strict
    pub option_strict: bool,
    /// Option Infer
    pub option_infer: bool,
    /// Option Explicit
    pub option_explicit: bool,
    /// Option Compare Text
    pub option_compare_text: bool,
    /// Whether the VB runtime is embedded
    pub embed_vb_runtime: bool,
    /// Root namespace, when one was recorded
    pub root_namespace: Option<String>,
    /// Global imports, blob order
    pub global_imports: Vec<String>,
}

/// Language-tagged options variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageOptions {
    /// C# options
    CSharp(CSharpOptions),
    /// Visual Basic options
    VisualBasic(VisualBasicOptions),
}

/// The complete reconstructed compiler configuration of one rebuild attempt.
///
/// Owned and immutable once built; holds no reference back to the reader it was derived
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptionsSnapshot {
    /// Recorded language version string
    pub language_version: Option<String>,
    /// Optimization level; absent defaults to debug
    pub optimization: OptimizationLevel,
    /// Debug-plus mode, recorded as the `debug-plus` optimization value
    pub debug_plus_mode: bool,
    /// Target platform; absent defaults to [`PlatformKind::AnyCpu`]
    pub platform: PlatformKind,
    /// Output kind; absent defaults to a class library
    pub output_kind: OutputKind,
    /// Module name, when it differs from the assembly name
    pub module_name: Option<String>,
    /// Entry-point type name, when one was recorded
    pub main_type_name: Option<String>,
    /// Compiler version string, informational
    pub compiler_version: Option<String>,
    /// Runtime version string, informational
    pub runtime_version: Option<String>,
    /// Public signing; absent defaults to `false`
    pub public_sign: bool,
    /// Always `true`: the rebuild must be deterministic
    pub deterministic: bool,
    /// Always `true`: the compiler schedules its own internal concurrency
    pub concurrent_build: bool,
    /// Always `false`: suppressed diagnostics must not surface
    pub report_suppressed_diagnostics: bool,
    /// Always public-only metadata import
    pub metadata_import: MetadataImportKind,
    /// Always [`MAX_WARNING_LEVEL`]
    pub warning_level: u32,
    /// Language-specific options
    pub language: LanguageOptions,
}

/// Parse settings derived alongside the snapshot, for syntax tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSettings {
    /// Recorded language version string
    pub language_version: Option<String>,
    /// Preprocessor symbols in effect
    pub preprocessor_symbols: Vec<String>,
}

/// Resolver seam for `#line` directive paths during a rebuild.
///
/// The only operation a rebuild legitimately needs is path normalization; the I/O entry
/// points exist to satisfy the interface shape and must never run.
pub trait SourceReferenceResolver {
    /// Normalizes a `#line` path to its logical identity.
    fn normalize_path(&self, path: &str, base_path: Option<&str>) -> Option<String>;

    /// Resolves a reference path to a location that could be opened.
    ///
    /// # Errors
    /// Rebuild resolvers fail with [`Error::ContractViolation`]; resolving real files is
    /// outside the rebuild contract.
    fn resolve_reference(&self, path: &str, base_path: Option<&str>) -> Result<String>;

    /// Opens a resolved path for reading.
    ///
    /// # Errors
    /// Rebuild resolvers fail with [`Error::ContractViolation`]; file I/O is outside the
    /// rebuild contract.
    fn open_read(&self, resolved_path: &str) -> Result<Vec<u8>>;
}

/// The deterministic `#line` path resolver installed for every rebuild.
///
/// Paths normalize to themselves regardless of base directory, so directives in different
/// physical directories that reference the same textual path share one logical identity.
/// No file I/O is ever performed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicSourceResolver;

impl SourceReferenceResolver for DeterministicSourceResolver {
    fn normalize_path(&self, path: &str, _base_path: Option<&str>) -> Option<String> {
        Some(path.to_string())
    }

    fn resolve_reference(&self, _path: &str, _base_path: Option<&str>) -> Result<String> {
        Err(Error::ContractViolation(
            "rebuild source resolver must not resolve file references",
        ))
    }

    fn open_read(&self, _resolved_path: &str) -> Result<Vec<u8>> {
        Err(Error::ContractViolation(
            "rebuild source resolver must not perform file I/O",
        ))
    }
}

/// Builds compiler invocations from recorded options.
///
/// The factory derives the snapshot and parse settings once; tree and compilation
/// construction are then pure functions over (paths, texts) and (trees, references), so the
/// emission stage can be re-run without re-deriving options.
pub struct CompilationFactory {
    assembly_name: String,
    language: SourceLanguage,
    snapshot: CompilationOptionsSnapshot,
    parse_settings: ParseSettings,
}

impl CompilationFactory {
    /// Reconstructs the compiler configuration from an options table.
    ///
    /// # Arguments
    /// * `assembly_name` - Name of the assembly being rebuilt
    /// * `options` - The decoded compilation-options table
    ///
    /// # Errors
    /// Returns [`Error::UnknownOrMissingLanguage`] / [`Error::UnsupportedLanguage`] for
    /// language problems, [`Error::UnsupportedOption`] for fail-closed options, and the
    /// unrecognized-value errors for present-but-unparseable closed-set options.
    pub fn create(assembly_name: &str, options: &OptionsTable) -> Result<CompilationFactory> {
        if let Some(version) = options.try_get_unique(keys::VERSION) {
            let parsed: u32 = version.parse().map_err(|_| Error::UnrecognizedOption {
                key: keys::VERSION.to_string(),
                value: version.to_string(),
            })?;
            if parsed > SUPPORTED_OPTIONS_VERSION {
                return Err(Error::UnsupportedOption("version"));
            }
        }

        // No defined semantics for rebuilds; fail closed rather than ignore.
        if !options.get_all(keys::PORTABILITY_POLICY).is_empty() {
            return Err(Error::UnsupportedOption("portability-policy"));
        }

        let language = SourceLanguage::from_name(
            options
                .try_get_unique(keys::LANGUAGE)
                .ok_or(Error::UnknownOrMissingLanguage)?,
        )?;

        let (optimization, debug_plus_mode) = match options.try_get_unique(keys::OPTIMIZATION) {
            Some(value) => parse_optimization(value)?,
            None => (OptimizationLevel::Debug, false),
        };

        let platform = parse_with_default(options, keys::PLATFORM, PlatformKind::AnyCpu)?;
        let output_kind = parse_with_default(
            options,
            keys::OUTPUT_KIND,
            OutputKind::DynamicallyLinkedLibrary,
        )?;

        let defines: Vec<String> = options
            .try_get_unique(keys::DEFINE)
            .map(|value| {
                value
                    .split(',')
                    .filter(|symbol| !symbol.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let language_options = match language {
            SourceLanguage::CSharp => LanguageOptions::CSharp(CSharpOptions {
                defines: defines.clone(),
                checked: bool_with_default(options, keys::CHECKED, false)?,
                allow_unsafe: bool_with_default(options, keys::UNSAFE, false)?,
                nullable: parse_with_default(options, keys::NULLABLE, NullableContextKind::Disable)?,
            }),
            SourceLanguage::VisualBasic => LanguageOptions::VisualBasic(VisualBasicOptions {
                defines: defines.clone(),
                checked: bool_with_default(options, keys::CHECKED, true)?,
                option_strict: bool_with_default(options, keys::OPTION_STRICT, false)?,
                option_infer: bool_with_default(options, keys::OPTION_INFER, false)?,
                option_explicit: bool_with_default(options, keys::OPTION_EXPLICIT, false)?,
                option_compare_text: bool_with_default(options, keys::OPTION_COMPARE_TEXT, false)?,
                embed_vb_runtime: bool_with_default(options, keys::EMBED_RUNTIME, false)?,
                root_namespace: options
                    .try_get_unique(keys::ROOT_NAMESPACE)
                    .map(str::to_string),
                global_imports: options
                    .try_get_unique(keys::GLOBAL_NAMESPACES)
                    .map(|value| {
                        value
                            .split(',')
                            .filter(|import| !import.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
        };

        let snapshot = CompilationOptionsSnapshot {
            language_version: options
                .try_get_unique(keys::LANGUAGE_VERSION)
                .map(str::to_string),
            optimization,
            debug_plus_mode,
            platform,
            output_kind,
            module_name: options.try_get_unique(keys::MODULE_NAME).map(str::to_string),
            main_type_name: options
                .try_get_unique(keys::MAIN_TYPE_NAME)
                .map(str::to_string),
            compiler_version: options
                .try_get_unique(keys::COMPILER_VERSION)
                .map(str::to_string),
            runtime_version: options
                .try_get_unique(keys::RUNTIME_VERSION)
                .map(str::to_string),
            public_sign: bool_with_default(options, keys::PUBLIC_SIGN, false)?,
            deterministic: true,
            concurrent_build: true,
            report_suppressed_diagnostics: false,
            metadata_import: MetadataImportKind::Public,
            warning_level: MAX_WARNING_LEVEL,
            language: language_options,
        };

        let parse_settings = ParseSettings {
            language_version: snapshot.language_version.clone(),
            preprocessor_symbols: defines,
        };

        Ok(CompilationFactory {
            assembly_name: assembly_name.to_string(),
            language,
            snapshot,
            parse_settings,
        })
    }

    /// The assembly name the rebuild emits under.
    #[must_use]
    pub fn assembly_name(&self) -> &str {
        &self.assembly_name
    }

    /// The source language of the original compilation.
    #[must_use]
    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// The reconstructed options snapshot.
    #[must_use]
    pub fn options_snapshot(&self) -> &CompilationOptionsSnapshot {
        &self.snapshot
    }

    /// The reconstructed parse settings.
    #[must_use]
    pub fn parse_settings(&self) -> &ParseSettings {
        &self.parse_settings
    }

    /// The `#line` path resolver every rebuild installs.
    #[must_use]
    pub fn source_reference_resolver(&self) -> DeterministicSourceResolver {
        DeterministicSourceResolver
    }

    /// Constructs one syntax tree per resolved source, in order.
    ///
    /// # Errors
    /// Propagates the service's parse failures.
    pub fn create_syntax_trees<S: CompilerService>(
        &self,
        service: &S,
        sources: &[ResolvedSourceText],
    ) -> Result<Vec<S::SyntaxTree>> {
        sources
            .iter()
            .map(|source| {
                service.create_syntax_tree(
                    &source.info.original_path,
                    &source.text,
                    &self.parse_settings,
                    self.language,
                )
            })
            .collect()
    }

    /// Constructs the compilation from trees and references.
    ///
    /// # Errors
    /// Propagates the service's construction failures.
    pub fn create_compilation<S: CompilerService>(
        &self,
        service: &S,
        trees: Vec<S::SyntaxTree>,
        references: Vec<ResolvedReference<S::Reference>>,
    ) -> Result<S::Compilation> {
        service.create_compilation(&self.assembly_name, trees, references, &self.snapshot)
    }
}

/// Parses the unique value of `key` as `T`, defaulting when absent, failing when present
/// but unparseable.
fn parse_with_default<T: FromStr>(options: &OptionsTable, key: &str, default: T) -> Result<T> {
    match options.try_get_unique(key) {
        Some(value) => value.parse().map_err(|_| Error::UnrecognizedOption {
            key: key.to_string(),
            value: value.to_string(),
        }),
        None => Ok(default),
    }
}

/// Boolean variant of [`parse_with_default`] with the same absent/present policy.
fn bool_with_default(options: &OptionsTable, key: &str, default: bool) -> Result<bool> {
    match options.try_get_unique(key) {
        Some(value) => options.get_bool(key).ok_or_else(|| Error::UnrecognizedOption {
            key: key.to_string(),
            value: value.to_string(),
        }),
        None => Ok(default),
    }
}
