//! Compilation options table decoded from Portable PDB debug metadata.
//!
//! The compiler records its configuration as a flat sequence of NUL-terminated UTF-8
//! key/value pairs inside a custom-debug-information blob attached to the module. This
//! module decodes that blob into an [`OptionsTable`] and provides the checked lookups the
//! option-reconstruction layer builds on.
//!
//! Keys may legitimately repeat (extern aliases), so uniqueness is a property of the lookup,
//! not of the storage: [`OptionsTable::try_get_unique`] deliberately treats an ambiguous
//! duplicate the same as an absent key, forcing callers to either supply a default or fail
//! explicitly.
//!
//! # Usage Examples
//!
//! ```rust
//! use dotrebuild::rebuild::options::{keys, OptionsTable};
//!
//! let table = OptionsTable::parse(b"language\0C#\0optimization\0release\0")?;
//!
//! assert_eq!(table.try_get_unique(keys::LANGUAGE), Some("C#"));
//! assert_eq!(table.try_get_unique(keys::OPTIMIZATION), Some("release"));
//! assert_eq!(table.try_get_unique(keys::PLATFORM), None);
//! # Ok::<(), dotrebuild::Error>(())
//! ```

use crate::{file::parser::Parser, Error, Result};

/// Well-known option key names as written by the compiler.
///
/// Process-wide, read-only: the set is fixed at compile time.
pub mod keys {
    /// Format version of the options blob itself
    pub const VERSION: &str = "version";
    /// Version of the compiler that produced the image
    pub const COMPILER_VERSION: &str = "compiler-version";
    /// Source language name
    pub const LANGUAGE: &str = "language";
    /// Language version in effect
    pub const LANGUAGE_VERSION: &str = "language-version";
    /// Optimization level: `debug`, `debug-plus` or `release`
    pub const OPTIMIZATION: &str = "optimization";
    /// Target platform
    pub const PLATFORM: &str = "platform";
    /// Public signing flag
    pub const PUBLIC_SIGN: &str = "public-sign";
    /// Preprocessor symbol definitions, comma-delimited
    pub const DEFINE: &str = "define";
    /// Overflow checking flag
    pub const CHECKED: &str = "checked";
    /// Nullable context
    pub const NULLABLE: &str = "nullable";
    /// Unsafe code flag
    pub const UNSAFE: &str = "unsafe";
    /// Number of source files in the original compile unit
    pub const SOURCE_FILE_COUNT: &str = "source-file-count";
    /// Output kind
    pub const OUTPUT_KIND: &str = "output-kind";
    /// Fallback text encoding name
    pub const FALLBACK_ENCODING: &str = "fallback-encoding";
    /// Default text encoding name
    pub const DEFAULT_ENCODING: &str = "default-encoding";
    /// Portability policy, recorded but unsupported for rebuilds
    pub const PORTABILITY_POLICY: &str = "portability-policy";
    /// Runtime version the image targets
    pub const RUNTIME_VERSION: &str = "runtime-version";
    /// Module name when it differs from the assembly name
    pub const MODULE_NAME: &str = "module-name";
    /// Name of the type containing the entry point
    pub const MAIN_TYPE_NAME: &str = "main-type-name";
    /// Visual Basic Option Strict
    pub const OPTION_STRICT: &str = "option-strict";
    /// Visual Basic Option Infer
    pub const OPTION_INFER: &str = "option-infer";
    /// Visual Basic Option Compare Text
    pub const OPTION_COMPARE_TEXT: &str = "option-compare-text";
    /// Visual Basic Option Explicit
    pub const OPTION_EXPLICIT: &str = "option-explicit";
    /// Visual Basic embedded runtime flag
    pub const EMBED_RUNTIME: &str = "embed-runtime";
    /// Visual Basic global imports, comma-delimited
    pub const GLOBAL_NAMESPACES: &str = "global-namespaces";
    /// Visual Basic root namespace
    pub const ROOT_NAMESPACE: &str = "root-namespace";
}

/// The ordered key/value pairs of one compilation-options blob.
///
/// Parsed once per accessor and immutable thereafter.
pub struct OptionsTable {
    pairs: Vec<(String, String)>,
}

impl OptionsTable {
    /// Decodes an options blob into its ordered pairs.
    ///
    /// The blob is a repeating sequence of NUL-terminated key then NUL-terminated value.
    ///
    /// # Arguments
    /// * `blob` - The raw custom-debug-information payload
    ///
    /// # Errors
    /// Returns [`Error::InvalidCompilationOptions`] for a key with no value (dangling key),
    /// an unterminated key or value, or an empty key.
    pub fn parse(blob: &[u8]) -> Result<OptionsTable> {
        let mut parser = Parser::new(blob);
        let mut pairs = Vec::new();

        while parser.has_more_data() {
            let Some(key_len) = parser.index_of_zero() else {
                return Err(Error::InvalidCompilationOptions(
                    "unterminated key".to_string(),
                ));
            };

            if key_len == 0 {
                return Err(Error::InvalidCompilationOptions("empty key".to_string()));
            }

            let key = parser
                .read_utf8(key_len)
                .map_err(|_| Error::InvalidCompilationOptions("key is not UTF-8".to_string()))?;
            parser.skip_null_terminator()?;

            let Some(value_len) = parser.index_of_zero() else {
                return Err(Error::InvalidCompilationOptions(format!(
                    "dangling key '{key}' without value"
                )));
            };

            let value = parser
                .read_utf8(value_len)
                .map_err(|_| Error::InvalidCompilationOptions("value is not UTF-8".to_string()))?;
            parser.skip_null_terminator()?;

            pairs.push((key, value));
        }

        Ok(OptionsTable { pairs })
    }

    /// Returns the ordered pairs as decoded from the blob.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Returns the number of recorded pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if the blob recorded no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the value of `key` only if exactly one pair with that key exists.
    ///
    /// Zero matches and multiple matches both yield [`None`]: duplicate non-alias keys
    /// indicate malformed data, and callers must supply a default or fail explicitly rather
    /// than pick one of several values.
    #[must_use]
    pub fn try_get_unique(&self, key: &str) -> Option<&str> {
        let mut found = None;
        for (existing, value) in &self.pairs {
            if existing == key {
                if found.is_some() {
                    return None;
                }
                found = Some(value.as_str());
            }
        }
        found
    }

    /// Returns the value of `key`, failing unless exactly one pair with that key exists.
    ///
    /// # Errors
    /// Returns [`Error::MissingRequiredOption`] for zero or multiple matches.
    pub fn get_unique_required(&self, key: &str) -> Result<&str> {
        self.try_get_unique(key)
            .ok_or_else(|| Error::MissingRequiredOption(key.to_string()))
    }

    /// Returns every value recorded for `key`, in blob order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Typed projection: the unique value of `key` parsed as a boolean.
    ///
    /// Accepts `true`/`false` in any case and `1`/`0`. Returns [`None`] when the key is
    /// absent, ambiguous, or the value does not parse; failure policy stays with the caller.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.try_get_unique(key)? {
            value if value.eq_ignore_ascii_case("true") || value == "1" => Some(true),
            value if value.eq_ignore_ascii_case("false") || value == "0" => Some(false),
            _ => None,
        }
    }

    /// Typed projection: the unique value of `key` parsed via [`std::str::FromStr`].
    ///
    /// Returns [`None`] when the key is absent, ambiguous, or the value does not parse.
    #[must_use]
    pub fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.try_get_unique(key)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_lookup() {
        let table = OptionsTable::parse(b"language\0C#\0optimization\0release\0").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.try_get_unique("language"), Some("C#"));
        assert_eq!(table.try_get_unique("optimization"), Some("release"));
        assert_eq!(table.try_get_unique("platform"), None);
    }

    #[test]
    fn duplicate_keys_read_as_absent() {
        let table = OptionsTable::parse(b"define\0DEBUG\0define\0TRACE\0").unwrap();

        assert_eq!(table.try_get_unique("define"), None);
        assert_eq!(table.get_all("define"), vec!["DEBUG", "TRACE"]);
        assert!(table.get_unique_required("define").is_err());
    }

    #[test]
    fn required_lookup_fails_when_absent() {
        let table = OptionsTable::parse(b"language\0C#\0").unwrap();

        assert!(matches!(
            table.get_unique_required("source-file-count"),
            Err(Error::MissingRequiredOption(key)) if key == "source-file-count"
        ));
    }

    #[test]
    fn dangling_key_is_invalid() {
        assert!(matches!(
            OptionsTable::parse(b"language\0C#\0orphan"),
            Err(Error::InvalidCompilationOptions(_))
        ));

        assert!(matches!(
            OptionsTable::parse(b"language\0C#\0orphan\0"),
            Err(Error::InvalidCompilationOptions(_))
        ));
    }

    #[test]
    fn empty_key_is_invalid() {
        assert!(matches!(
            OptionsTable::parse(b"\0value\0"),
            Err(Error::InvalidCompilationOptions(_))
        ));
    }

    #[test]
    fn empty_blob_is_empty_table() {
        let table = OptionsTable::parse(b"").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn empty_values_are_allowed() {
        let table = OptionsTable::parse(b"define\0\0").unwrap();
        assert_eq!(table.try_get_unique("define"), Some(""));
    }

    #[test]
    fn bool_projection() {
        let table =
            OptionsTable::parse(b"checked\0true\0unsafe\0False\0public-sign\0maybe\0").unwrap();

        assert_eq!(table.get_bool("checked"), Some(true));
        assert_eq!(table.get_bool("unsafe"), Some(false));
        assert_eq!(table.get_bool("public-sign"), None);
        assert_eq!(table.get_bool("nullable"), None);
    }

    #[test]
    fn parsed_projection() {
        let table = OptionsTable::parse(b"source-file-count\042\0version\0two\0").unwrap();

        assert_eq!(table.get_parsed::<usize>("source-file-count"), Some(42));
        assert_eq!(table.get_parsed::<u32>("version"), None);
    }
}
