//! Specification fingerprints
//!
//! The first line of every generated source file is a fixed disclaimer
//! identifying the file as tool-generated; the second line is a comment
//! carrying a single-line, hex-encoded re-serialization of the
//! declaration's canonical specification. This header format is stable
//! across releases: artifacts written by prior runs must remain readable.
//!
//! A file that lacks the disclaimer is never overwritten; overwriting a
//! hand-edited file is judged worse than failing the build.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use cognate_ldsl_ast::CanonicalSpec;
use thiserror::Error;

/// The comment appearing at the top of all generated files
pub const DISCLAIMER: &str =
    "// Modifying this comment will cause the next run of cognate to overwrite this file.";

/// Errors reading a fingerprint back from a generated file
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error(
        "'{path}' does not appear to have been generated by cognate, but cognate needs to \
         overwrite it; remove the file or rename the declaration"
    )]
    NotGenerated { path: PathBuf },

    #[error("'{path}' carries an unreadable specification fingerprint; the file appears to have been edited")]
    Malformed { path: PathBuf },

    #[error("can't read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A declaration's canonical specification as persisted in an artifact
/// header
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    spec: CanonicalSpec,
}

impl Fingerprint {
    pub fn new(spec: CanonicalSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &CanonicalSpec {
        &self.spec
    }

    /// Encode the canonical specification as the single-line payload of
    /// the header's second line
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(&self.spec).expect("canonical specs always serialize");
        hex::encode(json)
    }

    /// Decode a payload previously produced by [`Fingerprint::encode`]
    pub fn decode(payload: &str) -> Option<Self> {
        let bytes = hex::decode(payload.trim()).ok()?;
        let json = String::from_utf8(bytes).ok()?;
        let spec = serde_json::from_str(&json).ok()?;
        Some(Self { spec })
    }

    /// Read the fingerprint from a generated source file.
    ///
    /// Returns `Ok(None)` when the file does not exist (first
    /// compilation). A file that exists but lacks the disclaimer or a
    /// parsable fingerprint line is an error, not a silent rebuild.
    pub fn read_from(path: &Path) -> Result<Option<Self>, FingerprintError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FingerprintError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let mut reader = BufReader::new(file);
        let mut line1 = String::new();
        let mut line2 = String::new();
        reader
            .read_line(&mut line1)
            .and_then(|_| reader.read_line(&mut line2))
            .map_err(|e| FingerprintError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        if line1.trim_end() != DISCLAIMER {
            return Err(FingerprintError::NotGenerated {
                path: path.to_path_buf(),
            });
        }

        let payload = line2
            .strip_prefix("// ")
            .ok_or_else(|| FingerprintError::Malformed {
                path: path.to_path_buf(),
            })?;

        match Self::decode(payload) {
            Some(fp) => Ok(Some(fp)),
            None => Err(FingerprintError::Malformed {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Write a generated source file: disclaimer, fingerprint line, then the
/// translated body supplied by the caller.
pub fn write_generated_source(
    path: &Path,
    spec: &CanonicalSpec,
    body: &str,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    writeln!(file, "{DISCLAIMER}")?;
    writeln!(file, "// {}", Fingerprint::new(spec.clone()).encode())?;
    writeln!(file)?;
    file.write_all(body.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognate_ldsl_ast::Name;

    fn spec() -> CanonicalSpec {
        CanonicalSpec::Conjunction {
            input: "Token".to_string(),
            output: "discrete".to_string(),
            left: Name::from("word"),
            right: Name::from("shape"),
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let fp = Fingerprint::new(spec());
        let decoded = Fingerprint::decode(&fp.encode()).unwrap();
        assert_eq!(fp, decoded);
    }

    #[test]
    fn test_payload_is_single_line() {
        let fp = Fingerprint::new(spec());
        assert!(!fp.encode().contains('\n'));
    }

    #[test]
    fn test_read_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Fingerprint::read_from(&dir.path().join("ghost.rs")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_back_written_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conj.rs");
        write_generated_source(&path, &spec(), "pub struct Conj;\n").unwrap();

        let fp = Fingerprint::read_from(&path).unwrap().unwrap();
        assert_eq!(fp.spec(), &spec());
    }

    #[test]
    fn test_hand_written_file_is_not_generated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conj.rs");
        std::fs::write(&path, "// my own file\npub struct Conj;\n").unwrap();

        let err = Fingerprint::read_from(&path).unwrap_err();
        assert!(matches!(err, FingerprintError::NotGenerated { .. }));
    }

    #[test]
    fn test_corrupted_fingerprint_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conj.rs");
        std::fs::write(&path, format!("{DISCLAIMER}\n// zz-not-hex\n")).unwrap();

        let err = Fingerprint::read_from(&path).unwrap_err();
        assert!(matches!(err, FingerprintError::Malformed { .. }));
    }
}
