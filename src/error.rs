//! Error types for scanning, annotating and batch processing.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a file's definition blocks could not be located safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanErrorKind {
    #[error("decorator has unbalanced brackets at end of file")]
    UnbalancedDecorator,
    #[error("decorator run is interrupted by a blank line or comment")]
    InterruptedDecoratorRun,
    #[error("decorator is not followed by a function or class definition")]
    DanglingDecorator,
    #[error("decorator indentation does not match the definition below it")]
    MisalignedDecorator,
    #[error("triple-quoted string is never closed")]
    UnterminatedString,
}

/// A scan failure at a 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ScanError {
    pub line: usize,
    pub kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, line: usize) -> Self {
        Self { line, kind }
    }
}

/// Failure reported by an identifier generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identifier generator failed: {message}")]
pub struct GenerateError {
    pub message: String,
}

impl GenerateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure annotating one source text. No output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl AnnotateError {
    /// 1-based line the failure refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            AnnotateError::Scan(e) => Some(e.line),
            AnnotateError::Generate(_) => None,
        }
    }
}

/// Failure processing one file of a batch. The file is left untouched.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{}: cannot be discovered: {source}", path.display())]
    Discover {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{}: cannot be read: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Annotate {
        path: PathBuf,
        #[source]
        source: AnnotateError,
    },
    #[error("{}: cannot be written: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    pub fn path(&self) -> &Path {
        match self {
            FileError::Discover { path, .. }
            | FileError::Read { path, .. }
            | FileError::Encoding { path }
            | FileError::Annotate { path, .. }
            | FileError::Write { path, .. } => path,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            FileError::Annotate { source, .. } => source.line(),
            _ => None,
        }
    }
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("marker name {0:?} is not a dotted identifier path")]
    InvalidMarker(String),
    #[error("test prefix must not be empty")]
    EmptyPrefix,
    #[error("invalid include pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::new(ScanErrorKind::InterruptedDecoratorRun, 14);
        assert_eq!(
            err.to_string(),
            "line 14: decorator run is interrupted by a blank line or comment"
        );
    }

    #[test]
    fn test_file_error_carries_path_and_line() {
        let err = FileError::Annotate {
            path: PathBuf::from("tests/test_a.py"),
            source: ScanError::new(ScanErrorKind::DanglingDecorator, 3).into(),
        };
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.path(), Path::new("tests/test_a.py"));
        assert!(err.to_string().starts_with("tests/test_a.py: line 3:"));
    }

    #[test]
    fn test_generate_error_has_no_line() {
        let err = AnnotateError::from(GenerateError::new("entropy exhausted"));
        assert_eq!(err.line(), None);
        assert!(err.to_string().contains("entropy exhausted"));
    }
}
