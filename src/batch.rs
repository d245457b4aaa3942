//! Batch processing over many files.
//!
//! Files are independent, so they are annotated in parallel. A failure is
//! recorded in that file's outcome and never stops the rest of the batch;
//! a failed file is never written.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{ConfigError, FileError};
use crate::rewriter::{Annotator, Insertion};

/// What to do with files that need markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Overwrite them.
    #[default]
    Write,
    /// Leave them; the run fails if any would change.
    Check,
    /// Leave them; report what would change.
    DryRun,
}

/// Finds candidate test files under a set of roots.
#[derive(Debug, Clone)]
pub struct Discovery {
    include: GlobSet,
    exclude: Vec<String>,
}

/// Files found by [`Discovery::discover`], plus roots or entries that could
/// not be walked.
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub errors: Vec<FileError>,
}

impl Discovery {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in include {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let include = builder.build().map_err(|source| ConfigError::InvalidPattern {
            pattern: include.join(","),
            source,
        })?;
        Ok(Self {
            include,
            exclude: exclude.to_vec(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.include, &config.exclude)
    }

    /// Whether a file name matches an include pattern.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.include.is_match(Path::new(name)))
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == name)
    }

    /// Explicit files are taken as given; directories are walked for
    /// matching files. The result is sorted and free of duplicates.
    pub fn discover(&self, roots: &[PathBuf]) -> Discovered {
        let mut found = Discovered::default();

        for root in roots {
            if root.is_file() {
                found.files.push(root.clone());
                continue;
            }
            let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry.file_name().to_str().is_some_and(|n| self.is_excluded(n))
            });
            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_file() && self.matches(entry.path()) => {
                        debug!(path = %entry.path().display(), "discovered");
                        found.files.push(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(source) => {
                        let path = source.path().unwrap_or(root.as_path()).to_path_buf();
                        found.errors.push(FileError::Discover { path, source });
                    }
                }
            }
        }

        found.files.sort();
        let mut seen = HashSet::new();
        found.files.retain(|path| seen.insert(identity(path)));
        found
    }
}

/// Key under which two spellings of one file compare equal.
fn identity(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    })
}

/// How one file fared.
#[derive(Debug)]
pub enum Outcome {
    Unchanged,
    Annotated {
        markers: Vec<Insertion>,
        written: bool,
    },
    Failed(FileError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl FileReport {
    pub fn failed(error: FileError) -> Self {
        Self {
            path: error.path().to_path_buf(),
            outcome: Outcome::Failed(error),
        }
    }
}

/// Runs an [`Annotator`] over files in a given [`Mode`].
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    annotator: &'a Annotator,
    mode: Mode,
}

impl<'a> Batch<'a> {
    pub fn new(annotator: &'a Annotator, mode: Mode) -> Self {
        Self { annotator, mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Process every file in parallel. Reports come back in input order.
    pub fn run(&self, files: &[PathBuf]) -> Vec<FileReport> {
        files.par_iter().map(|path| self.process(path)).collect()
    }

    pub fn process(&self, path: &Path) -> FileReport {
        let outcome = match self.try_process(path) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(path = %path.display(), %error, "file left unchanged");
                Outcome::Failed(error)
            }
        };
        FileReport {
            path: path.to_path_buf(),
            outcome,
        }
    }

    fn try_process(&self, path: &Path) -> Result<Outcome, FileError> {
        let bytes = fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| FileError::Encoding {
            path: path.to_path_buf(),
        })?;
        debug!(path = %path.display(), "scanning");

        let annotated = self
            .annotator
            .annotate(&text)
            .map_err(|source| FileError::Annotate {
                path: path.to_path_buf(),
                source,
            })?;
        if !annotated.is_changed() {
            return Ok(Outcome::Unchanged);
        }

        let written = self.mode == Mode::Write;
        if written {
            write_atomic(path, &annotated.text).map_err(|source| FileError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        info!(
            path = %path.display(),
            markers = annotated.insertions.len(),
            written,
            "annotated"
        );
        Ok(Outcome::Annotated {
            markers: annotated.insertions,
            written,
        })
    }
}

/// Replace `path` with `content` via a temp file in the same directory, so
/// readers see either the old or the new content.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
