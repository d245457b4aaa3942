//! Batch summaries for people (colored text) and machines (JSON).

use std::fmt::Write as _;

use colored::*;
use serde::Serialize;

use crate::batch::{FileReport, Mode, Outcome};
use crate::rewriter::Insertion;

/// All outcomes of one run.
#[derive(Debug)]
pub struct BatchReport {
    pub mode: Mode,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub scanned: usize,
    pub annotated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub markers: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    mode: &'static str,
    summary: Summary,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    markers: &'a [Insertion],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchReport {
    pub fn new(mode: Mode, files: Vec<FileReport>) -> Self {
        Self { mode, files }
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for file in &self.files {
            match &file.outcome {
                Outcome::Unchanged => {
                    summary.scanned += 1;
                    summary.unchanged += 1;
                }
                Outcome::Annotated { markers, .. } => {
                    summary.scanned += 1;
                    summary.annotated += 1;
                    summary.markers += markers.len();
                }
                Outcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// 0 on success, 1 when `--check` finds unmarked tests, 2 when any file
    /// failed.
    pub fn exit_code(&self) -> i32 {
        let summary = self.summary();
        if summary.failed > 0 {
            2
        } else if self.mode == Mode::Check && summary.annotated > 0 {
            1
        } else {
            0
        }
    }

    /// One line per file that changed or failed, then a summary line.
    pub fn render_human(&self) -> String {
        let mut out = String::new();
        let verb = match self.mode {
            Mode::Write => "added",
            Mode::Check => "missing",
            Mode::DryRun => "would add",
        };

        for file in &self.files {
            match &file.outcome {
                Outcome::Unchanged => {}
                Outcome::Annotated { markers, .. } => {
                    let mark = if self.mode == Mode::Check { "✗".red() } else { "✓".green() };
                    let _ = writeln!(
                        out,
                        "{} {}  {} {} {}",
                        mark,
                        file.path.display(),
                        verb,
                        markers.len(),
                        plural(markers.len(), "marker").dimmed()
                    );
                    for insertion in markers {
                        let _ = writeln!(
                            out,
                            "    {}:{} {}",
                            file.path.display(),
                            insertion.line,
                            insertion.qualname.cyan()
                        );
                    }
                }
                Outcome::Failed(error) => {
                    let _ = writeln!(out, "{} {}", "✗".red(), error.to_string().red());
                }
            }
        }

        let s = self.summary();
        let _ = writeln!(
            out,
            "{} {} scanned, {} {}, {} unchanged, {} failed ({} {} {})",
            "→".cyan(),
            s.scanned,
            s.annotated,
            if self.mode == Mode::Check { "need markers" } else { "annotated" },
            s.unchanged,
            if s.failed > 0 { s.failed.to_string().red() } else { s.failed.to_string().normal() },
            s.markers,
            plural(s.markers, "marker"),
            verb
        );
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let files = self
            .files
            .iter()
            .map(|file| {
                let (status, markers, error): (_, &[Insertion], _) = match &file.outcome {
                    Outcome::Unchanged => ("unchanged", &[][..], None),
                    Outcome::Annotated { markers, written: true } => {
                        ("annotated", markers.as_slice(), None)
                    }
                    Outcome::Annotated { markers, written: false } => {
                        ("needs_markers", markers.as_slice(), None)
                    }
                    Outcome::Failed(e) => ("failed", &[][..], Some(e.to_string())),
                };
                JsonFile {
                    path: file.path.display().to_string(),
                    status,
                    markers,
                    error,
                }
            })
            .collect();
        let report = JsonReport {
            mode: match self.mode {
                Mode::Write => "write",
                Mode::Check => "check",
                Mode::DryRun => "dry_run",
            },
            summary: self.summary(),
            files,
        };
        serde_json::to_string_pretty(&report)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 { word.to_string() } else { format!("{}s", word) }
}
