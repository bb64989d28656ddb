//! End-of-run summary

use std::fmt;

use docsmith_docstring::{FileOutcome, FileReport, NodeResult};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub modified: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub generator_failures: usize,
    /// Python files left out by `--exclude`; not part of `files()`
    pub excluded: usize,
    pub dry_run: bool,
}

impl Summary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &FileReport) {
        match report.outcome {
            FileOutcome::Modified(_) => self.modified += 1,
            FileOutcome::Unchanged => self.unchanged += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
        }
        self.inserted += report.count(NodeResult::Inserted);
        self.replaced += report.count(NodeResult::Replaced);
        self.generator_failures += report.count(NodeResult::GeneratorFailed);
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn files(&self) -> usize {
        self.modified + self.unchanged + self.skipped + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would modify" } else { "modified" };
        write!(
            f,
            "{} files: {} {verb}, {} unchanged, {} skipped, {} failed",
            self.files(),
            self.modified,
            self.unchanged,
            self.skipped,
            self.failed
        )?;
        if self.excluded > 0 {
            write!(f, " ({} excluded)", self.excluded)?;
        }
        writeln!(f)?;
        write!(
            f,
            "docstrings: {} inserted, {} replaced, {} not generated",
            self.inserted, self.replaced, self.generator_failures
        )
    }
}
