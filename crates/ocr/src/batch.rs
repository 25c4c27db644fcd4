use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use scanrename_core::{ExtractedRecord, RenameConfig};

use crate::extract::Extractor;
use crate::loader::{ImageFileLoader, ImageLoader};
use crate::recognizer::TextRecognizer;

pub const COMPLETED_MESSAGE: &str = "Processing completed.";

/// Receives the fraction of eligible files processed so far (0.0–1.0).
pub trait ProgressSink {
    fn progress(&mut self, fraction: f64);
}

/// Receives one human-readable status line at a time.
pub trait StatusSink {
    fn status(&mut self, message: &str);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

impl<F: FnMut(&str)> StatusSink for F {
    fn status(&mut self, message: &str) {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Renamed,
    /// Dry run: the rename would have happened.
    Planned,
    Collision,
    Unreadable,
    RecognitionFailed,
    RenameFailed,
}

impl OutcomeStatus {
    /// Whether the file advanced the progress count.
    pub fn counts_as_processed(self) -> bool {
        !matches!(self, OutcomeStatus::Unreadable | OutcomeStatus::RecognitionFailed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub target: Option<PathBuf>,
    pub record: Option<ExtractedRecord>,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one `process` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub eligible: usize,
    pub processed: usize,
    pub renamed: usize,
    pub planned: usize,
    pub collisions: usize,
    pub unreadable: usize,
    pub failed: usize,
    /// Processed files with at least one field left at the sentinel.
    pub incomplete: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome.status {
            OutcomeStatus::Renamed => self.renamed += 1,
            OutcomeStatus::Planned => self.planned += 1,
            OutcomeStatus::Collision => self.collisions += 1,
            OutcomeStatus::Unreadable => self.unreadable += 1,
            OutcomeStatus::RecognitionFailed | OutcomeStatus::RenameFailed => self.failed += 1,
        }
        if outcome.status.counts_as_processed() {
            self.processed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Outcomes whose file actually moved.
    pub fn renamed_outcomes(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status == OutcomeStatus::Renamed)
    }
}

enum MoveResult {
    Moved,
    Planned,
    Collision,
    Failed(std::io::Error),
}

/// Orchestrates: enumerate → load → OCR → extract → rename → report.
pub struct BatchProcessor<R: TextRecognizer, L: ImageLoader = ImageFileLoader> {
    config: RenameConfig,
    recognizer: R,
    loader: L,
}

impl<R: TextRecognizer> BatchProcessor<R> {
    pub fn new(config: RenameConfig, recognizer: R) -> Self {
        Self { config, recognizer, loader: ImageFileLoader }
    }
}

impl<R: TextRecognizer, L: ImageLoader> BatchProcessor<R, L> {
    pub fn with_loader<L2: ImageLoader>(self, loader: L2) -> BatchProcessor<R, L2> {
        BatchProcessor { config: self.config, recognizer: self.recognizer, loader }
    }

    pub fn config(&self) -> &RenameConfig {
        &self.config
    }

    /// Entries of `input` passing the prefix/extension filter, in directory order.
    pub fn eligible_files(&self, input: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(input)? {
            let entry = entry?;
            // Undecodable bytes become U+FFFD; prefix and extension still match.
            let name = entry.file_name();
            if self.config.is_eligible(&name.to_string_lossy()) {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    /// Rename every eligible file in `input` into `output`.
    ///
    /// Per-file failures are reported through `status` and never abort the
    /// batch. The last status line is always [`COMPLETED_MESSAGE`].
    pub fn process<P, S>(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut P,
        status: &mut S,
    ) -> BatchReport
    where
        P: ProgressSink + ?Sized,
        S: StatusSink + ?Sized,
    {
        let mut report = BatchReport::default();

        let files = match self.eligible_files(input) {
            Ok(files) => files,
            Err(e) => {
                warn!("Cannot read input folder {}: {e}", input.display());
                status.status(&format!("Cannot read input folder {}: {e}", input.display()));
                status.status(COMPLETED_MESSAGE);
                return report;
            }
        };

        report.eligible = files.len();
        info!(
            "Found {} eligible files in {}{}",
            files.len(),
            input.display(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        // Only consulted in dry runs, where nothing lands on disk.
        let mut planned_targets = HashSet::new();

        for path in files {
            let file_name = display_name(&path);
            let outcome = self.process_file(&path, output, &mut planned_targets);

            match outcome.status {
                OutcomeStatus::Unreadable => {
                    status.status(&format!("Cannot identify image file: {file_name}. Skipping."));
                }
                OutcomeStatus::RecognitionFailed => {
                    status.status(&format!(
                        "Text recognition failed for {file_name}: {}. Skipping.",
                        outcome.error.as_deref().unwrap_or_default()
                    ));
                }
                OutcomeStatus::Collision => {
                    let target = outcome.target.as_deref().map(display_name).unwrap_or_default();
                    status.status(&format!("File already exists: {target}. Skipping."));
                }
                OutcomeStatus::RenameFailed => {
                    status.status(&format!(
                        "Cannot rename {file_name}: {}. Skipping.",
                        outcome.error.as_deref().unwrap_or_default()
                    ));
                }
                OutcomeStatus::Renamed | OutcomeStatus::Planned => {}
            }

            let counted = outcome.status.counts_as_processed();
            let incomplete = outcome
                .record
                .as_ref()
                .is_some_and(|r| !r.is_complete(&self.config.sentinel));
            if incomplete {
                report.incomplete += 1;
            }
            report.record(outcome);

            if counted {
                progress.progress(report.processed as f64 / report.eligible as f64);
                status.status(&format!("Processing {file_name}..."));
            }
        }

        info!(
            "Batch done: {} processed, {} renamed, {} collisions, {} unreadable",
            report.processed, report.renamed, report.collisions, report.unreadable
        );
        status.status(COMPLETED_MESSAGE);
        report
    }

    fn process_file(
        &self,
        path: &Path,
        output: &Path,
        planned_targets: &mut HashSet<PathBuf>,
    ) -> FileOutcome {
        let mut outcome = FileOutcome {
            source: path.to_path_buf(),
            target: None,
            record: None,
            status: OutcomeStatus::Unreadable,
            error: None,
        };

        let image = match self.loader.load(path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        // The image handle is released here, before any filesystem work.
        let text = self.recognizer.recognize(&image);
        drop(image);

        let text = match text {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR failed for {}: {e}", path.display());
                outcome.status = OutcomeStatus::RecognitionFailed;
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        let record = Extractor::extract_with_sentinel(&text, &self.config.sentinel);
        let target = output.join(record.target_file_name(&self.config.extension));
        debug!("{} -> {}", path.display(), target.display());

        outcome.status = match self.move_file(path, &target, planned_targets) {
            MoveResult::Moved => OutcomeStatus::Renamed,
            MoveResult::Planned => OutcomeStatus::Planned,
            MoveResult::Collision => {
                warn!("Target already exists: {}", target.display());
                OutcomeStatus::Collision
            }
            MoveResult::Failed(e) => {
                warn!("Rename of {} failed: {e}", path.display());
                outcome.error = Some(e.to_string());
                OutcomeStatus::RenameFailed
            }
        };
        outcome.record = Some(record);
        outcome.target = Some(target);
        outcome
    }

    // A colliding source stays where it is; it is not retried under another name.
    fn move_file(
        &self,
        source: &Path,
        target: &Path,
        planned_targets: &mut HashSet<PathBuf>,
    ) -> MoveResult {
        // symlink_metadata so a dangling link still counts as taken.
        if target.symlink_metadata().is_ok() {
            return MoveResult::Collision;
        }
        if self.config.dry_run {
            return if planned_targets.insert(target.to_path_buf()) {
                MoveResult::Planned
            } else {
                MoveResult::Collision
            };
        }
        match std::fs::rename(source, target) {
            Ok(()) => MoveResult::Moved,
            Err(e) => MoveResult::Failed(e),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
