use anyhow::{bail, Context};
use clap::{Args, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{info, warn};

use scanrename_core::{Journal, JournalEntry, RenameConfig};
use scanrename_ocr::{BatchProcessor, BatchReport, Extractor, TextRecognizer};

use crate::progress::TerminalSinks;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Folder holding the scanner output
    input: PathBuf,

    /// Folder the renamed files are moved into
    output: PathBuf,

    /// Show what would be renamed without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Record every rename in this JSON-lines journal (enables `undo`)
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Summary format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// File with recognised text; reads stdin when omitted
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    input: PathBuf,
    output: PathBuf,

    #[arg(long)]
    journal: Option<PathBuf>,

    /// Wait this long after an arrival before renaming, so the scanner can finish writing
    #[arg(long, default_value = "500")]
    settle_ms: u64,
}

#[derive(Args, Debug)]
pub struct UndoArgs {
    #[arg(long, default_value = "scanrename-journal.jsonl")]
    journal: PathBuf,

    /// Number of renames to undo, newest first
    #[arg(short = 'n', long, default_value = "1")]
    count: usize,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(not(feature = "tesseract"))]
fn recognizer(config: &RenameConfig) -> impl TextRecognizer {
    scanrename_ocr::CommandRecognizer::from_config(&config.tesseract)
}

#[cfg(feature = "tesseract")]
fn recognizer(config: &RenameConfig) -> impl TextRecognizer {
    scanrename_ocr::TesseractRecognizer::from_config(&config.tesseract)
}

pub fn run(config: RenameConfig, args: RunArgs, quiet: bool) -> anyhow::Result<()> {
    let dry_run = args.dry_run || config.dry_run;
    let config = config.with_dry_run(dry_run);
    if !dry_run {
        std::fs::create_dir_all(&args.output)
            .with_context(|| format!("creating output folder {}", args.output.display()))?;
    }

    let recognizer = recognizer(&config);
    let processor = BatchProcessor::new(config, recognizer);
    let quiet = quiet || matches!(args.format, OutputFormat::Json);
    let report = run_batch(&processor, &args.input, &args.output, quiet);

    if let Some(path) = &args.journal {
        let written = record_renames(&Journal::new(path.clone()), &report)?;
        info!("Journaled {written} renames to {}", path.display());
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_summary(&report, dry_run),
    }
    Ok(())
}

fn run_batch<R: TextRecognizer>(
    processor: &BatchProcessor<R>,
    input: &Path,
    output: &Path,
    quiet: bool,
) -> BatchReport {
    let sinks = TerminalSinks::new(quiet);
    let report = processor.process(input, output, &mut sinks.progress(), &mut sinks.status());
    sinks.finish();
    report
}

fn print_summary(report: &BatchReport, dry_run: bool) {
    println!("{}", summary_line(report, dry_run));
}

fn summary_line(report: &BatchReport, dry_run: bool) -> String {
    let moved = if dry_run {
        format!("{} would be renamed", report.planned)
    } else {
        format!("{} renamed", report.renamed)
    };
    format!(
        "{} of {} eligible files processed: {moved}, {} collisions, {} unreadable, {} failed, \
         {} with unrecognised fields",
        report.processed,
        report.eligible,
        report.collisions,
        report.unreadable,
        report.failed,
        report.incomplete
    )
}

/// Append one journal entry per file that actually moved.
pub fn record_renames(journal: &Journal, report: &BatchReport) -> anyhow::Result<usize> {
    let mut written = 0;
    for outcome in report.renamed_outcomes() {
        let (Some(target), Some(record)) = (&outcome.target, &outcome.record) else {
            continue;
        };
        journal
            .append(&JournalEntry::new(outcome.source.clone(), target.clone(), record.clone()))
            .with_context(|| format!("writing journal {}", journal.path().display()))?;
        written += 1;
    }
    Ok(written)
}

pub fn extract(config: &RenameConfig, args: ExtractArgs) -> anyhow::Result<()> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let record = Extractor::extract_with_sentinel(&text, &config.sentinel);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn watch(config: RenameConfig, args: WatchArgs, quiet: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating output folder {}", args.output.display()))?;
    let journal = args.journal.clone().map(Journal::new);

    let (tx, rx) = mpsc::channel();
    let _watcher = scanrename_ocr::spawn_intake_watcher(&args.input, config.clone(), tx)
        .with_context(|| format!("watching {}", args.input.display()))?;
    info!("Watching intake folder: {}", args.input.display());

    let recognizer = recognizer(&config);
    let processor = BatchProcessor::new(config, recognizer);
    let settle = Duration::from_millis(args.settle_ms);

    loop {
        let report = run_batch(&processor, &args.input, &args.output, quiet);
        if let Some(journal) = &journal {
            record_renames(journal, &report)?;
        }
        if report.eligible > 0 {
            print_summary(&report, processor.config().dry_run);
        }

        let Ok(first) = rx.recv() else {
            warn!("Watcher stopped");
            return Ok(());
        };
        info!("New scan: {}", first.display());
        std::thread::sleep(settle);
        // Anything queued meanwhile is covered by the next batch.
        while rx.try_recv().is_ok() {}
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct UndoSummary {
    pub restored: usize,
    pub skipped: usize,
}

pub fn undo(args: UndoArgs) -> anyhow::Result<()> {
    let journal = Journal::new(args.journal.clone());
    if !journal.path().exists() {
        bail!("journal {} does not exist", journal.path().display());
    }
    let summary = undo_renames(&journal, args.count, args.dry_run)?;
    println!("{} restored, {} skipped", summary.restored, summary.skipped);
    Ok(())
}

/// Move the newest `count` journaled targets back to their source paths.
pub fn undo_renames(journal: &Journal, count: usize, dry_run: bool) -> anyhow::Result<UndoSummary> {
    let mut summary = UndoSummary::default();
    for entry in journal.undoable()?.into_iter().take(count) {
        if !entry.target.exists() {
            warn!("Renamed file is gone: {}", entry.target.display());
            summary.skipped += 1;
            continue;
        }
        if entry.source.exists() {
            warn!("Refusing to overwrite {}", entry.source.display());
            summary.skipped += 1;
            continue;
        }
        if dry_run {
            println!("{} -> {}", entry.target.display(), entry.source.display());
        } else {
            std::fs::rename(&entry.target, &entry.source).with_context(|| {
                format!("moving {} back to {}", entry.target.display(), entry.source.display())
            })?;
            journal.mark_undone(&entry.id)?;
        }
        summary.restored += 1;
    }
    Ok(summary)
}

pub fn config(config: &RenameConfig, action: ConfigCommands, path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Show => print!("{}", config.to_toml()?),
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(path, RenameConfig::default().to_toml()?)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
