pub mod batch;
pub mod extract;
pub mod loader;
pub mod recognizer;
pub mod watch;

pub use batch::{
    BatchProcessor, BatchReport, FileOutcome, OutcomeStatus, ProgressSink, StatusSink,
    COMPLETED_MESSAGE,
};
pub use extract::{reformat_name, Extractor};
pub use loader::{ImageFileLoader, ImageLoader, LoadError};
pub use recognizer::{CommandRecognizer, MockRecognizer, OcrError, TextRecognizer};
pub use watch::{eligible_arrivals, spawn_intake_watcher};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
