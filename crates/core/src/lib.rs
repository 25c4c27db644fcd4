pub mod config;
pub mod journal;
pub mod record;

pub use config::{ConfigError, RenameConfig, TesseractConfig};
pub use journal::{Journal, JournalEntry, JournalError};
pub use record::{ExtractedRecord, UNKNOWN};
