use std::sync::OnceLock;

use regex::Regex;
use scanrename_core::{ExtractedRecord, UNKNOWN};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// The name sits right after the check date, printed as "Last, First".
re!(re_dated_name, r"\d{2}/\d{2}/\d{4}\s(\w+, \w+)");
re!(re_date, r"(\d{2}/\d{2}/\d{4})");
re!(re_module_code, r"Pk_(\d{4})_");

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Extract name, date and module code from raw OCR text.
    ///
    /// Total: every field falls back to [`UNKNOWN`] on its own.
    pub fn extract(ocr_text: &str) -> ExtractedRecord {
        Self::extract_with_sentinel(ocr_text, UNKNOWN)
    }

    /// Like [`Extractor::extract`] with a caller-chosen placeholder.
    pub fn extract_with_sentinel(ocr_text: &str, sentinel: &str) -> ExtractedRecord {
        ExtractedRecord {
            name: Self::extract_name(ocr_text, sentinel),
            date: Self::extract_date(ocr_text, sentinel),
            module_code: Self::extract_module_code(ocr_text, sentinel),
        }
    }

    // ── Name ──────────────────────────────────────────────────────────────────

    fn extract_name(text: &str, sentinel: &str) -> String {
        match re_dated_name().captures(text).and_then(|c| c.get(1)) {
            Some(m) => reformat_name(m.as_str(), sentinel),
            None => sentinel.to_string(),
        }
    }

    // ── Date ─────────────────────────────────────────────────────────────────

    // Independent of the name search; with several dates on the page the two
    // may land on different ones.
    fn extract_date(text: &str, sentinel: &str) -> String {
        re_date()
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().replace('/', "-"))
            .unwrap_or_else(|| sentinel.to_string())
    }

    // ── Module code ───────────────────────────────────────────────────────────

    fn extract_module_code(text: &str, sentinel: &str) -> String {
        re_module_code()
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| sentinel.to_string())
    }
}

/// `"Last, First"` → `"First Last"`; anything that is not exactly two
/// `", "`-separated parts becomes `sentinel`.
pub fn reformat_name(raw: &str, sentinel: &str) -> String {
    let parts: Vec<&str> = raw.split(", ").collect();
    match parts.as_slice() {
        [last, first] => format!("{first} {last}"),
        _ => sentinel.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
