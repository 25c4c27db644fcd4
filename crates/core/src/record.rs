use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written into any field that could not be parsed.
pub const UNKNOWN: &str = "Unknown";

/// Metadata pulled out of one scanned mastery check.
///
/// Every field is always populated: a value that could not be found is the
/// sentinel (normally [`UNKNOWN`]), never an empty string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedRecord {
    /// Student name, canonical "First Last" form.
    pub name: String,
    /// Date as `MM-DD-YYYY`.
    pub date: String,
    /// Four-digit module code.
    pub module_code: String,
}

impl ExtractedRecord {
    pub fn new(
        name: impl Into<String>,
        date: impl Into<String>,
        module_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            module_code: module_code.into(),
        }
    }

    /// A record where nothing was recognised.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN)
    }

    /// True when none of the fields holds `sentinel`.
    pub fn is_complete(&self, sentinel: &str) -> bool {
        self.name != sentinel && self.date != sentinel && self.module_code != sentinel
    }

    /// `"<Name> <ModuleCode> <Date><extension>"`, fields verbatim.
    pub fn target_file_name(&self, extension: &str) -> String {
        format!("{self}{extension}")
    }
}

impl fmt::Display for ExtractedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.module_code, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_file_name_uses_single_spaces() {
        let r = ExtractedRecord::new("Jane Doe", "12-01-2023", "4821");
        assert_eq!(r.target_file_name(".jpg"), "Jane Doe 4821 12-01-2023.jpg");
    }

    #[test]
    fn unknown_fields_appear_verbatim() {
        let r = ExtractedRecord::unknown();
        assert_eq!(r.target_file_name(".jpg"), "Unknown Unknown Unknown.jpg");
        assert!(!r.is_complete(UNKNOWN));
    }

    #[test]
    fn completeness_depends_on_every_field() {
        let full = ExtractedRecord::new("Jane Doe", "12-01-2023", "4821");
        assert!(full.is_complete(UNKNOWN));

        let partial = ExtractedRecord { module_code: UNKNOWN.into(), ..full };
        assert!(!partial.is_complete(UNKNOWN));
    }

    #[test]
    fn serializes_with_snake_case_keys() {
        let r = ExtractedRecord::new("Jane Doe", "12-01-2023", "4821");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["module_code"], "4821");
        assert_eq!(json["name"], "Jane Doe");
    }
}
