use serde::{Deserialize, Serialize};

/// Table used when a lookup does not name one.
pub const DEFAULT_TABLE: &str = "Localizable";

/// One resolved localized string, as reported by the localization layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizationRecord {
    pub key: String,
    /// String in the development language (the lookup's fallback value).
    pub development_string: String,
    pub table: String,
    /// What the lookup returned; the UI is expected to display this.
    pub result_string: String,
    #[serde(default)]
    pub is_system_origin: bool,
}

impl LocalizationRecord {
    pub fn new(
        key: impl Into<String>,
        development_string: impl Into<String>,
        table: impl Into<String>,
        result_string: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            development_string: development_string.into(),
            table: table.into(),
            result_string: result_string.into(),
            is_system_origin: false,
        }
    }

    #[must_use]
    pub fn system_origin(mut self, is_system_origin: bool) -> Self {
        self.is_system_origin = is_system_origin;
        self
    }

    /// The record with the system flag cleared, used for set membership.
    pub(crate) fn identity(&self) -> RecordIdentity {
        RecordIdentity {
            key: self.key.clone(),
            development_string: self.development_string.clone(),
            table: self.table.clone(),
            result_string: self.result_string.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RecordIdentity {
    key: String,
    development_string: String,
    table: String,
    result_string: String,
}
