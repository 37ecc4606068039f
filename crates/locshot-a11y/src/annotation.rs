//! Synthetic nodes carrying localization metadata.
//!
//! An annotation copies the record data it was built from, so draining or
//! expiring the record afterwards leaves the annotation intact.

use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;

pub const LOCALIZATION_KEY: &str = "AXLocalizationKey";
pub const TRANSLATED_STRING: &str = "AXTranslatedString";
pub const DEVELOPMENT_STRING: &str = "AXDevelopmentString";
pub const NIB_KEY: &str = "AXTranslatedStringNibKey";
pub const MERGED_UI_STRING: &str = "AXMergedUIString";
pub const REMAINDER: &str = "AXRemainder";
pub const TABLE: &str = "AXStringTable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationElement {
    pub localization_key: String,
    pub translated_string: String,
    pub development_string: Option<String>,
    pub table: Option<String>,
    pub translated_string_nib_key: Option<String>,
    /// Full UI string when the translation is only part of it.
    pub merged_ui_string: Option<String>,
    /// UI string with the translation removed.
    pub remainder: Option<String>,
    /// Attribute of the parent the match was found in.
    pub source_attribute: Option<Attribute>,
}

impl AnnotationElement {
    pub fn new(localization_key: impl Into<String>, translated_string: impl Into<String>) -> Self {
        Self {
            localization_key: localization_key.into(),
            translated_string: translated_string.into(),
            development_string: None,
            table: None,
            translated_string_nib_key: None,
            merged_ui_string: None,
            remainder: None,
            source_attribute: None,
        }
    }

    #[must_use]
    pub fn development_string(mut self, s: impl Into<String>) -> Self {
        self.development_string = Some(s.into());
        self
    }

    #[must_use]
    pub fn table(mut self, s: impl Into<String>) -> Self {
        self.table = Some(s.into());
        self
    }

    #[must_use]
    pub fn nib_key(mut self, s: impl Into<String>) -> Self {
        self.translated_string_nib_key = Some(s.into());
        self
    }

    /// Record the full UI string and what is left of it without the
    /// translation. Both are omitted when the remainder is blank.
    #[must_use]
    pub fn merged(mut self, ui_string: impl Into<String>, remainder: impl Into<String>) -> Self {
        let remainder = remainder.into();
        if !remainder.trim().is_empty() {
            self.merged_ui_string = Some(ui_string.into());
            self.remainder = Some(remainder);
        }
        self
    }

    #[must_use]
    pub fn source(mut self, attribute: Attribute) -> Self {
        self.source_attribute = Some(attribute);
        self
    }

    /// True when both annotate the same localization.
    pub fn same_match(&self, key: &str, translated: &str) -> bool {
        self.localization_key == key && self.translated_string == translated
    }

    /// Attributes exposed to automation clients, in a stable order.
    pub fn attributes(&self) -> Vec<(Attribute, String)> {
        let mut out = vec![
            (Attribute::custom(LOCALIZATION_KEY), self.localization_key.clone()),
            (Attribute::custom(TRANSLATED_STRING), self.translated_string.clone()),
        ];
        let optional = [
            (DEVELOPMENT_STRING, &self.development_string),
            (TABLE, &self.table),
            (NIB_KEY, &self.translated_string_nib_key),
            (MERGED_UI_STRING, &self.merged_ui_string),
            (REMAINDER, &self.remainder),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                out.push((Attribute::custom(name), value.clone()));
            }
        }
        out
    }

    /// One-line summary for logs.
    pub fn description(&self) -> String {
        let mut s = format!(
            "key={:?} translated={:?}",
            self.localization_key, self.translated_string
        );
        if let Some(dev) = &self.development_string {
            s.push_str(&format!(" dev={dev:?}"));
        }
        if let Some(remainder) = &self.remainder {
            s.push_str(&format!(" remainder={remainder:?}"));
        }
        s
    }
}
