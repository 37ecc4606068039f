//! Attribute names, attribute values, and change notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of an attribute exposed through the automation surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    Label,
    Value,
    Title,
    Description,
    Help,
    PlaceholderValue,
    ToolTip,
    Custom(String),
}

impl Attribute {
    /// Attributes an element exposes as user-facing text.
    pub fn user_facing() -> [Attribute; 6] {
        [
            Self::Label,
            Self::Value,
            Self::Title,
            Self::Description,
            Self::Help,
            Self::PlaceholderValue,
        ]
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Wire name, as automation clients see it.
    pub fn name(&self) -> &str {
        match self {
            Self::Label => "AXLabel",
            Self::Value => "AXValue",
            Self::Title => "AXTitle",
            Self::Description => "AXDescription",
            Self::Help => "AXHelp",
            Self::PlaceholderValue => "AXPlaceholderValue",
            Self::ToolTip => "AXToolTip",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One styled run of attributed text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub link: Option<String>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributedText {
    pub runs: Vec<TextRun>,
}

impl AttributedText {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }
}

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AxValue {
    Text(String),
    Attributed(AttributedText),
    Number(f64),
    Bool(bool),
}

impl From<&str> for AxValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AxValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<AttributedText> for AxValue {
    fn from(t: AttributedText) -> Self {
        Self::Attributed(t)
    }
}

/// Plain text of an attribute value.
///
/// Attributed text is flattened to its characters; numbers are rendered the
/// way they would be displayed. Booleans are state, not text, and yield
/// `None`.
pub fn pure_string(value: &AxValue) -> Option<String> {
    match value {
        AxValue::Text(s) => Some(s.clone()),
        AxValue::Attributed(t) => Some(t.runs.iter().map(|r| r.text.as_str()).collect()),
        AxValue::Number(n) => Some(n.to_string()),
        AxValue::Bool(_) => None,
    }
}

/// Change notifications a host posts for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notification {
    ValueChanged,
    TitleChanged,
    LabelChanged,
    DescriptionChanged,
    HelpChanged,
    LayoutChanged,
    FocusedElementChanged,
}

impl Notification {
    /// Attribute whose content the notification reports as changed.
    pub fn attribute(self) -> Option<Attribute> {
        match self {
            Self::ValueChanged => Some(Attribute::Value),
            Self::TitleChanged => Some(Attribute::Title),
            Self::LabelChanged => Some(Attribute::Label),
            Self::DescriptionChanged => Some(Attribute::Description),
            Self::HelpChanged => Some(Attribute::Help),
            Self::LayoutChanged | Self::FocusedElementChanged => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_string_flattens_runs() {
        let text = AttributedText::new(vec![
            TextRun {
                text: "Hal".into(),
                bold: true,
                ..TextRun::default()
            },
            TextRun::plain("lo"),
        ]);
        assert_eq!(pure_string(&text.into()).as_deref(), Some("Hallo"));
        assert_eq!(pure_string(&AxValue::Number(3.0)).as_deref(), Some("3"));
        assert_eq!(pure_string(&AxValue::Bool(true)), None);
    }

    #[test]
    fn notifications_map_to_attributes() {
        assert_eq!(Notification::ValueChanged.attribute(), Some(Attribute::Value));
        assert_eq!(Notification::TitleChanged.attribute(), Some(Attribute::Title));
        assert_eq!(Notification::LayoutChanged.attribute(), None);
    }

    #[test]
    fn attribute_names() {
        assert_eq!(Attribute::Label.to_string(), "AXLabel");
        assert_eq!(Attribute::custom("AXLocalizationKey").name(), "AXLocalizationKey");
        assert_eq!(Attribute::user_facing().len(), 6);
    }
}
