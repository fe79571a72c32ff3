//! Notion rich text runs.

use serde::{Deserialize, Serialize};

/// A single styled run of text.
///
/// Notion splits block text into runs wherever styling or links change.
/// Run order is significant and must be preserved when rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RichText {
    /// Run type (`text`, `mention` or `equation`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Unstyled text of the run.
    pub plain_text: String,
    /// Link target, if the run is a link.
    pub href: Option<String>,
    /// Inline styling.
    pub annotations: Annotations,
    /// Equation payload for `equation` runs.
    pub equation: Option<Equation>,
}

/// Inline styling flags of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Annotations {
    /// Bold text.
    pub bold: bool,
    /// Italic text.
    pub italic: bool,
    /// Struck-through text.
    pub strikethrough: bool,
    /// Underlined text (no markdown equivalent).
    pub underline: bool,
    /// Inline code.
    pub code: bool,
    /// Color name (`default`, `red`, `blue_background`, ...).
    pub color: String,
}

/// Inline equation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Equation {
    /// `LaTeX` source.
    pub expression: String,
}

impl RichText {
    /// Create an unstyled text run.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_owned(),
            plain_text: text.into(),
            ..Self::default()
        }
    }

    /// Create an inline equation run.
    #[must_use]
    pub fn equation(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self {
            kind: "equation".to_owned(),
            plain_text: expression.clone(),
            equation: Some(Equation { expression }),
            ..Self::default()
        }
    }

    /// Mark the run bold.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.annotations.bold = true;
        self
    }

    /// Mark the run italic.
    #[must_use]
    pub fn italic(mut self) -> Self {
        self.annotations.italic = true;
        self
    }

    /// Mark the run struck through.
    #[must_use]
    pub fn strikethrough(mut self) -> Self {
        self.annotations.strikethrough = true;
        self
    }

    /// Mark the run as inline code.
    #[must_use]
    pub fn code(mut self) -> Self {
        self.annotations.code = true;
        self
    }

    /// Attach a link target.
    #[must_use]
    pub fn with_link(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Equation source if this is an equation run.
    #[must_use]
    pub fn equation_source(&self) -> Option<&str> {
        if self.kind == "equation" {
            self.equation.as_ref().map(|e| e.expression.as_str())
        } else {
            None
        }
    }
}

/// Concatenate the plain text of all runs in order.
#[must_use]
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|run| run.plain_text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_text_run() {
        let json = r#"{
            "type": "text",
            "text": {"content": "Notion", "link": {"url": "https://notion.so"}},
            "annotations": {"bold": true, "italic": false, "strikethrough": false,
                            "underline": false, "code": false, "color": "default"},
            "plain_text": "Notion",
            "href": "https://notion.so"
        }"#;
        let run: RichText = serde_json::from_str(json).unwrap();
        assert_eq!(run.kind, "text");
        assert_eq!(run.plain_text, "Notion");
        assert_eq!(run.href.as_deref(), Some("https://notion.so"));
        assert!(run.annotations.bold);
        assert!(!run.annotations.code);
    }

    #[test]
    fn test_deserialize_equation_run() {
        let json = r#"{
            "type": "equation",
            "equation": {"expression": "E = mc^2"},
            "plain_text": "E = mc^2",
            "href": null
        }"#;
        let run: RichText = serde_json::from_str(json).unwrap();
        assert_eq!(run.equation_source(), Some("E = mc^2"));
        assert_eq!(run.annotations, Annotations::default());
    }

    #[test]
    fn test_plain_text_preserves_order() {
        let runs = vec![
            RichText::plain("Hello, "),
            RichText::plain("brave ").bold(),
            RichText::plain("world"),
        ];
        assert_eq!(plain_text(&runs), "Hello, brave world");
    }

    #[test]
    fn test_text_run_has_no_equation_source() {
        assert_eq!(RichText::plain("x").equation_source(), None);
    }
}
