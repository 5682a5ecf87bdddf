use serde::{Deserialize, Serialize};

use crate::error::HighlightError;

/// The fallback when the extractor couldn't detect a colour.
pub const DEFAULT_COLOUR: &str = "yellow";

fn default_colour() -> String {
    DEFAULT_COLOUR.to_string()
}

/// A single saved excerpt of text with its metadata, as produced by the
/// extractors. The pair (text, source_id) identifies a highlight; everything
/// else is metadata that a later submission may refresh.
///
/// Every field is defaulted at the deserialization boundary so a sparse
/// record decodes instead of failing the whole batch. Whether the required
/// fields are actually present is checked per record via [`validate`].
///
/// [`validate`]: Highlight::validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub note: String,
    #[serde(rename = "color", default = "default_colour")]
    pub colour: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub source_title: String,
}

impl Default for Highlight {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            text: String::new(),
            note: String::new(),
            colour: default_colour(),
            source_id: String::new(),
            source_title: String::new(),
        }
    }
}

impl Highlight {
    /// Checks the fields that make up the deduplication key.
    pub fn validate(&self) -> Result<(), HighlightError> {
        if self.text.trim().is_empty() {
            return Err(HighlightError::MissingText);
        }
        if self.source_id.trim().is_empty() {
            return Err(HighlightError::MissingSourceId);
        }
        Ok(())
    }
}

/// A highlight as it sits in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredHighlight {
    pub id: i64,
    #[serde(flatten)]
    pub highlight: Highlight,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_falls_back_when_missing() {
        let hl: Highlight = serde_json::from_str(r#"{"text": "t", "source_id": "s"}"#).unwrap();
        assert_eq!(hl.colour, DEFAULT_COLOUR);
        assert!(hl.validate().is_ok());
    }

    #[test]
    fn colour_uses_the_wire_name_color() {
        let hl = Highlight {
            text: "t".to_string(),
            source_id: "s".to_string(),
            colour: "pink".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&hl).unwrap();
        assert_eq!(json["color"], "pink");
        assert!(json.get("colour").is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let hl: Highlight = serde_json::from_str(
            r#"{"text": "t", "source_id": "s", "color": "blue", "page": 12}"#,
        )
        .unwrap();
        assert_eq!(hl.colour, "blue");
    }

    #[test]
    fn records_without_the_key_fields_fail_validation() {
        let hl: Highlight = serde_json::from_str(r#"{"note": "only a note"}"#).unwrap();
        assert_eq!(hl.validate(), Err(HighlightError::MissingText));

        let hl: Highlight = serde_json::from_str(r#"{"text": "t"}"#).unwrap();
        assert_eq!(hl.validate(), Err(HighlightError::MissingSourceId));
    }
}
