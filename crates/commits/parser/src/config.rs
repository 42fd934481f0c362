use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::ParserConfigError;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Words that introduce the deadline phrase. Matched case-insensitively at
    /// word boundaries; the first occurrence wins.
    #[serde(default = "default_deadline_keywords")]
    pub deadline_keywords: Vec<String>,

    /// Trailing path segments that mark the commitment as already kept.
    #[serde(default = "default_completion_markers")]
    pub completion_markers: Vec<String>,

    /// Offset from UTC in which natural-language phrases are interpreted.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            deadline_keywords: default_deadline_keywords(),
            completion_markers: default_completion_markers(),
            utc_offset_minutes: 0,
        }
    }
}

impl ParserConfig {
    /// The configured local offset.
    pub fn offset(&self) -> Result<FixedOffset, ParserConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ParserConfigError::InvalidOffset(self.utc_offset_minutes))
    }

    pub fn validate(&self) -> Result<(), ParserConfigError> {
        let blank = self
            .deadline_keywords
            .iter()
            .chain(&self.completion_markers)
            .any(|word| word.trim().is_empty());
        if blank {
            return Err(ParserConfigError::BlankWord);
        }
        self.offset().map(|_| ())
    }
}

fn default_deadline_keywords() -> Vec<String> {
    ["by", "before", "until", "till"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_completion_markers() -> Vec<String> {
    ["done", "completed", "fulfilled", "kept"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ParserConfig::default();
        config.validate().unwrap();
        assert_eq!(config.offset().unwrap(), FixedOffset::east_opt(0).unwrap());
        assert!(config.deadline_keywords.iter().any(|k| k == "by"));
    }

    #[test]
    fn offset_out_of_range_is_rejected() {
        let config = ParserConfig {
            utc_offset_minutes: 25 * 60,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ParserConfigError::InvalidOffset(1500))
        ));
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let config = ParserConfig {
            deadline_keywords: vec!["by".into(), "  ".into()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ParserConfigError::BlankWord)));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: ParserConfig =
            serde_json::from_str(r#"{ "utc_offset_minutes": -300 }"#).unwrap();
        assert_eq!(config.deadline_keywords, default_deadline_keywords());
        assert_eq!(config.offset().unwrap().local_minus_utc(), -300 * 60);
    }
}
