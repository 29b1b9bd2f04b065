//! Target language tags.

use std::fmt;

use crate::error::{Result, TransfeedError};

/// A syntactically valid BCP 47 language tag such as `ja` or `pt-BR`.
///
/// Only the shape is checked: an alphabetic primary subtag of 2 to 8
/// letters followed by alphanumeric subtags of 1 to 8 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parse and validate a language tag.
    pub fn parse(tag: &str) -> Result<Self> {
        let mut subtags = tag.split('-');

        let primary = subtags.next().unwrap_or_default();
        let primary_ok =
            (2..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
        let rest_ok = subtags.all(|s| {
            (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric())
        });

        if !primary_ok || !rest_ok {
            return Err(TransfeedError::Config(format!(
                "invalid language tag: {:?}",
                tag
            )));
        }

        Ok(Self(tag.to_string()))
    }

    /// The tag as sent to the translation backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_tags() {
        for tag in ["ja", "en", "pt-BR", "zh-Hant-TW", "es-419", "fil"] {
            let parsed = LanguageTag::parse(tag).unwrap();
            assert_eq!(parsed.as_str(), tag);
            assert_eq!(parsed.to_string(), tag);
        }
    }

    #[test]
    fn test_parse_invalid_tags() {
        for tag in ["", "j", "ja-", "ja_JP", "not a tag", "123", "ja-toolongsubtag"] {
            assert!(LanguageTag::parse(tag).is_err(), "{:?}", tag);
        }
    }
}
