//! The quote record and the add-form input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Category assigned to every quote that arrives from the sync remote.
pub const SERVER_CATEGORY: &str = "Server";

/// A single quote. There is no identifier: two quotes are "the same" when
/// their `text` matches exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub category: String,
}

impl Quote {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" — {}", self.text, self.category)
    }
}

/// Raw input from the add form, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewQuote {
    pub text: String,
    pub category: String,
}

impl NewQuote {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Trim both fields and reject the input if either ends up empty.
    pub fn validate(&self) -> Result<Quote, ValidationError> {
        let text = self.text.trim();
        let category = self.category.trim();

        if text.is_empty() || category.is_empty() {
            return Err(ValidationError);
        }

        Ok(Quote::new(text, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validate_trims_fields() {
        let quote = NewQuote::new("  Stay hungry. ", "\tLife\n").validate().unwrap();
        assert_eq!(quote, Quote::new("Stay hungry.", "Life"));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(NewQuote::new("", "Life").validate().is_err());
        assert!(NewQuote::new("text", "   ").validate().is_err());
        assert!(NewQuote::new(" \n ", "\t").validate().is_err());
    }

    #[test]
    fn display_matches_widget_format() {
        let quote = Quote::new("Get busy living or get busy dying.", "Motivation");
        assert_eq!(
            quote.to_string(),
            "\"Get busy living or get busy dying.\" — Motivation"
        );
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let quote: Quote = serde_json::from_str(r#"{"text":"only text","extra":1}"#).unwrap();
        assert_eq!(quote, Quote::new("only text", ""));
    }
}
