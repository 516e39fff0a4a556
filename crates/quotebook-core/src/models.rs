//! Data models for Quotebook
//!
//! Defines the catalog's data structures: `Quote`, the `QuoteDraft` used to
//! create or update one, and the transient `ExternalSuggestion` offered by the
//! external quote provider.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned quote identifier
///
/// Opaque to the client: it is only compared and echoed back in paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub i64);

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for QuoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(QuoteId)
    }
}

impl From<i64> for QuoteId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A quote stored in the remote catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    /// Unique identifier (assigned by the catalog service)
    pub id: QuoteId,
    /// The quote itself
    pub text: String,
    /// Who said it
    pub author: String,
    /// When the catalog stored it
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Quote {
    /// Create a quote with the given id and content
    pub fn new(id: impl Into<QuoteId>, text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: author.into(),
            created_at: None,
        }
    }

    /// The editable content of this quote
    pub fn draft(&self) -> QuoteDraft {
        QuoteDraft::new(&self.text, &self.author)
    }
}

/// The content of a quote, as sent on create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoteDraft {
    pub text: String,
    pub author: String,
}

impl QuoteDraft {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }

    /// First field that is blank after trimming, if any
    pub fn missing_field(&self) -> Option<Field> {
        if self.text.trim().is_empty() {
            Some(Field::Text)
        } else if self.author.trim().is_empty() {
            Some(Field::Author)
        } else {
            None
        }
    }

    /// True when neither field has content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.author.trim().is_empty()
    }
}

/// A quote field, used to attribute validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Text,
    Author,
}

impl Field {
    /// Parse a field name as reported by the catalog service
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Field::Text),
            "author" => Some(Field::Author),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Text => write!(f, "text"),
            Field::Author => write!(f, "author"),
        }
    }
}

/// A quote proposed by the external provider, not yet in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalSuggestion {
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub author: String,
}

impl ExternalSuggestion {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }

    /// Whether the provider returned something usable
    pub fn is_complete(&self) -> bool {
        !self.text.trim().is_empty() && !self.author.trim().is_empty()
    }
}

impl From<ExternalSuggestion> for QuoteDraft {
    fn from(suggestion: ExternalSuggestion) -> Self {
        QuoteDraft::new(suggestion.text, suggestion.author)
    }
}

/// What to ask the external provider for
///
/// At most one of author or text can be given.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExternalQuery {
    /// Any quote at all
    #[default]
    Any,
    /// A quote by this author
    ByAuthor(String),
    /// A quote containing this text
    ByText(String),
}

impl ExternalQuery {
    /// Query parameters for the external fetch endpoint
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        match self {
            ExternalQuery::Any => Vec::new(),
            ExternalQuery::ByAuthor(author) => vec![("author", author.as_str())],
            ExternalQuery::ByText(text) => vec![("query", text.as_str())],
        }
    }
}

/// Treat `null` like an absent string
fn deserialize_nullable<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept both offset timestamps and the naive ones the catalog service emits
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_id_display_and_parse() {
        let id: QuoteId = " 42 ".parse().unwrap();
        assert_eq!(id, QuoteId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<QuoteId>().is_err());
    }

    #[test]
    fn test_quote_deserialize_naive_timestamp() {
        let json = r#"{"id": 7, "text": "Stay hungry", "author": "Jobs", "created_at": "2024-05-01T10:20:30"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.id, QuoteId(7));
        assert_eq!(
            quote.created_at.unwrap().to_rfc3339(),
            "2024-05-01T10:20:30+00:00"
        );
    }

    #[test]
    fn test_quote_deserialize_offset_timestamp() {
        let json = r#"{"id": 1, "text": "A", "author": "X", "created_at": "2024-05-01T12:00:00+02:00"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(
            quote.created_at.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_quote_without_timestamp() {
        let json = r#"{"id": 1, "text": "A", "author": "X"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert!(quote.created_at.is_none());

        let json = r#"{"id": 1, "text": "A", "author": "X", "created_at": null}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert!(quote.created_at.is_none());
    }

    #[test]
    fn test_quote_bad_timestamp_is_an_error() {
        let json = r#"{"id": 1, "text": "A", "author": "X", "created_at": "yesterday"}"#;
        assert!(serde_json::from_str::<Quote>(json).is_err());
    }

    #[test]
    fn test_draft_missing_field() {
        assert_eq!(QuoteDraft::new("", "X").missing_field(), Some(Field::Text));
        assert_eq!(QuoteDraft::new("A", "  ").missing_field(), Some(Field::Author));
        assert_eq!(QuoteDraft::new("A", "X").missing_field(), None);
        assert!(QuoteDraft::default().is_blank());
    }

    #[test]
    fn test_external_query_params() {
        assert!(ExternalQuery::Any.params().is_empty());
        assert_eq!(
            ExternalQuery::ByAuthor("Seneca".into()).params(),
            vec![("author", "Seneca")]
        );
        assert_eq!(
            ExternalQuery::ByText("life".into()).params(),
            vec![("query", "life")]
        );
    }

    #[test]
    fn test_suggestion_completeness() {
        assert!(ExternalSuggestion::new("A", "X").is_complete());
        assert!(!ExternalSuggestion::new("", "X").is_complete());

        let suggestion: ExternalSuggestion = serde_json::from_str(r#"{"text": "A"}"#).unwrap();
        assert!(!suggestion.is_complete());

        let suggestion: ExternalSuggestion =
            serde_json::from_str(r#"{"text": null, "author": "X"}"#).unwrap();
        assert_eq!(suggestion.text, "");
    }
}
