//! Error handling
//!
//! `ApiError` is the four-kind taxonomy every repository call fails with.
//! Transport details are flattened to messages at the client boundary, so the
//! store and controller never see a raw `reqwest` error.
//!
//! `Failure` pairs an `ApiError` with the sequence that hit it; it is what the
//! store records as the last error and what adapters show the user.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::models::Field;

/// Errors returned by the quote repository
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Could not reach the service (connect, timeout, broken request)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was rejected (4xx) or failed local validation
    #[error("Validation failed: {message}")]
    Validation {
        field: Option<Field>,
        message: String,
    },

    /// The service failed (5xx) or answered with something unreadable
    #[error("Server error: {0}")]
    Server(String),
}

/// Discriminant of `ApiError`, for matching without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    NotFound,
    Validation,
    Server,
}

impl ApiError {
    /// Local validation failure for an empty form field
    pub fn empty_field(field: Field) -> Self {
        ApiError::Validation {
            field: Some(field),
            message: format!("The {} field must not be empty", field),
        }
    }

    /// Classify a non-success HTTP response
    ///
    /// `body` is the raw response body; FastAPI-style `detail` payloads are
    /// mined for a message and the offending field.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = parse_detail(body);
        let message = detail
            .as_ref()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| status.to_string());

        if status == StatusCode::NOT_FOUND {
            ApiError::NotFound(message)
        } else if status.is_client_error() {
            ApiError::Validation {
                field: detail.and_then(|d| d.field),
                message,
            }
        } else {
            ApiError::Server(message)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Server(_) => ErrorKind::Server,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Server(format!("Malformed response: {}", error))
        } else if let Some(status) = error.status() {
            ApiError::from_status(status, "")
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

/// Message and field extracted from an error body
#[derive(Debug, Clone, PartialEq, Eq)]
struct Detail {
    message: String,
    field: Option<Field>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: DetailBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetailBody {
    Message(String),
    Items(Vec<DetailItem>),
}

#[derive(Deserialize)]
struct DetailItem {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

fn parse_detail(body: &str) -> Option<Detail> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        DetailBody::Message(message) => Some(Detail {
            message,
            field: None,
        }),
        DetailBody::Items(items) => {
            let first = items.into_iter().next()?;
            let field = first
                .loc
                .last()
                .and_then(|v| v.as_str())
                .and_then(Field::from_name);
            Some(Detail {
                message: first.msg,
                field,
            })
        }
    }
}

/// The sequence a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadCatalog,
    Search,
    Random,
    Create,
    Update,
    Delete,
    ExternalFetch,
    Adopt,
}

impl Operation {
    fn describe(self) -> &'static str {
        match self {
            Operation::LoadCatalog => "Failed to load the quote list",
            Operation::Search => "Search failed",
            Operation::Random => "Failed to load a random quote",
            Operation::Create => "Failed to save the quote",
            Operation::Update => "Failed to update the quote",
            Operation::Delete => "Failed to delete the quote",
            Operation::ExternalFetch => "External lookup failed",
            Operation::Adopt => "Failed to add the external quote",
        }
    }
}

/// A failed sequence, as recorded in the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {source}", .operation.describe())]
pub struct Failure {
    pub operation: Operation,
    #[source]
    pub source: ApiError,
}

impl Failure {
    pub fn new(operation: Operation, source: ApiError) -> Self {
        Self { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The single message shown to the user for this sequence
    ///
    /// Validation messages come from the server (or the local check) and are
    /// shown as-is; everything else gets the sequence's description.
    pub fn user_message(&self) -> String {
        match &self.source {
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Network(_) => format!(
                "{}. Check that the quote service is reachable.",
                self.operation.describe()
            ),
            ApiError::NotFound(_) if self.operation == Operation::Random => {
                "No quotes yet. Add some to get a random one!".to_string()
            }
            _ => format!("{}.", self.operation.describe()),
        }
    }
}
