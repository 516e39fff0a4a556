//! Quote repository
//!
//! The controller talks to the remote catalog only through the
//! `QuoteRepository` trait. `HttpQuoteRepository` is the production
//! implementation; tests substitute an in-memory one.
//!
//! Every method either resolves with a typed payload or fails with an
//! `ApiError`. Nothing here retries: recovery is the controller's call.

mod http;

pub use http::HttpQuoteRepository;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{ExternalQuery, ExternalSuggestion, Quote, QuoteDraft, QuoteId};

/// Result type for repository operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Remote catalog operations plus the external suggestion lookup
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Every quote in the catalog
    async fn list_all(&self) -> ApiResult<Vec<Quote>>;

    /// One quote picked by the service; `NotFound` when the catalog is empty
    async fn get_random(&self) -> ApiResult<Quote>;

    /// Quotes whose text or author matches `term`; an empty term lists all
    async fn search(&self, term: &str) -> ApiResult<Vec<Quote>>;

    async fn create(&self, draft: &QuoteDraft) -> ApiResult<Quote>;

    async fn update(&self, id: QuoteId, draft: &QuoteDraft) -> ApiResult<Quote>;

    async fn delete(&self, id: QuoteId) -> ApiResult<()>;

    /// Ask the external provider for a suggestion
    async fn fetch_external(&self, query: &ExternalQuery) -> ApiResult<ExternalSuggestion>;
}
