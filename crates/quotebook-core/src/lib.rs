//! Quotebook Core Library
//!
//! This crate provides the client side of Quotebook: a typed client for the
//! remote quote catalog, the session's catalog state, and the controller that
//! keeps the two in step while remote calls overlap.
//!
//! # Architecture
//!
//! - **Repository**: one async method per remote capability, failing with a
//!   four-kind `ApiError`
//! - **Store**: mutex-guarded session state with named setters and a watch
//!   channel as the re-render signal
//! - **Controller**: turns user intents into repository calls and drops
//!   completions that a newer call has superseded
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let repo = HttpQuoteRepository::from_config(&config)?;
//! let controller = SyncController::new(repo);
//!
//! controller.initial_load().await?;
//! controller.search("courage").await?;
//!
//! for quote in controller.snapshot().quotes {
//!     println!("{} - {}", quote.text, quote.author);
//! }
//! ```
//!
//! # Modules
//!
//! - `sync`: Controller and sequence tracking (main entry point)
//! - `store`: Session catalog state
//! - `repository`: Remote catalog client
//! - `models`: Quotes, drafts and external suggestions
//! - `error`: Error taxonomy
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{ApiError, ErrorKind, Failure, Operation};
pub use models::{ExternalQuery, ExternalSuggestion, Field, Quote, QuoteDraft, QuoteId};
pub use repository::{ApiResult, HttpQuoteRepository, QuoteRepository};
pub use store::{CatalogState, CatalogStore, RandomOutcome, ViewMode};
pub use sync::{SaveResult, SyncController, SyncResult};
