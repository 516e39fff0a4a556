//! Synchronization controller
//!
//! Every user intent maps to one method here. A method issues the repository
//! calls for its sequence, applies the results to the store through the
//! guarded setters, and returns the failure (if any) it recorded.
//!
//! ## Reconciliation
//!
//! The catalog service is authoritative. After a successful create or update
//! the saved quote is shown at once, the view goes back to the full catalog
//! and both the list and the random pick are reloaded. After a successful delete the quote is dropped locally
//! and the current view (list or search) is reloaded; if the random pick was
//! the deleted quote a new one is requested once the delete is confirmed.
//!
//! ## Concurrency
//!
//! Methods take `&self` and the controller is cheap to clone, so a UI can
//! spawn intents as independent tasks. Overlapping calls of the same class
//! are resolved by sequence number: only the latest issued call may write.

use std::sync::Arc;

use futures_util::future::join;
use tracing::{debug, info, warn};

use crate::error::{ApiError, Failure, Operation};
use crate::models::{ExternalQuery, Quote, QuoteDraft, QuoteId};
use crate::repository::QuoteRepository;
use crate::store::{CatalogState, CatalogStore, RandomOutcome, ViewMode};
use crate::sync::{SequenceClass, Ticket};

/// Notice shown when the external source has no match
pub const EXTERNAL_NOT_FOUND: &str = "No matching quote found in the external source.";

/// Upper bound on re-picks when random keeps naming deleted quotes
const MAX_RANDOM_ATTEMPTS: usize = 3;

/// Result of a controller sequence
pub type SyncResult = Result<(), Failure>;

/// Result of a save: the quote as the service stored it
pub type SaveResult = Result<Quote, Failure>;

/// Drives the store from user intents
pub struct SyncController<R> {
    repo: Arc<R>,
    store: CatalogStore,
}

impl<R> Clone for SyncController<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            store: self.store.clone(),
        }
    }
}

impl<R: QuoteRepository + 'static> SyncController<R> {
    /// Create a controller with a fresh store
    pub fn new(repo: R) -> Self {
        Self::with_store(Arc::new(repo), CatalogStore::new())
    }

    /// Create a controller over an existing store
    pub fn with_store(repo: Arc<R>, store: CatalogStore) -> Self {
        Self { repo, store }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Shorthand for `store().snapshot()`
    pub fn snapshot(&self) -> CatalogState {
        self.store.snapshot()
    }

    // ==================== Loading ====================

    /// Load the catalog and a random pick side by side
    ///
    /// Each slot is filled or fails on its own; the first failure (catalog
    /// before random) is returned.
    pub async fn initial_load(&self) -> SyncResult {
        self.store.begin_sequence();
        let _loading = self.store.begin_loading();
        info!("Loading catalog");

        let (catalog, random) = join(self.run_list(), self.run_random()).await;
        catalog.and(random)
    }

    /// Reload whatever the view currently shows
    pub async fn reload_catalog(&self) -> SyncResult {
        self.store.begin_sequence();
        self.reload_view().await
    }

    /// Filter the view; an empty term is the same as `clear_search`
    pub async fn search(&self, term: &str) -> SyncResult {
        let term = term.trim();
        if term.is_empty() {
            return self.clear_search().await;
        }

        self.store.begin_sequence();
        self.store.close_form();
        self.store.set_search_term(term);
        self.run_search(term).await
    }

    /// Back to browsing the full catalog
    pub async fn clear_search(&self) -> SyncResult {
        self.store.begin_sequence();
        self.store.set_search_term("");
        self.run_list().await
    }

    /// Ask for a new random quote
    pub async fn refresh_random(&self) -> SyncResult {
        self.store.begin_sequence();
        self.run_random().await
    }

    // ==================== Form ====================

    /// Open or close the create form
    pub fn toggle_form(&self) {
        let open = self.store.toggle_form();
        debug!(open, "Toggled form");
    }

    /// Start editing `id`
    pub fn begin_edit(&self, id: QuoteId) -> SyncResult {
        let state = self.store.snapshot();
        let quote = state
            .quote(id)
            .or(state.random.as_ref().filter(|r| r.id == id))
            .cloned();

        match quote {
            Some(quote) => {
                debug!(%id, "Editing quote");
                self.store.begin_edit(&quote);
                Ok(())
            }
            None => {
                let failure = Failure::new(
                    Operation::Update,
                    ApiError::NotFound(format!("Quote {} is not in the catalog", id)),
                );
                self.store.set_error(failure.clone());
                Err(failure)
            }
        }
    }

    /// Abandon the edit and return the form to create mode
    pub fn cancel_edit(&self) {
        self.store.close_form();
        self.store.clear_error();
    }

    pub fn set_draft_text(&self, text: &str) {
        self.store.set_draft_text(text);
    }

    pub fn set_draft_author(&self, author: &str) {
        self.store.set_draft_author(author);
    }

    /// The text field lost focus: look up by text if only text is filled in
    pub async fn text_focus_lost(&self) -> SyncResult {
        let state = self.store.snapshot();
        if state.is_editing() {
            return Ok(());
        }
        let text = state.draft.text.trim();
        if text.is_empty() || !state.draft.author.trim().is_empty() {
            return Ok(());
        }
        self.fetch_external(ExternalQuery::ByText(text.to_string()))
            .await
    }

    /// The author field lost focus: look up by author if only author is filled in
    pub async fn author_focus_lost(&self) -> SyncResult {
        let state = self.store.snapshot();
        if state.is_editing() {
            return Ok(());
        }
        let author = state.draft.author.trim();
        if author.is_empty() || !state.draft.text.trim().is_empty() {
            return Ok(());
        }
        self.fetch_external(ExternalQuery::ByAuthor(author.to_string()))
            .await
    }

    /// Save the draft: update when editing, create otherwise
    pub async fn submit_form(&self) -> SaveResult {
        self.store.begin_sequence();
        let state = self.store.snapshot();
        match state.edit_target {
            Some(id) => self.save(Operation::Update, Some(id), state.draft).await,
            None => self.save(Operation::Create, None, state.draft).await,
        }
    }

    /// Delete a quote, then reconcile the view and the random pick
    pub async fn delete(&self, id: QuoteId) -> SyncResult {
        self.store.begin_sequence();
        let _loading = self.store.begin_loading();
        debug!(%id, "Deleting quote");

        if let Err(error) = self.repo.delete(id).await {
            let failure = Failure::new(Operation::Delete, error);
            warn!(%id, error = %failure, "Delete failed");
            self.store.set_error(failure.clone());
            return Err(failure);
        }

        info!(%id, "Deleted quote");
        let was_random = self.store.remove(id);
        self.store.set_notice(Some("Quote deleted.".to_string()));

        if was_random {
            debug!(%id, "Deleted quote was the random pick");
            let (view, random) = join(self.reload_view(), self.run_random()).await;
            if let Err(failure) = view.and(random) {
                debug!(error = %failure, "Reload after delete failed");
            }
        } else if let Err(failure) = self.reload_view().await {
            debug!(error = %failure, "Reload after delete failed");
        }
        Ok(())
    }

    // ==================== External suggestions ====================

    /// Ask the external source for a suggestion
    ///
    /// Any previous suggestion is dropped immediately. A miss is reported as
    /// a notice, not as an error.
    pub async fn fetch_external(&self, query: ExternalQuery) -> SyncResult {
        self.store.clear_error();
        let ticket = self.store.begin_external();
        let _loading = self.store.begin_loading();
        debug!(?query, %ticket, "Fetching external suggestion");

        match self.repo.fetch_external(&query).await {
            Ok(suggestion) => {
                if self.store.apply_suggestion(ticket, suggestion) {
                    info!("External suggestion received");
                } else {
                    debug!(%ticket, "Discarding stale external suggestion");
                }
                Ok(())
            }
            Err(ApiError::NotFound(reason)) => {
                if self
                    .store
                    .miss_suggestion(ticket, EXTERNAL_NOT_FOUND.to_string())
                {
                    info!(%reason, "External source has no match");
                }
                Ok(())
            }
            Err(error) => {
                let failure = Failure::new(Operation::ExternalFetch, error);
                if self.store.fail_suggestion(ticket, failure.clone()) {
                    warn!(error = %failure, "External fetch failed");
                    Err(failure)
                } else {
                    debug!(%ticket, "Discarding stale external failure");
                    Ok(())
                }
            }
        }
    }

    /// Copy the suggestion into the form without saving it
    pub fn use_suggestion(&self) {
        if self.store.take_suggestion_into_draft().is_some() {
            debug!("Suggestion copied into draft");
        }
    }

    /// Add the suggestion to the catalog as a new quote
    ///
    /// Does nothing (and returns `None`) when there is no suggestion.
    pub async fn adopt_suggestion(&self) -> Result<Option<Quote>, Failure> {
        let Some(suggestion) = self.store.snapshot().suggestion else {
            return Ok(None);
        };
        self.store.begin_sequence();
        self.save(Operation::Adopt, None, suggestion.into())
            .await
            .map(Some)
    }

    // ==================== Sequences ====================

    /// Validate, send, then reload from the service
    ///
    /// The saved quote is shown right away; a failed reload leaves it there.
    async fn save(
        &self,
        operation: Operation,
        target: Option<QuoteId>,
        draft: QuoteDraft,
    ) -> SaveResult {
        if let Some(field) = draft.missing_field() {
            let failure = Failure::new(operation, ApiError::empty_field(field));
            debug!(%field, "Draft rejected locally");
            self.store.set_error(failure.clone());
            return Err(failure);
        }

        let draft = QuoteDraft::new(draft.text.trim(), draft.author.trim());
        let _loading = self.store.begin_loading();
        let saved = match target {
            Some(id) => self.repo.update(id, &draft).await,
            None => self.repo.create(&draft).await,
        };

        let quote = match saved {
            Ok(quote) => quote,
            Err(error) => {
                let failure = Failure::new(operation, error);
                warn!(error = %failure, "Save failed");
                self.store.set_error(failure.clone());
                return Err(failure);
            }
        };

        info!(id = %quote.id, ?operation, "Saved quote");
        let notice = match operation {
            Operation::Update => "Quote updated.".to_string(),
            Operation::Adopt => format!("Added a quote by {} to the catalog.", quote.author),
            _ => "Quote added.".to_string(),
        };
        self.store.finish_save(quote.clone(), notice);

        let (catalog, random) = join(self.run_list(), self.run_random()).await;
        if let Err(failure) = catalog.and(random) {
            debug!(error = %failure, "Reload after save failed");
        }
        Ok(quote)
    }

    async fn reload_view(&self) -> SyncResult {
        let state = self.store.snapshot();
        match state.mode {
            ViewMode::Searching => self.run_search(&state.search_term).await,
            ViewMode::Browsing => self.run_list().await,
        }
    }

    async fn run_list(&self) -> SyncResult {
        let ticket = self.store.issue(SequenceClass::Catalog);
        let _loading = self.store.begin_loading();
        debug!(%ticket, "Listing quotes");

        match self.repo.list_all().await {
            Ok(quotes) => {
                let count = quotes.len();
                if self.store.apply_catalog(ticket, quotes) {
                    info!(count, "Catalog loaded");
                } else {
                    debug!(%ticket, "Discarding stale catalog");
                }
                Ok(())
            }
            Err(error) => self.catalog_failed(ticket, Operation::LoadCatalog, error),
        }
    }

    async fn run_search(&self, term: &str) -> SyncResult {
        let ticket = self.store.issue(SequenceClass::Catalog);
        let _loading = self.store.begin_loading();
        debug!(%ticket, term, "Searching quotes");

        match self.repo.search(term).await {
            Ok(quotes) => {
                let count = quotes.len();
                if self.store.apply_catalog(ticket, quotes) {
                    info!(count, term, "Search results loaded");
                } else {
                    debug!(%ticket, term, "Discarding stale search results");
                }
                Ok(())
            }
            Err(error) => self.catalog_failed(ticket, Operation::Search, error),
        }
    }

    fn catalog_failed(&self, ticket: Ticket, operation: Operation, error: ApiError) -> SyncResult {
        let failure = Failure::new(operation, error);
        if self.store.fail_catalog(ticket, failure.clone()) {
            warn!(error = %failure, "Catalog request failed");
            Err(failure)
        } else {
            debug!(%ticket, "Discarding stale catalog failure");
            Ok(())
        }
    }

    async fn run_random(&self) -> SyncResult {
        let _loading = self.store.begin_loading();
        let mut ticket = self.store.issue(SequenceClass::Random);

        for attempt in 1..=MAX_RANDOM_ATTEMPTS {
            if attempt > 1 {
                ticket = self.store.issue(SequenceClass::Random);
            }
            debug!(%ticket, "Requesting random quote");

            match self.repo.get_random().await {
                Ok(quote) => match self.store.apply_random(ticket, quote) {
                    RandomOutcome::Applied => return Ok(()),
                    RandomOutcome::Stale => {
                        debug!(%ticket, "Discarding stale random quote");
                        return Ok(());
                    }
                    RandomOutcome::Deleted(id) => {
                        warn!(%id, "Random pick was deleted meanwhile, picking again");
                    }
                },
                Err(error) => {
                    let failure = Failure::new(Operation::Random, error);
                    return if self.store.fail_random(ticket, failure.clone()) {
                        warn!(error = %failure, "Random quote request failed");
                        Err(failure)
                    } else {
                        debug!(%ticket, "Discarding stale random failure");
                        Ok(())
                    };
                }
            }
        }

        let failure = Failure::new(
            Operation::Random,
            ApiError::NotFound(format!(
                "Every random pick in {} attempts was a deleted quote",
                MAX_RANDOM_ATTEMPTS
            )),
        );
        if self.store.fail_random(ticket, failure.clone()) {
            warn!(error = %failure, "Giving up on random quote");
            Err(failure)
        } else {
            Ok(())
        }
    }
}
