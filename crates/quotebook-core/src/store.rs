//! Session catalog state
//!
//! The `CatalogStore` is the only place client-visible catalog state lives.
//! It is a cheap, cloneable handle over one mutex-guarded `CatalogState`;
//! every mutation goes through a named method that takes the lock, changes
//! the state, releases the lock and then bumps a revision counter on a
//! `watch` channel so presentation layers know to re-render.
//!
//! ## Guarded setters
//!
//! Results of remote calls are applied with `apply_*` / `fail_*` methods
//! that take the `Ticket` issued for the call. The ticket is checked against
//! the sequence tracker under the same lock as the write, so a superseded
//! completion can never slip in between the check and the update.
//!
//! ## Usage
//!
//! ```ignore
//! let store = CatalogStore::new();
//! let mut changes = store.subscribe();
//!
//! let ticket = store.issue(SequenceClass::Catalog);
//! store.apply_catalog(ticket, quotes);
//!
//! changes.changed().await?;
//! let state = store.snapshot();
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::{Failure, Operation};
use crate::models::{ExternalSuggestion, Quote, QuoteDraft, QuoteId};
use crate::sync::{SequenceClass, SequenceTracker, Ticket};

/// What the catalog view currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// The full catalog
    #[default]
    Browsing,
    /// Results for the active search term
    Searching,
}

/// Outcome of applying a random pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomOutcome {
    Applied,
    /// A newer random request was issued
    Stale,
    /// The pick names a quote deleted earlier in this session
    Deleted(QuoteId),
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    /// The catalog view, in server order
    pub quotes: Vec<Quote>,
    pub mode: ViewMode,
    /// Active search term; empty while browsing
    pub search_term: String,
    pub random: Option<Quote>,
    /// Why the random slot is empty, when it failed
    pub random_failure: Option<Failure>,
    pub suggestion: Option<ExternalSuggestion>,
    /// Informational message, distinct from `last_error`
    pub notice: Option<String>,
    /// Quote being edited; `None` means the form creates
    pub edit_target: Option<QuoteId>,
    pub form_open: bool,
    pub draft: QuoteDraft,
    pub last_error: Option<Failure>,
    /// Mode the current `quotes` were loaded under
    loaded_as: ViewMode,
    in_flight: usize,
    tombstones: HashSet<QuoteId>,
    sequences: SequenceTracker,
}

impl CatalogState {
    /// True while any sequence is running
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Number of sequences currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn quote(&self, id: QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == id)
    }

    /// Whether `id` was deleted during this session
    pub fn is_deleted(&self, id: QuoteId) -> bool {
        self.tombstones.contains(&id)
    }

    pub fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    /// Whether `quotes` holds something other than what `mode` promises
    pub fn is_view_stale(&self) -> bool {
        self.loaded_as != self.mode
    }

    /// Replace a quote with the same id in place, or insert a new one
    fn splice(&mut self, quote: Quote, at_front: bool) {
        if let Some(random) = self.random.as_mut().filter(|r| r.id == quote.id) {
            *random = quote.clone();
        }
        match self.quotes.iter_mut().find(|q| q.id == quote.id) {
            Some(existing) => *existing = quote,
            None if at_front => self.quotes.insert(0, quote),
            None => self.quotes.push(quote),
        }
    }

    fn discard_suggestion(&mut self) {
        // Any result still in flight is now for a different form
        self.sequences.issue(SequenceClass::External);
        self.suggestion = None;
    }
}

/// Shared handle to the session's catalog state
#[derive(Debug, Clone)]
pub struct CatalogStore {
    state: Arc<Mutex<CatalogState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(CatalogState::default())),
            revision: Arc::new(revision),
        }
    }

    /// A copy of the current state
    pub fn snapshot(&self) -> CatalogState {
        self.lock().clone()
    }

    /// Receiver that changes whenever the state does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision (number of mutations so far)
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        // State is always left consistent between statements, so a panic
        // elsewhere does not invalidate it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one mutation under the lock, then signal a re-render
    fn update<T>(&self, f: impl FnOnce(&mut CatalogState) -> T) -> T {
        let result = {
            let mut state = self.lock();
            f(&mut state)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Like `update`, but only signals when `f` reports a change
    fn update_if(&self, f: impl FnOnce(&mut CatalogState) -> bool) -> bool {
        let changed = {
            let mut state = self.lock();
            f(&mut state)
        };
        if changed {
            self.revision.send_modify(|rev| *rev += 1);
        }
        changed
    }

    // ==================== Plain setters ====================

    /// Replace the whole catalog view
    pub fn replace_all(&self, quotes: Vec<Quote>) {
        self.update(|s| {
            s.quotes = quotes;
            s.loaded_as = s.mode;
        });
    }

    /// Insert a quote at the end, or replace the one with the same id in place
    pub fn upsert(&self, quote: Quote) {
        self.update(|s| s.splice(quote, false));
    }

    /// Remove a deleted quote from the view and remember it as deleted
    ///
    /// Returns true when it was the random pick, which is cleared as well.
    pub fn remove(&self, id: QuoteId) -> bool {
        self.update(|s| {
            s.quotes.retain(|q| q.id != id);
            s.tombstones.insert(id);
            if s.edit_target == Some(id) {
                s.edit_target = None;
                s.form_open = false;
                s.draft = QuoteDraft::default();
            }
            if s.random.as_ref().is_some_and(|r| r.id == id) {
                s.random = None;
                true
            } else {
                false
            }
        })
    }

    pub fn set_random(&self, quote: Quote) {
        self.update(|s| {
            s.random = Some(quote);
            s.random_failure = None;
        });
    }

    pub fn clear_random(&self) {
        self.update(|s| s.random = None);
    }

    /// Set the search term; an empty (or blank) term means browsing
    pub fn set_search_term(&self, term: &str) {
        let term = term.trim().to_string();
        self.update(|s| {
            s.mode = if term.is_empty() {
                ViewMode::Browsing
            } else {
                ViewMode::Searching
            };
            s.search_term = term;
        });
    }

    /// Set or clear the suggestion
    ///
    /// Clearing also invalidates any fetch still in flight.
    pub fn set_suggestion(&self, suggestion: Option<ExternalSuggestion>) {
        self.update(|s| match suggestion {
            Some(suggestion) => s.suggestion = Some(suggestion),
            None => s.discard_suggestion(),
        });
    }

    pub fn set_edit_target(&self, id: Option<QuoteId>) {
        self.update(|s| s.edit_target = id);
    }

    pub fn set_notice(&self, notice: Option<String>) {
        self.update(|s| s.notice = notice);
    }

    pub fn set_error(&self, failure: Failure) {
        self.update(|s| s.last_error = Some(failure));
    }

    pub fn clear_error(&self) {
        self.update_if(|s| s.last_error.take().is_some());
    }

    /// Start of a user-initiated sequence: drop the previous error and notice
    pub fn begin_sequence(&self) {
        self.update_if(|s| {
            let had_error = s.last_error.take().is_some();
            let had_notice = s.notice.take().is_some();
            had_error || had_notice
        });
    }

    // ==================== Form ====================

    /// Open or close the create form, starting from an empty draft
    pub fn toggle_form(&self) -> bool {
        self.update(|s| {
            s.form_open = !s.form_open;
            s.edit_target = None;
            s.draft = QuoteDraft::default();
            s.notice = None;
            s.last_error = None;
            s.discard_suggestion();
            s.form_open
        })
    }

    /// Open the form on an existing quote
    pub fn begin_edit(&self, quote: &Quote) {
        self.update(|s| {
            s.edit_target = Some(quote.id);
            s.draft = quote.draft();
            s.form_open = true;
            s.notice = None;
            s.last_error = None;
            s.discard_suggestion();
        });
    }

    /// Close the form and return it to create mode
    pub fn close_form(&self) {
        self.update(|s| {
            s.form_open = false;
            s.edit_target = None;
            s.draft = QuoteDraft::default();
            s.discard_suggestion();
        });
    }

    /// Put a saved draft behind us: close the form, go back to browsing and
    /// show the saved quote until the catalog is reloaded
    ///
    /// Search results on screen are dropped first; they are not the catalog.
    pub fn finish_save(&self, saved: Quote, notice: String) {
        self.update(|s| {
            s.form_open = false;
            s.edit_target = None;
            s.draft = QuoteDraft::default();
            s.mode = ViewMode::Browsing;
            s.search_term.clear();
            if s.loaded_as != ViewMode::Browsing {
                s.quotes.clear();
                s.loaded_as = ViewMode::Browsing;
            }
            s.splice(saved, true);
            s.notice = Some(notice);
            s.discard_suggestion();
        });
    }

    pub fn set_draft(&self, draft: QuoteDraft) {
        self.update(|s| {
            s.draft = draft;
            s.form_open = true;
        });
    }

    /// Edit the draft text; the pending suggestion no longer applies
    pub fn set_draft_text(&self, text: &str) {
        self.update(|s| {
            s.draft.text = text.to_string();
            s.notice = None;
            s.discard_suggestion();
        });
    }

    /// Edit the draft author; the pending suggestion no longer applies
    pub fn set_draft_author(&self, author: &str) {
        self.update(|s| {
            s.draft.author = author.to_string();
            s.notice = None;
            s.discard_suggestion();
        });
    }

    /// Move the suggestion into the draft
    pub fn take_suggestion_into_draft(&self) -> Option<ExternalSuggestion> {
        self.update(|s| {
            let suggestion = s.suggestion.clone()?;
            s.draft = suggestion.clone().into();
            s.form_open = true;
            s.edit_target = None;
            s.discard_suggestion();
            Some(suggestion)
        })
    }

    // ==================== Sequencing ====================

    /// Issue a ticket for a call in `class`
    pub fn issue(&self, class: SequenceClass) -> Ticket {
        self.lock().sequences.issue(class)
    }

    /// Issue an external ticket and drop the previous suggestion and notice
    pub fn begin_external(&self) -> Ticket {
        self.update(|s| {
            s.suggestion = None;
            s.notice = None;
            s.sequences.issue(SequenceClass::External)
        })
    }

    /// Mark a sequence as running until the guard is dropped
    pub fn begin_loading(&self) -> LoadingGuard {
        self.update(|s| s.in_flight += 1);
        LoadingGuard {
            store: self.clone(),
        }
    }

    /// Apply a list or search result if no newer catalog call was issued
    pub fn apply_catalog(&self, ticket: Ticket, quotes: Vec<Quote>) -> bool {
        self.update_if(|s| {
            if !s.sequences.is_current(ticket) {
                return false;
            }
            s.quotes = quotes;
            s.loaded_as = s.mode;
            true
        })
    }

    /// Record a failed list or search if no newer catalog call was issued
    ///
    /// A failed search empties the view. A failed list keeps what is shown,
    /// unless what is shown are results of an earlier search.
    pub fn fail_catalog(&self, ticket: Ticket, failure: Failure) -> bool {
        self.update_if(|s| {
            if !s.sequences.is_current(ticket) {
                return false;
            }
            if failure.operation == Operation::Search || s.is_view_stale() {
                s.quotes.clear();
                s.loaded_as = s.mode;
            }
            s.last_error = Some(failure);
            true
        })
    }

    /// Apply a random pick unless superseded or deleted meanwhile
    pub fn apply_random(&self, ticket: Ticket, quote: Quote) -> RandomOutcome {
        let outcome = {
            let mut s = self.lock();
            if !s.sequences.is_current(ticket) {
                RandomOutcome::Stale
            } else if s.tombstones.contains(&quote.id) {
                RandomOutcome::Deleted(quote.id)
            } else {
                s.random = Some(quote);
                s.random_failure = None;
                RandomOutcome::Applied
            }
        };
        if outcome == RandomOutcome::Applied {
            self.revision.send_modify(|rev| *rev += 1);
        }
        outcome
    }

    /// Record a failed random pick; the slot is emptied
    pub fn fail_random(&self, ticket: Ticket, failure: Failure) -> bool {
        self.update_if(|s| {
            if !s.sequences.is_current(ticket) {
                return false;
            }
            s.random = None;
            s.random_failure = Some(failure.clone());
            s.last_error = Some(failure);
            true
        })
    }

    /// Apply an external suggestion; clears the "not found" notice
    pub fn apply_suggestion(&self, ticket: Ticket, suggestion: ExternalSuggestion) -> bool {
        self.update_if(|s| {
            if !s.sequences.is_current(ticket) {
                return false;
            }
            s.suggestion = Some(suggestion);
            s.notice = None;
            true
        })
    }

    /// The external source had nothing: show `notice` instead of a suggestion
    pub fn miss_suggestion(&self, ticket: Ticket, notice: String) -> bool {
        self.update_if(|s| {
            if !s.sequences.is_current(ticket) {
                return false;
            }
            s.suggestion = None;
            s.notice = Some(notice);
            true
        })
    }

    pub fn fail_suggestion(&self, ticket: Ticket, failure: Failure) -> bool {
        self.update_if(|s| {
            if !s.sequences.is_current(ticket) {
                return false;
            }
            s.suggestion = None;
            s.last_error = Some(failure);
            true
        })
    }
}

/// Keeps `loading` set while alive
#[derive(Debug)]
pub struct LoadingGuard {
    store: CatalogStore,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.store
            .update(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn quotes(ids: &[i64]) -> Vec<Quote> {
        ids.iter()
            .map(|&id| Quote::new(id, format!("text {}", id), "Someone"))
            .collect()
    }

    #[test]
    fn test_stale_catalog_result_is_dropped() {
        let store = CatalogStore::new();
        let first = store.issue(SequenceClass::Catalog);
        let second = store.issue(SequenceClass::Catalog);

        assert!(store.apply_catalog(second, quotes(&[2])));
        assert!(!store.apply_catalog(first, quotes(&[1])));

        let ids: Vec<_> = store.snapshot().quotes.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![QuoteId(2)]);
    }

    #[test]
    fn test_failed_search_empties_view() {
        let store = CatalogStore::new();
        store.replace_all(quotes(&[1, 2]));

        let ticket = store.issue(SequenceClass::Catalog);
        let failure = Failure::new(Operation::Search, ApiError::Server("boom".into()));
        assert!(store.fail_catalog(ticket, failure));

        let state = store.snapshot();
        assert!(state.quotes.is_empty());
        assert_eq!(state.last_error.unwrap().operation, Operation::Search);
    }

    #[test]
    fn test_failed_list_keeps_view() {
        let store = CatalogStore::new();
        store.replace_all(quotes(&[1]));

        let ticket = store.issue(SequenceClass::Catalog);
        let failure = Failure::new(Operation::LoadCatalog, ApiError::Network("down".into()));
        assert!(store.fail_catalog(ticket, failure));
        assert_eq!(store.snapshot().quotes.len(), 1);
    }

    #[test]
    fn test_failed_list_after_search_drops_results() {
        let store = CatalogStore::new();
        store.set_search_term("love");
        let ticket = store.issue(SequenceClass::Catalog);
        store.apply_catalog(ticket, quotes(&[1]));

        store.set_search_term("");
        assert!(store.snapshot().is_view_stale());

        let ticket = store.issue(SequenceClass::Catalog);
        let failure = Failure::new(Operation::LoadCatalog, ApiError::Network("down".into()));
        assert!(store.fail_catalog(ticket, failure));

        let state = store.snapshot();
        assert!(state.quotes.is_empty());
        assert!(!state.is_view_stale());
    }

    #[test]
    fn test_finish_save_shows_saved_quote() {
        let store = CatalogStore::new();
        store.replace_all(quotes(&[1, 2]));

        store.finish_save(Quote::new(3, "new", "Someone"), "Quote added.".into());
        let ids: Vec<_> = store.snapshot().quotes.iter().map(|q| q.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        store.finish_save(Quote::new(1, "changed", "Someone"), "Quote updated.".into());
        let state = store.snapshot();
        let texts: Vec<_> = state.quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["new", "changed", "text 2"]);
    }

    #[test]
    fn test_finish_save_from_search_drops_results() {
        let store = CatalogStore::new();
        store.set_search_term("text");
        store.replace_all(quotes(&[1, 2]));

        store.finish_save(Quote::new(3, "new", "Someone"), "Quote added.".into());
        let state = store.snapshot();
        assert_eq!(state.mode, ViewMode::Browsing);
        assert_eq!(state.quotes, vec![Quote::new(3, "new", "Someone")]);
        assert!(!state.is_view_stale());
    }

    #[test]
    fn test_remove_clears_matching_random() {
        let store = CatalogStore::new();
        store.replace_all(quotes(&[1, 2]));
        store.set_random(Quote::new(2, "text 2", "Someone"));

        assert!(!store.remove(QuoteId(1)));
        assert!(store.snapshot().random.is_some());

        assert!(store.remove(QuoteId(2)));
        let state = store.snapshot();
        assert!(state.random.is_none());
        assert!(state.quotes.is_empty());
        assert!(state.is_deleted(QuoteId(2)));
    }

    #[test]
    fn test_random_pick_of_deleted_quote_is_refused() {
        let store = CatalogStore::new();
        store.remove(QuoteId(5));

        let ticket = store.issue(SequenceClass::Random);
        let outcome = store.apply_random(ticket, Quote::new(5, "gone", "Someone"));
        assert_eq!(outcome, RandomOutcome::Deleted(QuoteId(5)));
        assert!(store.snapshot().random.is_none());
    }

    #[test]
    fn test_stale_random_pick() {
        let store = CatalogStore::new();
        let old = store.issue(SequenceClass::Random);
        let _new = store.issue(SequenceClass::Random);
        assert_eq!(
            store.apply_random(old, Quote::new(1, "a", "b")),
            RandomOutcome::Stale
        );
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let store = CatalogStore::new();
        store.replace_all(quotes(&[1, 2, 3]));
        store.upsert(Quote::new(2, "changed", "Someone"));
        store.upsert(Quote::new(4, "new", "Someone"));

        let state = store.snapshot();
        let texts: Vec<_> = state.quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["text 1", "changed", "text 3", "new"]);
    }

    #[test]
    fn test_draft_edit_invalidates_suggestion() {
        let store = CatalogStore::new();
        let ticket = store.begin_external();
        store.set_draft_text("Who");

        // The fetch issued before the edit lands too late
        assert!(!store.apply_suggestion(ticket, ExternalSuggestion::new("A", "B")));
        assert!(store.snapshot().suggestion.is_none());
    }

    #[test]
    fn test_suggestion_miss_then_hit() {
        let store = CatalogStore::new();
        let ticket = store.begin_external();
        assert!(store.miss_suggestion(ticket, "not found".into()));
        assert_eq!(store.snapshot().notice.as_deref(), Some("not found"));

        let ticket = store.begin_external();
        assert!(store.snapshot().notice.is_none());
        assert!(store.apply_suggestion(ticket, ExternalSuggestion::new("A", "B")));
        assert!(store.snapshot().suggestion.is_some());
    }

    #[test]
    fn test_loading_guard_counts_overlap() {
        let store = CatalogStore::new();
        let first = store.begin_loading();
        let second = store.begin_loading();
        assert_eq!(store.snapshot().in_flight(), 2);

        drop(first);
        assert!(store.snapshot().is_loading());
        drop(second);
        assert!(!store.snapshot().is_loading());
    }

    #[test]
    fn test_search_term_sets_mode() {
        let store = CatalogStore::new();
        store.set_search_term("  love ");
        let state = store.snapshot();
        assert_eq!(state.mode, ViewMode::Searching);
        assert_eq!(state.search_term, "love");

        store.set_search_term("   ");
        assert_eq!(store.snapshot().mode, ViewMode::Browsing);
    }

    #[test]
    fn test_toggle_form_resets_edit_state() {
        let store = CatalogStore::new();
        let quote = Quote::new(1, "A", "B");
        store.begin_edit(&quote);
        assert_eq!(store.snapshot().draft, quote.draft());

        // Toggling from an edit closes the form and forgets the target
        assert!(!store.toggle_form());
        let state = store.snapshot();
        assert!(state.edit_target.is_none());
        assert!(state.draft.is_blank());

        assert!(store.toggle_form());
    }

    #[test]
    fn test_take_suggestion_into_draft() {
        let store = CatalogStore::new();
        let ticket = store.begin_external();
        store.apply_suggestion(ticket, ExternalSuggestion::new("Be here now", "Ram Dass"));

        let taken = store.take_suggestion_into_draft();
        assert!(taken.is_some());
        let state = store.snapshot();
        assert_eq!(state.draft, QuoteDraft::new("Be here now", "Ram Dass"));
        assert!(state.suggestion.is_none());
        assert!(state.form_open);
        assert!(store.take_suggestion_into_draft().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = CatalogStore::new();
        let mut changes = store.subscribe();
        let before = store.revision();

        store.set_notice(Some("hello".into()));
        changes.changed().await.unwrap();
        assert!(*changes.borrow_and_update() > before);
    }
}
