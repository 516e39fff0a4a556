//! In-memory quote repository for controller tests
//!
//! Results are computed when a call arrives. A call can then be held on a
//! gate until the test releases it, which lets a test force any completion
//! order between overlapping calls.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;

use quotebook_core::{
    ApiError, ApiResult, ExternalQuery, ExternalSuggestion, Quote, QuoteDraft, QuoteId,
    QuoteRepository,
};

#[derive(Default)]
struct Inner {
    quotes: Vec<Quote>,
    next_id: i64,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    gates: HashMap<String, oneshot::Receiver<()>>,
    random_picks: VecDeque<QuoteId>,
    stale_picks: VecDeque<Quote>,
    external: VecDeque<ApiResult<ExternalSuggestion>>,
    external_queries: Vec<ExternalQuery>,
}

pub struct FakeRepository {
    inner: Mutex<Inner>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::with_quotes(Vec::new())
    }

    pub fn with_quotes(quotes: Vec<Quote>) -> Self {
        let next_id = quotes.iter().map(|q| q.id.0).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(Inner {
                quotes,
                next_id,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Number of times `operation` was called
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Make the next `operation` call fail with `error`
    pub fn fail_next(&self, operation: &'static str, error: ApiError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Hold the next call matching `key` until the sender fires (or drops)
    ///
    /// Keys are the operation name, with the argument for searches and
    /// deletes: `"list"`, `"random"`, `"search:love"`, `"delete:3"`,
    /// `"external"`.
    pub fn hold(&self, key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().gates.insert(key.to_string(), rx);
        tx
    }

    /// Id returned by the next `get_random` call
    pub fn pick_next(&self, id: i64) {
        self.lock().random_picks.push_back(QuoteId(id));
    }

    /// Return `quote` from the next `get_random` call even if it was deleted,
    /// like a lagging replica would
    pub fn pick_stale(&self, quote: Quote) {
        self.lock().stale_picks.push_back(quote);
    }

    /// Queue the outcome of the next external fetch (default: not found)
    pub fn push_external(&self, result: ApiResult<ExternalSuggestion>) {
        self.lock().external.push_back(result);
    }

    pub fn external_queries(&self) -> Vec<ExternalQuery> {
        self.lock().external_queries.clone()
    }

    pub fn stored(&self) -> Vec<Quote> {
        self.lock().quotes.clone()
    }

    /// Count the call, then return its injected failure, if any
    fn enter(&self, operation: &'static str) -> Result<(), ApiError> {
        let mut inner = self.lock();
        *inner.calls.entry(operation).or_default() += 1;
        match inner.failures.get_mut(operation).and_then(|f| f.pop_front()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn gate(&self, key: String) {
        let gate = self.lock().gates.remove(&key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

pub fn quote(id: i64, text: &str, author: &str) -> Quote {
    Quote::new(id, text, author)
}

/// A small catalog: ids 1..=n
pub fn catalog(n: i64) -> Vec<Quote> {
    (1..=n)
        .map(|id| quote(id, &format!("Quote number {}", id), &format!("Author {}", id)))
        .collect()
}

fn matches(quote: &Quote, term: &str) -> bool {
    let term = term.to_lowercase();
    quote.text.to_lowercase().contains(&term) || quote.author.to_lowercase().contains(&term)
}

#[async_trait]
impl QuoteRepository for FakeRepository {
    async fn list_all(&self) -> ApiResult<Vec<Quote>> {
        let result = self.enter("list").map(|_| self.stored());
        self.gate("list".to_string()).await;
        result
    }

    async fn get_random(&self) -> ApiResult<Quote> {
        let result = self.enter("random").and_then(|_| {
            let mut inner = self.lock();
            if let Some(stale) = inner.stale_picks.pop_front() {
                return Ok(stale);
            }
            let picked = match inner.random_picks.pop_front() {
                Some(id) => inner.quotes.iter().find(|q| q.id == id).cloned(),
                None => inner.quotes.first().cloned(),
            };
            picked.ok_or_else(|| ApiError::NotFound("No quotes".to_string()))
        });
        self.gate("random".to_string()).await;
        result
    }

    async fn search(&self, term: &str) -> ApiResult<Vec<Quote>> {
        let result = self.enter("search").map(|_| {
            self.stored()
                .into_iter()
                .filter(|q| matches(q, term))
                .collect()
        });
        self.gate(format!("search:{}", term)).await;
        result
    }

    async fn create(&self, draft: &QuoteDraft) -> ApiResult<Quote> {
        let result = self.enter("create").map(|_| {
            let mut inner = self.lock();
            let created = Quote::new(inner.next_id, &draft.text, &draft.author);
            inner.next_id += 1;
            inner.quotes.push(created.clone());
            created
        });
        self.gate("create".to_string()).await;
        result
    }

    async fn update(&self, id: QuoteId, draft: &QuoteDraft) -> ApiResult<Quote> {
        let result = self.enter("update").and_then(|_| {
            let mut inner = self.lock();
            let existing = inner
                .quotes
                .iter_mut()
                .find(|q| q.id == id)
                .ok_or_else(|| ApiError::NotFound(format!("Quote {} not found", id)))?;
            existing.text = draft.text.clone();
            existing.author = draft.author.clone();
            Ok(existing.clone())
        });
        self.gate("update".to_string()).await;
        result
    }

    async fn delete(&self, id: QuoteId) -> ApiResult<()> {
        let result = self.enter("delete").and_then(|_| {
            let mut inner = self.lock();
            let before = inner.quotes.len();
            inner.quotes.retain(|q| q.id != id);
            if inner.quotes.len() == before {
                Err(ApiError::NotFound(format!("Quote {} not found", id)))
            } else {
                Ok(())
            }
        });
        self.gate(format!("delete:{}", id)).await;
        result
    }

    async fn fetch_external(&self, query: &ExternalQuery) -> ApiResult<ExternalSuggestion> {
        let result = self.enter("external").and_then(|_| {
            let mut inner = self.lock();
            inner.external_queries.push(query.clone());
            inner
                .external
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::NotFound("No match".to_string())))
        });
        self.gate("external".to_string()).await;
        result
    }
}
