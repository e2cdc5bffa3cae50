//! In-memory metadata provider for testing.

use crate::MetadataProvider;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use shelf_catalog::BookDetails;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A request the [`MockProvider`] has received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(String),
    Search(String),
}

#[derive(Default)]
struct State {
    books: HashMap<String, BookDetails>,
    searches: HashMap<String, Vec<BookDetails>>,
    failures: HashMap<String, ErrorKind>,
    delays: HashMap<String, Duration>,
    calls: Vec<Call>,
}

/// In-memory metadata provider for testing.
///
/// Answers ISBN lookups from a map, and searches either from canned results
/// registered per query or by matching titles of the known books. Failures
/// and latency can be scripted per ISBN or per query, and every request is
/// recorded so tests can assert on exactly what was asked and when.
///
/// State lives behind a [`std::sync::Mutex`] that is never held across an
/// `.await`, so the scripting methods can be called from synchronous test
/// setup as well as mid-test.
///
/// # Examples
///
/// ```
/// use shelf_catalog::BookDetails;
/// use shelf_provider::MetadataProvider;
/// use shelf_provider::provider::MockProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::with_books([BookDetails::new("9780553897845", "A Game of Thrones")]);
/// assert_eq!(provider.fetch_by_isbn("9780553897845").await.unwrap().title, "A Game of Thrones");
/// assert_eq!(provider.fetch_count("9780553897845"), 1);
/// # }
/// ```
pub struct MockProvider {
    name: String,
    state: Mutex<State>,
}

impl MockProvider {
    /// Create a mock provider that knows about the given books.
    pub fn with_books(books: impl IntoIterator<Item = BookDetails>) -> Self {
        let state = State {
            books: books.into_iter().map(|b| (b.isbn.clone(), b)).collect(),
            ..State::default()
        };
        Self {
            name: "mock".to_string(),
            state: Mutex::new(state),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Canned results for an exact query string.
    pub fn with_search(self, query: impl Into<String>, results: Vec<BookDetails>) -> Self {
        self.lock().searches.insert(query.into(), results);
        self
    }

    /// Make every request for `key` (an ISBN or a query) fail with `kind`.
    pub fn fail(&self, key: impl Into<String>, kind: ErrorKind) {
        self.lock().failures.insert(key.into(), kind);
    }

    /// Stop failing requests for `key`.
    pub fn recover(&self, key: &str) {
        self.lock().failures.remove(key);
    }

    /// Make every request for `key` (an ISBN or a query) take `delay`.
    pub fn delay(&self, key: impl Into<String>, delay: Duration) {
        self.lock().delays.insert(key.into(), delay);
    }

    /// Teach the provider about another book after construction.
    pub fn insert(&self, details: BookDetails) {
        self.lock().books.insert(details.isbn.clone(), details);
    }

    /// All requests received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Queries received by [`search`](MetadataProvider::search), in order.
    pub fn searches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Search(q) => Some(q),
                Call::Fetch(_) => None,
            })
            .collect()
    }

    pub fn fetch_count(&self, isbn: &str) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::Fetch(i) if i == isbn)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread poisons the lock; the data is still fine
        // for whichever assertion comes next.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and return its scripted latency and failure.
    fn begin(&self, call: Call, key: &str) -> (Option<Duration>, Option<ErrorKind>) {
        let mut state = self.lock();
        state.calls.push(call);
        (state.delays.get(key).copied(), state.failures.get(key).cloned())
    }
}
impl Default for MockProvider {
    fn default() -> Self {
        Self::with_books([])
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_by_isbn(&self, isbn: &str) -> Result<BookDetails> {
        let (delay, failure) = self.begin(Call::Fetch(isbn.to_string()), isbn);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(kind) = failure {
            exn::bail!(kind);
        }
        let found = self.lock().books.get(isbn).cloned();
        found.ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(isbn.to_string())))
    }

    async fn search(&self, query: &str) -> Result<Vec<BookDetails>> {
        let (delay, failure) = self.begin(Call::Search(query.to_string()), query);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(kind) = failure {
            exn::bail!(kind);
        }
        let state = self.lock();
        if let Some(canned) = state.searches.get(query) {
            return Ok(canned.clone());
        }
        let needle = query.to_lowercase();
        let mut found: Vec<BookDetails> =
            state.books.values().filter(|b| b.title.to_lowercase().contains(&needle)).cloned().collect();
        found.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(found)
    }
}
