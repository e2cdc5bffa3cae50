//! Debounced catalog search.
//!
//! Every keystroke replaces the query. Once the input has been quiet for the
//! debounce window, the latest query (and only the latest) goes to the
//! catalog; anything still running for an older query is cancelled, and if
//! an older answer arrives anyway it is dropped.

use shelf_catalog::BookDetails;
use shelf_config::SearchConfig;
use shelf_provider::ProviderHandle;
use shelf_provider::error::ErrorKind as ProviderErrorKind;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No query worth sending.
    #[default]
    Idle,
    /// Waiting out the debounce window, or waiting on the catalog.
    Pending,
    /// The latest query has been answered (or has failed).
    Results,
}

/// The last query failed; the results shown are from before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
    pub query: String,
    pub kind: ProviderErrorKind,
    pub retryable: bool,
}

/// Everything a search box needs to render itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub query: String,
    pub phase: Phase,
    pub results: Vec<BookDetails>,
    pub failure: Option<SearchFailure>,
}
impl SearchSnapshot {
    /// Whether there is a query with results to show.
    pub fn is_searching(&self) -> bool {
        !self.query.is_empty() && !self.results.is_empty()
    }
}

/// The one outstanding search. Replaced on every keystroke.
struct Slot {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner {
    provider: ProviderHandle,
    debounce: Duration,
    min_query_len: usize,
    slot: Mutex<Slot>,
    snapshot: watch::Sender<SearchSnapshot>,
    tracker: TaskTracker,
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(&self, generation: u64, query: String, cancel: CancellationToken) {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            outcome = async {
                tokio::time::sleep(self.debounce).await;
                tracing::debug!(%query, "Searching");
                self.provider.search(&query).await
            } => outcome,
        };
        // Results are applied under the slot lock so a newer keystroke
        // either lands entirely before (and the generation check drops
        // this) or entirely after.
        let slot = self.slot();
        if slot.generation != generation {
            tracing::debug!(%query, "Dropping superseded search results");
            return;
        }
        match outcome {
            Ok(results) => {
                tracing::debug!(%query, count = results.len(), "Search results");
                self.snapshot.send_modify(|s| {
                    s.phase = Phase::Results;
                    s.results = results;
                    s.failure = None;
                });
            },
            Err(e) => {
                let retryable = e.is_retryable();
                tracing::warn!(%query, error = ?e, retryable, "Search failed");
                self.snapshot.send_modify(|s| {
                    s.phase = Phase::Results;
                    s.failure = Some(SearchFailure {
                        query,
                        kind: (*e).clone(),
                        retryable,
                    });
                });
            },
        }
        drop(slot);
    }
}

/// Turns a stream of keystrokes into at most one catalog query per pause in
/// typing.
///
/// Input shorter than the minimum length clears the results without asking
/// the catalog anything. The state is published as a [`SearchSnapshot`] on
/// a watch channel; a failed query keeps the previous results and records
/// the failure alongside them.
#[derive(Clone)]
pub struct SearchCoordinator {
    inner: Arc<Inner>,
}

impl SearchCoordinator {
    pub fn new(provider: ProviderHandle, config: &SearchConfig) -> Self {
        let (snapshot, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                debounce: config.debounce(),
                min_query_len: config.min_query_len.max(1),
                slot: Mutex::new(Slot {
                    generation: 0,
                    cancel: CancellationToken::new(),
                }),
                snapshot,
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// The search box now reads `query`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn input(&self, query: impl Into<String>) {
        let query = query.into();
        let mut slot = self.inner.slot();
        slot.generation += 1;
        slot.cancel.cancel();
        slot.cancel = CancellationToken::new();

        if query.chars().count() < self.inner.min_query_len {
            self.inner.snapshot.send_modify(|s| {
                s.query = query;
                s.phase = Phase::Idle;
                s.results.clear();
                s.failure = None;
            });
            return;
        }

        self.inner.snapshot.send_modify(|s| {
            s.query = query.clone();
            s.phase = Phase::Pending;
        });
        let inner = self.inner.clone();
        let (generation, cancel) = (slot.generation, slot.cancel.clone());
        drop(slot);
        self.inner.tracker.spawn(async move { inner.run(generation, query, cancel).await });
    }

    /// Empty the search box.
    pub fn clear(&self) {
        self.input(String::new());
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Wait until every search started so far has been answered, cancelled
    /// or dropped.
    pub async fn settle(&self) {
        let tracker = &self.inner.tracker;
        tracker.close();
        tracker.wait().await;
        tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use shelf_provider::provider::MockProvider;

    fn dune() -> BookDetails {
        BookDetails::new("9780441013593", "Dune").with_authors(["Frank Herbert"])
    }

    fn coordinator() -> (Arc<MockProvider>, SearchCoordinator) {
        let provider = Arc::new(MockProvider::with_books([
            dune(),
            BookDetails::new("9780441172696", "Dune Messiah"),
            BookDetails::new("9780553897845", "A Game of Thrones"),
        ]));
        let search = SearchCoordinator::new(provider.clone(), &SearchConfig::default());
        (provider, search)
    }

    #[rstest]
    #[case::empty("")]
    #[case::one("d")]
    #[case::two("du")]
    #[case::two_wide("日本")]
    #[tokio::test(start_paused = true)]
    async fn test_short_input_never_queries(#[case] query: &str) {
        let (provider, search) = coordinator();
        search.input(query);
        tokio::time::sleep(Duration::from_secs(1)).await;
        search.settle().await;
        assert!(provider.searches().is_empty());
        let snapshot = search.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(!snapshot.is_searching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queries_once_after_debounce() {
        let (provider, search) = coordinator();
        search.input("dun");
        assert_eq!(search.snapshot().phase, Phase::Pending);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(provider.searches().is_empty(), "queried before the debounce window");
        search.settle().await;
        assert_eq!(provider.searches(), vec!["dun".to_string()]);
        let snapshot = search.snapshot();
        assert_eq!(snapshot.phase, Phase::Results);
        assert_eq!(snapshot.results.len(), 2);
        assert!(snapshot.is_searching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_within_window_queries_latest_only() {
        let (provider, search) = coordinator();
        search.input("dun");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.input("dune m");
        search.settle().await;
        assert_eq!(provider.searches(), vec!["dune m".to_string()]);
        assert_eq!(search.snapshot().results, vec![BookDetails::new("9780441172696", "Dune Messiah")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_superseded_answer_is_discarded() {
        let (provider, search) = coordinator();
        provider.delay("dun", Duration::from_secs(5));
        search.input("dun");
        // Past the debounce, so "dun" is already at the catalog.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(provider.searches(), vec!["dun".to_string()]);
        search.input("game");
        search.settle().await;
        let snapshot = search.snapshot();
        assert_eq!(snapshot.query, "game");
        assert_eq!(snapshot.results, vec![BookDetails::new("9780553897845", "A Game of Thrones")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shortening_input_clears_results() {
        let (_provider, search) = coordinator();
        search.input("dune");
        search.settle().await;
        assert!(search.snapshot().is_searching());
        search.input("du");
        let snapshot = search.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.results.is_empty());
        search.input("dune");
        search.clear();
        search.settle().await;
        assert_eq!(search.snapshot(), SearchSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_results() {
        let (provider, search) = coordinator();
        search.input("dune");
        search.settle().await;
        let before = search.snapshot().results;
        provider.fail("dune messiah", ProviderErrorKind::Network("offline".to_string()));
        search.input("dune messiah");
        search.settle().await;
        let snapshot = search.snapshot();
        assert_eq!(snapshot.phase, Phase::Results);
        assert_eq!(snapshot.results, before);
        let failure = snapshot.failure.unwrap();
        assert_eq!(failure.query, "dune messiah");
        assert!(failure.retryable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_are_published() {
        let (_provider, search) = coordinator();
        let mut rx = search.subscribe();
        search.input("dune");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, Phase::Pending);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, Phase::Results);
    }
}
