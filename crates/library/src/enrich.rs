//! Lazy metadata backfill.
//!
//! Books can be added by ISBN alone. Whenever a view is materialized, the
//! [`Reconciler`] looks for books still missing their details and asks the
//! catalog about each of them in the background, at most once at a time per
//! book.

use shelf_catalog::{Book, BookId};
use shelf_provider::ProviderHandle;
use shelf_provider::error::ErrorKind as ProviderErrorKind;
use shelf_store::Repository;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

const EVENT_CAPACITY: usize = 64;

/// Why a backfill produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Provider(ProviderErrorKind),
    /// The details arrived but could not be stored.
    Store,
}

/// What became of one backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// Details were stored.
    Filled(BookId),
    /// Details arrived after the book was deleted and were thrown away.
    Discarded(BookId),
    /// Nothing was stored; the next pass will try again.
    Failed {
        id: BookId,
        kind: FailureKind,
        retryable: bool,
    },
}

/// What a [`Reconciler::reconcile`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sweep {
    /// Books a fetch was started for, in the order given.
    pub scheduled: Vec<BookId>,
    /// Books skipped because a fetch for them was already running.
    pub in_flight: usize,
}

struct Inner {
    repo: Repository,
    provider: ProviderHandle,
    in_flight: Mutex<HashSet<BookId>>,
    tracker: TaskTracker,
    events: broadcast::Sender<Enrichment>,
}

impl Inner {
    fn in_flight(&self) -> MutexGuard<'_, HashSet<BookId>> {
        // Only ever holds plain inserts and removes; a poisoned set is intact.
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: Enrichment) {
        _ = self.events.send(event);
    }

    async fn backfill(&self, id: BookId, isbn: String) {
        let details = match self.provider.fetch_by_isbn(&isbn).await {
            Ok(details) => details,
            Err(e) => {
                let retryable = e.is_retryable();
                tracing::warn!(provider = self.provider.name(), error = ?e, retryable, "Metadata fetch failed");
                self.publish(Enrichment::Failed {
                    id,
                    kind: FailureKind::Provider((*e).clone()),
                    retryable,
                });
                return;
            },
        };
        match self.repo.fill_details(id, &details).await {
            Ok(true) => {
                tracing::debug!(title = %details.title, "Details filled");
                self.publish(Enrichment::Filled(id));
            },
            Ok(false) => {
                tracing::debug!("Book deleted while its details were in flight; discarding");
                self.publish(Enrichment::Discarded(id));
            },
            Err(e) => {
                let retryable = e.is_retryable();
                tracing::warn!(error = ?e, "Could not store fetched details");
                self.publish(Enrichment::Failed {
                    id,
                    kind: FailureKind::Store,
                    retryable,
                });
            },
        }
    }
}

/// Removes its book from the in-flight set when the job ends, however it
/// ends.
struct InFlight {
    inner: Arc<Inner>,
    id: BookId,
}
impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.in_flight().remove(&self.id);
    }
}

/// Supervises one background fetch per book missing its details.
///
/// Results are only ever written to the book they were fetched for, and only
/// if it still exists. A failure leaves the details absent; there is no retry
/// loop, the next [`reconcile`](Self::reconcile) simply asks again. Two
/// different books with the same ISBN are fetched independently, and
/// whichever answer lands last is what both end up showing.
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<Inner>,
}

impl Reconciler {
    pub fn new(repo: Repository, provider: ProviderHandle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                repo,
                provider,
                in_flight: Mutex::new(HashSet::new()),
                tracker: TaskTracker::new(),
                events,
            }),
        }
    }

    /// Start a fetch for every book in `books` that is missing details and
    /// has no fetch running. Returns without waiting for any of them.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn reconcile<'a>(&self, books: impl IntoIterator<Item = &'a Book>) -> Sweep {
        let mut sweep = Sweep::default();
        for book in books.into_iter().filter(|b| b.needs_details()) {
            if !self.inner.in_flight().insert(book.id) {
                sweep.in_flight += 1;
                continue;
            }
            let guard = InFlight {
                inner: self.inner.clone(),
                id: book.id,
            };
            let inner = self.inner.clone();
            let (id, isbn) = (book.id, book.isbn.clone());
            let span = tracing::info_span!("backfill", %id, isbn = %book.isbn);
            self.inner.tracker.spawn(
                async move {
                    let _guard = guard;
                    inner.backfill(id, isbn).await;
                }
                .instrument(span),
            );
            sweep.scheduled.push(book.id);
        }
        if !sweep.scheduled.is_empty() {
            tracing::debug!(scheduled = sweep.scheduled.len(), in_flight = sweep.in_flight, "Backfill sweep");
        }
        sweep
    }

    /// Reconcile every stored book missing details, not only those in view.
    pub async fn reconcile_all(&self) -> shelf_store::error::Result<Sweep> {
        let missing = self.inner.repo.list_missing_details().await?;
        Ok(self.reconcile(&missing))
    }

    pub fn is_in_flight(&self, id: BookId) -> bool {
        self.inner.in_flight().contains(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight().len()
    }

    /// Outcomes of every backfill finishing from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Enrichment> {
        self.inner.events.subscribe()
    }

    /// Wait until every backfill started so far has finished.
    pub async fn settle(&self) {
        let tracker = &self.inner.tracker;
        tracker.close();
        tracker.wait().await;
        tracker.reopen();
    }
}
