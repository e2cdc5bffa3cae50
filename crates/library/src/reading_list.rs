use crate::enrich::Reconciler;
use crate::error::{ErrorKind, Result};
use crate::ranking::error::{ErrorKind as RankingErrorKind, Result as RankingResult};
use crate::ranking::{RankedView, RankingEngine};
use crate::search::{SearchCoordinator, SearchSnapshot};
use crate::spin::{RandomSelector, Spin};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use shelf_catalog::libby::decode_export;
use shelf_catalog::{Book, BookDetails, BookId, Namespace, NewBook, Status};
use shelf_config::Config;
use shelf_provider::ProviderHandle;
use shelf_store::{Change, Database, Repository};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::instrument;

/// Raise a ranking failure into the library's vocabulary, keeping storage
/// failures distinguishable from refused operations.
trait OrRaiseRanking<T> {
    fn or_raise_ranking(self) -> Result<T>;
}
impl<T> OrRaiseRanking<T> for RankingResult<T> {
    fn or_raise_ranking(self) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => {
                let kind = match &*e {
                    RankingErrorKind::Store => ErrorKind::Store,
                    RankingErrorKind::InvalidOffset { .. } | RankingErrorKind::NotFound(_) => ErrorKind::Ranking,
                };
                Err(e).or_raise(|| kind)
            },
        }
    }
}

/// The outcome of a spin: who was picked, from which candidates, and how
/// the wheel should be animated to get there.
///
/// Only [`ReadingList::spin`] builds one, so the spin always has exactly one
/// slice per candidate.
#[derive(Debug, Clone)]
pub struct Draw {
    candidates: Vec<Book>,
    spin: Spin,
}
impl Draw {
    /// The to-read list at the moment of the spin, one slice each.
    pub fn candidates(&self) -> &[Book] {
        &self.candidates
    }

    pub fn spin(&self) -> &Spin {
        &self.spin
    }

    pub fn target(&self) -> &Book {
        &self.candidates[self.spin.target]
    }

    /// The candidate under the pointer once the wheel actually came to rest
    /// at `angle`.
    pub fn settle(&self, angle: f64) -> &Book {
        &self.candidates[self.spin.index_at(angle)]
    }
}

/// A reading list: one record store, one catalog, and the engines that keep
/// them consistent.
///
/// Every user action is one method here. Views are returned as snapshots;
/// nothing handed out is updated behind the caller's back, so callers that
/// want live data re-read (or follow [`views`](Self::views)).
pub struct ReadingList {
    engine: RankingEngine,
    reconciler: Reconciler,
    search: SearchCoordinator,
    selector: Mutex<RandomSelector>,
}

impl ReadingList {
    pub fn new(db: &Database, provider: ProviderHandle, config: &Config) -> Self {
        let repo = Repository::from(db);
        Self {
            engine: RankingEngine::new(repo.clone()),
            reconciler: Reconciler::new(repo, provider.clone()),
            search: SearchCoordinator::new(provider, &config.search),
            selector: Mutex::new(RandomSelector::from_entropy().with_rotations(config.spin.rotations())),
        }
    }

    /// Replace the randomizer, e.g. with a seeded one.
    pub fn with_selector(self, selector: RandomSelector) -> Self {
        Self {
            selector: Mutex::new(selector),
            ..self
        }
    }

    pub fn repository(&self) -> &Repository {
        self.engine.repository()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn searcher(&self) -> &SearchCoordinator {
        &self.search
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Materialize a ranked view.
    ///
    /// Runs a reconciliation pass first: rankings are re-derived from
    /// storage, and any book in the view still missing details gets a
    /// background fetch.
    #[instrument(skip(self))]
    pub async fn view(&self, namespace: Namespace) -> Result<RankedView> {
        let view = self.engine.refresh(namespace).await.or_raise_ranking()?;
        self.reconciler.reconcile(view.iter());
        Ok(view)
    }

    /// Books already read, in the order they were finished.
    pub async fn read_view(&self) -> Result<Vec<Book>> {
        let books = self.repository().list_read().await.or_raise(|| ErrorKind::Store)?;
        self.reconciler.reconcile(&books);
        Ok(books)
    }

    /// A namespace as stored right now, then again after every change that
    /// could affect it.
    ///
    /// Read-only: rankings are shown as stored, not repaired.
    pub fn views(&self, namespace: Namespace) -> impl Stream<Item = Result<RankedView>> + '_ {
        let mut changes = self.repository().subscribe();
        stream! {
            yield self.engine.snapshot(namespace).await.or_raise_ranking();
            loop {
                match changes.recv().await {
                    Ok(Change::Reranked(other)) if other != namespace => continue,
                    Ok(_) => {},
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "View subscriber lagged; re-reading");
                    },
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
                yield self.engine.snapshot(namespace).await.or_raise_ranking();
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a book picked from search results to the end of the to-read list.
    pub async fn add(&self, details: BookDetails) -> Result<Book> {
        self.engine.add(&NewBook::from_details(details)).await.or_raise_ranking()
    }

    /// Add a book picked from search results as already read, finished now.
    pub async fn add_read(&self, details: BookDetails) -> Result<Book> {
        let book = NewBook::from_details(details).with_status(Status::AlreadyRead);
        self.engine.add(&book).await.or_raise_ranking()
    }

    /// Add a book picked from search results straight to the favorites. It
    /// also joins the end of the to-read list.
    pub async fn add_favorite(&self, details: BookDetails) -> Result<Book> {
        let book = NewBook::from_details(details).with_favorite(true);
        self.engine.add(&book).await.or_raise_ranking()
    }

    /// Seed the list with bare ISBNs, in order. Details are backfilled the
    /// next time a view is materialized.
    pub async fn add_isbns<I, S>(&self, isbns: I) -> Result<Vec<Book>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let books: Vec<NewBook> = isbns
            .into_iter()
            .map(Into::into)
            .map(|isbn: String| isbn.trim().to_string())
            .filter(|isbn| !isbn.is_empty())
            .map(NewBook::from_isbn)
            .collect();
        self.engine.add_all(&books).await.or_raise_ranking()
    }

    /// Seed the list from a Libby timeline export, oldest entry first.
    ///
    /// Every entry becomes a book, including repeat borrows of the same
    /// title.
    #[instrument(skip_all)]
    pub async fn import(&self, export: impl AsRef<[u8]>) -> Result<Vec<Book>> {
        let entries = decode_export(export).or_raise(|| ErrorKind::Import)?;
        let books: Vec<NewBook> = entries
            .into_iter()
            .map(|entry| NewBook::from_details(entry.details).with_date_added(entry.at))
            .collect();
        let added = self.engine.add_all(&books).await.or_raise_ranking()?;
        tracing::info!(count = added.len(), "Imported Libby export");
        Ok(added)
    }

    /// Returns `false` if there was no such book.
    pub async fn delete(&self, id: BookId) -> Result<bool> {
        self.engine.delete(id).await.or_raise_ranking()
    }

    pub async fn move_items(&self, namespace: Namespace, from: &[usize], to: usize) -> Result<RankedView> {
        self.engine.move_items(namespace, from, to).await.or_raise_ranking()
    }

    pub async fn set_status(&self, id: BookId, status: Status) -> Result<Book> {
        self.engine.set_status(id, status).await.or_raise_ranking()
    }

    pub async fn set_favorite(&self, id: BookId, is_favorite: bool) -> Result<Book> {
        self.engine.set_favorite(id, is_favorite).await.or_raise_ranking()
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// The search box now reads `query`. See [`SearchCoordinator`].
    pub fn search(&self, query: impl Into<String>) {
        self.search.input(query);
    }

    pub fn search_snapshot(&self) -> SearchSnapshot {
        self.search.snapshot()
    }

    pub fn search_updates(&self) -> watch::Receiver<SearchSnapshot> {
        self.search.subscribe()
    }

    // =========================================================================
    // Randomizer
    // =========================================================================

    /// Pick a random book from the to-read list.
    pub async fn spin(&self) -> Result<Draw> {
        let candidates = self.view(Namespace::ToRead).await?.books;
        let spin = {
            let mut selector = self.selector.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            selector.select(candidates.len()).or_raise(|| ErrorKind::Spin)?
        };
        tracing::info!(candidates = candidates.len(), target = spin.target, "Spun the wheel");
        Ok(Draw { candidates, spin })
    }

    /// Wait for every background fetch and search started so far.
    pub async fn settle(&self) {
        self.reconciler.settle().await;
        self.search.settle().await;
    }
}
