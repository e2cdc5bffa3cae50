use crate::ranking::error::{ErrorKind, Result};
use crate::ranking::plan::{align, move_offsets, plan};
use exn::{OptionExt, ResultExt};
use shelf_catalog::{Book, BookId, Namespace, NewBook, Status, UNRANKED};
use shelf_store::Repository;
use time::UtcDateTime;
use tokio::sync::{Mutex, MutexGuard};
use tracing::instrument;

/// A namespace as it stands after a ranking operation: every member, in
/// order, carrying the rankings that were just stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedView {
    pub namespace: Namespace,
    pub books: Vec<Book>,
}
impl RankedView {
    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }

    pub fn ids(&self) -> Vec<BookId> {
        self.books.iter().map(|b| b.id).collect()
    }

    /// The highest ranking in the view, recomputed from its members.
    pub fn last_ranking(&self) -> Option<u32> {
        self.books.iter().map(|b| self.namespace.rank_of(b)).max()
    }

    /// Where a book appended to this namespace goes.
    pub fn next_ranking(&self) -> u32 {
        self.books.iter().zip(1u32..).last().map_or(0, |(_, next)| next)
    }
}
impl IntoIterator for RankedView {
    type Item = Book;
    type IntoIter = std::vec::IntoIter<Book>;
    fn into_iter(self) -> Self::IntoIter {
        self.books.into_iter()
    }
}

/// Owns the `ranking` and `favorite_ranking` fields of every book.
///
/// Each namespace has its own lock, so a reorder of the to-read list and a
/// reorder of the favorites never wait on each other, while two reorders of
/// the same namespace are applied one after the other (the later one wins).
/// Operations touching both namespaces take the to-read lock first.
///
/// Every operation that changes a namespace's membership or order finishes
/// by re-reading the namespace from storage and writing contiguous rankings,
/// so whatever happened before (a failed batch, a crash, a sentinel) is
/// repaired by the next operation on that namespace.
pub struct RankingEngine {
    repo: Repository,
    to_read: Mutex<()>,
    favorites: Mutex<()>,
}

impl RankingEngine {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            to_read: Mutex::new(()),
            favorites: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    async fn lock(&self, namespace: Namespace) -> MutexGuard<'_, ()> {
        match namespace {
            Namespace::ToRead => self.to_read.lock().await,
            Namespace::Favorites => self.favorites.lock().await,
        }
    }

    async fn list(&self, namespace: Namespace) -> Result<Vec<Book>> {
        self.repo.list(namespace).await.or_raise(|| ErrorKind::Store)
    }

    async fn get(&self, id: BookId) -> Result<Book> {
        let book = self.repo.get(id).await.or_raise(|| ErrorKind::Store)?;
        book.ok_or_raise(|| ErrorKind::NotFound(id))
    }

    /// The namespace as stored, without repairing anything.
    pub async fn snapshot(&self, namespace: Namespace) -> Result<RankedView> {
        Ok(RankedView {
            namespace,
            books: self.list(namespace).await?,
        })
    }

    /// Number `ordered` `0..n` and store whatever changed as one batch.
    ///
    /// `ordered` is the whole namespace in its new order. Only its order is
    /// trusted: it is lined up with the namespace as stored once the lock is
    /// held, so books deleted since are dropped, books it is missing go last,
    /// and writes are planned against the stored rankings.
    pub async fn reindex(&self, namespace: Namespace, ordered: Vec<Book>) -> Result<RankedView> {
        let _guard = self.lock(namespace).await;
        let stored = self.list(namespace).await?;
        self.reindex_locked(namespace, align(&ordered, stored)).await
    }

    async fn reindex_locked(&self, namespace: Namespace, mut ordered: Vec<Book>) -> Result<RankedView> {
        ordered.retain(|book| namespace.contains(book));
        let batch = plan(namespace, &ordered);
        if !batch.is_empty() {
            let written = self.repo.apply_rankings(namespace, &batch).await.or_raise(|| ErrorKind::Store)?;
            tracing::info!(%namespace, planned = batch.len(), written, "Reindexed");
        }
        for (book, rank) in ordered.iter_mut().zip(0u32..) {
            namespace.set_rank(book, rank);
        }
        Ok(RankedView {
            namespace,
            books: ordered,
        })
    }

    /// Re-derive a namespace's rankings from storage.
    ///
    /// This is the reconciliation pass: favorites still holding
    /// [`UNRANKED`] sort last and receive real positions here.
    #[instrument(skip(self))]
    pub async fn refresh(&self, namespace: Namespace) -> Result<RankedView> {
        let _guard = self.lock(namespace).await;
        self.refresh_locked(namespace).await
    }

    async fn refresh_locked(&self, namespace: Namespace) -> Result<RankedView> {
        let current = self.list(namespace).await?;
        self.reindex_locked(namespace, current).await
    }

    /// Insert one book, appending it to the end of the to-read list if it
    /// has not been read. A favorite starts out [`UNRANKED`].
    pub async fn add(&self, book: &NewBook) -> Result<Book> {
        let mut added = self.add_all(std::slice::from_ref(book)).await?;
        added.pop().ok_or_raise(|| ErrorKind::Store)
    }

    /// Insert several books in order, as if [`add`](Self::add)ed one by one.
    #[instrument(skip_all, fields(count = books.len()))]
    pub async fn add_all(&self, books: &[NewBook]) -> Result<Vec<Book>> {
        let _guard = self.lock(Namespace::ToRead).await;
        let mut to_read = self.refresh_locked(Namespace::ToRead).await?;
        let mut added = Vec::with_capacity(books.len());
        for book in books {
            let ranking = if book.status.is_unread() {
                to_read.next_ranking()
            } else {
                UNRANKED
            };
            let book = self.repo.insert(book, ranking, UNRANKED).await.or_raise(|| ErrorKind::Store)?;
            if book.status.is_unread() {
                to_read.books.push(book.clone());
            }
            added.push(book);
        }
        Ok(added)
    }

    /// Delete a book and close the gaps it leaves behind.
    ///
    /// Returns `false` if there was no such book.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: BookId) -> Result<bool> {
        let _to_read = self.lock(Namespace::ToRead).await;
        let _favorites = self.lock(Namespace::Favorites).await;
        let Some(book) = self.repo.get(id).await.or_raise(|| ErrorKind::Store)? else {
            return Ok(false);
        };
        if !self.repo.delete(id).await.or_raise(|| ErrorKind::Store)? {
            return Ok(false);
        }
        for namespace in Namespace::ALL {
            if namespace.contains(&book) {
                self.refresh_locked(namespace).await?;
            }
        }
        Ok(true)
    }

    /// Apply one user reorder to a namespace.
    ///
    /// The offsets are resolved against the namespace as stored at the
    /// moment the lock is acquired, not against whatever the caller last
    /// displayed.
    #[instrument(skip(self))]
    pub async fn move_items(&self, namespace: Namespace, from: &[usize], to: usize) -> Result<RankedView> {
        let _guard = self.lock(namespace).await;
        let mut current = self.list(namespace).await?;
        move_offsets(&mut current, from, to)?;
        self.reindex_locked(namespace, current).await
    }

    /// Change a book's reading status, keeping the to-read list contiguous.
    ///
    /// Finishing a book stamps `date_read` and drops it from the to-read
    /// list. Un-reading a book clears `date_read` and appends it to the end
    /// of the to-read list. Moving between to-read and reading now changes
    /// no ranking.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: BookId, status: Status) -> Result<Book> {
        let _guard = self.lock(Namespace::ToRead).await;
        let book = self.get(id).await?;
        if book.status == status {
            return Ok(book);
        }
        let updated = match (book.status.is_unread(), status.is_unread()) {
            (true, false) => self.repo.set_status(id, status, Some(UtcDateTime::now()), None).await,
            (false, true) => {
                let to_read = self.refresh_locked(Namespace::ToRead).await?;
                self.repo.set_status(id, status, None, Some(to_read.next_ranking())).await
            },
            _ => self.repo.set_status(id, status, book.date_read, None).await,
        }
        .or_raise(|| ErrorKind::Store)?;
        if !updated {
            exn::bail!(ErrorKind::NotFound(id));
        }
        if book.status.is_unread() != status.is_unread() {
            self.refresh_locked(Namespace::ToRead).await?;
        }
        self.get(id).await
    }

    /// Add a book to, or remove it from, the favorites.
    ///
    /// A new favorite holds [`UNRANKED`] (and so sorts last) until the next
    /// [`refresh`](Self::refresh) of the favorites gives it a position.
    /// Removing a favorite closes the gap immediately.
    #[instrument(skip(self))]
    pub async fn set_favorite(&self, id: BookId, is_favorite: bool) -> Result<Book> {
        let _guard = self.lock(Namespace::Favorites).await;
        let book = self.get(id).await?;
        if book.is_favorite == is_favorite {
            return Ok(book);
        }
        let updated = self.repo.set_favorite(id, is_favorite, UNRANKED).await.or_raise(|| ErrorKind::Store)?;
        if !updated {
            exn::bail!(ErrorKind::NotFound(id));
        }
        if !is_favorite {
            self.refresh_locked(Namespace::Favorites).await?;
        }
        self.get(id).await
    }
}
