//! Repository for books on the reading list.

use crate::error::{ErrorKind, Result};
use crate::models::{BookRow, details_to_json};
use crate::{Change, Database};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use shelf_catalog::{Book, BookDetails, BookId, Namespace, NewBook, Status};
use sqlx::SqlitePool;
use time::UtcDateTime;
use tokio::sync::broadcast;
use tracing::instrument;

/// Repository for managing [`Book`] records.
///
/// Every operation is either a single statement or a single transaction,
/// so the store never holds a half-applied change. Rankings are stored as
/// given: deciding which values are correct is the ranking engine's job, and
/// the repository only promises that a batch lands atomically.
///
/// Successful writes are announced on the owning [`Database`]'s change
/// channel; writes that matched no row are not.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    changes: broadcast::Sender<Change>,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            changes: db.change_sender(),
        }
    }
}
impl Repository {
    fn notify(&self, change: Change) {
        // Nobody listening is fine.
        _ = self.changes.send(change);
    }

    fn unix(at: UtcDateTime) -> i64 {
        at.unix_timestamp()
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert a new book with the rankings the caller has already chosen.
    #[instrument(skip(self, book), fields(isbn = %book.isbn))]
    pub async fn insert(&self, book: &NewBook, ranking: u32, favorite_ranking: u32) -> Result<Book> {
        let details = book.details.as_ref().map(details_to_json).transpose()?;
        let row: BookRow = sqlx::query_as(include_str!("../queries/insert_book.sql"))
            .bind(&book.isbn)
            .bind(details)
            .bind(book.status.as_code())
            .bind(i64::from(ranking))
            .bind(i64::from(favorite_ranking))
            .bind(book.is_favorite)
            .bind(Self::unix(book.date_added))
            .bind(book.date_read().map(Self::unix))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let book = Book::try_from(row)?;
        self.notify(Change::Inserted(book.id));
        Ok(book)
    }

    // =========================================================================
    // Get/List
    // =========================================================================

    pub async fn get(&self, id: BookId) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Book::try_from).transpose()
    }

    async fn fetch_all(&self, query: &'static str) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> =
            sqlx::query_as(query).fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Book::try_from).collect()
    }

    /// Every book in the namespace, in the namespace's sort order.
    ///
    /// Rankings ties (the [`UNRANKED`](shelf_catalog::UNRANKED) sentinel,
    /// or a gap left by a failed batch) are broken by `date_added`, then `id`,
    /// so the order is total and stable between calls.
    pub async fn list(&self, namespace: Namespace) -> Result<Vec<Book>> {
        match namespace {
            Namespace::ToRead => self.fetch_all(include_str!("../queries/list_to_read.sql")).await,
            Namespace::Favorites => self.fetch_all(include_str!("../queries/list_favorites.sql")).await,
        }
    }

    /// Books already read, oldest first.
    pub async fn list_read(&self) -> Result<Vec<Book>> {
        self.fetch_all(include_str!("../queries/list_read.sql")).await
    }

    /// Books the catalog has not been asked about yet, by id.
    pub async fn list_missing_details(&self) -> Result<Vec<Book>> {
        self.fetch_all(include_str!("../queries/list_missing_details.sql")).await
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Store a batch of rankings for one namespace in a single transaction.
    ///
    /// Rows already holding their value are not written. Returns the number
    /// of rows that actually changed; zero means the batch was a no-op.
    #[instrument(skip(self, rankings), fields(batch = rankings.len()))]
    pub async fn apply_rankings(&self, namespace: Namespace, rankings: &[(BookId, u32)]) -> Result<u64> {
        let query = match namespace {
            Namespace::ToRead => include_str!("../queries/set_ranking.sql"),
            Namespace::Favorites => include_str!("../queries/set_favorite_ranking.sql"),
        };
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut changed = 0;
        for (id, rank) in rankings {
            let result = sqlx::query(query)
                .bind(i64::from(*rank))
                .bind(id.0)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            changed += result.rows_affected();
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        if changed > 0 {
            tracing::debug!(changed, "Rankings written");
            self.notify(Change::Reranked(namespace));
        }
        Ok(changed)
    }

    /// Change a book's status and read date, optionally moving its to-read
    /// ranking in the same statement. Returns `false` if the book is gone.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: BookId,
        status: Status,
        date_read: Option<UtcDateTime>,
        ranking: Option<u32>,
    ) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/set_status.sql"))
            .bind(status.as_code())
            .bind(date_read.map(Self::unix))
            .bind(ranking.map(i64::from))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let updated = result.rows_affected() > 0;
        if updated {
            self.notify(Change::Updated(id));
        }
        Ok(updated)
    }

    /// Flag or unflag a book as a favorite together with its favorite
    /// ranking. Returns `false` if the book is gone.
    #[instrument(skip(self))]
    pub async fn set_favorite(&self, id: BookId, is_favorite: bool, favorite_ranking: u32) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/set_favorite.sql"))
            .bind(is_favorite)
            .bind(i64::from(favorite_ranking))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let updated = result.rows_affected() > 0;
        if updated {
            self.notify(Change::Updated(id));
        }
        Ok(updated)
    }

    /// Replace a book's details wholesale.
    ///
    /// Returns `false` (and writes nothing) if the book has been deleted in
    /// the meantime; a late catalog answer never brings a record back.
    #[instrument(skip(self, details))]
    pub async fn fill_details(&self, id: BookId, details: &BookDetails) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/fill_details.sql"))
            .bind(details_to_json(details)?)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let filled = result.rows_affected() > 0;
        if filled {
            self.notify(Change::DetailsFilled(id));
        }
        Ok(filled)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete a book. Returns `false` if there was nothing to delete.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: BookId) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            self.notify(Change::Deleted(id));
        }
        Ok(deleted)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    /// Changes committed from now on, as a stream.
    ///
    /// A subscriber that falls too far behind skips the changes it missed
    /// (logged as a warning) and should re-read whatever it is displaying.
    /// The stream ends once every sender is gone.
    pub fn changes(&self) -> impl Stream<Item = Change> + use<> {
        let mut rx = self.subscribe();
        stream! {
            loop {
                match rx.recv().await {
                    Ok(change) => yield change,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Change subscriber lagged behind");
                    },
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}
