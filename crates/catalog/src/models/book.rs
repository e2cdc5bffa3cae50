use super::{BookDetails, Status};
use derive_more::Display;
use time::UtcDateTime;

/// Reserved ranking meaning "not yet assigned a slot".
///
/// Sorts after every real ranking, so a book carrying it lands at the end of
/// its namespace until the next reindex hands it a real position.
pub const UNRANKED: u32 = u32::MAX;

/// Row identity assigned by the record store.
///
/// ISBNs are not unique (the same book can be added twice), so every
/// per-record operation is keyed by this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct BookId(pub i64);

/// A book on the reading list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub isbn: String,
    /// Absent until the catalog has been asked about `isbn`.
    pub details: Option<BookDetails>,
    pub status: Status,
    /// Position within the to-read namespace. Meaningless once read.
    pub ranking: u32,
    /// Position within the favorites namespace. Meaningless unless
    /// `is_favorite`; [`UNRANKED`] while awaiting a slot.
    pub favorite_ranking: u32,
    pub is_favorite: bool,
    pub date_added: UtcDateTime,
    pub date_read: Option<UtcDateTime>,
}
impl AsRef<Book> for Book {
    fn as_ref(&self) -> &Book {
        self
    }
}
impl Book {
    /// Best available title: the catalog's if known, otherwise the ISBN.
    pub fn title(&self) -> &str {
        self.details.as_ref().map_or(self.isbn.as_str(), |d| d.title.as_str())
    }

    pub fn needs_details(&self) -> bool {
        self.details.is_none()
    }
}

/// Everything needed to create a [`Book`] except what the store and the
/// ranking engine assign (identity and rankings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub isbn: String,
    pub details: Option<BookDetails>,
    pub status: Status,
    pub is_favorite: bool,
    pub date_added: UtcDateTime,
}
impl NewBook {
    /// A bare ISBN (bulk seed); details will be backfilled later.
    pub fn from_isbn(isbn: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            details: None,
            status: Status::ToRead,
            is_favorite: false,
            date_added: UtcDateTime::now(),
        }
    }

    /// A book picked from catalog results, details already known.
    pub fn from_details(details: BookDetails) -> Self {
        Self {
            isbn: details.isbn.clone(),
            details: Some(details),
            ..Self::from_isbn(String::new())
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn with_date_added(mut self, date_added: UtcDateTime) -> Self {
        self.date_added = date_added;
        self
    }

    /// A book that arrives already read was finished when it was added.
    pub fn date_read(&self) -> Option<UtcDateTime> {
        (!self.status.is_unread()).then_some(self.date_added)
    }
}
