use shelf_catalog::{BookId, Namespace};

/// A write that has been committed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Inserted(BookId),
    Deleted(BookId),
    /// Status or favorite flag changed.
    Updated(BookId),
    DetailsFilled(BookId),
    /// At least one ranking in the namespace changed.
    Reranked(Namespace),
}
