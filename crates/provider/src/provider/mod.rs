//! Metadata provider trait and implementations.

mod directory;
#[cfg(feature = "mock")]
mod mock;

pub use self::directory::DirectoryProvider;
#[cfg(feature = "mock")]
pub use self::mock::{Call, MockProvider};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use shelf_catalog::BookDetails;
use shelf_catalog::google::isbn_query;

/// Unified interface for book catalogs.
///
/// Both operations are asynchronous and may be slow; callers are expected to
/// run them as background tasks and to be ready for them to be cancelled
/// (dropped) at any suspension point.
///
/// # Examples
///
/// ```
/// use shelf_provider::{MetadataProvider, error::Result};
///
/// async fn title_of(provider: &dyn MetadataProvider, isbn: &str) -> Result<String> {
///     Ok(provider.fetch_by_isbn(isbn).await?.title)
/// }
/// ```
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Name of the provider, used for logging only.
    fn name(&self) -> &str;

    /// Look a single book up by ISBN.
    ///
    /// Default implementation searches for `isbn:<isbn>` and takes the first
    /// result, returning [`NotFound`](ErrorKind::NotFound) if there is none.
    async fn fetch_by_isbn(&self, isbn: &str) -> Result<BookDetails> {
        let results = self.search(&isbn_query(isbn)).await?;
        results.into_iter().next().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(isbn.to_string())))
    }

    /// Free-text search, in the catalog's relevance order.
    ///
    /// An empty result is not an error.
    async fn search(&self, query: &str) -> Result<Vec<BookDetails>>;
}
