mod book;
mod details;
mod namespace;
mod status;

pub use self::book::{Book, BookId, NewBook, UNRANKED};
pub use self::details::{BookDetails, CoverImage, Covers};
pub use self::namespace::Namespace;
pub use self::status::Status;

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase().replace(['-', '_', ' '], "")
}
