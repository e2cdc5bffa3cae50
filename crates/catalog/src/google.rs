//! Google Books `volumes` payload decoding.
//!
//! Both ISBN lookups and free-text searches hit the same endpoint
//! (`/books/v1/volumes?q=...`) and return the same envelope; an ISBN lookup
//! is just a search for `isbn:<isbn>` whose first result wins. Only the fields
//! that end up in [`BookDetails`] are modelled, everything else in the
//! (very chatty) response is ignored.

use crate::error::{ErrorKind, Result};
use crate::models::{BookDetails, CoverImage, Covers};
use exn::ResultExt;
use serde::Deserialize;
use tracing::instrument;

#[derive(Deserialize)]
struct VolumesResponse {
    // Omitted entirely (rather than empty) when nothing matched.
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: String,
    authors: Option<Vec<String>>,
    description: Option<String>,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
    image_links: Option<ImageLinks>,
}

#[derive(Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: IdentifierKind,
    identifier: String,
}

#[derive(Deserialize, PartialEq, Eq)]
enum IdentifierKind {
    #[serde(rename = "ISBN_10")]
    Isbn10,
    #[serde(rename = "ISBN_13")]
    Isbn13,
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
}

impl From<Volume> for BookDetails {
    fn from(volume: Volume) -> Self {
        let info = volume.volume_info;
        let isbn = info
            .industry_identifiers
            .unwrap_or_default()
            .into_iter()
            .find(|id| id.kind == IdentifierKind::Isbn13)
            .map(|id| id.identifier)
            .unwrap_or_default();
        let covers = info
            .image_links
            .map(|links| Covers {
                small: links.small_thumbnail.map(CoverImage::url),
                medium: links.thumbnail.map(CoverImage::url),
            })
            .unwrap_or_default();
        BookDetails {
            isbn,
            title: info.title,
            authors: info.authors.unwrap_or_default(),
            description: info.description,
            covers,
        }
    }
}

/// Search term that looks a single book up by ISBN.
pub fn isbn_query(isbn: impl AsRef<str>) -> String {
    format!("isbn:{}", isbn.as_ref().trim())
}

/// Decode a `volumes` response body into [`BookDetails`], preserving the
/// catalog's relevance order.
///
/// Volumes without an `ISBN_13` identifier keep an empty `isbn`.
#[instrument(skip(body), fields(body_size = body.as_ref().len()))]
pub fn decode_volumes(body: impl AsRef<[u8]>) -> Result<Vec<BookDetails>> {
    let response: VolumesResponse =
        serde_json::from_slice(body.as_ref()).or_raise(|| ErrorKind::MalformedPayload("google books volumes"))?;
    Ok(response.items.into_iter().map(BookDetails::from).collect())
}
