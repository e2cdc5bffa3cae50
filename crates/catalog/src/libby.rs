//! Libby timeline export decoding.
//!
//! Libby lets readers export their borrowing history as JSON. Each timeline
//! entry carries enough to seed a reading list (ISBN, title, a single author
//! and a cover URL) but no description. Imported books keep these details as
//! they are; the catalog is never asked about them.

use crate::error::{ErrorKind, Result};
use crate::models::{BookDetails, CoverImage, Covers};
use exn::ResultExt;
use serde::Deserialize;
use time::UtcDateTime;
use tracing::instrument;

#[derive(Deserialize)]
struct Export {
    version: u32,
    timeline: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    cover: Cover,
    title: Title,
    author: String,
    isbn: String,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
    activity: String,
}

#[derive(Deserialize)]
struct Cover {
    url: String,
}

#[derive(Deserialize)]
struct Title {
    text: String,
}

/// One decoded timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub details: BookDetails,
    /// What happened, e.g. `"Borrowed"` or `"Returned"`.
    pub activity: String,
    pub at: UtcDateTime,
}

/// Decode a Libby export, in timeline order.
///
/// Entries are not deduplicated: a book borrowed twice appears twice, and
/// it is up to the caller to decide whether that matters.
#[instrument(skip(body), fields(body_size = body.as_ref().len()))]
pub fn decode_export(body: impl AsRef<[u8]>) -> Result<Vec<TimelineEntry>> {
    let export: Export = serde_json::from_slice(body.as_ref()).or_raise(|| ErrorKind::MalformedPayload("libby export"))?;
    tracing::debug!(version = export.version, entries = export.timeline.len(), "Decoded Libby export");
    export
        .timeline
        .into_iter()
        .map(|entry| {
            let at = UtcDateTime::from_unix_timestamp_nanos(i128::from(entry.timestamp) * 1_000_000).or_raise(|| {
                ErrorKind::ParseError {
                    field: "timestamp",
                    value: entry.timestamp.to_string(),
                }
            })?;
            let details = BookDetails::new(entry.isbn, entry.title.text)
                .with_authors([entry.author])
                .with_covers(Covers {
                    small: None,
                    medium: Some(CoverImage::url(entry.cover.url)),
                });
            Ok(TimelineEntry {
                details,
                activity: entry.activity,
                at,
            })
        })
        .collect()
}
