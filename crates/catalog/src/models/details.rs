use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Metadata about a book as reported by the catalog.
///
/// Treated as an immutable value: once fetched it is only ever replaced
/// wholesale, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub isbn: String,
    pub title: String,
    /// Ordered as credited by the catalog.
    pub authors: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub covers: Covers,
}
impl BookDetails {
    pub fn new(isbn: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            authors: Vec::new(),
            description: None,
            covers: Covers::default(),
        }
    }

    pub fn with_authors<A: Into<String>>(mut self, authors: impl IntoIterator<Item = A>) -> Self {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_covers(mut self, covers: Covers) -> Self {
        self.covers = covers;
        self
    }
}
impl Display for BookDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.authors.as_slice() {
            [] => write!(f, "{}", self.title),
            authors => write!(f, "{} by {}", self.title, authors.join(", ")),
        }
    }
}

/// Small and medium cover images for a book, either of which may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Covers {
    pub small: Option<CoverImage>,
    pub medium: Option<CoverImage>,
}

/// A cover image reference.
///
/// Image loading and caching is somebody else's problem; this only records
/// whether the bytes are already at hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CoverImage {
    Url { url: String },
    Fetched { url: String, bytes: Vec<u8> },
}
impl CoverImage {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// Where the image came from, regardless of whether it has been fetched.
    pub fn source(&self) -> &str {
        match self {
            Self::Url { url } | Self::Fetched { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_authors_in_order() {
        let details = BookDetails::new("9780553897845", "A Game of Thrones").with_authors(["George R. R. Martin"]);
        assert_eq!(details.to_string(), "A Game of Thrones by George R. R. Martin");
        let details = BookDetails::new("1", "Good Omens").with_authors(["Terry Pratchett", "Neil Gaiman"]);
        assert_eq!(details.to_string(), "Good Omens by Terry Pratchett, Neil Gaiman");
    }

    #[test]
    fn test_missing_covers_default_when_deserializing() {
        let json = r#"{"isbn":"1","title":"Untitled","authors":[],"description":null}"#;
        let details: BookDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.covers, Covers::default());
    }

    #[test]
    fn test_cover_source_ignores_fetch_state() {
        let fetched = CoverImage::Fetched {
            url: "https://covers.example/1-M.jpg".to_string(),
            bytes: vec![0xff, 0xd8],
        };
        assert_eq!(fetched.source(), "https://covers.example/1-M.jpg");
        assert_eq!(CoverImage::url("https://covers.example/1-S.jpg").source(), "https://covers.example/1-S.jpg");
    }
}
