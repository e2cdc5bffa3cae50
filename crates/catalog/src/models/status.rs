use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Where a book sits in the reader's life.
///
/// Favorites are deliberately *not* a status: a book can be a favorite while
/// unread, being read, or already read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    ToRead,
    ReadingNow,
    AlreadyRead,
}
impl Status {
    /// Stable code persisted by the record store.
    pub fn as_code(&self) -> &'static str {
        match self {
            Status::ToRead => "to_read",
            Status::ReadingNow => "reading_now",
            Status::AlreadyRead => "already_read",
        }
    }

    /// Human readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ToRead => "To Read",
            Status::ReadingNow => "Reading Now",
            Status::AlreadyRead => "Already Read",
        }
    }

    /// Unread books (including the one currently being read) are the ones
    /// that hold a to-read ranking.
    pub fn is_unread(&self) -> bool {
        !matches!(self, Status::AlreadyRead)
    }
}
impl FromStr for Status {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "toread" | "tbr" | "unread" => Self::ToRead,
            "readingnow" | "reading" => Self::ReadingNow,
            "alreadyread" | "read" | "haveread" => Self::AlreadyRead,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "status",
                value: s.to_string(),
            }),
        })
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
