use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use shelf_catalog::{Book, BookDetails, BookId, Status};
use time::UtcDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) isbn: String,
    pub(crate) details: Option<String>,
    pub(crate) status: String,
    pub(crate) ranking: i64,
    pub(crate) favorite_ranking: i64,
    pub(crate) is_favorite: bool,
    pub(crate) date_added: i64,
    pub(crate) date_read: Option<i64>,
}

pub(crate) fn details_to_json(details: &BookDetails) -> Result<String> {
    serde_json::to_string(details).or_raise(|| ErrorKind::InvalidData("details"))
}

fn rank_from_row(value: i64, field: &'static str) -> Result<u32> {
    u32::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}

impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> std::result::Result<Self, Self::Error> {
        let details = row
            .details
            .as_deref()
            .map(serde_json::from_str::<BookDetails>)
            .transpose()
            .or_raise(|| ErrorKind::InvalidData("details"))?;
        Ok(Book {
            id: BookId(row.id),
            isbn: row.isbn,
            details,
            status: row.status.parse::<Status>().or_raise(|| ErrorKind::InvalidData("status"))?,
            ranking: rank_from_row(row.ranking, "ranking")?,
            favorite_ranking: rank_from_row(row.favorite_ranking, "favorite ranking")?,
            is_favorite: row.is_favorite,
            date_added: UtcDateTime::from_unix_timestamp(row.date_added)
                .or_raise(|| ErrorKind::InvalidData("date added"))?,
            date_read: row
                .date_read
                .map(UtcDateTime::from_unix_timestamp)
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("date read"))?,
        })
    }
}
