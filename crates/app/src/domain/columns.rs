//! Column conversions between unsigned domain amounts and signed `BIGINT` columns.

use sqlx::Error;

pub(crate) fn to_bigint(value: u64) -> Result<i64, Error> {
    i64::try_from(value).map_err(|source| Error::Encode(Box::new(source)))
}

pub(crate) fn from_bigint(value: i64, column: &str) -> Result<u64, Error> {
    u64::try_from(value).map_err(|source| Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    })
}
