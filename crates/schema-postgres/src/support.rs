//! Shared plumbing: sqlx error mapping.
//!
//! All SQL here is runtime-checked (`sqlx::query`/`query_as`, never the
//! `query!` macros) so this crate builds without a live database at compile
//! time — same choice the teacher workspace makes in `sem_os_postgres`.
//!
//! Enum columns are stored as `text` and converted through the `to_db`/
//! `from_db` methods defined alongside each enum in `schema_types::enums`
//! (inherent impls must live in the crate that owns the type).

use schema_core::error::SchemaIntelError;

pub fn map_sqlx(action: &'static str) -> impl Fn(sqlx::Error) -> SchemaIntelError {
    move |e| match e {
        sqlx::Error::RowNotFound => SchemaIntelError::NotFound(format!("{action}: not found")),
        other => SchemaIntelError::Internal(anyhow::anyhow!("{action}: {other}")),
    }
}
