use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lead {0} not found")]
    NotFound(i64),

    #[error("a lead already exists for conversation {0}")]
    DuplicateConversation(String),

    #[error("no results for query")]
    NoResults,

    #[error("invalid stored value: {0}")]
    Corrupt(String),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("{0}")]
    Other(String),
}
