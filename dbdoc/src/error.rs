use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbDocError {
    #[error("Duplicate field '{field}' on table '{table}'")]
    DuplicateField { field: String, table: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DbDocError>;
