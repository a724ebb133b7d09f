use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("no file at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("expected a .csv file, got {}", if found.is_empty() { "no extension" } else { found.as_str() })]
    InvalidExtension { found: String },

    #[error("{} looks like a binary file, not CSV text", path.display())]
    InvalidContent { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("database error ({context}): {source}")]
    Database {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl IoError {
    pub(crate) fn db(context: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> IoError {
        let context = context.into();
        move |source| IoError::Database { context, source }
    }
}
