use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Header row missing or not the expected column sequence.
    #[error("invalid CSV headers: expected {expected}, found '{found}'")]
    InvalidHeaders { expected: String, found: String },

    /// Structural CSV error (bad quoting, reader failure).
    #[error("CSV read error at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// The special-status collaborator failed. Never retried here.
    #[error("special-status lookup failed for intervention '{num_intervention}', venue '{num_venue}': {source}")]
    SpecialStatus {
        num_intervention: String,
        num_venue: String,
        #[source]
        source: BoxError,
    },
}
