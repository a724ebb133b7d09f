//! `collecteur-recon`: medical-act reconciliation engine.
//!
//! Pure engine crate: receives the parsed submitted batch and the candidate rows
//! already fetched from the database, returns the reconciliation result.
//! No filesystem or database dependencies; the special-status check is injected.

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod normalize;

pub use config::MatchConfig;
pub use engine::{no_special_status, reconcile, SpecialStatusLookup};
pub use error::ReconError;
pub use ingest::{parse_submitted, SubmittedBatch};
pub use model::{
    CandidateRecord, MatchVerdict, MissReason, MissingAct, ReconciliationResult, Scheme,
    SubmittedRecord,
};
