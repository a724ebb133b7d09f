use std::convert::Infallible;

use crate::config::MatchConfig;
use crate::error::ReconError;
use crate::index::CandidateIndex;
use crate::matcher::match_act;
use crate::model::{
    CandidateRecord, MatchVerdict, MissReason, MissingAct, ReconciliationResult, SubmittedRecord,
};

/// Point lookup telling whether a file (intervention + venue) is under the C9 administrative hold.
///
/// Only consulted for acts already found missing, so the call count is bounded by
/// `total_missing`. Failures are surfaced as [`ReconError::SpecialStatus`].
pub trait SpecialStatusLookup {
    type Error: std::error::Error + Send + Sync + 'static;

    fn has_special_status(&self, num_intervention: &str, num_venue: &str) -> Result<bool, Self::Error>;
}

impl<F, E> SpecialStatusLookup for F
where
    F: Fn(&str, &str) -> Result<bool, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn has_special_status(&self, num_intervention: &str, num_venue: &str) -> Result<bool, E> {
        self(num_intervention, num_venue)
    }
}

/// Lookup for callers without a status table: nothing is ever on hold.
pub fn no_special_status(_num_intervention: &str, _num_venue: &str) -> Result<bool, Infallible> {
    Ok(false)
}

/// Reconcile a submitted batch against the candidates fetched for its identifiers.
///
/// Output is deterministic: `missing` follows input order.
pub fn reconcile<L: SpecialStatusLookup>(
    submitted: &[SubmittedRecord],
    candidates: &[CandidateRecord],
    lookup: &L,
    config: &MatchConfig,
) -> Result<ReconciliationResult, ReconError> {
    let index = CandidateIndex::build(candidates);
    let mut result = ReconciliationResult {
        total_submitted: submitted.len(),
        ..Default::default()
    };

    for record in submitted {
        match match_act(record, index.get(&record.acte_id), config) {
            MatchVerdict::Matched { scheme } => {
                result.total_found += 1;
                result.by_scheme.get_mut(scheme).found += 1;
            }
            MatchVerdict::Missing { reason } => {
                // No matched scheme here: the row's own declaration decides.
                let scheme = record.expected_scheme();
                result.total_missing += 1;
                result.by_scheme.get_mut(scheme).missing += 1;

                let reason = if on_special_hold(record, lookup)? {
                    MissReason::DossierEnC9
                } else {
                    reason
                };

                result.missing.push(MissingAct {
                    id: record.acte_id.clone(),
                    scheme,
                    reason,
                });
            }
        }
    }

    log::debug!(
        "reconciled {} acts against {} ids: {} found, {} missing",
        result.total_submitted,
        index.distinct_ids(),
        result.total_found,
        result.total_missing,
    );

    Ok(result)
}

fn on_special_hold<L: SpecialStatusLookup>(
    record: &SubmittedRecord,
    lookup: &L,
) -> Result<bool, ReconError> {
    // Without both keys the point query cannot identify a file.
    if record.num_intervention.trim().is_empty() || record.num_venue.trim().is_empty() {
        return Ok(false);
    }

    let held = lookup
        .has_special_status(&record.num_intervention, &record.num_venue)
        .map_err(|e| ReconError::SpecialStatus {
            num_intervention: record.num_intervention.clone(),
            num_venue: record.num_venue.clone(),
            source: Box::new(e),
        })?;

    if held {
        log::debug!(
            "acte {}: file {}/{} on C9 hold",
            record.acte_id,
            record.num_intervention,
            record.num_venue
        );
    }
    Ok(held)
}
