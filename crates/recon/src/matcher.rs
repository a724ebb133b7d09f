use crate::config::MatchConfig;
use crate::model::{CandidateRecord, MatchVerdict, MissReason, SubmittedRecord};
use crate::normalize::{coefficients_eq, parse_act_datetime, text_eq};

/// Decide whether `submitted` is present among `candidates` (all rows sharing its `acte_id`).
///
/// Candidates of the wrong scheme are discarded first. The first remaining candidate that
/// passes the whole constraint chain wins. When none does, the reported reason is the first
/// failing constraint of the *first* same-scheme candidate only; failures of later
/// candidates are not surveyed.
pub fn match_act(
    submitted: &SubmittedRecord,
    candidates: &[&CandidateRecord],
    config: &MatchConfig,
) -> MatchVerdict {
    if candidates.is_empty() {
        return MatchVerdict::Missing {
            reason: MissReason::ActeIntrouvableEnBdd,
        };
    }

    let expected = submitted.expected_scheme();
    let mut typed = candidates.iter().filter(|c| c.scheme == expected).peekable();

    let Some(first) = typed.peek().copied() else {
        return MatchVerdict::Missing {
            reason: MissReason::TypeActeMismatch,
        };
    };

    let first_failure = match check_constraints(submitted, first, config) {
        None => return MatchVerdict::Matched { scheme: expected },
        Some(reason) => reason,
    };

    if typed.skip(1).any(|c| check_constraints(submitted, c, config).is_none()) {
        return MatchVerdict::Matched { scheme: expected };
    }

    MatchVerdict::Missing {
        reason: first_failure,
    }
}

/// Run the constraint chain; `None` when every constraint holds.
///
/// Order is significant: it decides which reason is reported.
pub fn check_constraints(
    submitted: &SubmittedRecord,
    candidate: &CandidateRecord,
    config: &MatchConfig,
) -> Option<MissReason> {
    if !text_eq(&submitted.acte_id, &candidate.acte_id) {
        return Some(MissReason::ActeIdMismatch);
    }
    if !text_eq(&submitted.code_acte, &candidate.code_acte) {
        return Some(MissReason::CodeActeMismatch);
    }
    if !coefficients_eq(&submitted.activite_ou_coeff, &candidate.activite_ou_coeff) {
        return Some(MissReason::ActiviteOuCoeffMismatch);
    }
    if !text_eq(&submitted.num_intervention, &candidate.num_intervention) {
        return Some(MissReason::NumInterventionMismatch);
    }
    if !text_eq(&submitted.num_venue, &candidate.venue_alt_number) {
        return Some(MissReason::NumVenueMismatch);
    }

    let (Some(submitted_at), Some(recorded_at)) = (
        parse_act_datetime(&submitted.date_acte),
        parse_act_datetime(&candidate.date_acte),
    ) else {
        return Some(MissReason::InvalidDateFormat);
    };
    let gap_seconds = (submitted_at - recorded_at).num_seconds().abs();
    if gap_seconds > config.tolerance_seconds() {
        return Some(MissReason::DateMismatch);
    }

    None
}
