use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_text;

// ---------------------------------------------------------------------------
// Scheme
// ---------------------------------------------------------------------------

/// Act-coding scheme. Each scheme has its own source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scheme {
    #[serde(rename = "NGAP")]
    Ngap,
    #[serde(rename = "CCAM")]
    Ccam,
}

impl Scheme {
    /// Case/space-insensitive parse. `None` for anything but NGAP or CCAM.
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_text(raw).as_str() {
            "ngap" => Some(Self::Ngap),
            "ccam" => Some(Self::Ccam),
            _ => None,
        }
    }

    /// Scheme declared by a submitted `type_acte` cell. Absent or unknown falls back to CCAM.
    pub fn from_type_acte(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Ccam)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ngap => "NGAP",
            Self::Ccam => "CCAM",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One row of the submitted CSV, already trimmed, `code_acte` upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedRecord {
    pub date_acte: String,
    pub num_intervention: String,
    pub num_venue: String,
    pub acte_id: String,
    pub code_acte: String,
    pub activite_ou_coeff: String,
    /// Raw cell. Kept as text: blank or unknown values are tolerated.
    pub type_acte: String,
}

impl SubmittedRecord {
    pub fn expected_scheme(&self) -> Scheme {
        Scheme::from_type_acte(&self.type_acte)
    }
}

/// One database row from either scheme's query, fields normalised to a single shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub acte_id: String,
    pub code_acte: String,
    pub activite_ou_coeff: String,
    pub acte_internum: String,
    pub num_intervention: String,
    /// Venue key from the join (`vennum`). Carried through, never compared.
    pub venue_number: String,
    /// Venue number (`novenue`) compared against the submitted `num_venue`.
    pub venue_alt_number: String,
    pub date_acte: String,
    pub scheme: Scheme,
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Why a submitted act was not confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    ActeIntrouvableEnBdd,
    TypeActeMismatch,
    ActeIdMismatch,
    CodeActeMismatch,
    ActiviteOuCoeffMismatch,
    NumInterventionMismatch,
    NumVenueMismatch,
    InvalidDateFormat,
    DateMismatch,
    /// Administrative hold on the file: the absence is explained.
    #[serde(rename = "dossier_en_C9")]
    DossierEnC9,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActeIntrouvableEnBdd => "acte_introuvable_en_bdd",
            Self::TypeActeMismatch => "type_acte_mismatch",
            Self::ActeIdMismatch => "acte_id_mismatch",
            Self::CodeActeMismatch => "code_acte_mismatch",
            Self::ActiviteOuCoeffMismatch => "activite_ou_coeff_mismatch",
            Self::NumInterventionMismatch => "num_intervention_mismatch",
            Self::NumVenueMismatch => "num_venue_mismatch",
            Self::InvalidDateFormat => "invalid_date_format",
            Self::DateMismatch => "date_mismatch",
            Self::DossierEnC9 => "dossier_en_C9",
        }
    }
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchVerdict {
    Matched { scheme: Scheme },
    Missing { reason: MissReason },
}

impl MatchVerdict {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    pub fn scheme(&self) -> Option<Scheme> {
        match self {
            Self::Matched { scheme } => Some(*scheme),
            Self::Missing { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<MissReason> {
        match self {
            Self::Matched { .. } => None,
            Self::Missing { reason } => Some(*reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeTally {
    pub found: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByScheme {
    #[serde(rename = "NGAP")]
    pub ngap: SchemeTally,
    #[serde(rename = "CCAM")]
    pub ccam: SchemeTally,
}

impl ByScheme {
    pub fn get(&self, scheme: Scheme) -> &SchemeTally {
        match scheme {
            Scheme::Ngap => &self.ngap,
            Scheme::Ccam => &self.ccam,
        }
    }

    pub fn get_mut(&mut self, scheme: Scheme) -> &mut SchemeTally {
        match scheme {
            Scheme::Ngap => &mut self.ngap,
            Scheme::Ccam => &mut self.ccam,
        }
    }
}

/// A submitted act absent from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAct {
    pub id: String,
    /// Scheme declared by the submitted row (CCAM when blank or unknown).
    #[serde(rename = "type")]
    pub scheme: Scheme,
    pub reason: MissReason,
}

/// Aggregate outcome of one reconciliation. Serialises to the response contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    #[serde(rename = "total_csv")]
    pub total_submitted: usize,
    pub total_found: usize,
    pub total_missing: usize,
    /// Input order of the missing records.
    #[serde(rename = "missing_acts_list")]
    pub missing: Vec<MissingAct>,
    #[serde(rename = "by_type")]
    pub by_scheme: ByScheme,
}

impl ReconciliationResult {
    /// Missing acts counted per reason, in reason order.
    pub fn reason_counts(&self) -> BTreeMap<MissReason, usize> {
        let mut counts = BTreeMap::new();
        for act in &self.missing {
            *counts.entry(act.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Count identities: found + missing = submitted, per-scheme sums agree with totals.
    pub fn is_consistent(&self) -> bool {
        let b = &self.by_scheme;
        self.total_found + self.total_missing == self.total_submitted
            && b.ngap.found + b.ccam.found == self.total_found
            && b.ngap.missing + b.ccam.missing == self.total_missing
            && self.missing.len() == self.total_missing
    }
}
