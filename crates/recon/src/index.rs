use std::collections::HashMap;

use crate::model::CandidateRecord;

/// Candidates grouped by exact `acte_id`. Duplicates are kept in fetch order.
pub struct CandidateIndex<'a> {
    by_id: HashMap<&'a str, Vec<&'a CandidateRecord>>,
}

impl<'a> CandidateIndex<'a> {
    pub fn build(candidates: &'a [CandidateRecord]) -> Self {
        let mut by_id: HashMap<&'a str, Vec<&'a CandidateRecord>> = HashMap::new();
        for candidate in candidates {
            by_id.entry(candidate.acte_id.as_str()).or_default().push(candidate);
        }

        for (id, rows) in &by_id {
            if rows.len() > 1 {
                log::debug!("acte_id {id}: {} candidate rows", rows.len());
            }
        }

        Self { by_id }
    }

    /// Candidates for `acte_id`; empty when the id was not returned by the database.
    pub fn get(&self, acte_id: &str) -> &[&'a CandidateRecord] {
        self.by_id.get(acte_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn distinct_ids(&self) -> usize {
        self.by_id.len()
    }
}
