//! Submitted CSV -> [`SubmittedRecord`]s.

use std::collections::HashSet;

use crate::error::ReconError;
use crate::model::SubmittedRecord;

/// Expected header cells, after trim + lower-case, in order.
pub const SUBMITTED_HEADERS: [&str; 7] = [
    "date_acte",
    "num_intervention",
    "num_venue",
    "acte_id",
    "code_acte",
    "activite_ou_coeff",
    "type_acte",
];

pub const HEADER_LINE_DISPLAY: &str =
    "DATE_ACTE;NUM_INTERVENTION;NUM_VENUE;ACTE_ID;CODE_ACTE;ACTIVITE_OU_COEFF;TYPE_ACTE";

pub const DEFAULT_DELIMITER: u8 = b';';

#[derive(Debug, Clone, Default)]
pub struct SubmittedBatch {
    pub rows: Vec<SubmittedRecord>,
    /// Rows dropped for having fewer cells than the header.
    pub skipped_rows: usize,
}

impl SubmittedBatch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-blank `acte_id`s, first-seen order, no repeats. This is the database fetch key set.
    pub fn distinct_acte_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| !r.acte_id.is_empty())
            .filter(|r| seen.insert(r.acte_id.as_str()))
            .map(|r| r.acte_id.clone())
            .collect()
    }
}

/// Parse the submitted file content. Headers are validated strictly; short rows are skipped.
pub fn parse_submitted(data: &str, delimiter: u8) -> Result<SubmittedBatch, ReconError> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(csv_err)?,
        None => {
            return Err(ReconError::InvalidHeaders {
                expected: HEADER_LINE_DISPLAY.into(),
                found: String::new(),
            })
        }
    };
    let found: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    if found != SUBMITTED_HEADERS {
        return Err(ReconError::InvalidHeaders {
            expected: HEADER_LINE_DISPLAY.into(),
            found: found.join(";").to_uppercase(),
        });
    }

    let mut batch = SubmittedBatch::default();

    for record in records {
        let record = record.map_err(csv_err)?;
        if record.len() < SUBMITTED_HEADERS.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            log::warn!("line {line}: incomplete CSV row ({} of 7 cells) skipped", record.len());
            batch.skipped_rows += 1;
            continue;
        }

        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        batch.rows.push(SubmittedRecord {
            date_acte: cell(0),
            num_intervention: cell(1),
            num_venue: cell(2),
            acte_id: cell(3),
            code_acte: cell(4).to_uppercase(),
            activite_ou_coeff: cell(5),
            type_acte: cell(6),
        });
    }

    Ok(batch)
}

fn csv_err(e: csv::Error) -> ReconError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    ReconError::Csv {
        line,
        message: e.to_string(),
    }
}
