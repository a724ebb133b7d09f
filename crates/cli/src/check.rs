//! `collecteur check` and `collecteur validate`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use collecteur_config::Settings;
use collecteur_io::{read_file_as_utf8, validate_upload, write_missing_csv, ActeRepository};
use collecteur_recon::{parse_submitted, reconcile, ReconciliationResult, SubmittedBatch};
use serde::Serialize;

use crate::exit_codes::{EXIT_MISSING_ACTS, EXIT_SUCCESS};
use crate::CliError;

pub struct CheckArgs {
    pub file: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub export_missing: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub tolerance: Option<u32>,
    pub delimiter: Option<char>,
}

#[derive(Serialize)]
struct CheckStats {
    t_parse_ms: u64,
    t_sql_ms: u64,
    skipped_rows: usize,
}

#[derive(Serialize)]
struct CheckResponse<'a> {
    ok: bool,
    stats: CheckStats,
    result: &'a ReconciliationResult,
}

#[derive(Serialize)]
struct ValidateResponse {
    ok: bool,
    size: u64,
    rows: usize,
    skipped_rows: usize,
    distinct_ids: usize,
}

pub fn cmd_check(args: CheckArgs, mut settings: Settings) -> Result<u8, CliError> {
    if let Some(db) = args.db {
        settings.database.path = db;
    }
    if let Some(minutes) = args.tolerance {
        settings.matching.date_tolerance_minutes = minutes;
    }
    apply_delimiter(&mut settings, args.delimiter)?;

    let upload = validate_upload(&args.file, settings.limits.upload_max_size)?;

    let parse_start = Instant::now();
    let batch = read_batch(&upload.path, &settings)?;
    let t_parse_ms = elapsed_ms(parse_start);

    let ids = admit(&batch, settings.limits.max_ids)?;

    let repo = ActeRepository::open(&settings.database.path)?;
    let sql_start = Instant::now();
    let candidates = repo.fetch_by_acte_ids_chunked(&ids, settings.chunk_size())?;
    let t_sql_ms = elapsed_ms(sql_start);

    let result = reconcile(&batch.rows, &candidates, &repo, &settings.match_config())?;

    log::info!(
        "upload processed: total_csv={} found={} missing={} t_parse_ms={} t_sql_ms={} size={}",
        result.total_submitted,
        result.total_found,
        result.total_missing,
        t_parse_ms,
        t_sql_ms,
        upload.size,
    );

    let response = CheckResponse {
        ok: true,
        stats: CheckStats { t_parse_ms, t_sql_ms, skipped_rows: batch.skipped_rows },
        result: &result,
    };
    let json_str = serde_json::to_string_pretty(&response)
        .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref dest) = args.export_missing {
        if result.missing.is_empty() {
            log::info!("no missing acts, nothing exported");
        } else {
            let written = write_missing_csv(&result.missing, dest, chrono::Local::now().naive_local())?;
            eprintln!("wrote {}", written.display());
        }
    }

    if args.json {
        println!("{json_str}");
    }

    print_summary(&result, batch.skipped_rows);

    if result.total_missing > 0 {
        Ok(EXIT_MISSING_ACTS)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

pub fn cmd_validate(file: PathBuf, json: bool, delimiter: Option<char>, mut settings: Settings) -> Result<u8, CliError> {
    apply_delimiter(&mut settings, delimiter)?;

    let upload = validate_upload(&file, settings.limits.upload_max_size)?;
    let batch = read_batch(&upload.path, &settings)?;
    let ids = admit(&batch, settings.limits.max_ids)?;

    if json {
        let response = ValidateResponse {
            ok: true,
            size: upload.size,
            rows: batch.rows.len(),
            skipped_rows: batch.skipped_rows,
            distinct_ids: ids.len(),
        };
        let json_str = serde_json::to_string_pretty(&response)
            .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!(
        "{}: {} rows, {} skipped, {} distinct acte ids",
        file.display(),
        batch.rows.len(),
        batch.skipped_rows,
        ids.len(),
    );
    Ok(EXIT_SUCCESS)
}

fn apply_delimiter(settings: &mut Settings, delimiter: Option<char>) -> Result<(), CliError> {
    if let Some(c) = delimiter {
        settings.csv.delimiter = c;
        settings.validate()?;
    }
    Ok(())
}

fn read_batch(path: &Path, settings: &Settings) -> Result<SubmittedBatch, CliError> {
    let text = read_file_as_utf8(path)?;
    let batch = parse_submitted(&text, settings.delimiter_byte())?;
    if batch.skipped_rows > 0 {
        log::warn!("{} incomplete rows skipped", batch.skipped_rows);
    }
    Ok(batch)
}

/// Row and id-count gates applied before any database work. Returns the fetch keys.
fn admit(batch: &SubmittedBatch, max_ids: usize) -> Result<Vec<String>, CliError> {
    if batch.is_empty() {
        return Err(CliError::rejected("NO_ROWS", "no readable rows in file"));
    }

    let ids = batch.distinct_acte_ids();
    if ids.is_empty() {
        return Err(CliError::rejected("NO_IDS", "no acte_id found in file"));
    }
    if ids.len() > max_ids {
        return Err(CliError::rejected(
            "TOO_MANY_IDS",
            format!("{} distinct acte ids, limit is {max_ids}", ids.len()),
        )
        .with_detail("limit", max_ids as u64)
        .with_hint("split the file or raise limits.max_ids"));
    }
    Ok(ids)
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn print_summary(result: &ReconciliationResult, skipped_rows: usize) {
    let by = &result.by_scheme;
    eprintln!(
        "{} acts checked: {} found, {} missing",
        result.total_submitted, result.total_found, result.total_missing,
    );
    eprintln!("  NGAP: {} found, {} missing", by.ngap.found, by.ngap.missing);
    eprintln!("  CCAM: {} found, {} missing", by.ccam.found, by.ccam.missing);
    for (reason, count) in result.reason_counts() {
        eprintln!("  {reason}: {count}");
    }
    if skipped_rows > 0 {
        eprintln!("  ({skipped_rows} incomplete rows skipped)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collecteur_recon::model::SubmittedRecord;

    fn batch(ids: &[&str]) -> SubmittedBatch {
        SubmittedBatch {
            rows: ids
                .iter()
                .map(|id| SubmittedRecord { acte_id: id.to_string(), ..Default::default() })
                .collect(),
            skipped_rows: 0,
        }
    }

    #[test]
    fn admit_rejects_empty_batch() {
        let err = admit(&SubmittedBatch::default(), 10).unwrap_err();
        assert_eq!(err.error_code, "NO_ROWS");
    }

    #[test]
    fn admit_rejects_blank_ids() {
        let err = admit(&batch(&["", ""]), 10).unwrap_err();
        assert_eq!(err.error_code, "NO_IDS");
    }

    #[test]
    fn admit_counts_distinct_ids_against_limit() {
        assert_eq!(admit(&batch(&["1", "2", "1"]), 2).unwrap().len(), 2);
        let err = admit(&batch(&["1", "2", "3"]), 2).unwrap_err();
        assert_eq!(err.error_code, "TOO_MANY_IDS");
        assert_eq!(err.detail, Some(("limit", 2)));
    }

    #[test]
    fn delimiter_override_validated() {
        let mut settings = Settings::default();
        apply_delimiter(&mut settings, Some(',')).unwrap();
        assert_eq!(settings.delimiter_byte(), b',');
        assert!(apply_delimiter(&mut settings, Some('x')).is_err());
    }
}
