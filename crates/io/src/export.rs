// Missing-acts CSV export

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use collecteur_recon::model::MissingAct;

use crate::error::IoError;

pub const EXPORT_HEADER: [&str; 3] = ["acte_id", "type_acte", "raison_discordance"];

/// `Actes_Manquants_YYYYMMDD_HHMM.csv`
pub fn export_file_name(at: NaiveDateTime) -> String {
    format!("Actes_Manquants_{}.csv", at.format("%Y%m%d_%H%M"))
}

/// Write `missing` as `;`-separated CSV. When `dest` is a directory the file is
/// created inside it under [`export_file_name`]. Returns the path written.
pub fn write_missing_csv(missing: &[MissingAct], dest: &Path, at: NaiveDateTime) -> Result<PathBuf, IoError> {
    let path = if dest.is_dir() {
        dest.join(export_file_name(at))
    } else {
        dest.to_path_buf()
    };

    let export_err = |source: csv::Error| IoError::Export {
        path: path.clone(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(&path)
        .map_err(export_err)?;

    writer.write_record(EXPORT_HEADER).map_err(export_err)?;
    for act in missing {
        writer
            .write_record([act.id.as_str(), act.scheme.as_str(), act.reason.as_str()])
            .map_err(export_err)?;
    }
    writer.flush().map_err(|source| IoError::Write {
        path: path.clone(),
        source,
    })?;

    log::info!("exported {} missing acts to {}", missing.len(), path.display());
    Ok(path)
}
