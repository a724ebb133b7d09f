// Act tables in SQLite

use std::path::Path;

use collecteur_recon::model::{CandidateRecord, Scheme};
use collecteur_recon::SpecialStatusLookup;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::IoError;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS oc_actengap (
    noacte TEXT NOT NULL,
    lettrecle TEXT,
    coefficient REAL,
    internum TEXT,
    dateexec TEXT               -- 'YYYY-MM-DD HH:MM[:SS]'
);

CREATE TABLE IF NOT EXISTS oc_acteccam (
    noacte TEXT NOT NULL,
    codeacte TEXT,
    activite TEXT,
    internum TEXT,
    dateexec TEXT
);

CREATE TABLE IF NOT EXISTS oc_intervention (
    internum TEXT PRIMARY KEY,
    nodossier TEXT,
    vennum TEXT
);

CREATE TABLE IF NOT EXISTS o_venue (
    vennum TEXT PRIMARY KEY,
    novenue TEXT
);

CREATE TABLE IF NOT EXISTS w_serveracte (
    cocode TEXT NOT NULL,
    nodossier TEXT,
    novenue TEXT
);

CREATE INDEX IF NOT EXISTS idx_actengap_noacte ON oc_actengap(noacte);
CREATE INDEX IF NOT EXISTS idx_acteccam_noacte ON oc_acteccam(noacte);
CREATE INDEX IF NOT EXISTS idx_serveracte_key ON w_serveracte(cocode, nodossier, novenue);
"#;

/// Administrative code marking a file as on hold.
pub const SPECIAL_STATUS_CODE: &str = "C9";

// Both selects return the CandidateRecord columns in declaration order.
const SELECT_NGAP: &str = "SELECT
        CAST(a.noacte AS TEXT),
        CAST(a.lettrecle AS TEXT),
        CAST(a.coefficient AS TEXT),
        CAST(a.internum AS TEXT),
        CAST(i.nodossier AS TEXT),
        CAST(v.vennum AS TEXT),
        CAST(v.novenue AS TEXT),
        strftime('%d/%m/%Y %H:%M', a.dateexec)
    FROM oc_actengap a
    LEFT JOIN oc_intervention i ON i.internum = a.internum
    LEFT JOIN o_venue v         ON v.vennum   = i.vennum
    WHERE a.noacte IN";

const SELECT_CCAM: &str = "SELECT
        CAST(a.noacte AS TEXT),
        CAST(a.codeacte AS TEXT),
        CAST(a.activite AS TEXT),
        CAST(a.internum AS TEXT),
        CAST(i.nodossier AS TEXT),
        CAST(v.vennum AS TEXT),
        CAST(v.novenue AS TEXT),
        strftime('%d/%m/%Y %H:%M', a.dateexec)
    FROM oc_acteccam a
    LEFT JOIN oc_intervention i ON i.internum = a.internum
    LEFT JOIN o_venue v         ON v.vennum   = i.vennum
    WHERE a.noacte IN";

/// Read access to the act tables. The caller owns the connection lifetime.
pub struct ActeRepository {
    conn: Connection,
}

impl ActeRepository {
    /// Open an existing database. A missing file is an error, not an empty database.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        if !path.exists() {
            return Err(IoError::Database {
                context: format!("open {}", path.display()),
                source: rusqlite::Error::InvalidPath(path.to_path_buf()),
            });
        }
        let conn = Connection::open(path).map_err(IoError::db(format!("open {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create (or reuse) `path` and make sure every table exists.
    pub fn create(path: &Path) -> Result<Self, IoError> {
        let conn = Connection::open(path).map_err(IoError::db(format!("open {}", path.display())))?;
        let repo = Self { conn };
        repo.create_schema()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn create_schema(&self) -> Result<(), IoError> {
        self.conn.execute_batch(SCHEMA).map_err(IoError::db("create schema"))
    }

    /// NGAP rows then CCAM rows for every id in `ids`.
    pub fn fetch_by_acte_ids(&self, ids: &[String]) -> Result<Vec<CandidateRecord>, IoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = self.select(SELECT_NGAP, ids, Scheme::Ngap)?;
        rows.extend(self.select(SELECT_CCAM, ids, Scheme::Ccam)?);
        Ok(rows)
    }

    /// Same as [`fetch_by_acte_ids`](Self::fetch_by_acte_ids), at most `chunk_size` ids per query.
    pub fn fetch_by_acte_ids_chunked(
        &self,
        ids: &[String],
        chunk_size: usize,
    ) -> Result<Vec<CandidateRecord>, IoError> {
        let chunk_size = chunk_size.max(1);
        let chunks = ids.len().div_ceil(chunk_size);
        let mut rows = Vec::new();

        for (n, chunk) in ids.chunks(chunk_size).enumerate() {
            let fetched = self.fetch_by_acte_ids(chunk)?;
            log::debug!(
                "chunk {}/{chunks}: {} ids -> {} candidate rows",
                n + 1,
                chunk.len(),
                fetched.len()
            );
            rows.extend(fetched);
        }

        Ok(rows)
    }

    pub fn has_special_status(&self, num_intervention: &str, num_venue: &str) -> Result<bool, IoError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM w_serveracte WHERE cocode = ?1 AND nodossier = ?2 AND novenue = ?3",
                params![SPECIAL_STATUS_CODE, num_intervention, num_venue],
                |row| row.get(0),
            )
            .optional()
            .map_err(IoError::db("special status lookup"))?;

        log::debug!(
            "special status {num_intervention}/{num_venue}: {}",
            if found.is_some() { "held" } else { "clear" }
        );
        Ok(found.is_some())
    }

    fn select(&self, head: &str, ids: &[String], scheme: Scheme) -> Result<Vec<CandidateRecord>, IoError> {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{head} ({placeholders})");
        let context = format!("fetch {scheme} acts");

        let mut stmt = self.conn.prepare(&sql).map_err(IoError::db(context.clone()))?;
        let iter = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                // NULL from a missing join or bad date becomes an empty string.
                let text = |i: usize| -> rusqlite::Result<String> {
                    Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
                };
                Ok(CandidateRecord {
                    acte_id: text(0)?,
                    code_acte: text(1)?,
                    activite_ou_coeff: text(2)?,
                    acte_internum: text(3)?,
                    num_intervention: text(4)?,
                    venue_number: text(5)?,
                    venue_alt_number: text(6)?,
                    date_acte: text(7)?,
                    scheme,
                })
            })
            .map_err(IoError::db(context.clone()))?;

        iter.collect::<Result<Vec<_>, _>>().map_err(IoError::db(context))
    }
}

impl SpecialStatusLookup for ActeRepository {
    type Error = IoError;

    fn has_special_status(&self, num_intervention: &str, num_venue: &str) -> Result<bool, IoError> {
        ActeRepository::has_special_status(self, num_intervention, num_venue)
    }
}
