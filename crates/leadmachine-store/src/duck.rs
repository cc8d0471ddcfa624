//! DuckDB lead store.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use duckdb::{Connection, Row, ToSql, params};
use leadmachine_core::placeholder::{PLACEHOLDER_MARKER, UNKNOWN_FIRST_NAME};
use leadmachine_core::{LeadRecord, LeadSource, NewLead};
use tracing::{debug, info};

use crate::{LeadStore, StoreError};

const SCHEMA_SQL: &str = "
    CREATE SEQUENCE IF NOT EXISTS leads_id_seq START 1;
    CREATE TABLE IF NOT EXISTS leads (
        id                     BIGINT PRIMARY KEY DEFAULT nextval('leads_id_seq'),
        first_name             VARCHAR NOT NULL,
        last_name              VARCHAR NOT NULL,
        phone                  VARCHAR,
        source                 VARCHAR NOT NULL,
        source_conversation_id VARCHAR UNIQUE,
        issue_description      VARCHAR,
        created_at             TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
        updated_at             TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
    );
";

const LEAD_COLUMNS: &str =
    "id, first_name, last_name, phone, source, source_conversation_id, issue_description";

/// DuckDB store for lead records.
///
/// One `leads` table keyed by a sequence-backed `id`, with a UNIQUE
/// `source_conversation_id` so repeated deliveries of a conversation cannot
/// produce a second row even if the caller skips the lookup.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// The schema is created on open if missing.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_schema(conn)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self::with_schema(conn)?;
        info!(path = %path.display(), leads = store.lead_count()?, "opened lead store");
        Ok(store)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    // ── Counts ──

    /// Number of rows in the `leads` table.
    pub fn lead_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*)::BIGINT FROM leads", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ── Display path ──

    /// Most recent leads as Arrow batches, newest first.
    pub fn leads_arrow(&self, limit: usize) -> Result<Vec<RecordBatch>, StoreError> {
        let sql = format!(
            "SELECT id, first_name, last_name, phone, source, source_conversation_id, created_at
             FROM leads ORDER BY id DESC LIMIT {limit}"
        );
        self.query_arrow(&sql)
    }

    /// A single lead with every column, for card display.
    pub fn lead_arrow(&self, id: i64) -> Result<RecordBatch, StoreError> {
        let mut stmt = self.conn.prepare("SELECT * FROM leads WHERE id = ?")?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([id])?.collect();
        let batch = batches.into_iter().next().ok_or(StoreError::NoResults)?;
        if batch.num_rows() == 0 {
            return Err(StoreError::NoResults);
        }
        Ok(batch)
    }

    // ── Escape hatch ──

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }

    fn query_leads(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<LeadRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawLead::from_row)?;
        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?.into_record()?);
        }
        Ok(leads)
    }
}

/// Row as read from DuckDB, before the source column is parsed.
struct RawLead {
    id: i64,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    source: String,
    source_conversation_id: Option<String>,
    issue_description: Option<String>,
}

impl RawLead {
    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone: row.get(3)?,
            source: row.get(4)?,
            source_conversation_id: row.get(5)?,
            issue_description: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<LeadRecord, StoreError> {
        let source: LeadSource = self
            .source
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("lead {}: {e}", self.id)))?;
        Ok(LeadRecord {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            source,
            source_conversation_id: self.source_conversation_id,
            issue_description: self.issue_description,
        })
    }
}

impl LeadStore for DuckStore {
    fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Option<LeadRecord>, StoreError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE source_conversation_id = ?");
        Ok(self.query_leads(&sql, &[&conversation_id])?.into_iter().next())
    }

    fn get_lead(&self, id: i64) -> Result<Option<LeadRecord>, StoreError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?");
        Ok(self.query_leads(&sql, &[&id])?.into_iter().next())
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<i64, StoreError> {
        let id: i64 = self.conn.query_row(
            "INSERT INTO leads (
                first_name, last_name, phone, source, source_conversation_id, issue_description
            ) VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id",
            params![
                lead.first_name,
                lead.last_name,
                lead.phone,
                lead.source.as_str(),
                lead.source_conversation_id,
                lead.issue_description
            ],
            |row| row.get(0),
        )?;
        debug!(id, source = %lead.source, "inserted lead");
        Ok(id)
    }

    fn update_name(&self, id: i64, first_name: &str, last_name: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE leads SET first_name = ?, last_name = ?, updated_at = current_timestamp
             WHERE id = ?",
            params![first_name, last_name, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn placeholder_candidates(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads
             WHERE first_name = ? AND last_name LIKE ? AND source = ?
             ORDER BY id"
        );
        let marker = format!("%{PLACEHOLDER_MARKER}%");
        self.query_leads(
            &sql,
            &[
                &UNKNOWN_FIRST_NAME,
                &marker,
                &LeadSource::IncomingCall.as_str(),
            ],
        )
    }
}
