//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::analyzer::{HeadingCounts, HtmlVersion};
use crate::state::CheckStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{AnalysisRecord, CheckUpdate, QueuedRecord, RecordPage, UnreachableLink};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const RECORD_COLUMNS: &str = "id, url, check_status, post_time, check_time, title, html_version, \
     h1, h2, h3, h4, h5, h6, internal_links, external_links, inaccessible_links, login_form_detected";

/// SQLite storage backend
///
/// The connection sits behind a mutex held only for the duration of one
/// method, so the dispatcher and request handlers can share a single handle.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database, used by tests and `--dry-run`
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, format!("bad timestamp '{}': {}", value, e)))
}

/// Maps a row selected with `RECORD_COLUMNS`; details are loaded separately
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let status_text: String = row.get(2)?;
    let status = CheckStatus::from_db_string(&status_text)
        .ok_or_else(|| conversion_error(2, format!("unknown status '{}'", status_text)))?;

    let submitted_at = parse_timestamp(3, &row.get::<_, String>(3)?)?;
    let checked_at = match row.get::<_, Option<String>>(4)? {
        Some(text) => Some(parse_timestamp(4, &text)?),
        None => None,
    };

    let html_version = match row.get::<_, Option<String>>(6)? {
        Some(text) => Some(
            HtmlVersion::from_db_string(&text)
                .ok_or_else(|| conversion_error(6, format!("unknown HTML version '{}'", text)))?,
        ),
        None => None,
    };

    let mut headings = [0u32; 6];
    for (offset, count) in headings.iter_mut().enumerate() {
        *count = row.get(7 + offset)?;
    }

    Ok(AnalysisRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status,
        submitted_at,
        checked_at,
        title: row.get(5)?,
        html_version,
        headings: HeadingCounts::from_counts(headings),
        internal_link_count: row.get(13)?,
        external_link_count: row.get(14)?,
        unreachable_link_count: row.get(15)?,
        has_login_form: row.get(16)?,
        unreachable_links: Vec::new(),
    })
}

fn load_unreachable_links(conn: &Connection, id: i64) -> rusqlite::Result<Vec<UnreachableLink>> {
    let mut stmt = conn.prepare_cached(
        "SELECT url, status_code FROM inaccessible_links WHERE result_id = ?1 ORDER BY id",
    )?;
    let links = stmt
        .query_map(params![id], |row| {
            Ok(UnreachableLink {
                url: row.get(0)?,
                status_code: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(links)
}

fn load_record(conn: &Connection, id: i64) -> StorageResult<AnalysisRecord> {
    let sql = format!("SELECT {} FROM results WHERE id = ?1", RECORD_COLUMNS);
    let mut record = conn
        .query_row(&sql, params![id], record_from_row)
        .optional()?
        .ok_or(StorageError::NotFound(id))?;
    record.unreachable_links = load_unreachable_links(conn, id)?;
    Ok(record)
}

/// The single write path: row fields plus a full replacement of detail rows
///
/// Must run inside a transaction so readers never see a count that disagrees
/// with the detail rows. With `claimed_only` the row is written only while the
/// dispatcher's claim is still on it.
fn write_update(
    conn: &Connection,
    id: i64,
    update: &CheckUpdate,
    in_flight: bool,
    claimed_only: bool,
) -> StorageResult<()> {
    let headings = update.headings.as_array();
    let affected = conn.execute(
        "UPDATE results SET
            url = ?1, check_status = ?2, in_flight = ?3, check_time = ?4, title = ?5,
            html_version = ?6, h1 = ?7, h2 = ?8, h3 = ?9, h4 = ?10, h5 = ?11, h6 = ?12,
            internal_links = ?13, external_links = ?14, inaccessible_links = ?15,
            login_form_detected = ?16
         WHERE id = ?17 AND (?18 = 0 OR in_flight = 1)",
        params![
            update.url,
            update.status.to_db_string(),
            in_flight,
            update.checked_at.map(|t| t.to_rfc3339()),
            update.title,
            update.html_version.map(|v| v.as_str()),
            headings[0],
            headings[1],
            headings[2],
            headings[3],
            headings[4],
            headings[5],
            update.internal_links,
            update.external_links,
            update.unreachable_count(),
            update.has_login_form,
            id,
            claimed_only,
        ],
    )?;

    if affected == 0 {
        let exists = conn
            .query_row("SELECT 1 FROM results WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some();
        return Err(if exists && claimed_only {
            StorageError::NotClaimed(id)
        } else {
            StorageError::NotFound(id)
        });
    }

    conn.execute(
        "DELETE FROM inaccessible_links WHERE result_id = ?1",
        params![id],
    )?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO inaccessible_links (result_id, url, status_code) VALUES (?1, ?2, ?3)",
    )?;
    for link in &update.unreachable_links {
        stmt.execute(params![id, link.url, link.status_code])?;
    }

    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Submission =====

    fn submit_urls(&self, urls: &[String]) -> StorageResult<Vec<i64>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let mut ids = Vec::with_capacity(urls.len());
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO results (url, check_status, post_time) VALUES (?1, ?2, ?3)",
            )?;
            for url in urls {
                stmt.execute(params![url, CheckStatus::Created.to_db_string(), now])?;
                ids.push(tx.last_insert_rowid());
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    // ===== Work Queue =====

    fn next_eligible(&self) -> StorageResult<Option<QueuedRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT id, url FROM results
                 WHERE check_status = ?1 OR (check_status = ?2 AND in_flight = 0)
                 ORDER BY id ASC LIMIT 1",
                params![
                    CheckStatus::Created.to_db_string(),
                    CheckStatus::Pending.to_db_string()
                ],
                |row| {
                    Ok(QueuedRecord {
                        id: row.get(0)?,
                        url: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn claim_record(&self, id: i64, url: &str) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_update(&tx, id, &CheckUpdate::pending(url), true, false)?;
        tx.commit()?;
        Ok(())
    }

    fn commit_check(&self, id: i64, update: &CheckUpdate) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        write_update(&tx, id, update, false, true)?;
        tx.commit()?;
        Ok(())
    }

    fn requeue_stranded(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count = conn.execute(
            "UPDATE results SET in_flight = 0 WHERE check_status = ?1 AND in_flight = 1",
            params![CheckStatus::Pending.to_db_string()],
        )?;
        Ok(count)
    }

    // ===== Façade Queries =====

    fn set_status(&self, id: i64, status: CheckStatus) -> StorageResult<()> {
        if !status.is_manual_target() {
            return Err(StorageError::InvalidStatus(status));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let record = load_record(&tx, id)?;
        write_update(&tx, id, &record.with_status(status), false, false)?;
        tx.commit()?;
        Ok(())
    }

    fn get_record(&self, id: i64) -> StorageResult<AnalysisRecord> {
        let conn = self.lock()?;
        load_record(&conn, id)
    }

    fn list_records(&self, page_size: u32, page: u32) -> StorageResult<RecordPage> {
        if page_size == 0 || page == 0 {
            return Err(StorageError::InvalidPagination { page_size, page });
        }

        let conn = self.lock()?;
        let total_count: i64 = conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;

        let offset = i64::from(page - 1) * i64::from(page_size);
        let sql = format!(
            "SELECT {} FROM results ORDER BY id ASC LIMIT ?1 OFFSET ?2",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut records = stmt
            .query_map(params![page_size, offset], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for record in records.iter_mut().filter(|r| r.unreachable_link_count > 0) {
            record.unreachable_links = load_unreachable_links(&conn, record.id)?;
        }

        Ok(RecordPage {
            records,
            total_count: total_count as u64,
        })
    }

    fn delete_record(&self, id: i64) -> StorageResult<()> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM results WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    // ===== Statistics =====

    fn count_by_status(&self) -> StorageResult<HashMap<CheckStatus, u64>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT check_status, COUNT(*) FROM results GROUP BY check_status")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (status, count) = row?;
            if let Some(status) = CheckStatus::from_db_string(&status) {
                counts.insert(status, count as u64);
            }
        }

        Ok(counts)
    }
}
