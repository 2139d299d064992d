//! SQLite-backed record store.
//!
//! Reads checked-out items from the purchasing checkout table joined with
//! the users table for each sorter's phone number.

use crate::error::{RowDecodeError, ScanError};
use crate::models::OverdueRow;
use crate::store::{FetchedRows, RecordSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::PathBuf;
use tracing::{debug, info};

/// Timestamp format bound into the query; understood by `julianday()`.
const AS_OF_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Record source over a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    database: PathBuf,
    checkout_table: String,
    users_table: String,
    as_of: DateTime<Utc>,
}

impl SqliteSource {
    pub fn new(
        database: impl Into<PathBuf>,
        checkout_table: impl Into<String>,
        users_table: impl Into<String>,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            database: database.into(),
            checkout_table: checkout_table.into(),
            users_table: users_table.into(),
            as_of,
        }
    }

    /// Build the overdue query for the configured tables.
    fn query(&self) -> Result<String, ScanError> {
        for table in [&self.checkout_table, &self.users_table] {
            if !is_identifier(table) {
                return Err(ScanError::Fatal(format!("invalid table name: {:?}", table)));
            }
        }

        Ok(format!(
            "SELECT u.phone, s.sku, s.sorter, \
                    CAST(julianday(?1) - julianday(s.checkout) AS INTEGER) AS days_since_checkout \
             FROM {checkout} s \
             LEFT JOIN {users} u ON s.sorter = u.username \
             WHERE s.checkin IS NULL \
               AND CAST(julianday(?1) - julianday(s.checkout) AS INTEGER) > 0 \
               AND u.phone IS NOT NULL AND u.phone <> ''",
            checkout = self.checkout_table,
            users = self.users_table,
        ))
    }

    /// Blocking fetch. The statement and its cursor are dropped on return.
    fn fetch_blocking(&self) -> Result<FetchedRows, ScanError> {
        let sql = self.query()?;
        debug!("Executing query: {}", sql);

        let conn = Connection::open_with_flags(
            &self.database,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| fatal(format!("open {}", self.database.display()), e))?;

        let mut stmt = conn.prepare(&sql).map_err(|e| fatal("prepare", e))?;
        let as_of = self.as_of.format(AS_OF_FORMAT).to_string();
        let mut rows = stmt.query(params![as_of]).map_err(|e| fatal("query", e))?;

        let mut fetched = Vec::new();
        while let Some(row) = rows.next().map_err(|e| fatal("iterate", e))? {
            fetched.push(decode_row(row, fetched.len()));
        }

        info!(
            "Fetched {} rows from {}",
            fetched.len(),
            self.database.display()
        );
        Ok(fetched)
    }
}

#[async_trait]
impl RecordSource for SqliteSource {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch_rows(&self) -> Result<FetchedRows, ScanError> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.fetch_blocking())
            .await
            .map_err(|e| ScanError::Fatal(format!("query task failed: {}", e)))?
    }
}

fn fatal(stage: impl AsRef<str>, e: rusqlite::Error) -> ScanError {
    ScanError::Fatal(format!("{}: {}", stage.as_ref(), e))
}

fn decode_row(row: &Row<'_>, index: usize) -> Result<OverdueRow, RowDecodeError> {
    let field = |name: &str, e: rusqlite::Error| RowDecodeError {
        index,
        reason: format!("{}: {}", name, e),
    };

    Ok(OverdueRow {
        phone: row.get(0).map_err(|e| field("phone", e))?,
        item_id: row.get(1).map_err(|e| field("sku", e))?,
        party_id: row.get(2).map_err(|e| field("sorter", e))?,
        days_elapsed: row.get(3).map_err(|e| field("days_since_checkout", e))?,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;
    use tempfile::TempDir;

    const SCHEMA: &str = "
        CREATE TABLE users (username TEXT PRIMARY KEY, phone);
        CREATE TABLE sortrequest (sku, sorter TEXT, checkout TEXT, checkin TEXT);
    ";

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn create_db(dir: &TempDir, setup: &str) -> PathBuf {
        let path = dir.path().join("purchasing.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(setup).unwrap();
        path
    }

    fn source(path: &Path) -> SqliteSource {
        SqliteSource::new(path, "sortrequest", "users", as_of())
    }

    fn decoded(rows: FetchedRows) -> Vec<OverdueRow> {
        let mut rows: Vec<OverdueRow> = rows.into_iter().map(|r| r.unwrap()).collect();
        rows.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        rows
    }

    #[tokio::test]
    async fn test_fetches_checked_out_items() {
        let dir = TempDir::new().unwrap();
        let path = create_db(
            &dir,
            "
            INSERT INTO users VALUES ('alice', '+15550001'), ('bob', '+15550002');
            INSERT INTO sortrequest VALUES
                ('A', 'alice', '2026-10-11 09:00:00', NULL),
                ('B', 'alice', '2026-10-08 09:00:00', NULL),
                ('C', 'bob',   '2026-10-15 09:00:00', NULL),
                ('D', 'bob',   '2026-10-01 09:00:00', '2026-10-05 09:00:00');
            ",
        );

        let rows = decoded(source(&path).fetch_rows().await.unwrap());
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            OverdueRow {
                phone: "+15550001".to_string(),
                item_id: "A".to_string(),
                party_id: "alice".to_string(),
                days_elapsed: 6,
            }
        );
        assert_eq!(rows[1].days_elapsed, 9);
        assert_eq!(rows[2].item_id, "C");
        assert_eq!(rows[2].days_elapsed, 2);
    }

    #[tokio::test]
    async fn test_excludes_missing_phone_and_future_checkout() {
        let dir = TempDir::new().unwrap();
        let path = create_db(
            &dir,
            "
            INSERT INTO users VALUES ('carol', NULL), ('dave', ''), ('erin', '+15550005');
            INSERT INTO sortrequest VALUES
                ('A', 'carol',   '2026-10-01 09:00:00', NULL),
                ('B', 'dave',    '2026-10-01 09:00:00', NULL),
                ('C', 'nobody',  '2026-10-01 09:00:00', NULL),
                ('D', 'erin',    '2026-10-17 09:00:00', NULL);
            ",
        );

        let rows = source(&path).fetch_rows().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_row_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = create_db(
            &dir,
            "
            INSERT INTO users VALUES ('alice', '+15550001');
            INSERT INTO sortrequest VALUES
                ('A',  'alice', '2026-10-11 09:00:00', NULL),
                (NULL, 'alice', '2026-10-10 09:00:00', NULL);
            ",
        );

        let rows = source(&path).fetch_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        let failures: Vec<_> = rows.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].reason.starts_with("sku"));
    }

    #[tokio::test]
    async fn test_missing_database_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.db");

        let err = source(&missing).fetch_rows().await.unwrap_err();
        assert!(matches!(err, ScanError::Fatal(_)));
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = create_db(&dir, "");
        let source = SqliteSource::new(&path, "checkouts", "users", as_of());

        let err = tokio_test::block_on(source.fetch_rows()).unwrap_err();
        assert!(err.to_string().contains("prepare"));
    }

    #[test]
    fn test_rejects_unsafe_table_names() {
        let source = SqliteSource::new("x.db", "sortrequest; DROP TABLE users", "users", as_of());
        assert!(source.query().is_err());
        assert!(is_identifier("sort_request2"));
        assert!(!is_identifier("2sort"));
        assert!(!is_identifier(""));
    }
}
