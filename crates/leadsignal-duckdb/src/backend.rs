use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use crate::schema::init_sql;

/// Generate `prefix_` followed by `len` random lowercase alphanumerics.
pub(crate) fn generate_id(prefix: &str, len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..36u8);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect();
    format!("{prefix}_{suffix}")
}

/// Convert a decode failure into the error DuckDB row mappers return.
pub(crate) fn conversion_error(
    column: usize,
    err: impl std::fmt::Display,
) -> duckdb::Error {
    duckdb::Error::FromSqlConversionFailure(
        column,
        duckdb::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        )),
    )
}

/// The DuckDB store behind the evaluator, the dashboard and the ingestion
/// endpoints.
///
/// DuckDB is single-writer, so the connection is wrapped in
/// `Arc<Mutex<_>>`: every query takes the lock, and the struct can still be
/// shared across Axum handlers and the scheduler.
///
/// The memory limit is configurable via `LEADSIGNAL_DUCKDB_MEMORY`
/// (default `"1GB"`) and applied by [`init_sql`] at open time.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only: data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute `SELECT 1` as a lightweight liveness check for `/health`.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that seed raw feed rows or verify
    /// stored data. Production code should use the typed methods.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_prefix_and_length() {
        let id = generate_id("trg", 21);
        assert!(id.starts_with("trg_"));
        assert_eq!(id.len(), 25);
        assert!(id[4..]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn in_memory_database_answers_ping() {
        let db = DuckDbBackend::open_in_memory().expect("open");
        db.ping().await.expect("ping");
    }
}
