use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use linkfolio_core::event::RecordCommand;

use crate::queries::format_ts;
use crate::schema::init_sql;

/// A DuckDB-backed event store.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. The connection sits behind `Arc<Mutex<_>>` so every
/// query is serialised while the struct can still be shared across axum
/// handlers.
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

    /// Open an **in-memory** DuckDB database. Data is discarded on drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persist a batch of record commands in a single transaction.
    ///
    /// Each row gets a fresh UUID v4. Returns immediately if `commands` is
    /// empty.
    pub async fn insert_commands(&self, commands: &[RecordCommand]) -> Result<()> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let mut views = 0usize;
        let mut clicks = 0usize;
        for command in commands {
            let id = uuid::Uuid::new_v4().to_string();
            match command {
                RecordCommand::View(view) => {
                    tx.execute(
                        r#"INSERT INTO profile_views (id, owner_id, occurred_at, referrer, user_agent)
                           VALUES (?1, ?2, CAST(?3 AS TIMESTAMP), ?4, ?5)"#,
                        duckdb::params![
                            id,
                            view.owner_id,
                            format_ts(view.occurred_at),
                            view.referrer,
                            view.user_agent,
                        ],
                    )?;
                    views += 1;
                }
                RecordCommand::Click(click) => {
                    tx.execute(
                        r#"INSERT INTO link_clicks (
                               id, owner_id, occurred_at, link_kind, link_id, link_label, referrer
                           ) VALUES (?1, ?2, CAST(?3 AS TIMESTAMP), ?4, ?5, ?6, ?7)"#,
                        duckdb::params![
                            id,
                            click.owner_id,
                            format_ts(click.occurred_at),
                            click.link_kind.as_str(),
                            click.link_id,
                            click.link_label,
                            click.referrer,
                        ],
                    )?;
                    clicks += 1;
                }
            }
        }

        tx.commit()?;
        tracing::info!(views, clicks, "Recorded events into DuckDB");
        Ok(())
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to seed or verify rows.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
