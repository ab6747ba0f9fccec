use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use linkfolio_core::event::ViewEvent;
use linkfolio_core::store::EventOrder;

use super::{format_ts, parse_ts};
use crate::DuckDbBackend;

/// Owner filter plus the optional inclusive lower bound on `occurred_at`.
fn owner_window(
    owner_id: &str,
    since: Option<DateTime<Utc>>,
) -> (String, Vec<Box<dyn duckdb::types::ToSql>>) {
    let mut filter_sql = String::from("owner_id = ?1 AND occurred_at IS NOT NULL");
    let mut params: Vec<Box<dyn duckdb::types::ToSql>> = vec![Box::new(owner_id.to_string())];
    if let Some(since) = since {
        filter_sql.push_str(" AND occurred_at >= CAST(?2 AS TIMESTAMP)");
        params.push(Box::new(format_ts(since)));
    }
    (filter_sql, params)
}

impl DuckDbBackend {
    pub async fn count_views(&self, owner_id: &str, since: Option<DateTime<Utc>>) -> Result<u64> {
        let conn = self.conn.lock().await;

        let (filter_sql, params) = owner_window(owner_id, since);
        let sql = format!("SELECT COUNT(*) FROM profile_views WHERE {filter_sql}");
        let param_refs: Vec<&dyn duckdb::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn
            .prepare(&sql)?
            .query_row(param_refs.as_slice(), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// View rows for `owner_id`. Rows whose timestamp cannot be read are
    /// skipped with a warning.
    pub async fn view_events(
        &self,
        owner_id: &str,
        since: Option<DateTime<Utc>>,
        order: EventOrder,
    ) -> Result<Vec<ViewEvent>> {
        let conn = self.conn.lock().await;

        let (filter_sql, params) = owner_window(owner_id, since);
        let direction = match order {
            EventOrder::OccurredAtAsc => "ASC",
            EventOrder::OccurredAtDesc => "DESC",
        };
        let sql = format!(
            r#"
            SELECT id, owner_id, CAST(occurred_at AS VARCHAR), referrer, user_agent
            FROM profile_views
            WHERE {filter_sql}
            ORDER BY occurred_at {direction}, id
            "#
        );

        let param_refs: Vec<&dyn duckdb::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, owner_id, occurred_at, referrer, user_agent) = row?;
            let Some(occurred_at) = occurred_at.as_deref().and_then(parse_ts) else {
                warn!(id = %id, raw = ?occurred_at, "Skipping profile view with unreadable timestamp");
                continue;
            };
            events.push(ViewEvent {
                owner_id,
                occurred_at,
                referrer,
                user_agent,
            });
        }
        Ok(events)
    }
}
