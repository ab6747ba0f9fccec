use anyhow::Result;
use tracing::warn;

use linkfolio_core::event::{ClickEvent, LinkKind};

use super::parse_ts;
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// All click rows for `owner_id`, oldest first.
    ///
    /// Rows with an unreadable timestamp or an unknown `link_kind` are
    /// skipped with a warning.
    pub async fn click_events(&self, owner_id: &str) -> Result<Vec<ClickEvent>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, owner_id, CAST(occurred_at AS VARCHAR), link_kind, link_id, link_label, referrer
            FROM link_clicks
            WHERE owner_id = ?1
            ORDER BY occurred_at ASC NULLS LAST, id
            "#,
        )?;
        let rows = stmt.query_map(duckdb::params![owner_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, owner_id, occurred_at, link_kind, link_id, link_label, referrer) = row?;
            let Some(occurred_at) = occurred_at.as_deref().and_then(parse_ts) else {
                warn!(id = %id, raw = ?occurred_at, "Skipping link click with unreadable timestamp");
                continue;
            };
            let Some(link_kind) = LinkKind::parse(&link_kind) else {
                warn!(id = %id, link_kind = %link_kind, "Skipping link click with unknown link kind");
                continue;
            };
            events.push(ClickEvent {
                owner_id,
                occurred_at,
                link_kind,
                link_id,
                link_label,
                referrer,
            });
        }
        Ok(events)
    }
}
