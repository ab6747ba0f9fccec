use async_trait::async_trait;
use chrono::{DateTime, Utc};

use linkfolio_core::event::{ClickEvent, RecordCommand, ViewEvent};
use linkfolio_core::store::{EventOrder, EventStore};

use crate::DuckDbBackend;

#[async_trait]
impl EventStore for DuckDbBackend {
    async fn record(&self, commands: &[RecordCommand]) -> anyhow::Result<()> {
        self.insert_commands(commands).await
    }

    async fn fetch_count(
        &self,
        owner_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64> {
        self.count_views(owner_id, since).await
    }

    async fn fetch_events(
        &self,
        owner_id: &str,
        since: Option<DateTime<Utc>>,
        order: EventOrder,
    ) -> anyhow::Result<Vec<ViewEvent>> {
        self.view_events(owner_id, since, order).await
    }

    async fn fetch_click_events(&self, owner_id: &str) -> anyhow::Result<Vec<ClickEvent>> {
        self.click_events(owner_id).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbBackend::ping(self).await
    }
}
