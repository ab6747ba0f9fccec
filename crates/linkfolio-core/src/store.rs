//! Event store abstraction.

use chrono::{DateTime, Utc};

use crate::event::{ClickEvent, RecordCommand, ViewEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    #[default]
    OccurredAtAsc,
    OccurredAtDesc,
}

/// Append-only persistence of view and click events.
///
/// Every query is scoped to one owner. `since` is an inclusive lower bound
/// on `occurred_at`; `None` means all time.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Persist a batch of record commands.
    async fn record(&self, commands: &[RecordCommand]) -> anyhow::Result<()>;

    /// Number of view events for `owner_id`.
    async fn fetch_count(
        &self,
        owner_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<u64>;

    async fn fetch_events(
        &self,
        owner_id: &str,
        since: Option<DateTime<Utc>>,
        order: EventOrder,
    ) -> anyhow::Result<Vec<ViewEvent>>;

    async fn fetch_view_events(
        &self,
        owner_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<ViewEvent>> {
        self.fetch_events(owner_id, since, EventOrder::OccurredAtAsc)
            .await
    }

    async fn fetch_click_events(&self, owner_id: &str) -> anyhow::Result<Vec<ClickEvent>>;

    /// Cheap liveness check.
    async fn ping(&self) -> anyhow::Result<()>;
}
