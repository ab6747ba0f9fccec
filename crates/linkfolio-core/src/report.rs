//! Dashboard report assembly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    bucket_by_day, by_link_label, by_referrer, top_n, window_cutoff, RankedEntity,
    TimeBucketCount, DEFAULT_TOP_N,
};
use crate::error::CoreError;
use crate::session::Session;
use crate::store::EventStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    TotalViews,
    ViewsLast7Days,
    ViewsLast30Days,
    ViewsOverTime,
    TopLinks,
    TopReferrers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub total_views: u64,
    pub views_last_7_days: u64,
    pub views_last_30_days: u64,
    /// Daily views over the last 30 days.
    pub views_over_time: Vec<TimeBucketCount>,
    pub top_links: Vec<RankedEntity>,
    pub top_referrers: Vec<RankedEntity>,
    pub timezone: String,
    /// Sections whose fetch failed and were filled with defaults.
    pub unavailable: Vec<ReportSection>,
}

impl AnalyticsReport {
    /// True when there is nothing to chart yet.
    pub fn is_empty(&self) -> bool {
        self.total_views == 0 && self.views_over_time.is_empty() && self.top_links.is_empty()
    }
}

/// Builds the owner's analytics report from an [`EventStore`].
pub struct Dashboard {
    store: Arc<dyn EventStore>,
    session: Session,
}

impl Dashboard {
    pub fn new(store: Arc<dyn EventStore>, session: Session) -> Self {
        Self { store, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch and aggregate everything the dashboard shows.
    ///
    /// The fetches run concurrently and are combined once all of them have
    /// returned. A failed fetch does not fail the report: its section falls
    /// back to zero / empty and is listed in `unavailable`.
    pub async fn load(&self, now: DateTime<Utc>, tz: Tz) -> Result<AnalyticsReport, CoreError> {
        self.session.ensure_active(now)?;

        let owner_id = self.session.owner_id.as_str();
        let last_7 = window_cutoff(now, 7);
        let last_30 = window_cutoff(now, 30);

        let (total, week, month, recent_views, all_views, clicks) = tokio::join!(
            self.store.fetch_count(owner_id, None),
            self.store.fetch_count(owner_id, Some(last_7)),
            self.store.fetch_count(owner_id, Some(last_30)),
            self.store.fetch_view_events(owner_id, Some(last_30)),
            self.store.fetch_view_events(owner_id, None),
            self.store.fetch_click_events(owner_id),
        );

        let mut unavailable = Vec::new();

        let total_views =
            settle(owner_id, ReportSection::TotalViews, total, &mut unavailable).unwrap_or(0);
        let views_last_7_days =
            settle(owner_id, ReportSection::ViewsLast7Days, week, &mut unavailable).unwrap_or(0);
        let views_last_30_days =
            settle(owner_id, ReportSection::ViewsLast30Days, month, &mut unavailable)
                .unwrap_or(0);

        let views_over_time = settle(
            owner_id,
            ReportSection::ViewsOverTime,
            recent_views,
            &mut unavailable,
        )
        .map(|views| bucket_by_day(&views, tz).to_vec())
        .unwrap_or_default();
        let top_referrers = settle(
            owner_id,
            ReportSection::TopReferrers,
            all_views,
            &mut unavailable,
        )
        .map(|views| top_n(&views, by_referrer, DEFAULT_TOP_N))
        .unwrap_or_default();
        let top_links = settle(owner_id, ReportSection::TopLinks, clicks, &mut unavailable)
            .map(|clicks| top_n(&clicks, by_link_label, DEFAULT_TOP_N))
            .unwrap_or_default();

        tracing::debug!(
            owner_id,
            total_views,
            unavailable = unavailable.len(),
            "Analytics report assembled"
        );

        Ok(AnalyticsReport {
            total_views,
            views_last_7_days,
            views_last_30_days,
            views_over_time,
            top_links,
            top_referrers,
            timezone: tz.name().to_string(),
            unavailable,
        })
    }
}

fn settle<T>(
    owner_id: &str,
    section: ReportSection,
    result: anyhow::Result<T>,
    unavailable: &mut Vec<ReportSection>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let failure = CoreError::FetchFailure(format!("{e:#}"));
            tracing::warn!(owner_id, ?section, error = %failure, "Report section unavailable");
            unavailable.push(section);
            None
        }
    }
}
