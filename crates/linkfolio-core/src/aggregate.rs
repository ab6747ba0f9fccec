//! In-memory aggregation of view and click events into dashboard summaries.
//!
//! Every function here is pure: it reads a snapshot that the caller already
//! fetched (and filtered by owner / time range) and returns fresh values.
//! Empty input always yields zero or an empty sequence.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::event::{ClickEvent, Occurrence, ViewEvent};
use crate::referrer::referrer_label;

/// Length of the ranked lists shown on the dashboard.
pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucketCount {
    /// Calendar day, `YYYY-MM-DD`, in the report time zone.
    pub bucket_label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub label: String,
    pub count: u64,
}

pub fn total_count<E>(events: &[E]) -> u64 {
    events.len() as u64
}

/// Count events with `occurred_at >= cutoff`. The bound is inclusive.
pub fn count_since<E: Occurrence>(events: &[E], cutoff: DateTime<Utc>) -> u64 {
    events
        .iter()
        .filter(|e| e.occurred_at() >= cutoff)
        .count() as u64
}

/// Start of a rolling window of `days` days ending at `now`.
pub fn window_cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Per-day event counts, ascending by day.
///
/// Holds only the days that had at least one event. Labels are rendered
/// while iterating, and [`DayBuckets::iter`] can be called any number of
/// times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayBuckets {
    days: BTreeMap<NaiveDate, u64>,
}

impl DayBuckets {
    pub fn iter(&self) -> impl Iterator<Item = TimeBucketCount> + '_ {
        self.days.iter().map(|(day, count)| TimeBucketCount {
            bucket_label: day.format("%Y-%m-%d").to_string(),
            count: *count,
        })
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn to_vec(&self) -> Vec<TimeBucketCount> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a DayBuckets {
    type Item = TimeBucketCount;
    type IntoIter = Box<dyn Iterator<Item = TimeBucketCount> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Group events by the calendar day they fell on in `tz`.
///
/// Input order does not matter. Days without events are not emitted.
pub fn bucket_by_day<E: Occurrence>(events: &[E], tz: Tz) -> DayBuckets {
    let mut days = BTreeMap::new();
    for event in events {
        let day = event.occurred_at().with_timezone(&tz).date_naive();
        *days.entry(day).or_insert(0u64) += 1;
    }
    DayBuckets { days }
}

/// Rank the `n` most frequent keys produced by `key_fn`.
///
/// Sorted by count descending; equal counts keep the order in which their
/// key was first seen in `events`.
pub fn top_n<E, F>(events: &[E], key_fn: F, n: usize) -> Vec<RankedEntity>
where
    F: Fn(&E) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RankedEntity> = Vec::new();

    for event in events {
        let key = key_fn(event);
        match index.get(&key) {
            Some(&i) => groups[i].count += 1,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(RankedEntity {
                    label: key,
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable, which preserves first-seen order on ties.
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(n);
    groups
}

pub fn by_link_label(click: &ClickEvent) -> String {
    click.link_label.clone()
}

/// Raw referrer string, or `"Directo"` when there is none.
pub fn by_referrer(view: &ViewEvent) -> String {
    referrer_label(view.referrer.as_deref())
}
