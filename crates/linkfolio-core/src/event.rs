use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which list on the public page an outbound link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Social,
    Custom,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Social => "social",
            LinkKind::Custom => "custom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "social" => Some(LinkKind::Social),
            "custom" => Some(LinkKind::Custom),
            _ => None,
        }
    }
}

/// One load of an owner's public page. Stored rows mirror the `profile_views` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEvent {
    pub owner_id: String,
    pub occurred_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// One activation of an outbound link. Stored rows mirror the `link_clicks` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub owner_id: String,
    pub occurred_at: DateTime<Utc>,
    pub link_kind: LinkKind,
    pub link_id: Option<String>,
    pub link_label: String,
    pub referrer: Option<String>,
}

/// Common read access the aggregator needs from any event type.
pub trait Occurrence {
    fn occurred_at(&self) -> DateTime<Utc>;
}

impl Occurrence for ViewEvent {
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Occurrence for ClickEvent {
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Body of `POST /api/views`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewPayload {
    pub owner_id: String,
    pub referrer: Option<String>,
}

/// Body of `POST /api/clicks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClickPayload {
    pub owner_id: String,
    pub link_kind: LinkKind,
    pub link_id: Option<String>,
    pub link_label: String,
    pub referrer: Option<String>,
}

/// A request from the public page to persist one event.
///
/// The page never talks to storage directly: it raises a command and the
/// event store consumes it, assigning the row id on insert.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordCommand {
    View(ViewEvent),
    Click(ClickEvent),
}
