use chrono::{DateTime, Utc};

use crate::NotificationId;

/// A single notification as delivered by the server, over REST or the
/// realtime stream. Wire field names are the backend's; unknown fields are
/// ignored so schema additions on the server side stay non-breaking.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "message", default)]
    pub body: String,
    #[serde(rename = "type", default)]
    pub kind: Category,
    #[serde(rename = "lu", default)]
    pub read: bool,
    #[serde(rename = "date_envoi", default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Display timestamp: the send date when the server provides one,
    /// falling back to the creation date.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.sent_at.or(self.created_at)
    }
}

/// Category tag. The set is open-ended on the server; anything we don't
/// recognize is informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum Category {
    #[serde(rename = "succes")]
    Success,
    #[serde(rename = "erreur")]
    Error,
    #[default]
    #[serde(rename = "info")]
    #[serde(other)]
    Info,
}

/// The list endpoint returns either a bare array or a paginated envelope.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum FeedResponse {
    Paginated { results: Vec<Notification> },
    Bare(Vec<Notification>),
}

impl FeedResponse {
    pub fn into_records(self) -> Vec<Notification> {
        match self {
            FeedResponse::Paginated { results } => results,
            FeedResponse::Bare(records) => records,
        }
    }
}

/// A realtime frame carries the record either directly or wrapped in a
/// `content` envelope, depending on the server-side publisher.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum PushFrame {
    Wrapped { content: Notification },
    Bare(Notification),
}

impl PushFrame {
    pub fn into_record(self) -> Notification {
        match self {
            PushFrame::Wrapped { content } => content,
            PushFrame::Bare(record) => record,
        }
    }
}
