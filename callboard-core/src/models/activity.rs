use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::call::Call;
use super::message::Message;
use super::tagged::{Tagged, Timestamped};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Call,
    Message,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Call => write!(f, "call"),
            ActivityKind::Message => write!(f, "message"),
        }
    }
}

/// One row of the combined call/message feed, normalized to a single instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub sid: String,
    pub from: String,
    pub to: String,
    pub status: String,
    pub date: Option<DateTime<Utc>>,
    pub account_id: String,
}

impl ActivityEntry {
    /// Calls are placed in the feed by creation time.
    pub fn from_call(call: Tagged<Call>) -> Self {
        Self {
            kind: ActivityKind::Call,
            date: call.record.date_created.or(call.record.start_time),
            sid: call.record.sid,
            from: call.record.from,
            to: call.record.to,
            status: call.record.status,
            account_id: call.account_id,
        }
    }

    pub fn from_message(message: Tagged<Message>) -> Self {
        Self {
            kind: ActivityKind::Message,
            date: message.record.timestamp(),
            sid: message.record.sid,
            from: message.record.from,
            to: message.record.to,
            status: message.record.status,
            account_id: message.account_id,
        }
    }
}

impl Timestamped for ActivityEntry {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}
