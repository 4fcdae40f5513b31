use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records that carry a natural ordering instant for merge sorting.
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

/// A record annotated with the account it was fetched from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tagged<T> {
    #[serde(flatten)]
    pub record: T,
    pub account_id: String,
}

impl<T> Tagged<T> {
    pub fn new(account_id: impl Into<String>, record: T) -> Self {
        Self {
            record,
            account_id: account_id.into(),
        }
    }
}

impl<T: Timestamped> Timestamped for Tagged<T> {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.record.timestamp()
    }
}
