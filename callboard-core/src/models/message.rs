use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tagged::Timestamped;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sid: String,
    pub from: String,
    pub to: String,
    pub body: String,
    pub status: String,
    pub direction: String,
    pub date_sent: Option<DateTime<Utc>>,
    pub date_created: Option<DateTime<Utc>>,
    pub price: Option<String>,
    pub price_unit: Option<String>,
    pub num_media: Option<u32>,
    pub num_segments: Option<u32>,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

impl Message {
    pub fn new(sid: &str, from: &str, to: &str, date_sent: Option<DateTime<Utc>>) -> Self {
        Self {
            sid: sid.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            body: String::new(),
            status: "delivered".to_string(),
            direction: "outbound-api".to_string(),
            date_sent,
            date_created: date_sent,
            price: None,
            price_unit: None,
            num_media: Some(0),
            num_segments: Some(1),
            error_code: None,
            error_message: None,
        }
    }

    pub fn with_price(mut self, price: &str) -> Self {
        self.price = Some(price.to_string());
        self.price_unit = Some("USD".to_string());
        self
    }

    pub fn parties(&self) -> [&str; 2] {
        [self.from.as_str(), self.to.as_str()]
    }
}

impl Timestamped for Message {
    /// Queued messages have no send date yet; fall back to creation.
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date_sent.or(self.date_created)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub sid: String,
    pub content_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    #[serde(flatten)]
    pub message: Message,
    pub media: Vec<Media>,
}
