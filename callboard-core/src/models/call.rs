use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tagged::Timestamped;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub sid: String,
    pub from: String,
    pub to: String,
    pub status: String,
    pub direction: String,
    pub duration: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub date_created: Option<DateTime<Utc>>,
    /// Signed provider price; charges are negative, e.g. `"-0.0150"`.
    pub price: Option<String>,
    pub price_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,
}

impl Call {
    pub fn new(sid: &str, from: &str, to: &str, start_time: Option<DateTime<Utc>>) -> Self {
        Self {
            sid: sid.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            status: "completed".to_string(),
            direction: "outbound-api".to_string(),
            duration: None,
            start_time,
            end_time: None,
            date_created: start_time,
            price: None,
            price_unit: None,
            answered_by: None,
            caller_name: None,
        }
    }

    pub fn with_price(mut self, price: &str) -> Self {
        self.price = Some(price.to_string());
        self.price_unit = Some("USD".to_string());
        self
    }

    /// Both endpoints of the call.
    pub fn parties(&self) -> [&str; 2] {
        [self.from.as_str(), self.to.as_str()]
    }
}

impl Timestamped for Call {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub sid: String,
    pub duration: Option<u32>,
    pub date_created: Option<DateTime<Utc>>,
    pub url: String,
}

/// A call together with its recordings, fetched from the same account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallDetail {
    #[serde(flatten)]
    pub call: Call,
    pub recordings: Vec<Recording>,
}
