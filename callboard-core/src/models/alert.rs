use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tagged::Timestamped;

/// A debugger alert. The request/response fields are only populated on
/// single-alert fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub sid: String,
    pub alert_text: Option<String>,
    pub log_level: String,
    pub error_code: Option<String>,
    pub more_info: Option<String>,
    pub request_method: Option<String>,
    pub request_url: Option<String>,
    pub resource_sid: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_generated: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_variables: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_sid: Option<String>,
}

impl Alert {
    pub fn new(sid: &str, log_level: &str, date_created: Option<DateTime<Utc>>) -> Self {
        Self {
            sid: sid.to_string(),
            alert_text: None,
            log_level: log_level.to_string(),
            error_code: None,
            more_info: None,
            request_method: None,
            request_url: None,
            resource_sid: None,
            date_created,
            date_generated: date_created,
            date_updated: date_created,
            request_variables: None,
            response_body: None,
            response_headers: None,
            service_sid: None,
        }
    }
}

impl Timestamped for Alert {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date_created
    }
}
