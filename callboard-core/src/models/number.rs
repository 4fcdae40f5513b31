use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumberCapabilities {
    #[serde(default)]
    pub voice: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub mms: bool,
    #[serde(default)]
    pub fax: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub sid: String,
    /// E.164, e.g. `+15551234567`.
    pub phone_number: String,
    pub friendly_name: String,
    pub voice_url: Option<String>,
    pub voice_method: Option<String>,
    pub sms_url: Option<String>,
    pub sms_method: Option<String>,
    pub status_callback: Option<String>,
    pub status_callback_method: Option<String>,
    pub capabilities: NumberCapabilities,
    pub date_created: Option<DateTime<Utc>>,
}

impl PhoneNumber {
    pub fn new(sid: &str, phone_number: &str) -> Self {
        Self {
            sid: sid.to_string(),
            phone_number: phone_number.to_string(),
            friendly_name: phone_number.to_string(),
            voice_url: None,
            voice_method: None,
            sms_url: None,
            sms_method: None,
            status_callback: None,
            status_callback_method: None,
            capabilities: NumberCapabilities::default(),
            date_created: None,
        }
    }

    pub fn with_voice_url(mut self, url: &str) -> Self {
        self.voice_url = Some(url.to_string());
        self
    }

    pub fn with_sms_url(mut self, url: &str) -> Self {
        self.sms_url = Some(url.to_string());
        self
    }

    pub fn with_status_callback(mut self, url: &str) -> Self {
        self.status_callback = Some(url.to_string());
        self
    }

    /// Exact match against any webhook field configured on this number.
    pub fn has_webhook(&self, url: &str) -> bool {
        [&self.voice_url, &self.sms_url, &self.status_callback]
            .into_iter()
            .any(|configured| configured.as_deref() == Some(url))
    }
}

/// Fields to change on a number. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NumberUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_callback_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

impl NumberUpdate {
    pub fn is_empty(&self) -> bool {
        self.form_fields().is_empty()
    }

    /// Provider form parameters for the fields being changed.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("VoiceUrl", &self.voice_url),
            ("VoiceMethod", &self.voice_method),
            ("SmsUrl", &self.sms_url),
            ("SmsMethod", &self.sms_method),
            ("StatusCallback", &self.status_callback),
            ("StatusCallbackMethod", &self.status_callback_method),
            ("FriendlyName", &self.friendly_name),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_webhook_matches_any_field_exactly() {
        let number = PhoneNumber::new("PN1", "+15551234567")
            .with_voice_url("https://hooks.example.com/voice")
            .with_status_callback("https://hooks.example.com/status");

        assert!(number.has_webhook("https://hooks.example.com/voice"));
        assert!(number.has_webhook("https://hooks.example.com/status"));
        assert!(!number.has_webhook("https://hooks.example.com/voice/"));
        assert!(!number.has_webhook("https://hooks.example.com/sms"));
    }

    #[test]
    fn test_number_update_form_fields() {
        let update = NumberUpdate {
            voice_url: Some("https://a.example.com".to_string()),
            friendly_name: Some("Main line".to_string()),
            ..Default::default()
        };

        assert_eq!(
            update.form_fields(),
            vec![
                ("VoiceUrl", "https://a.example.com"),
                ("FriendlyName", "Main line")
            ]
        );
        assert!(!update.is_empty());
        assert!(NumberUpdate::default().is_empty());
    }
}
