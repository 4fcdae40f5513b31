use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{CallboardError, CallboardResult};
use crate::models::{
    Alert, Call, Media, Message, NumberCapabilities, NumberUpdate, PhoneNumber, Recording,
};
use crate::registry::Account;

use super::{
    effective_limit, AlertFilter, CallFilter, FetchOutcome, MessageFilter, ProviderGateway,
};

const API_VERSION: &str = "2010-04-01";

/// REST gateway for one provider account.
pub struct TwilioGateway {
    client: Client,
    account_id: String,
    account_sid: String,
    auth_token: String,
    api_base: String,
    monitor_base: String,
}

impl TwilioGateway {
    pub fn new(account: &Account, config: &UpstreamConfig) -> CallboardResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                CallboardError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client, account, config))
    }

    pub fn with_client(client: Client, account: &Account, config: &UpstreamConfig) -> Self {
        Self {
            client,
            account_id: account.id.clone(),
            account_sid: account.credentials.sid.clone(),
            auth_token: account.credentials.token.clone(),
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            monitor_base: config.monitor_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn account_url(&self, resource: &str) -> String {
        format!(
            "{}/{}/Accounts/{}/{}",
            self.api_base, API_VERSION, self.account_sid, resource
        )
    }

    fn recording_url(&self, recording_sid: &str) -> String {
        self.account_url(&format!("Recordings/{}.mp3", recording_sid))
    }

    fn media_url(&self, message_sid: &str, media_sid: &str) -> String {
        self.account_url(&format!("Messages/{}/Media/{}", message_sid, media_sid))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.account_sid, Some(&self.auth_token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> CallboardResult<T> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            debug!(
                account_id = %self.account_id,
                "Upstream returned status {}",
                status
            );
            return Err(CallboardError::UpstreamStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("error").to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> CallboardResult<T> {
        self.send(self.client.get(url).query(query)).await
    }
}

fn check_sid(sid: &str) -> CallboardResult<()> {
    if sid.is_empty() || !sid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CallboardError::ValidationError(format!(
            "Invalid resource sid: {:?}",
            sid
        )));
    }
    Ok(())
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The REST API uses RFC 2822 dates, the monitor API RFC 3339.
fn parse_date(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc2822(&raw)
        .or_else(|_| DateTime::parse_from_rfc3339(&raw))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

fn parse_count(raw: Option<String>) -> Option<u32> {
    raw.and_then(|v| v.parse().ok())
}

#[derive(Debug, Deserialize)]
struct CallsPage {
    #[serde(default)]
    calls: Vec<WireCall>,
}

#[derive(Debug, Deserialize)]
struct WireCall {
    sid: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    price_unit: Option<String>,
    #[serde(default)]
    answered_by: Option<String>,
    #[serde(default)]
    caller_name: Option<String>,
}

impl From<WireCall> for Call {
    fn from(w: WireCall) -> Self {
        Call {
            sid: w.sid,
            from: w.from.unwrap_or_default(),
            to: w.to.unwrap_or_default(),
            status: w.status.unwrap_or_default(),
            direction: w.direction.unwrap_or_default(),
            duration: parse_count(w.duration),
            start_time: parse_date(w.start_time),
            end_time: parse_date(w.end_time),
            date_created: parse_date(w.date_created),
            price: w.price,
            price_unit: w.price_unit,
            answered_by: w.answered_by,
            caller_name: w.caller_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesPage {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    sid: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    date_sent: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    price_unit: Option<String>,
    #[serde(default)]
    num_media: Option<String>,
    #[serde(default)]
    num_segments: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<WireMessage> for Message {
    fn from(w: WireMessage) -> Self {
        Message {
            sid: w.sid,
            from: w.from.unwrap_or_default(),
            to: w.to.unwrap_or_default(),
            body: w.body.unwrap_or_default(),
            status: w.status.unwrap_or_default(),
            direction: w.direction.unwrap_or_default(),
            date_sent: parse_date(w.date_sent),
            date_created: parse_date(w.date_created),
            price: w.price,
            price_unit: w.price_unit,
            num_media: parse_count(w.num_media),
            num_segments: parse_count(w.num_segments),
            error_code: w.error_code,
            error_message: w.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NumbersPage {
    #[serde(default)]
    incoming_phone_numbers: Vec<WireNumber>,
}

#[derive(Debug, Deserialize)]
struct WireNumber {
    sid: String,
    phone_number: String,
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    voice_url: Option<String>,
    #[serde(default)]
    voice_method: Option<String>,
    #[serde(default)]
    sms_url: Option<String>,
    #[serde(default)]
    sms_method: Option<String>,
    #[serde(default)]
    status_callback: Option<String>,
    #[serde(default)]
    status_callback_method: Option<String>,
    #[serde(default)]
    capabilities: Option<NumberCapabilities>,
    #[serde(default)]
    date_created: Option<String>,
}

/// The provider reports unset webhooks as empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<WireNumber> for PhoneNumber {
    fn from(w: WireNumber) -> Self {
        PhoneNumber {
            friendly_name: w.friendly_name.unwrap_or_else(|| w.phone_number.clone()),
            sid: w.sid,
            phone_number: w.phone_number,
            voice_url: non_empty(w.voice_url),
            voice_method: w.voice_method,
            sms_url: non_empty(w.sms_url),
            sms_method: w.sms_method,
            status_callback: non_empty(w.status_callback),
            status_callback_method: w.status_callback_method,
            capabilities: w.capabilities.unwrap_or_default(),
            date_created: parse_date(w.date_created),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlertsPage {
    #[serde(default)]
    alerts: Vec<WireAlert>,
}

#[derive(Debug, Deserialize)]
struct WireAlert {
    sid: String,
    #[serde(default)]
    alert_text: Option<String>,
    #[serde(default)]
    log_level: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    more_info: Option<String>,
    #[serde(default)]
    request_method: Option<String>,
    #[serde(default)]
    request_url: Option<String>,
    #[serde(default)]
    resource_sid: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
    #[serde(default)]
    date_generated: Option<String>,
    #[serde(default)]
    date_updated: Option<String>,
    #[serde(default)]
    request_variables: Option<String>,
    #[serde(default)]
    response_body: Option<String>,
    #[serde(default)]
    response_headers: Option<String>,
    #[serde(default)]
    service_sid: Option<String>,
}

impl From<WireAlert> for Alert {
    fn from(w: WireAlert) -> Self {
        Alert {
            sid: w.sid,
            alert_text: w.alert_text,
            log_level: w.log_level.unwrap_or_default(),
            error_code: w.error_code,
            more_info: w.more_info,
            request_method: w.request_method,
            request_url: w.request_url,
            resource_sid: w.resource_sid,
            date_created: parse_date(w.date_created),
            date_generated: parse_date(w.date_generated),
            date_updated: parse_date(w.date_updated),
            request_variables: w.request_variables,
            response_body: w.response_body,
            response_headers: w.response_headers,
            service_sid: w.service_sid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordingsPage {
    #[serde(default)]
    recordings: Vec<WireRecording>,
}

#[derive(Debug, Deserialize)]
struct WireRecording {
    sid: String,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    media_list: Vec<WireMedia>,
}

#[derive(Debug, Deserialize)]
struct WireMedia {
    sid: String,
    #[serde(default)]
    content_type: Option<String>,
}

#[async_trait]
impl ProviderGateway for TwilioGateway {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn list_calls(&self, filter: &CallFilter) -> CallboardResult<Vec<Call>> {
        let mut query = vec![("PageSize", effective_limit(filter.limit).to_string())];
        if let Some(status) = &filter.status {
            query.push(("Status", status.clone()));
        }
        if let Some(from) = &filter.from {
            query.push(("From", from.clone()));
        }
        if let Some(to) = &filter.to {
            query.push(("To", to.clone()));
        }
        if let Some(after) = filter.start_after {
            query.push(("StartTime>", format_instant(after)));
        }
        if let Some(before) = filter.start_before {
            query.push(("StartTime<", format_instant(before)));
        }

        let page: CallsPage = self
            .get_json(&self.account_url("Calls.json"), &query)
            .await?;
        Ok(page.calls.into_iter().map(Call::from).collect())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> CallboardResult<Vec<Message>> {
        let mut query = vec![("PageSize", effective_limit(filter.limit).to_string())];
        if let Some(from) = &filter.from {
            query.push(("From", from.clone()));
        }
        if let Some(to) = &filter.to {
            query.push(("To", to.clone()));
        }
        if let Some(after) = filter.sent_after {
            query.push(("DateSent>", format_instant(after)));
        }
        if let Some(before) = filter.sent_before {
            query.push(("DateSent<", format_instant(before)));
        }

        let page: MessagesPage = self
            .get_json(&self.account_url("Messages.json"), &query)
            .await?;
        Ok(page.messages.into_iter().map(Message::from).collect())
    }

    async fn list_numbers(&self, limit: u32) -> CallboardResult<Vec<PhoneNumber>> {
        let query = [("PageSize", effective_limit(Some(limit)).to_string())];
        let page: NumbersPage = self
            .get_json(&self.account_url("IncomingPhoneNumbers.json"), &query)
            .await?;
        Ok(page
            .incoming_phone_numbers
            .into_iter()
            .map(PhoneNumber::from)
            .collect())
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> CallboardResult<Vec<Alert>> {
        let mut query = vec![("PageSize", effective_limit(filter.limit).to_string())];
        if let Some(level) = &filter.log_level {
            query.push(("LogLevel", level.clone()));
        }
        if let Some(start) = filter.start_date {
            query.push(("StartDate", format_instant(start)));
        }
        if let Some(end) = filter.end_date {
            query.push(("EndDate", format_instant(end)));
        }

        let url = format!("{}/v1/Alerts", self.monitor_base);
        let page: AlertsPage = self.get_json(&url, &query).await?;
        Ok(page.alerts.into_iter().map(Alert::from).collect())
    }

    async fn fetch_call(&self, sid: &str) -> FetchOutcome<Call> {
        if let Err(e) = check_sid(sid) {
            return FetchOutcome::TransportError(e);
        }
        let url = self.account_url(&format!("Calls/{}.json", sid));
        FetchOutcome::from(self.get_json::<WireCall>(&url, &[]).await).map(Call::from)
    }

    async fn fetch_message(&self, sid: &str) -> FetchOutcome<Message> {
        if let Err(e) = check_sid(sid) {
            return FetchOutcome::TransportError(e);
        }
        let url = self.account_url(&format!("Messages/{}.json", sid));
        FetchOutcome::from(self.get_json::<WireMessage>(&url, &[]).await).map(Message::from)
    }

    async fn fetch_number(&self, sid: &str) -> FetchOutcome<PhoneNumber> {
        if let Err(e) = check_sid(sid) {
            return FetchOutcome::TransportError(e);
        }
        let url = self.account_url(&format!("IncomingPhoneNumbers/{}.json", sid));
        FetchOutcome::from(self.get_json::<WireNumber>(&url, &[]).await).map(PhoneNumber::from)
    }

    async fn fetch_alert(&self, sid: &str) -> FetchOutcome<Alert> {
        if let Err(e) = check_sid(sid) {
            return FetchOutcome::TransportError(e);
        }
        let url = format!("{}/v1/Alerts/{}", self.monitor_base, sid);
        FetchOutcome::from(self.get_json::<WireAlert>(&url, &[]).await).map(Alert::from)
    }

    async fn list_recordings(&self, call_sid: &str) -> CallboardResult<Vec<Recording>> {
        check_sid(call_sid)?;
        let query = [("CallSid", call_sid.to_string())];
        let page: RecordingsPage = self
            .get_json(&self.account_url("Recordings.json"), &query)
            .await?;

        Ok(page
            .recordings
            .into_iter()
            .map(|r| Recording {
                url: self.recording_url(&r.sid),
                duration: parse_count(r.duration),
                date_created: parse_date(r.date_created),
                sid: r.sid,
            })
            .collect())
    }

    async fn list_media(&self, message_sid: &str) -> CallboardResult<Vec<Media>> {
        check_sid(message_sid)?;
        let url = self.account_url(&format!("Messages/{}/Media.json", message_sid));
        let page: MediaPage = self.get_json(&url, &[]).await?;

        Ok(page
            .media_list
            .into_iter()
            .map(|m| Media {
                url: self.media_url(message_sid, &m.sid),
                content_type: m.content_type.unwrap_or_default(),
                sid: m.sid,
            })
            .collect())
    }

    async fn update_number(
        &self,
        sid: &str,
        update: &NumberUpdate,
    ) -> FetchOutcome<PhoneNumber> {
        if let Err(e) = check_sid(sid) {
            return FetchOutcome::TransportError(e);
        }
        let url = self.account_url(&format!("IncomingPhoneNumbers/{}.json", sid));
        let request = self.client.post(&url).form(&update.form_fields());
        FetchOutcome::from(self.send::<WireNumber>(request).await).map(PhoneNumber::from)
    }

    async fn delete_number(&self, sid: &str) -> FetchOutcome<()> {
        if let Err(e) = check_sid(sid) {
            return FetchOutcome::TransportError(e);
        }
        let url = self.account_url(&format!("IncomingPhoneNumbers/{}.json", sid));
        let result = async {
            let response = self.authorized(self.client.delete(&url)).send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(CallboardError::UpstreamStatus {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("error").to_string(),
                })
            }
        }
        .await;
        FetchOutcome::from(result)
    }
}
