//! Webhook health probing.
//!
//! Only URLs already configured on a number in scope may be probed. The
//! probe is a single provider-shaped form POST with a bounded timeout and no
//! redirect following.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::WebhooksConfig;
use crate::error::{CallboardError, CallboardResult};
use crate::gateway::WIDE_WINDOW_LIMIT;
use crate::registry::Scope;

use super::fanout::FanoutAggregator;

const TEST_ACCOUNT_SID: &str = "ACTEST000000000000000000000000000";
const TEST_API_VERSION: &str = "2010-04-01";
const TEST_CALLER: &str = "+15551234567";
const TEST_CALLED: &str = "+15559876543";
const TEST_SIGNATURE: &str = "test-signature";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookKind {
    Voice,
    Sms,
}

impl FromStr for WebhookKind {
    type Err = CallboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "voice" => Ok(WebhookKind::Voice),
            "sms" => Ok(WebhookKind::Sms),
            other => Err(CallboardError::ValidationError(format!(
                "Unknown webhook type '{}'. Use voice or sms",
                other
            ))),
        }
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookKind::Voice => write!(f, "voice"),
            WebhookKind::Sms => write!(f, "sms"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
    Unreachable,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Healthy => write!(f, "healthy"),
            ProbeStatus::Unhealthy => write!(f, "unhealthy"),
            ProbeStatus::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookProbeResult {
    pub status: ProbeStatus,
    pub http_status: Option<u16>,
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookProbeResult {
    pub fn is_healthy(&self) -> bool {
        self.status == ProbeStatus::Healthy
    }

    fn from_status(status: u16, elapsed: Duration) -> Self {
        let healthy = (200..400).contains(&status);
        Self {
            status: if healthy {
                ProbeStatus::Healthy
            } else {
                ProbeStatus::Unhealthy
            },
            http_status: Some(status),
            response_time_ms: elapsed.as_millis() as u64,
            error: if healthy {
                None
            } else {
                Some(format!("HTTP {}", status))
            },
        }
    }

    fn unreachable(error: String, elapsed: Duration) -> Self {
        Self {
            status: ProbeStatus::Unreachable,
            http_status: None,
            response_time_ms: elapsed.as_millis() as u64,
            error: Some(error),
        }
    }
}

/// Form fields of a provider-shaped test event.
pub fn probe_payload(kind: WebhookKind) -> Vec<(&'static str, String)> {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(13)
        .collect();

    let mut fields = vec![
        ("AccountSid", TEST_ACCOUNT_SID.to_string()),
        ("ApiVersion", TEST_API_VERSION.to_string()),
    ];

    match kind {
        WebhookKind::Voice => fields.extend([
            ("CallSid", format!("CAtest{}", suffix)),
            ("CallStatus", "ringing".to_string()),
            ("Called", TEST_CALLED.to_string()),
            ("Caller", TEST_CALLER.to_string()),
            ("Direction", "inbound".to_string()),
            ("From", TEST_CALLER.to_string()),
            ("To", TEST_CALLED.to_string()),
        ]),
        WebhookKind::Sms => fields.extend([
            ("MessageSid", format!("SMtest{}", suffix)),
            ("SmsStatus", "received".to_string()),
            ("Body", "Test message from Twilio Dashboard".to_string()),
            ("From", TEST_CALLER.to_string()),
            ("To", TEST_CALLED.to_string()),
            ("NumMedia", "0".to_string()),
        ]),
    }

    fields
}

pub struct WebhookProber {
    fanout: FanoutAggregator,
    client: Client,
    user_agent: String,
}

impl WebhookProber {
    pub fn new(fanout: FanoutAggregator, config: &WebhooksConfig) -> CallboardResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_secs))
            .redirect(Policy::none())
            .build()
            .map_err(|e| {
                CallboardError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            fanout,
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Checks `url` against the numbers in scope, then probes it once.
    pub async fn test(
        &self,
        scope: &Scope,
        url: &str,
        kind: WebhookKind,
    ) -> CallboardResult<WebhookProbeResult> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CallboardError::ValidationError(
                "Webhook url must not be empty".to_string(),
            ));
        }

        self.ensure_configured(scope, url).await?;

        let result = self.probe(url, kind).await;
        info!(
            "Webhook probe of {} ({}): {} in {}ms",
            url, kind, result.status, result.response_time_ms
        );
        Ok(result)
    }

    async fn ensure_configured(&self, scope: &Scope, url: &str) -> CallboardResult<()> {
        let numbers = self
            .fanout
            .list_numbers(scope, Some(WIDE_WINDOW_LIMIT))
            .await?;

        if numbers.iter().any(|n| n.record.has_webhook(url)) {
            return Ok(());
        }

        warn!("Rejected probe of unconfigured webhook url {}", url);
        Err(CallboardError::WebhookNotConfigured(url.to_string()))
    }

    /// One POST; every outcome is reported as data.
    pub async fn probe(&self, url: &str, kind: WebhookKind) -> WebhookProbeResult {
        let started = Instant::now();

        let response = self
            .client
            .post(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header("X-Twilio-Signature", TEST_SIGNATURE)
            .form(&probe_payload(kind))
            .send()
            .await;

        let elapsed = started.elapsed();

        match response {
            Ok(response) => WebhookProbeResult::from_status(response.status().as_u16(), elapsed),
            Err(e) if e.is_timeout() => {
                debug!("Webhook probe of {} timed out", url);
                WebhookProbeResult::unreachable("Connection timeout".to_string(), elapsed)
            }
            Err(e) => {
                debug!("Webhook probe of {} failed: {}", url, e);
                WebhookProbeResult::unreachable(e.without_url().to_string(), elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let elapsed = Duration::from_millis(42);

        let ok = WebhookProbeResult::from_status(204, elapsed);
        assert_eq!(ok.status, ProbeStatus::Healthy);
        assert_eq!(ok.error, None);
        assert_eq!(ok.response_time_ms, 42);

        let redirect = WebhookProbeResult::from_status(302, elapsed);
        assert!(redirect.is_healthy());

        let missing = WebhookProbeResult::from_status(404, elapsed);
        assert_eq!(missing.status, ProbeStatus::Unhealthy);
        assert_eq!(missing.error.as_deref(), Some("HTTP 404"));
        assert_eq!(missing.http_status, Some(404));
    }

    #[test]
    fn test_voice_payload() {
        let payload = probe_payload(WebhookKind::Voice);
        let get = |key: &str| {
            payload
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("AccountSid"), Some(TEST_ACCOUNT_SID));
        assert_eq!(get("CallStatus"), Some("ringing"));
        assert_eq!(get("Direction"), Some("inbound"));
        let call_sid = get("CallSid").unwrap();
        assert!(call_sid.starts_with("CAtest"));
        assert_eq!(call_sid.len(), "CAtest".len() + 13);
        assert_eq!(get("MessageSid"), None);
    }

    #[test]
    fn test_sms_payload() {
        let payload = probe_payload(WebhookKind::Sms);
        let keys: Vec<&str> = payload.iter().map(|(k, _)| *k).collect();

        assert_eq!(
            keys,
            vec![
                "AccountSid",
                "ApiVersion",
                "MessageSid",
                "SmsStatus",
                "Body",
                "From",
                "To",
                "NumMedia"
            ]
        );
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Voice".parse::<WebhookKind>().unwrap(), WebhookKind::Voice);
        assert_eq!("sms".parse::<WebhookKind>().unwrap(), WebhookKind::Sms);
        assert!("fax".parse::<WebhookKind>().is_err());
    }

    #[test]
    fn test_result_serialization() {
        let result = WebhookProbeResult::unreachable(
            "Connection timeout".to_string(),
            Duration::from_millis(5001),
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "unreachable");
        assert!(json["httpStatus"].is_null());
        assert_eq!(json["responseTimeMs"], 5001);
        assert_eq!(json["error"], "Connection timeout");
    }
}
