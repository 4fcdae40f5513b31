#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use callboard_core::{
    effective_limit, Account, AccountRegistry, Alert, AlertFilter, Call, CallFilter, Callboard,
    CallboardError, CallboardResult, FetchOutcome, GatewayProvider, Media, Message,
    MessageFilter, NumberUpdate, PhoneNumber, ProviderGateway, Recording, Timestamped,
    WebhooksConfig,
};

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

/// In-memory gateway for one account.
pub struct MockGateway {
    account_id: String,
    pub calls: RwLock<Vec<Call>>,
    pub messages: RwLock<Vec<Message>>,
    pub numbers: RwLock<Vec<PhoneNumber>>,
    pub alerts: RwLock<Vec<Alert>>,
    pub recordings: RwLock<HashMap<String, Vec<Recording>>>,
    pub media: RwLock<HashMap<String, Vec<Media>>>,
    pub fail_lists: bool,
    pub fail_fetches: bool,
    pub delay: Duration,
    pub list_requests: AtomicUsize,
    pub fetch_requests: AtomicUsize,
    pub deleted: RwLock<Vec<String>>,
}

impl MockGateway {
    pub fn new(account_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            calls: RwLock::new(Vec::new()),
            messages: RwLock::new(Vec::new()),
            numbers: RwLock::new(Vec::new()),
            alerts: RwLock::new(Vec::new()),
            recordings: RwLock::new(HashMap::new()),
            media: RwLock::new(HashMap::new()),
            fail_lists: false,
            fail_fetches: false,
            delay: Duration::ZERO,
            list_requests: AtomicUsize::new(0),
            fetch_requests: AtomicUsize::new(0),
            deleted: RwLock::new(Vec::new()),
        }
    }

    pub fn with_calls(self, calls: Vec<Call>) -> Self {
        *self.calls.write().unwrap() = calls;
        self
    }

    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        *self.messages.write().unwrap() = messages;
        self
    }

    pub fn with_numbers(self, numbers: Vec<PhoneNumber>) -> Self {
        *self.numbers.write().unwrap() = numbers;
        self
    }

    pub fn with_alerts(self, alerts: Vec<Alert>) -> Self {
        *self.alerts.write().unwrap() = alerts;
        self
    }

    pub fn with_recordings(self, call_sid: &str, recordings: Vec<Recording>) -> Self {
        self.recordings
            .write()
            .unwrap()
            .insert(call_sid.to_string(), recordings);
        self
    }

    pub fn with_media(self, message_sid: &str, media: Vec<Media>) -> Self {
        self.media
            .write()
            .unwrap()
            .insert(message_sid.to_string(), media);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_lists = true;
        self
    }

    pub fn failing_fetches(mut self) -> Self {
        self.fail_fetches = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn list_gate(&self) -> CallboardResult<()> {
        self.list_requests.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_lists {
            return Err(CallboardError::UpstreamStatus {
                status: 401,
                message: "Unauthorized".to_string(),
            });
        }
        Ok(())
    }

    fn fetch_gate(&self) -> Option<CallboardError> {
        self.fetch_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches {
            Some(CallboardError::UpstreamTimeout)
        } else {
            None
        }
    }
}

fn in_window<T: Timestamped>(
    record: &T,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) -> bool {
    let Some(ts) = record.timestamp() else {
        return after.is_none() && before.is_none();
    };
    after.map_or(true, |a| ts >= a) && before.map_or(true, |b| ts <= b)
}

fn found<T: Clone>(records: &[T], matches: impl Fn(&T) -> bool) -> FetchOutcome<T> {
    match records.iter().find(|r| matches(r)) {
        Some(record) => FetchOutcome::Found(record.clone()),
        None => FetchOutcome::NotFoundHere,
    }
}

#[async_trait]
impl ProviderGateway for MockGateway {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn list_calls(&self, filter: &CallFilter) -> CallboardResult<Vec<Call>> {
        self.list_gate().await?;
        Ok(self
            .calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| in_window(*c, filter.start_after, filter.start_before))
            .filter(|c| filter.status.as_ref().map_or(true, |s| &c.status == s))
            .take(effective_limit(filter.limit) as usize)
            .cloned()
            .collect())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> CallboardResult<Vec<Message>> {
        self.list_gate().await?;
        Ok(self
            .messages
            .read()
            .unwrap()
            .iter()
            .filter(|m| in_window(*m, filter.sent_after, filter.sent_before))
            .take(effective_limit(filter.limit) as usize)
            .cloned()
            .collect())
    }

    async fn list_numbers(&self, limit: u32) -> CallboardResult<Vec<PhoneNumber>> {
        self.list_gate().await?;
        Ok(self
            .numbers
            .read()
            .unwrap()
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> CallboardResult<Vec<Alert>> {
        self.list_gate().await?;
        Ok(self
            .alerts
            .read()
            .unwrap()
            .iter()
            .filter(|a| filter.log_level.as_ref().map_or(true, |l| &a.log_level == l))
            .take(effective_limit(filter.limit) as usize)
            .cloned()
            .collect())
    }

    async fn fetch_call(&self, sid: &str) -> FetchOutcome<Call> {
        if let Some(e) = self.fetch_gate() {
            return FetchOutcome::TransportError(e);
        }
        found(self.calls.read().unwrap().as_slice(), |c| c.sid == sid)
    }

    async fn fetch_message(&self, sid: &str) -> FetchOutcome<Message> {
        if let Some(e) = self.fetch_gate() {
            return FetchOutcome::TransportError(e);
        }
        found(self.messages.read().unwrap().as_slice(), |m| m.sid == sid)
    }

    async fn fetch_number(&self, sid: &str) -> FetchOutcome<PhoneNumber> {
        if let Some(e) = self.fetch_gate() {
            return FetchOutcome::TransportError(e);
        }
        found(self.numbers.read().unwrap().as_slice(), |n| n.sid == sid)
    }

    async fn fetch_alert(&self, sid: &str) -> FetchOutcome<Alert> {
        if let Some(e) = self.fetch_gate() {
            return FetchOutcome::TransportError(e);
        }
        found(self.alerts.read().unwrap().as_slice(), |a| a.sid == sid)
    }

    async fn list_recordings(&self, call_sid: &str) -> CallboardResult<Vec<Recording>> {
        Ok(self
            .recordings
            .read()
            .unwrap()
            .get(call_sid)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_media(&self, message_sid: &str) -> CallboardResult<Vec<Media>> {
        Ok(self
            .media
            .read()
            .unwrap()
            .get(message_sid)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_number(&self, sid: &str, update: &NumberUpdate) -> FetchOutcome<PhoneNumber> {
        if let Some(e) = self.fetch_gate() {
            return FetchOutcome::TransportError(e);
        }
        let mut numbers = self.numbers.write().unwrap();
        match numbers.iter_mut().find(|n| n.sid == sid) {
            Some(number) => {
                if let Some(url) = &update.voice_url {
                    number.voice_url = Some(url.clone());
                }
                if let Some(url) = &update.sms_url {
                    number.sms_url = Some(url.clone());
                }
                if let Some(name) = &update.friendly_name {
                    number.friendly_name = name.clone();
                }
                FetchOutcome::Found(number.clone())
            }
            None => FetchOutcome::NotFoundHere,
        }
    }

    async fn delete_number(&self, sid: &str) -> FetchOutcome<()> {
        if let Some(e) = self.fetch_gate() {
            return FetchOutcome::TransportError(e);
        }
        let mut numbers = self.numbers.write().unwrap();
        let before = numbers.len();
        numbers.retain(|n| n.sid != sid);
        if numbers.len() == before {
            return FetchOutcome::NotFoundHere;
        }
        self.deleted.write().unwrap().push(sid.to_string());
        FetchOutcome::Found(())
    }
}

#[derive(Default)]
pub struct MockProvider {
    gateways: HashMap<String, Arc<MockGateway>>,
}

impl GatewayProvider for MockProvider {
    fn gateway(&self, account_id: &str) -> CallboardResult<Arc<dyn ProviderGateway>> {
        self.gateways
            .get(account_id)
            .map(|g| Arc::clone(g) as Arc<dyn ProviderGateway>)
            .ok_or_else(|| CallboardError::AccountNotFound(account_id.to_string()))
    }
}

/// Registry + mock gateways, in registry order.
pub struct Harness {
    pub board: Callboard,
    pub gateways: HashMap<String, Arc<MockGateway>>,
}

impl Harness {
    pub fn new(gateways: Vec<MockGateway>) -> Self {
        Self::with_stale_days(gateways, &[])
    }

    pub fn with_stale_days(gateways: Vec<MockGateway>, stale_days: &[(&str, u32)]) -> Self {
        Self::with_webhooks(gateways, stale_days, WebhooksConfig::default())
    }

    pub fn with_webhooks(
        gateways: Vec<MockGateway>,
        stale_days: &[(&str, u32)],
        webhooks: WebhooksConfig,
    ) -> Self {
        let accounts = gateways
            .iter()
            .map(|g| {
                let id = g.account_id().to_string();
                let mut account = Account::new(&id, &id.to_uppercase(), "AC0", "token");
                if let Some((_, days)) = stale_days.iter().find(|(a, _)| *a == id) {
                    account = account.with_stale_after_days(*days);
                }
                account
            })
            .collect();
        let registry = Arc::new(AccountRegistry::new(accounts, 30).unwrap());

        let gateways: HashMap<String, Arc<MockGateway>> = gateways
            .into_iter()
            .map(|g| (g.account_id().to_string(), Arc::new(g)))
            .collect();
        let provider = MockProvider {
            gateways: gateways.clone(),
        };

        let board = Callboard::new(registry, Arc::new(provider), &webhooks).unwrap();
        Self { board, gateways }
    }

    pub fn gateway(&self, account_id: &str) -> &MockGateway {
        &self.gateways[account_id]
    }

    pub fn fetches(&self, account_id: &str) -> usize {
        self.gateway(account_id).fetch_requests.load(Ordering::SeqCst)
    }
}
