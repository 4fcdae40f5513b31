//! Upstream provider boundary.
//!
//! A [`ProviderGateway`] is bound to exactly one account's credentials. The
//! aggregation services never build gateways themselves; they ask a
//! [`GatewayProvider`] for the gateway of a given account id.

mod cache;
mod twilio;

pub use cache::ClientCache;
pub use twilio::TwilioGateway;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CallboardError, CallboardResult};
use crate::models::{Alert, Call, Media, Message, NumberUpdate, PhoneNumber, Recording};

/// Largest page the provider will return for one list request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Result cap for plain list views.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Result cap for dashboard counts.
pub const STATS_LIMIT: u32 = 100;

/// Result cap for derived computations that need a wide window. Activity
/// beyond this many records per account is not seen.
pub const WIDE_WINDOW_LIMIT: u32 = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallFilter {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub start_after: Option<DateTime<Utc>>,
    pub start_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl CallFilter {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, limit: u32) -> Self {
        Self {
            start_after: start,
            start_before: end,
            limit: Some(limit),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub sent_after: Option<DateTime<Utc>>,
    pub sent_before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl MessageFilter {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, limit: u32) -> Self {
        Self {
            sent_after: start,
            sent_before: end,
            limit: Some(limit),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertFilter {
    pub log_level: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// Page size actually requested from the provider.
pub fn effective_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_PAGE_SIZE)
}

/// Outcome of fetching a single resource from one account.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Found(T),
    /// The account answered but does not own the resource.
    NotFoundHere,
    TransportError(CallboardError),
}

impl<T> FetchOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Found(value) => FetchOutcome::Found(f(value)),
            FetchOutcome::NotFoundHere => FetchOutcome::NotFoundHere,
            FetchOutcome::TransportError(e) => FetchOutcome::TransportError(e),
        }
    }
}

impl<T> From<CallboardResult<T>> for FetchOutcome<T> {
    fn from(result: CallboardResult<T>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Found(value),
            Err(CallboardError::UpstreamStatus { status: 404, .. }) => FetchOutcome::NotFoundHere,
            Err(e) => FetchOutcome::TransportError(e),
        }
    }
}

#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Registry id of the account this gateway is bound to.
    fn account_id(&self) -> &str;

    async fn list_calls(&self, filter: &CallFilter) -> CallboardResult<Vec<Call>>;

    async fn list_messages(&self, filter: &MessageFilter) -> CallboardResult<Vec<Message>>;

    async fn list_numbers(&self, limit: u32) -> CallboardResult<Vec<PhoneNumber>>;

    async fn list_alerts(&self, filter: &AlertFilter) -> CallboardResult<Vec<Alert>>;

    async fn fetch_call(&self, sid: &str) -> FetchOutcome<Call>;

    async fn fetch_message(&self, sid: &str) -> FetchOutcome<Message>;

    async fn fetch_number(&self, sid: &str) -> FetchOutcome<PhoneNumber>;

    async fn fetch_alert(&self, sid: &str) -> FetchOutcome<Alert>;

    async fn list_recordings(&self, call_sid: &str) -> CallboardResult<Vec<Recording>>;

    async fn list_media(&self, message_sid: &str) -> CallboardResult<Vec<Media>>;

    async fn update_number(&self, sid: &str, update: &NumberUpdate)
        -> FetchOutcome<PhoneNumber>;

    async fn delete_number(&self, sid: &str) -> FetchOutcome<()>;
}

/// Hands out the gateway bound to a given account.
pub trait GatewayProvider: Send + Sync {
    fn gateway(&self, account_id: &str) -> CallboardResult<Arc<dyn ProviderGateway>>;
}
