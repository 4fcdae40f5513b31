//! Stale number and account detection.
//!
//! A number is stale when neither a call nor a message inside its account's
//! window has it as an endpoint. The window is `[now - stale_after_days, now]`
//! and only the most recent [`WIDE_WINDOW_LIMIT`] calls and messages of each
//! account are considered, so very busy accounts are approximated.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CallboardError, CallboardResult};
use crate::gateway::{CallFilter, MessageFilter, WIDE_WINDOW_LIMIT};
use crate::models::{Call, Message, PhoneNumber, Timestamped};
use crate::registry::Scope;

use super::fanout::FanoutAggregator;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaleNumber {
    pub sid: String,
    pub phone_number: String,
    pub account_id: String,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaleAccount {
    pub account_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StalenessSummary {
    pub total_numbers: usize,
    pub stale_number_count: usize,
    pub stale_account_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StalenessReport {
    pub stale_numbers: Vec<StaleNumber>,
    pub stale_accounts: Vec<StaleAccount>,
    pub summary: StalenessSummary,
}

/// Classification of a single account's numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountStaleness {
    pub account_id: String,
    pub total_numbers: usize,
    pub stale_numbers: Vec<StaleNumber>,
}

impl AccountStaleness {
    /// An account with no numbers is never stale.
    pub fn is_stale(&self) -> bool {
        self.total_numbers > 0 && self.stale_numbers.len() == self.total_numbers
    }
}

/// Classifies one account's numbers against already-windowed activity.
pub fn classify_account(
    account_id: &str,
    numbers: &[PhoneNumber],
    calls: &[Call],
    messages: &[Message],
) -> AccountStaleness {
    let endpoints = calls
        .iter()
        .map(|c| (c.parties(), c.timestamp()))
        .chain(messages.iter().map(|m| (m.parties(), m.timestamp())));

    let mut active: HashSet<&str> = HashSet::new();
    let mut last_activity: HashMap<&str, DateTime<Utc>> = HashMap::new();

    for (parties, at) in endpoints {
        for party in parties {
            active.insert(party);
            if let Some(at) = at {
                last_activity
                    .entry(party)
                    .and_modify(|seen| {
                        if at > *seen {
                            *seen = at;
                        }
                    })
                    .or_insert(at);
            }
        }
    }

    let stale_numbers = numbers
        .iter()
        .filter(|n| !active.contains(n.phone_number.as_str()))
        .map(|n| StaleNumber {
            sid: n.sid.clone(),
            phone_number: n.phone_number.clone(),
            account_id: account_id.to_string(),
            last_activity: last_activity.get(n.phone_number.as_str()).copied(),
        })
        .collect();

    AccountStaleness {
        account_id: account_id.to_string(),
        total_numbers: numbers.len(),
        stale_numbers,
    }
}

#[derive(Clone)]
pub struct StalenessClassifier {
    fanout: FanoutAggregator,
}

impl StalenessClassifier {
    pub fn new(fanout: FanoutAggregator) -> Self {
        Self { fanout }
    }

    pub async fn classify(&self, scope: &Scope) -> CallboardResult<StalenessReport> {
        self.classify_at(scope, Utc::now()).await
    }

    /// Classifies relative to a fixed `now`.
    pub async fn classify_at(
        &self,
        scope: &Scope,
        now: DateTime<Utc>,
    ) -> CallboardResult<StalenessReport> {
        let registry = Arc::clone(self.fanout.registry());

        let per_account = self
            .fanout
            .fan_out(scope, "staleness data", move |gateway| {
                let days = registry.stale_after_days(gateway.account_id());
                let cutoff = now - Duration::days(i64::from(days));
                let calls_filter = CallFilter::window(Some(cutoff), None, WIDE_WINDOW_LIMIT);
                let messages_filter = MessageFilter::window(Some(cutoff), None, WIDE_WINDOW_LIMIT);

                async move {
                    let (numbers, calls, messages) = tokio::try_join!(
                        gateway.list_numbers(WIDE_WINDOW_LIMIT),
                        gateway.list_calls(&calls_filter),
                        gateway.list_messages(&messages_filter),
                    )?;

                    let result =
                        classify_account(gateway.account_id(), &numbers, &calls, &messages);
                    debug!(
                        "Account {}: {} of {} numbers stale (cutoff {})",
                        result.account_id,
                        result.stale_numbers.len(),
                        result.total_numbers,
                        cutoff
                    );
                    Ok::<_, CallboardError>(result)
                }
            })
            .await?;

        let registry = self.fanout.registry();
        let mut report = StalenessReport::default();

        for (account_id, account) in per_account {
            report.summary.total_numbers += account.total_numbers;
            if account.is_stale() {
                report.stale_accounts.push(StaleAccount {
                    name: registry.display_name(&account_id),
                    account_id,
                });
            }
            report.stale_numbers.extend(account.stale_numbers);
        }

        report.summary.stale_number_count = report.stale_numbers.len();
        report.summary.stale_account_count = report.stale_accounts.len();

        info!(
            "Staleness across {}: {} of {} numbers stale, {} stale accounts",
            scope,
            report.summary.stale_number_count,
            report.summary.total_numbers,
            report.summary.stale_account_count
        );

        Ok(report)
    }
}
