use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CallboardError, CallboardResult};
use crate::gateway::{CallFilter, MessageFilter, WIDE_WINDOW_LIMIT};
use crate::models::{Call, Message};
use crate::registry::Scope;

use super::fanout::FanoutAggregator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "all")]
    AllTime,
}

impl Period {
    pub fn days(&self) -> Option<i64> {
        match self {
            Period::Last7Days => Some(7),
            Period::Last30Days => Some(30),
            Period::Last90Days => Some(90),
            Period::AllTime => None,
        }
    }

    /// `(start, end)` bounds ending at `now`; unbounded for all time.
    pub fn window(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self.days() {
            Some(days) => (Some(now - Duration::days(days)), Some(now)),
            None => (None, None),
        }
    }
}

impl FromStr for Period {
    type Err = CallboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(Period::Last7Days),
            "30d" => Ok(Period::Last30Days),
            "90d" => Ok(Period::Last90Days),
            "all" => Ok(Period::AllTime),
            other => Err(CallboardError::ValidationError(format!(
                "Unknown period '{}'. Use 7d, 30d, 90d or all",
                other
            ))),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Last7Days => write!(f, "7d"),
            Period::Last30Days => write!(f, "30d"),
            Period::Last90Days => write!(f, "90d"),
            Period::AllTime => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub calls: f64,
    pub messages: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountCost {
    pub account_id: String,
    pub name: String,
    pub calls_cost: f64,
    pub messages_cost: f64,
    pub total_cost: f64,
}

impl AccountCost {
    pub fn new(account_id: String, name: String, calls_cost: f64, messages_cost: f64) -> Self {
        Self {
            account_id,
            name,
            calls_cost,
            messages_cost,
            total_cost: calls_cost + messages_cost,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub period: Period,
    pub total_cost: f64,
    pub breakdown: CostBreakdown,
    pub by_account: Vec<AccountCost>,
}

impl CostReport {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            total_cost: 0.0,
            breakdown: CostBreakdown::default(),
            by_account: Vec::new(),
        }
    }

    pub fn add_account(&mut self, account: AccountCost) {
        self.breakdown.calls += account.calls_cost;
        self.breakdown.messages += account.messages_cost;
        self.total_cost += account.total_cost;
        self.by_account.push(account);
    }
}

/// Magnitude of a provider price. Charges arrive signed, e.g. `"-0.0150"`.
pub fn price_amount(price: Option<&str>, sid: &str) -> f64 {
    match price {
        None => 0.0,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value.abs(),
            _ => {
                warn!("Ignoring unparsable price {:?} on {}", raw, sid);
                0.0
            }
        },
    }
}

pub fn sum_call_costs(calls: &[Call]) -> f64 {
    calls
        .iter()
        .map(|c| price_amount(c.price.as_deref(), &c.sid))
        .sum()
}

pub fn sum_message_costs(messages: &[Message]) -> f64 {
    messages
        .iter()
        .map(|m| price_amount(m.price.as_deref(), &m.sid))
        .sum()
}

#[derive(Clone)]
pub struct CostAggregator {
    fanout: FanoutAggregator,
}

impl CostAggregator {
    pub fn new(fanout: FanoutAggregator) -> Self {
        Self { fanout }
    }

    pub async fn aggregate(&self, scope: &Scope, period: Period) -> CallboardResult<CostReport> {
        self.aggregate_at(scope, period, Utc::now()).await
    }

    pub async fn aggregate_at(
        &self,
        scope: &Scope,
        period: Period,
        now: DateTime<Utc>,
    ) -> CallboardResult<CostReport> {
        let (start, end) = period.window(now);
        let calls_filter = CallFilter::window(start, end, WIDE_WINDOW_LIMIT);
        let messages_filter = MessageFilter::window(start, end, WIDE_WINDOW_LIMIT);

        let per_account = self
            .fanout
            .fan_out(scope, "costs", move |gateway| {
                let calls_filter = calls_filter.clone();
                let messages_filter = messages_filter.clone();
                async move {
                    let (calls, messages) = tokio::try_join!(
                        gateway.list_calls(&calls_filter),
                        gateway.list_messages(&messages_filter),
                    )?;
                    Ok::<_, CallboardError>((sum_call_costs(&calls), sum_message_costs(&messages)))
                }
            })
            .await?;

        let registry = self.fanout.registry();
        let mut report = CostReport::new(period);
        for (account_id, (calls_cost, messages_cost)) in per_account {
            let name = registry.display_name(&account_id);
            report.add_account(AccountCost::new(account_id, name, calls_cost, messages_cost));
        }

        info!(
            "Cost over {} across {}: {:.4} ({} accounts)",
            period,
            scope,
            report.total_cost,
            report.by_account.len()
        );

        Ok(report)
    }
}
