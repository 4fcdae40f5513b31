mod cost_aggregator;
mod dashboard;
mod fanout;
mod lookup;
mod staleness;
mod webhook;

pub use cost_aggregator::{
    price_amount, sum_call_costs, sum_message_costs, AccountCost, CostAggregator, CostBreakdown,
    CostReport, Period,
};
pub use dashboard::{
    merge_activity, DashboardAggregator, DashboardStats, ACTIVITY_FEED_LEN, ACTIVITY_PER_ACCOUNT,
};
pub use fanout::{sort_desc, FanoutAggregator};
pub use lookup::{AccountLookupResolver, NumberAdmin};
pub use staleness::{
    classify_account, AccountStaleness, StaleAccount, StaleNumber, StalenessClassifier,
    StalenessReport, StalenessSummary,
};
pub use webhook::{probe_payload, ProbeStatus, WebhookKind, WebhookProbeResult, WebhookProber};
