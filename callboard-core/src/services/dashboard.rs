use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CallboardError, CallboardResult};
use crate::gateway::{CallFilter, MessageFilter, STATS_LIMIT};
use crate::models::{ActivityEntry, Tagged};
use crate::registry::Scope;

use super::fanout::{sort_desc, FanoutAggregator};

/// Calls and messages fetched per account for the activity feed.
pub const ACTIVITY_PER_ACCOUNT: u32 = 5;

/// Length of the merged activity feed.
pub const ACTIVITY_FEED_LEN: usize = 10;

/// Headline counts. Each count is capped at [`STATS_LIMIT`] per account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub numbers: usize,
    pub calls: usize,
    pub messages: usize,
}

impl DashboardStats {
    fn add(&mut self, other: DashboardStats) {
        self.numbers += other.numbers;
        self.calls += other.calls;
        self.messages += other.messages;
    }
}

/// Sorts newest first, then keeps the head of the feed.
pub fn merge_activity(mut entries: Vec<ActivityEntry>, len: usize) -> Vec<ActivityEntry> {
    sort_desc(&mut entries);
    entries.truncate(len);
    entries
}

#[derive(Clone)]
pub struct DashboardAggregator {
    fanout: FanoutAggregator,
}

impl DashboardAggregator {
    pub fn new(fanout: FanoutAggregator) -> Self {
        Self { fanout }
    }

    pub async fn stats(&self, scope: &Scope) -> CallboardResult<DashboardStats> {
        let per_account = self
            .fanout
            .fan_out(scope, "stats", |gateway| async move {
                let calls_filter = CallFilter::with_limit(STATS_LIMIT);
                let messages_filter = MessageFilter::with_limit(STATS_LIMIT);
                let (numbers, calls, messages) = tokio::try_join!(
                    gateway.list_numbers(STATS_LIMIT),
                    gateway.list_calls(&calls_filter),
                    gateway.list_messages(&messages_filter),
                )?;
                Ok::<_, CallboardError>(DashboardStats {
                    numbers: numbers.len(),
                    calls: calls.len(),
                    messages: messages.len(),
                })
            })
            .await?;

        let mut stats = DashboardStats::default();
        for (_, account_stats) in per_account {
            stats.add(account_stats);
        }

        info!(
            "Stats across {}: {} numbers, {} calls, {} messages",
            scope, stats.numbers, stats.calls, stats.messages
        );
        Ok(stats)
    }

    /// Latest calls and messages across the scope, newest first.
    pub async fn recent_activity(&self, scope: &Scope) -> CallboardResult<Vec<ActivityEntry>> {
        let per_account = self
            .fanout
            .fan_out(scope, "activity", |gateway| async move {
                let calls_filter = CallFilter::with_limit(ACTIVITY_PER_ACCOUNT);
                let messages_filter = MessageFilter::with_limit(ACTIVITY_PER_ACCOUNT);
                let (calls, messages) = tokio::try_join!(
                    gateway.list_calls(&calls_filter),
                    gateway.list_messages(&messages_filter),
                )?;
                Ok::<_, CallboardError>((calls, messages))
            })
            .await?;

        let entries: Vec<ActivityEntry> = per_account
            .into_iter()
            .flat_map(|(account_id, (calls, messages))| {
                let calls = calls
                    .into_iter()
                    .map(|c| ActivityEntry::from_call(Tagged::new(account_id.clone(), c)))
                    .collect::<Vec<_>>();
                let messages = messages
                    .into_iter()
                    .map(|m| ActivityEntry::from_message(Tagged::new(account_id.clone(), m)))
                    .collect::<Vec<_>>();
                calls.into_iter().chain(messages)
            })
            .collect();

        Ok(merge_activity(entries, ACTIVITY_FEED_LEN))
    }
}
