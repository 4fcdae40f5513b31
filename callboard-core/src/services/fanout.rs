//! Concurrent multi-account listing.
//!
//! Every list operation resolves its [`Scope`] once, runs one task per
//! account on a [`JoinSet`], and reassembles the per-account results in
//! registry order before merging. The first failing account aborts the rest
//! of the fan-out.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::{CallboardError, CallboardResult};
use crate::gateway::{
    AlertFilter, CallFilter, GatewayProvider, MessageFilter, ProviderGateway, WIDE_WINDOW_LIMIT,
};
use crate::models::{Alert, Call, Message, PhoneNumber, Tagged, Timestamped};
use crate::registry::{AccountRegistry, Scope};

/// Stable newest-first sort. Records without a timestamp go last and keep
/// their relative order.
pub fn sort_desc<T: Timestamped>(records: &mut [T]) {
    records.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
}

#[derive(Clone)]
pub struct FanoutAggregator {
    registry: Arc<AccountRegistry>,
    provider: Arc<dyn GatewayProvider>,
}

impl FanoutAggregator {
    pub fn new(registry: Arc<AccountRegistry>, provider: Arc<dyn GatewayProvider>) -> Self {
        Self { registry, provider }
    }

    pub fn registry(&self) -> &Arc<AccountRegistry> {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<dyn GatewayProvider> {
        &self.provider
    }

    /// Runs `fetch` against every account in `scope` concurrently.
    ///
    /// Results come back as `(account_id, value)` pairs in registry order,
    /// whatever order the tasks finished in.
    pub async fn fan_out<T, F, Fut>(
        &self,
        scope: &Scope,
        operation: &str,
        fetch: F,
    ) -> CallboardResult<Vec<(String, T)>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn ProviderGateway>) -> Fut,
        Fut: Future<Output = CallboardResult<T>> + Send + 'static,
    {
        let account_ids = self.registry.resolve(scope)?;

        let mut tasks = JoinSet::new();
        for (index, account_id) in account_ids.iter().enumerate() {
            let gateway = self.provider.gateway(account_id)?;
            let request = fetch(gateway);
            debug!("Fetching {} for account {}", operation, account_id);
            tasks.spawn(async move { (index, request.await) });
        }

        let mut slots: Vec<Option<T>> = account_ids.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| {
                CallboardError::Internal(format!("Fan-out task failed to complete: {}", e))
            })?;

            match result {
                Ok(value) => slots[index] = Some(value),
                Err(e) => {
                    let account_id = &account_ids[index];
                    error!(
                        account_id = %account_id,
                        error_code = e.error_code(),
                        "Failed to fetch {}: {}",
                        operation,
                        e
                    );
                    // Abort the branches still in flight.
                    tasks.abort_all();
                    return Err(CallboardError::upstream_fetch_failed(operation, account_id));
                }
            }
        }

        account_ids
            .into_iter()
            .zip(slots)
            .map(|(account_id, slot)| {
                slot.map(|value| (account_id, value)).ok_or_else(|| {
                    CallboardError::Internal(format!("Missing fan-out result for {}", operation))
                })
            })
            .collect()
    }

    /// Fan-out over a list operation, tagging each record with its account.
    pub async fn fan_out_tagged<T, F, Fut>(
        &self,
        scope: &Scope,
        operation: &str,
        fetch: F,
    ) -> CallboardResult<Vec<Tagged<T>>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn ProviderGateway>) -> Fut,
        Fut: Future<Output = CallboardResult<Vec<T>>> + Send + 'static,
    {
        let per_account = self.fan_out(scope, operation, fetch).await?;

        let merged: Vec<Tagged<T>> = per_account
            .into_iter()
            .flat_map(|(account_id, records)| {
                records
                    .into_iter()
                    .map(move |record| Tagged::new(account_id.clone(), record))
            })
            .collect();

        info!("Fetched {} {} across {}", merged.len(), operation, scope);
        Ok(merged)
    }

    pub async fn list_calls(
        &self,
        scope: &Scope,
        filter: &CallFilter,
    ) -> CallboardResult<Vec<Tagged<Call>>> {
        let filter = filter.clone();
        let mut calls = self
            .fan_out_tagged(scope, "calls", move |gateway| {
                let filter = filter.clone();
                async move { gateway.list_calls(&filter).await }
            })
            .await?;
        sort_desc(&mut calls);
        Ok(calls)
    }

    pub async fn list_messages(
        &self,
        scope: &Scope,
        filter: &MessageFilter,
    ) -> CallboardResult<Vec<Tagged<Message>>> {
        let filter = filter.clone();
        let mut messages = self
            .fan_out_tagged(scope, "messages", move |gateway| {
                let filter = filter.clone();
                async move { gateway.list_messages(&filter).await }
            })
            .await?;
        sort_desc(&mut messages);
        Ok(messages)
    }

    /// Numbers keep account order, then upstream order.
    pub async fn list_numbers(
        &self,
        scope: &Scope,
        limit: Option<u32>,
    ) -> CallboardResult<Vec<Tagged<PhoneNumber>>> {
        let limit = limit.unwrap_or(WIDE_WINDOW_LIMIT);
        self.fan_out_tagged(scope, "numbers", move |gateway| async move {
            gateway.list_numbers(limit).await
        })
        .await
    }

    pub async fn list_alerts(
        &self,
        scope: &Scope,
        filter: &AlertFilter,
    ) -> CallboardResult<Vec<Tagged<Alert>>> {
        let filter = filter.clone();
        let mut alerts = self
            .fan_out_tagged(scope, "alerts", move |gateway| {
                let filter = filter.clone();
                async move { gateway.list_alerts(&filter).await }
            })
            .await?;
        sort_desc(&mut alerts);
        Ok(alerts)
    }
}
