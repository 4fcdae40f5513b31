//! Single-resource lookup across accounts.
//!
//! A resource sid does not say which account owns it, so accounts are asked
//! one at a time in registry order until one answers with the resource.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{CallboardError, CallboardResult};
use crate::gateway::{FetchOutcome, GatewayProvider, ProviderGateway};
use crate::models::{
    Alert, Call, CallDetail, Message, MessageDetail, NumberUpdate, PhoneNumber, Tagged,
};
use crate::registry::{AccountRegistry, Scope};

#[derive(Clone)]
pub struct AccountLookupResolver {
    registry: Arc<AccountRegistry>,
    provider: Arc<dyn GatewayProvider>,
}

impl AccountLookupResolver {
    pub fn new(registry: Arc<AccountRegistry>, provider: Arc<dyn GatewayProvider>) -> Self {
        Self { registry, provider }
    }

    /// Returns the first account's answer for `sid`.
    ///
    /// Misses and transport errors on individual accounts are not surfaced;
    /// only exhausting the scope is.
    pub async fn find_one<T, F, Fut>(
        &self,
        scope: &Scope,
        kind: &str,
        sid: &str,
        fetch: F,
    ) -> CallboardResult<Tagged<T>>
    where
        F: Fn(Arc<dyn ProviderGateway>) -> Fut,
        Fut: Future<Output = FetchOutcome<T>>,
    {
        for account_id in self.registry.resolve(scope)? {
            let gateway = self.provider.gateway(&account_id)?;

            match fetch(gateway).await {
                FetchOutcome::Found(record) => {
                    info!("Found {} {} in account {}", kind, sid, account_id);
                    return Ok(Tagged::new(account_id, record));
                }
                FetchOutcome::NotFoundHere => {
                    debug!("{} {} not in account {}", kind, sid, account_id);
                }
                FetchOutcome::TransportError(e) => {
                    debug!(
                        error_code = e.error_code(),
                        "Lookup of {} {} failed in account {}: {}", kind, sid, account_id, e
                    );
                }
            }
        }

        Err(CallboardError::resource_not_found(kind, sid))
    }

    /// Call plus its recordings, both from the owning account.
    pub async fn call_detail(
        &self,
        scope: &Scope,
        sid: &str,
    ) -> CallboardResult<Tagged<CallDetail>> {
        self.find_one(scope, "Call", sid, |gateway| async move {
            let call = match gateway.fetch_call(sid).await {
                FetchOutcome::Found(call) => call,
                FetchOutcome::NotFoundHere => return FetchOutcome::NotFoundHere,
                FetchOutcome::TransportError(e) => return FetchOutcome::TransportError(e),
            };
            match gateway.list_recordings(sid).await {
                Ok(recordings) => FetchOutcome::Found(CallDetail { call, recordings }),
                Err(e) => FetchOutcome::TransportError(e),
            }
        })
        .await
    }

    /// Message plus its media, both from the owning account.
    pub async fn message_detail(
        &self,
        scope: &Scope,
        sid: &str,
    ) -> CallboardResult<Tagged<MessageDetail>> {
        self.find_one(scope, "Message", sid, |gateway| async move {
            let message = match gateway.fetch_message(sid).await {
                FetchOutcome::Found(message) => message,
                FetchOutcome::NotFoundHere => return FetchOutcome::NotFoundHere,
                FetchOutcome::TransportError(e) => return FetchOutcome::TransportError(e),
            };
            match gateway.list_media(sid).await {
                Ok(media) => FetchOutcome::Found(MessageDetail { message, media }),
                Err(e) => FetchOutcome::TransportError(e),
            }
        })
        .await
    }

    pub async fn alert_detail(&self, scope: &Scope, sid: &str) -> CallboardResult<Tagged<Alert>> {
        self.find_one(scope, "Alert", sid, |gateway| async move {
            gateway.fetch_alert(sid).await
        })
        .await
    }

    pub async fn number_detail(
        &self,
        scope: &Scope,
        sid: &str,
    ) -> CallboardResult<Tagged<PhoneNumber>> {
        self.find_one(scope, "Phone number", sid, |gateway| async move {
            gateway.fetch_number(sid).await
        })
        .await
    }

    pub async fn call(&self, scope: &Scope, sid: &str) -> CallboardResult<Tagged<Call>> {
        self.find_one(scope, "Call", sid, |gateway| async move {
            gateway.fetch_call(sid).await
        })
        .await
    }

    pub async fn message(&self, scope: &Scope, sid: &str) -> CallboardResult<Tagged<Message>> {
        self.find_one(scope, "Message", sid, |gateway| async move {
            gateway.fetch_message(sid).await
        })
        .await
    }
}

/// Webhook configuration and release of owned numbers.
#[derive(Clone)]
pub struct NumberAdmin {
    resolver: AccountLookupResolver,
}

impl NumberAdmin {
    pub fn new(resolver: AccountLookupResolver) -> Self {
        Self { resolver }
    }

    pub async fn update(
        &self,
        scope: &Scope,
        sid: &str,
        update: &NumberUpdate,
    ) -> CallboardResult<Tagged<PhoneNumber>> {
        if update.is_empty() {
            return Err(CallboardError::ValidationError(
                "No number fields to update".to_string(),
            ));
        }

        let updated = self
            .resolver
            .find_one(scope, "Phone number", sid, |gateway| async move {
                gateway.update_number(sid, update).await
            })
            .await?;

        info!(
            "Updated number {} in account {}",
            updated.record.phone_number, updated.account_id
        );
        Ok(updated)
    }

    /// Releases the number and returns the id of the account that owned it.
    pub async fn release(&self, scope: &Scope, sid: &str) -> CallboardResult<String> {
        let released = self
            .resolver
            .find_one(scope, "Phone number", sid, |gateway| async move {
                gateway.delete_number(sid).await
            })
            .await?;

        info!("Released number {} from account {}", sid, released.account_id);
        Ok(released.account_id)
    }
}
