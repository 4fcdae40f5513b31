use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{CallboardError, CallboardResult};
use crate::registry::AccountRegistry;

use super::{GatewayProvider, ProviderGateway, TwilioGateway};

/// Builds one gateway per account on first use and reuses it afterwards.
///
/// All gateways share a single HTTP connection pool.
pub struct ClientCache {
    registry: Arc<AccountRegistry>,
    config: UpstreamConfig,
    client: Client,
    gateways: RwLock<HashMap<String, Arc<dyn ProviderGateway>>>,
}

impl ClientCache {
    pub fn new(registry: Arc<AccountRegistry>, config: UpstreamConfig) -> CallboardResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                CallboardError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            registry,
            config,
            client,
            gateways: RwLock::new(HashMap::new()),
        })
    }

    pub fn cached_count(&self) -> usize {
        self.gateways.read().map(|g| g.len()).unwrap_or(0)
    }
}

impl GatewayProvider for ClientCache {
    fn gateway(&self, account_id: &str) -> CallboardResult<Arc<dyn ProviderGateway>> {
        if let Some(existing) = self
            .gateways
            .read()
            .map_err(|_| CallboardError::Internal("Gateway cache lock poisoned".to_string()))?
            .get(account_id)
        {
            return Ok(Arc::clone(existing));
        }

        let account = self.registry.get(account_id)?;

        let mut gateways = self
            .gateways
            .write()
            .map_err(|_| CallboardError::Internal("Gateway cache lock poisoned".to_string()))?;

        let gateway = gateways
            .entry(account_id.to_string())
            .or_insert_with(|| {
                debug!("Creating gateway for account {}", account_id);
                Arc::new(TwilioGateway::with_client(
                    self.client.clone(),
                    account,
                    &self.config,
                ))
            });

        Ok(Arc::clone(gateway))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Account;

    fn cache() -> ClientCache {
        let registry = AccountRegistry::new(
            vec![
                Account::new("prod", "Production", "AC1", "tok1"),
                Account::new("staging", "Staging", "AC2", "tok2"),
            ],
            30,
        )
        .unwrap();
        ClientCache::new(Arc::new(registry), UpstreamConfig::default()).unwrap()
    }

    #[test]
    fn test_gateway_is_reused() {
        let cache = cache();

        let first = cache.gateway("prod").unwrap();
        let second = cache.gateway("prod").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.account_id(), "prod");
        assert_eq!(cache.cached_count(), 1);

        cache.gateway("staging").unwrap();
        assert_eq!(cache.cached_count(), 2);
    }

    #[test]
    fn test_unknown_account() {
        let cache = cache();
        let err = cache.gateway("nope").err().unwrap();
        assert!(matches!(err, CallboardError::AccountNotFound(id) if id == "nope"));
        assert_eq!(cache.cached_count(), 0);
    }
}
