//! Multi-account telephony aggregation.
//!
//! The core resolves an account [`Scope`], fans provider requests out to
//! every account in it and merges the answers. Derived reports (staleness,
//! cost, dashboard counts) and webhook probing are built on the same fan-out.

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod registry;
pub mod services;

pub use config::{
    get_config_dir, AccountsConfig, CallboardConfig, ConfigLoadError, LoggingConfig,
    UpstreamConfig, WebhooksConfig,
};
pub use error::{CallboardError, CallboardResult, CliErrorDisplay};
pub use gateway::{
    effective_limit, AlertFilter, CallFilter, ClientCache, FetchOutcome, GatewayProvider,
    MessageFilter, ProviderGateway, TwilioGateway, DEFAULT_LIST_LIMIT, MAX_PAGE_SIZE,
    STATS_LIMIT, WIDE_WINDOW_LIMIT,
};
pub use models::{
    ActivityEntry, ActivityKind, Alert, Call, CallDetail, Media, Message, MessageDetail,
    NumberCapabilities, NumberUpdate, PhoneNumber, Recording, Tagged, Timestamped,
};
pub use registry::{Account, AccountRegistry, AccountSummary, Credentials, Scope, ACCOUNT_COLORS};
pub use services::{
    AccountCost, AccountLookupResolver, CostAggregator, CostBreakdown, CostReport,
    DashboardAggregator, DashboardStats, FanoutAggregator, NumberAdmin, Period, ProbeStatus,
    StaleAccount, StaleNumber, StalenessClassifier, StalenessReport, StalenessSummary,
    WebhookKind, WebhookProbeResult, WebhookProber,
};

use std::sync::Arc;

/// Every service wired to one registry and one gateway provider.
#[derive(Clone)]
pub struct Callboard {
    pub fanout: FanoutAggregator,
    pub resolver: AccountLookupResolver,
    pub numbers: NumberAdmin,
    pub staleness: StalenessClassifier,
    pub costs: CostAggregator,
    pub dashboard: DashboardAggregator,
    pub webhooks: Arc<WebhookProber>,
}

impl Callboard {
    pub fn new(
        registry: Arc<AccountRegistry>,
        provider: Arc<dyn GatewayProvider>,
        webhooks: &WebhooksConfig,
    ) -> CallboardResult<Self> {
        let fanout = FanoutAggregator::new(Arc::clone(&registry), Arc::clone(&provider));
        let resolver = AccountLookupResolver::new(registry, provider);

        Ok(Self {
            numbers: NumberAdmin::new(resolver.clone()),
            staleness: StalenessClassifier::new(fanout.clone()),
            costs: CostAggregator::new(fanout.clone()),
            dashboard: DashboardAggregator::new(fanout.clone()),
            webhooks: Arc::new(WebhookProber::new(fanout.clone(), webhooks)?),
            resolver,
            fanout,
        })
    }

    /// Production wiring: registry from disk, gateways from the client cache.
    pub fn from_config(config: &CallboardConfig) -> CallboardResult<Self> {
        let registry = Arc::new(AccountRegistry::load(
            &config.accounts.path,
            config.accounts.default_stale_after_days,
        )?);
        let cache = ClientCache::new(Arc::clone(&registry), config.upstream.clone())?;
        Self::new(registry, Arc::new(cache), &config.webhooks)
    }

    pub fn registry(&self) -> &AccountRegistry {
        self.fanout.registry()
    }
}
