use tracing::debug;

use callboard_core::{AccountRegistry, Callboard, CallboardConfig, CallboardResult, Scope};

/// Loaded configuration, wired services and the account selection.
pub struct AppContext {
    pub config: CallboardConfig,
    pub board: Callboard,
    account: Option<String>,
}

impl AppContext {
    pub fn new(config: CallboardConfig, account: Option<&str>) -> CallboardResult<Self> {
        let board = Callboard::from_config(&config)?;
        Ok(Self {
            config,
            board,
            account: account.map(str::to_string),
        })
    }

    pub fn registry(&self) -> &AccountRegistry {
        self.board.registry()
    }

    /// `--account` when given, otherwise the first configured account.
    pub fn scope(&self) -> CallboardResult<Scope> {
        let scope = match &self.account {
            Some(raw) => raw.parse::<Scope>()?,
            None => self.registry().default_scope()?,
        };

        // Reject unknown ids up front.
        let ids = self.registry().resolve(&scope)?;
        debug!("Scope {} covers {} account(s)", scope, ids.len());
        Ok(scope)
    }

    pub fn default_limit(&self) -> u32 {
        self.config.upstream.default_limit
    }
}
