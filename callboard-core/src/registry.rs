//! Static account registry.
//!
//! Loaded once from `accounts.json` and shared read-only for the process
//! lifetime. The file is either a bare array of accounts or an object with a
//! `defaultStaleAfterDays` and an `accounts` array.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CallboardError, CallboardResult};

pub const ACCOUNT_COLORS: [&str; 8] = [
    "#3B82F6", // blue
    "#EF4444", // red
    "#10B981", // green
    "#F59E0B", // amber
    "#8B5CF6", // purple
    "#EC4899", // pink
    "#06B6D4", // cyan
    "#F97316", // orange
];

/// Provider credentials for one account. Never serialized, redacted in `Debug`.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub sid: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("sid", &self.sid)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub stale_after_days: Option<u32>,
}

impl Account {
    pub fn new(id: &str, name: &str, sid: &str, token: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            credentials: Credentials {
                sid: sid.to_string(),
                token: token.to_string(),
            },
            stale_after_days: None,
        }
    }

    pub fn with_stale_after_days(mut self, days: u32) -> Self {
        self.stale_after_days = Some(days);
        self
    }
}

/// Credential-free view of an account, safe to hand to any consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub color: String,
    pub stale_after_days: u32,
}

/// The set of accounts an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Single(String),
    All,
}

impl Scope {
    pub fn single(account_id: impl Into<String>) -> Self {
        Scope::Single(account_id.into())
    }
}

impl FromStr for Scope {
    type Err = CallboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CallboardError::ValidationError(
                "Scope must be 'all' or an account id".to_string(),
            ));
        }
        if trimmed.eq_ignore_ascii_case("all") {
            Ok(Scope::All)
        } else {
            Ok(Scope::Single(trimmed.to_string()))
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Single(id) => write!(f, "{}", id),
            Scope::All => write!(f, "all"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AccountsFile {
    List(Vec<Account>),
    #[serde(rename_all = "camelCase")]
    WithDefaults {
        default_stale_after_days: Option<u32>,
        accounts: Vec<Account>,
    },
}

#[derive(Debug, Clone)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
    default_stale_after_days: u32,
}

impl AccountRegistry {
    pub fn new(accounts: Vec<Account>, default_stale_after_days: u32) -> CallboardResult<Self> {
        let mut seen = HashSet::new();
        for account in &accounts {
            if account.id.trim().is_empty() {
                return Err(CallboardError::ValidationError(
                    "Account id must not be empty".to_string(),
                ));
            }
            if account.id.eq_ignore_ascii_case("all") {
                return Err(CallboardError::ValidationError(
                    "'all' is reserved and cannot be used as an account id".to_string(),
                ));
            }
            if !seen.insert(account.id.as_str()) {
                return Err(CallboardError::ValidationError(format!(
                    "Duplicate account id: {}",
                    account.id
                )));
            }
        }

        Ok(Self {
            accounts,
            default_stale_after_days,
        })
    }

    pub fn empty(default_stale_after_days: u32) -> Self {
        Self {
            accounts: Vec::new(),
            default_stale_after_days,
        }
    }

    /// Loads the accounts file. A missing file yields an empty registry.
    pub fn load(path: &Path, fallback_stale_after_days: u32) -> CallboardResult<Self> {
        if !path.exists() {
            warn!(
                "No accounts found at {} - create the file with account credentials",
                path.display()
            );
            return Ok(Self::empty(fallback_stale_after_days));
        }

        let raw = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&raw, fallback_stale_after_days).map_err(|e| {
            CallboardError::AccountsFileInvalid {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        info!("Loaded {} account(s)", registry.len());
        Ok(registry)
    }

    pub fn from_json(raw: &str, fallback_stale_after_days: u32) -> CallboardResult<Self> {
        let parsed: AccountsFile = serde_json::from_str(raw)?;
        match parsed {
            AccountsFile::List(accounts) => Self::new(accounts, fallback_stale_after_days),
            AccountsFile::WithDefaults {
                default_stale_after_days,
                accounts,
            } => Self::new(
                accounts,
                default_stale_after_days.unwrap_or(fallback_stale_after_days),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn default_stale_after_days(&self) -> u32 {
        self.default_stale_after_days
    }

    /// Account ids in registry order.
    pub fn account_ids(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.id.clone()).collect()
    }

    pub fn get(&self, account_id: &str) -> CallboardResult<&Account> {
        self.accounts
            .iter()
            .find(|a| a.id == account_id)
            .ok_or_else(|| CallboardError::AccountNotFound(account_id.to_string()))
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.accounts.iter().any(|a| a.id == account_id)
    }

    pub fn first(&self) -> Option<&Account> {
        self.accounts.first()
    }

    pub fn stale_after_days(&self, account_id: &str) -> u32 {
        self.accounts
            .iter()
            .find(|a| a.id == account_id)
            .and_then(|a| a.stale_after_days)
            .unwrap_or(self.default_stale_after_days)
    }

    pub fn color_for(&self, account_id: &str) -> Option<&'static str> {
        self.accounts
            .iter()
            .position(|a| a.id == account_id)
            .map(|index| ACCOUNT_COLORS[index % ACCOUNT_COLORS.len()])
    }

    /// Display name, falling back to the id for unknown accounts.
    pub fn display_name(&self, account_id: &str) -> String {
        self.accounts
            .iter()
            .find(|a| a.id == account_id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| account_id.to_string())
    }

    pub fn info(&self, account_id: &str) -> CallboardResult<AccountSummary> {
        let account = self.get(account_id)?;
        Ok(self.summarize(account))
    }

    pub fn summaries(&self) -> Vec<AccountSummary> {
        self.accounts.iter().map(|a| self.summarize(a)).collect()
    }

    fn summarize(&self, account: &Account) -> AccountSummary {
        AccountSummary {
            id: account.id.clone(),
            name: account.name.clone(),
            color: self
                .color_for(&account.id)
                .unwrap_or(ACCOUNT_COLORS[0])
                .to_string(),
            stale_after_days: account
                .stale_after_days
                .unwrap_or(self.default_stale_after_days),
        }
    }

    /// Resolves a scope into the ordered list of account ids it covers.
    pub fn resolve(&self, scope: &Scope) -> CallboardResult<Vec<String>> {
        match scope {
            Scope::All => Ok(self.account_ids()),
            Scope::Single(id) => {
                if self.contains(id) {
                    Ok(vec![id.clone()])
                } else {
                    Err(CallboardError::AccountNotFound(id.clone()))
                }
            }
        }
    }

    /// The scope used when a caller does not pick one: the first account.
    pub fn default_scope(&self) -> CallboardResult<Scope> {
        self.first()
            .map(|a| Scope::Single(a.id.clone()))
            .ok_or(CallboardError::NoAccountsConfigured)
    }
}
