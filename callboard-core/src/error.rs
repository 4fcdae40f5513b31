//! Error types for the Callboard core library.
//!
//! Every failure that can cross the library boundary is a [`CallboardError`]
//! with a stable code. Messages never carry credentials or upstream response
//! bodies verbatim.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Config | Config file, accounts file and validation errors |
//! | E2001-E2099 | Account | Unknown account or scope errors |
//! | E3001-E3099 | Aggregation | Fan-out failures and exhausted lookups |
//! | E4001-E4099 | Webhook | Webhook authorization errors |
//! | E5001-E5099 | Upstream | Provider transport, status and parse errors |
//! | E9001-E9099 | General | Internal, IO, serialization and validation errors |

use std::fmt;
use thiserror::Error;

/// The main error type for the Callboard core library.
#[derive(Debug, Error)]
pub enum CallboardError {
    // ========================================================================
    // Configuration Errors (E1001-E1099)
    // ========================================================================
    /// Configuration file parse error
    #[error("[E1001] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E1002] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// Accounts file could not be loaded
    #[error("[E1003] Failed to load accounts from {path}: {message}")]
    AccountsFileInvalid { path: String, message: String },

    // ========================================================================
    // Account Errors (E2001-E2099)
    // ========================================================================
    /// Account id is not in the registry
    #[error("[E2001] Account not found: {0}")]
    AccountNotFound(String),

    /// Registry has no accounts to resolve a default scope from
    #[error("[E2002] No accounts are configured")]
    NoAccountsConfigured,

    // ========================================================================
    // Aggregation Errors (E3001-E3099)
    // ========================================================================
    /// One account's upstream call failed during a fan-out
    #[error("[E3001] Failed to fetch {operation} from upstream (account '{account_id}')")]
    UpstreamFetchFailed {
        operation: String,
        account_id: String,
    },

    /// Every account in scope was tried and none owned the resource
    #[error("[E3002] {kind} not found: {sid}")]
    ResourceNotFound { kind: String, sid: String },

    // ========================================================================
    // Webhook Errors (E4001-E4099)
    // ========================================================================
    /// Probe requested for a URL that no number in scope is configured with
    #[error("[E4001] URL must match a configured webhook: {0}")]
    WebhookNotConfigured(String),

    // ========================================================================
    // Upstream Errors (E5001-E5099)
    // ========================================================================
    /// Upstream request could not be completed
    #[error("[E5001] Upstream request failed: {0}")]
    UpstreamRequestFailed(String),

    /// Upstream answered with a non-success status
    #[error("[E5002] Upstream returned HTTP {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    /// Upstream response could not be decoded
    #[error("[E5003] Failed to parse upstream response: {0}")]
    UpstreamParseError(String),

    /// Upstream request timed out
    #[error("[E5004] Upstream request timed out")]
    UpstreamTimeout,

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Validation error
    #[error("[E9002] Validation error: {0}")]
    ValidationError(String),

    /// IO error
    #[error("[E9003] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9004] Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for Callboard operations.
pub type CallboardResult<T> = Result<T, CallboardError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<reqwest::Error> for CallboardError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors embed the request URL; strip it so account SIDs
        // never leak into messages.
        let err = err.without_url();
        if err.is_timeout() {
            CallboardError::UpstreamTimeout
        } else if err.is_status() {
            let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
            CallboardError::UpstreamStatus {
                status,
                message: err.to_string(),
            }
        } else if err.is_decode() {
            CallboardError::UpstreamParseError(err.to_string())
        } else {
            CallboardError::UpstreamRequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CallboardError {
    fn from(err: serde_json::Error) -> Self {
        CallboardError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for CallboardError {
    fn from(err: std::io::Error) -> Self {
        CallboardError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for CallboardError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => CallboardError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => CallboardError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => CallboardError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => CallboardError::ConfigParseError(err.to_string()),
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl CallboardError {
    pub fn upstream_fetch_failed(operation: impl Into<String>, account_id: impl Into<String>) -> Self {
        CallboardError::UpstreamFetchFailed {
            operation: operation.into(),
            account_id: account_id.into(),
        }
    }

    pub fn resource_not_found(kind: impl Into<String>, sid: impl Into<String>) -> Self {
        CallboardError::ResourceNotFound {
            kind: kind.into(),
            sid: sid.into(),
        }
    }

    /// Returns true if this error came from talking to the upstream provider.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            CallboardError::UpstreamFetchFailed { .. }
                | CallboardError::UpstreamRequestFailed(_)
                | CallboardError::UpstreamStatus { .. }
                | CallboardError::UpstreamParseError(_)
                | CallboardError::UpstreamTimeout
        )
    }

    /// Returns true if the caller can fix this error by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CallboardError::AccountNotFound(_)
                | CallboardError::ResourceNotFound { .. }
                | CallboardError::WebhookNotConfigured(_)
                | CallboardError::ValidationError(_)
        )
    }

    /// Returns true if this error is related to configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CallboardError::ConfigParseError(_)
                | CallboardError::InvalidConfigValue { .. }
                | CallboardError::AccountsFileInvalid { .. }
                | CallboardError::NoAccountsConfigured
        )
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CallboardError::ConfigParseError(_) => "E1001",
            CallboardError::InvalidConfigValue { .. } => "E1002",
            CallboardError::AccountsFileInvalid { .. } => "E1003",
            CallboardError::AccountNotFound(_) => "E2001",
            CallboardError::NoAccountsConfigured => "E2002",
            CallboardError::UpstreamFetchFailed { .. } => "E3001",
            CallboardError::ResourceNotFound { .. } => "E3002",
            CallboardError::WebhookNotConfigured(_) => "E4001",
            CallboardError::UpstreamRequestFailed(_) => "E5001",
            CallboardError::UpstreamStatus { .. } => "E5002",
            CallboardError::UpstreamParseError(_) => "E5003",
            CallboardError::UpstreamTimeout => "E5004",
            CallboardError::Internal(_) => "E9001",
            CallboardError::ValidationError(_) => "E9002",
            CallboardError::IoError(_) => "E9003",
            CallboardError::SerializationError(_) => "E9004",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            CallboardError::AccountNotFound(_) => {
                Some("Run 'callboard accounts' to see configured account ids")
            }
            CallboardError::NoAccountsConfigured => {
                Some("Create accounts.json with at least one account (id, name, sid, token)")
            }
            CallboardError::AccountsFileInvalid { .. } => {
                Some("Check that accounts.json is valid JSON and account ids are unique")
            }
            CallboardError::UpstreamFetchFailed { .. } => {
                Some("Check the account credentials and provider status, then try again")
            }
            CallboardError::ResourceNotFound { .. } => {
                Some("Try again with --account all to search every configured account")
            }
            CallboardError::WebhookNotConfigured(_) => {
                Some("Only URLs configured on one of your numbers can be tested")
            }
            CallboardError::UpstreamTimeout => {
                Some("Increase upstream.request_timeout_secs or try again later")
            }
            _ => None,
        }
    }
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with suggestions.
pub struct CliErrorDisplay<'a> {
    error: &'a CallboardError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a CallboardError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message (already includes code)
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}
