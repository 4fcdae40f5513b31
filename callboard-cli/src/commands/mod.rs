pub mod accounts;
pub mod alerts;
pub mod calls;
pub mod costs;
pub mod dashboard;
pub mod messages;
pub mod numbers;
pub mod staleness;
pub mod webhooks;

pub use accounts::handle_accounts_command;
pub use alerts::{handle_alerts_command, AlertsCommand};
pub use calls::{handle_calls_command, CallsCommand};
pub use costs::handle_costs_command;
pub use dashboard::{handle_activity_command, handle_stats_command};
pub use messages::{handle_messages_command, MessagesCommand};
pub use numbers::{handle_numbers_command, NumbersCommand};
pub use staleness::handle_staleness_command;
pub use webhooks::{handle_webhooks_command, WebhooksCommand};

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use colored::{ColoredString, Colorize};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;

use callboard_core::{AccountRegistry, Scope};

pub(crate) fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::White))
                .collect::<Vec<_>>(),
        );
    table
}

pub(crate) fn print_scope_header(title: &str, scope: &Scope, registry: &AccountRegistry) {
    println!("{}", title.cyan().bold());
    let label = match scope {
        Scope::All => format!("All accounts ({})", registry.len()),
        Scope::Single(id) => format!("Account: {}", registry.display_name(id)),
    };
    println!("{}", label.dimmed());
    println!();
}

/// Account id in its assigned color.
pub(crate) fn account_label(registry: &AccountRegistry, account_id: &str) -> ColoredString {
    match registry.color_for(account_id).and_then(parse_hex_color) {
        Some((r, g, b)) => account_id.truecolor(r, g, b),
        None => account_id.normal(),
    }
}

/// Table cell for an account id in its assigned color.
pub(crate) fn account_cell(registry: &AccountRegistry, account_id: &str) -> Cell {
    match registry.color_for(account_id).and_then(parse_hex_color) {
        Some((r, g, b)) => Cell::new(account_id).fg(Color::Rgb { r, g, b }),
        None => Cell::new(account_id),
    }
}

fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Accepts RFC 3339 instants or plain `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_date_arg(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| anyhow!("Invalid date '{}'. Use YYYY-MM-DD or RFC 3339", raw))
}

pub(crate) fn parse_optional_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_date_arg).transpose()
}

pub(crate) fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub(crate) fn format_status(status: &str) -> Cell {
    let color = match status {
        "completed" | "delivered" | "received" | "sent" | "in-progress" => Color::Green,
        "queued" | "ringing" | "sending" | "accepted" | "scheduled" => Color::Yellow,
        "failed" | "busy" | "no-answer" | "canceled" | "undelivered" => Color::Red,
        _ => Color::White,
    };
    Cell::new(status).fg(color)
}

pub(crate) fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", head)
    } else {
        s.to_string()
    }
}

pub(crate) fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}
