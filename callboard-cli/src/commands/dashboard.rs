use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};

use callboard_core::{ActivityKind, STATS_LIMIT};

use super::{
    account_cell, format_date, format_status, is_json, new_table, print_json, print_scope_header,
};
use crate::context::AppContext;

pub async fn handle_stats_command(ctx: &AppContext, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let stats = ctx.board.dashboard.stats(&scope).await?;

    if is_json(format) {
        return print_json(&stats);
    }

    print_scope_header("Dashboard", &scope, ctx.registry());

    println!("  Phone numbers:   {}", stats.numbers.to_string().bold());
    println!("  Recent calls:    {}", stats.calls.to_string().bold());
    println!("  Recent messages: {}", stats.messages.to_string().bold());
    println!();
    println!(
        "  {}",
        format!("Counts are capped at {} per account", STATS_LIMIT).dimmed()
    );

    Ok(())
}

pub async fn handle_activity_command(ctx: &AppContext, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let feed = ctx.board.dashboard.recent_activity(&scope).await?;

    if is_json(format) {
        return print_json(&feed);
    }

    let registry = ctx.registry();
    print_scope_header("Recent Activity", &scope, registry);

    if feed.is_empty() {
        println!("{}", "No recent activity.".yellow());
        return Ok(());
    }

    let mut table = new_table(&["Type", "SID", "Account", "From", "To", "Status", "Date"]);
    for entry in &feed {
        let kind_color = match entry.kind {
            ActivityKind::Call => Color::Magenta,
            ActivityKind::Message => Color::Cyan,
        };
        table.add_row(vec![
            Cell::new(entry.kind).fg(kind_color),
            Cell::new(&entry.sid),
            account_cell(registry, &entry.account_id),
            Cell::new(&entry.from),
            Cell::new(&entry.to),
            format_status(&entry.status),
            Cell::new(format_date(entry.date)),
        ]);
    }

    println!("{table}");
    Ok(())
}
