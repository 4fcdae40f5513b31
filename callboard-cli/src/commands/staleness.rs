use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;

use super::{account_cell, format_date, is_json, new_table, print_json, print_scope_header};
use crate::context::AppContext;

pub async fn handle_staleness_command(ctx: &AppContext, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let report = ctx.board.staleness.classify(&scope).await?;

    if is_json(format) {
        return print_json(&report);
    }

    let registry = ctx.registry();
    print_scope_header("Stale Numbers", &scope, registry);

    let summary = &report.summary;
    println!(
        "  {} of {} number(s) had no calls or messages in their window",
        summary.stale_number_count.to_string().yellow().bold(),
        summary.total_numbers
    );
    println!();

    if report.stale_numbers.is_empty() {
        println!("{}", "Every number has recent activity.".green());
        return Ok(());
    }

    let mut table = new_table(&["SID", "Number", "Account", "Window", "Last Activity"]);
    for number in &report.stale_numbers {
        table.add_row(vec![
            Cell::new(&number.sid),
            Cell::new(&number.phone_number),
            account_cell(registry, &number.account_id),
            Cell::new(format!(
                "{} days",
                registry.stale_after_days(&number.account_id)
            )),
            Cell::new(format_date(number.last_activity)),
        ]);
    }
    println!("{table}");

    if !report.stale_accounts.is_empty() {
        println!();
        println!("{}", "Stale Accounts".yellow().bold());
        for account in &report.stale_accounts {
            println!(
                "  {} {} ({})",
                "→".blue(),
                account.name,
                account.account_id.dimmed()
            );
        }
    }

    Ok(())
}
