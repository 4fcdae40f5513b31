use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;

use super::{account_cell, is_json, new_table, print_json};
use crate::context::AppContext;

pub fn handle_accounts_command(ctx: &AppContext, format: &str) -> Result<()> {
    let registry = ctx.registry();
    let summaries = registry.summaries();

    if is_json(format) {
        return print_json(&summaries);
    }

    println!("{}", "Accounts".cyan().bold());
    println!(
        "{}",
        format!("Source: {}", ctx.config.accounts.path.display()).dimmed()
    );
    println!();

    if summaries.is_empty() {
        println!("{}", "No accounts configured.".yellow());
        println!(
            "{}",
            "Add {\"id\", \"name\", \"sid\", \"token\"} entries to the accounts file.".dimmed()
        );
        return Ok(());
    }

    let mut table = new_table(&["Id", "Name", "Color", "Stale After"]);
    for summary in &summaries {
        table.add_row(vec![
            account_cell(registry, &summary.id),
            Cell::new(&summary.name),
            Cell::new(&summary.color),
            Cell::new(format!("{} days", summary.stale_after_days)),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} {} account(s), default staleness {} days",
        "→".blue(),
        summaries.len(),
        registry.default_stale_after_days()
    );

    Ok(())
}
