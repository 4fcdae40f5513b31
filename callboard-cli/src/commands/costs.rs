use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Color};

use callboard_core::{CostReport, Period};

use super::{account_cell, is_json, new_table, print_json, print_scope_header};
use crate::context::AppContext;

fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

fn cost_cell(cost: f64) -> Cell {
    Cell::new(format_cost(cost)).set_alignment(CellAlignment::Right)
}

pub async fn handle_costs_command(ctx: &AppContext, period: &str, format: &str) -> Result<()> {
    let period: Period = period.parse()?;
    let scope = ctx.scope()?;
    let report = ctx.board.costs.aggregate(&scope, period).await?;

    if is_json(format) {
        return print_json(&report);
    }

    print_scope_header(&format!("Costs ({})", period), &scope, ctx.registry());
    print_report(ctx, &report);
    Ok(())
}

fn print_report(ctx: &AppContext, report: &CostReport) {
    let mut table = new_table(&["Account", "Name", "Calls", "Messages", "Total"]);
    for account in &report.by_account {
        table.add_row(vec![
            account_cell(ctx.registry(), &account.account_id),
            Cell::new(&account.name),
            cost_cell(account.calls_cost),
            cost_cell(account.messages_cost),
            cost_cell(account.total_cost).fg(Color::Green),
        ]);
    }
    println!("{table}");

    println!();
    println!("{}", "Summary".cyan().bold());
    println!("  Calls:    {}", format_cost(report.breakdown.calls));
    println!("  Messages: {}", format_cost(report.breakdown.messages));
    println!(
        "  {} {}",
        "Total:".bold(),
        format_cost(report.total_cost).green().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(0.0), "$0.00");
        assert_eq!(format_cost(12.3456), "$12.35");
    }
}
