use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use callboard_core::AlertFilter;

use super::{
    account_cell, account_label, format_date, is_json, new_table, or_dash, parse_optional_date,
    print_json, print_scope_header, truncate_string,
};
use crate::context::AppContext;

#[derive(Subcommand)]
pub enum AlertsCommand {
    #[command(about = "List debugger alerts, newest first")]
    List {
        #[arg(long, help = "Only alerts at this level (error, warning, notice, debug)")]
        log_level: Option<String>,

        #[arg(long, help = "Created on or after (YYYY-MM-DD or RFC 3339)")]
        start: Option<String>,

        #[arg(long, help = "Created on or before (YYYY-MM-DD or RFC 3339)")]
        end: Option<String>,

        #[arg(short, long, help = "Maximum alerts per account")]
        limit: Option<u32>,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Show one alert with its request and response")]
    Show {
        #[arg(help = "Alert SID")]
        sid: String,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },
}

pub async fn handle_alerts_command(ctx: &AppContext, cmd: Option<AlertsCommand>) -> Result<()> {
    match cmd.unwrap_or(AlertsCommand::List {
        log_level: None,
        start: None,
        end: None,
        limit: None,
        format: "text".to_string(),
    }) {
        AlertsCommand::List {
            log_level,
            start,
            end,
            limit,
            format,
        } => {
            let filter = AlertFilter {
                log_level,
                start_date: parse_optional_date(start.as_deref())?,
                end_date: parse_optional_date(end.as_deref())?,
                limit: Some(limit.unwrap_or(ctx.default_limit())),
            };
            cmd_alerts_list(ctx, &filter, &format).await
        }
        AlertsCommand::Show { sid, format } => cmd_alerts_show(ctx, &sid, &format).await,
    }
}

fn level_color(level: &str) -> Color {
    match level {
        "error" => Color::Red,
        "warning" => Color::Yellow,
        "notice" => Color::Blue,
        _ => Color::White,
    }
}

async fn cmd_alerts_list(ctx: &AppContext, filter: &AlertFilter, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let alerts = ctx.board.fanout.list_alerts(&scope, filter).await?;

    if is_json(format) {
        return print_json(&alerts);
    }

    let registry = ctx.registry();
    print_scope_header("Alerts", &scope, registry);

    if alerts.is_empty() {
        println!("{}", "No alerts.".green());
        return Ok(());
    }

    let mut table = new_table(&["SID", "Account", "Level", "Code", "Text", "Created"]);
    for alert in &alerts {
        let record = &alert.record;
        table.add_row(vec![
            Cell::new(&record.sid),
            account_cell(registry, &alert.account_id),
            Cell::new(&record.log_level).fg(level_color(&record.log_level)),
            Cell::new(or_dash(record.error_code.as_deref())),
            Cell::new(truncate_string(
                record.alert_text.as_deref().unwrap_or(""),
                50,
            )),
            Cell::new(format_date(record.date_created)),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} {} alert(s)", "→".blue(), alerts.len());

    Ok(())
}

async fn cmd_alerts_show(ctx: &AppContext, sid: &str, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let alert = ctx.board.resolver.alert_detail(&scope, sid).await?;

    if is_json(format) {
        return print_json(&alert);
    }

    let record = &alert.record;
    println!("{}", format!("Alert {}", record.sid).cyan().bold());
    println!();
    println!("  Account:   {}", account_label(ctx.registry(), &alert.account_id));
    println!("  Level:     {}", record.log_level);
    println!("  Code:      {}", or_dash(record.error_code.as_deref()));
    println!("  Created:   {}", format_date(record.date_created));
    println!("  Resource:  {}", or_dash(record.resource_sid.as_deref()));
    println!(
        "  Request:   {} {}",
        or_dash(record.request_method.as_deref()),
        or_dash(record.request_url.as_deref())
    );
    if let Some(more_info) = &record.more_info {
        println!("  More info: {}", more_info.dimmed());
    }
    if let Some(text) = &record.alert_text {
        println!();
        println!("  {}", text);
    }

    for (label, value) in [
        ("Request variables", &record.request_variables),
        ("Response headers", &record.response_headers),
        ("Response body", &record.response_body),
    ] {
        if let Some(value) = value {
            println!();
            println!("  {}", label.yellow().bold());
            println!("{}", value);
        }
    }

    Ok(())
}
