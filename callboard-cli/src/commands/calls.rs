use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use callboard_core::CallFilter;

use super::{
    account_cell, account_label, format_date, format_status, is_json, new_table, or_dash,
    parse_optional_date, print_json, print_scope_header,
};
use crate::context::AppContext;

#[derive(Subcommand)]
pub enum CallsCommand {
    #[command(about = "List recent calls, newest first")]
    List {
        #[arg(long, help = "Only calls with this status (e.g. completed, busy)")]
        status: Option<String>,

        #[arg(long, help = "Only calls from this number")]
        from: Option<String>,

        #[arg(long, help = "Only calls to this number")]
        to: Option<String>,

        #[arg(long, help = "Started on or after (YYYY-MM-DD or RFC 3339)")]
        start: Option<String>,

        #[arg(long, help = "Started on or before (YYYY-MM-DD or RFC 3339)")]
        end: Option<String>,

        #[arg(short, long, help = "Maximum calls per account")]
        limit: Option<u32>,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Show one call with its recordings")]
    Show {
        #[arg(help = "Call SID")]
        sid: String,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },
}

pub async fn handle_calls_command(ctx: &AppContext, cmd: Option<CallsCommand>) -> Result<()> {
    match cmd.unwrap_or(CallsCommand::List {
        status: None,
        from: None,
        to: None,
        start: None,
        end: None,
        limit: None,
        format: "text".to_string(),
    }) {
        CallsCommand::List {
            status,
            from,
            to,
            start,
            end,
            limit,
            format,
        } => {
            let filter = CallFilter {
                status,
                from,
                to,
                start_after: parse_optional_date(start.as_deref())?,
                start_before: parse_optional_date(end.as_deref())?,
                limit: Some(limit.unwrap_or(ctx.default_limit())),
            };
            cmd_calls_list(ctx, &filter, &format).await
        }
        CallsCommand::Show { sid, format } => cmd_calls_show(ctx, &sid, &format).await,
    }
}

async fn cmd_calls_list(ctx: &AppContext, filter: &CallFilter, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let calls = ctx.board.fanout.list_calls(&scope, filter).await?;

    if is_json(format) {
        return print_json(&calls);
    }

    let registry = ctx.registry();
    print_scope_header("Calls", &scope, registry);

    if calls.is_empty() {
        println!("{}", "No calls found.".yellow());
        return Ok(());
    }

    let mut table = new_table(&[
        "SID", "Account", "From", "To", "Status", "Direction", "Duration", "Started", "Price",
    ]);
    for call in &calls {
        let record = &call.record;
        table.add_row(vec![
            Cell::new(&record.sid),
            account_cell(registry, &call.account_id),
            Cell::new(&record.from),
            Cell::new(&record.to),
            format_status(&record.status),
            Cell::new(&record.direction),
            Cell::new(
                record
                    .duration
                    .map(|d| format!("{}s", d))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format_date(record.start_time)),
            Cell::new(or_dash(record.price.as_deref())).fg(Color::Yellow),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} {} call(s)", "→".blue(), calls.len());

    Ok(())
}

async fn cmd_calls_show(ctx: &AppContext, sid: &str, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let detail = ctx.board.resolver.call_detail(&scope, sid).await?;

    if is_json(format) {
        return print_json(&detail);
    }

    let registry = ctx.registry();
    let call = &detail.record.call;

    println!("{}", format!("Call {}", call.sid).cyan().bold());
    println!();
    println!("  Account:    {}", account_label(registry, &detail.account_id));
    println!("  From:       {}", call.from);
    println!("  To:         {}", call.to);
    println!("  Status:     {}", call.status);
    println!("  Direction:  {}", call.direction);
    println!(
        "  Duration:   {}",
        call.duration
            .map(|d| format!("{}s", d))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  Started:    {}", format_date(call.start_time));
    println!("  Ended:      {}", format_date(call.end_time));
    println!(
        "  Price:      {} {}",
        or_dash(call.price.as_deref()),
        call.price_unit.as_deref().unwrap_or("")
    );
    if let Some(answered_by) = &call.answered_by {
        println!("  Answered:   {}", answered_by);
    }
    if let Some(caller_name) = &call.caller_name {
        println!("  Caller:     {}", caller_name);
    }
    println!();

    let recordings = &detail.record.recordings;
    if recordings.is_empty() {
        println!("{}", "No recordings.".dimmed());
        return Ok(());
    }

    let mut table = new_table(&["Recording", "Duration", "Created", "URL"]);
    for recording in recordings {
        table.add_row(vec![
            Cell::new(&recording.sid),
            Cell::new(
                recording
                    .duration
                    .map(|d| format!("{}s", d))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format_date(recording.date_created)),
            Cell::new(&recording.url),
        ]);
    }
    println!("{table}");

    Ok(())
}
