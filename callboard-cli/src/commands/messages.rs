use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use callboard_core::MessageFilter;

use super::{
    account_cell, account_label, format_date, format_status, is_json, new_table, or_dash,
    parse_optional_date, print_json, print_scope_header, truncate_string,
};
use crate::context::AppContext;

#[derive(Subcommand)]
pub enum MessagesCommand {
    #[command(about = "List recent messages, newest first")]
    List {
        #[arg(long, help = "Only messages from this number")]
        from: Option<String>,

        #[arg(long, help = "Only messages to this number")]
        to: Option<String>,

        #[arg(long, help = "Sent on or after (YYYY-MM-DD or RFC 3339)")]
        start: Option<String>,

        #[arg(long, help = "Sent on or before (YYYY-MM-DD or RFC 3339)")]
        end: Option<String>,

        #[arg(short, long, help = "Maximum messages per account")]
        limit: Option<u32>,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Show one message with its media")]
    Show {
        #[arg(help = "Message SID")]
        sid: String,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },
}

pub async fn handle_messages_command(
    ctx: &AppContext,
    cmd: Option<MessagesCommand>,
) -> Result<()> {
    match cmd.unwrap_or(MessagesCommand::List {
        from: None,
        to: None,
        start: None,
        end: None,
        limit: None,
        format: "text".to_string(),
    }) {
        MessagesCommand::List {
            from,
            to,
            start,
            end,
            limit,
            format,
        } => {
            let filter = MessageFilter {
                from,
                to,
                sent_after: parse_optional_date(start.as_deref())?,
                sent_before: parse_optional_date(end.as_deref())?,
                limit: Some(limit.unwrap_or(ctx.default_limit())),
            };
            cmd_messages_list(ctx, &filter, &format).await
        }
        MessagesCommand::Show { sid, format } => cmd_messages_show(ctx, &sid, &format).await,
    }
}

async fn cmd_messages_list(ctx: &AppContext, filter: &MessageFilter, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let messages = ctx.board.fanout.list_messages(&scope, filter).await?;

    if is_json(format) {
        return print_json(&messages);
    }

    let registry = ctx.registry();
    print_scope_header("Messages", &scope, registry);

    if messages.is_empty() {
        println!("{}", "No messages found.".yellow());
        return Ok(());
    }

    let mut table = new_table(&[
        "SID", "Account", "From", "To", "Status", "Body", "Sent", "Price",
    ]);
    for message in &messages {
        let record = &message.record;
        table.add_row(vec![
            Cell::new(&record.sid),
            account_cell(registry, &message.account_id),
            Cell::new(&record.from),
            Cell::new(&record.to),
            format_status(&record.status),
            Cell::new(truncate_string(&record.body, 40)),
            Cell::new(format_date(record.date_sent.or(record.date_created))),
            Cell::new(or_dash(record.price.as_deref())).fg(Color::Yellow),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} {} message(s)", "→".blue(), messages.len());

    Ok(())
}

async fn cmd_messages_show(ctx: &AppContext, sid: &str, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let detail = ctx.board.resolver.message_detail(&scope, sid).await?;

    if is_json(format) {
        return print_json(&detail);
    }

    let registry = ctx.registry();
    let message = &detail.record.message;

    println!("{}", format!("Message {}", message.sid).cyan().bold());
    println!();
    println!("  Account:    {}", account_label(registry, &detail.account_id));
    println!("  From:       {}", message.from);
    println!("  To:         {}", message.to);
    println!("  Status:     {}", message.status);
    println!("  Direction:  {}", message.direction);
    println!("  Sent:       {}", format_date(message.date_sent));
    println!("  Created:    {}", format_date(message.date_created));
    println!(
        "  Segments:   {}",
        message
            .num_segments
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Price:      {} {}",
        or_dash(message.price.as_deref()),
        message.price_unit.as_deref().unwrap_or("")
    );
    if let Some(code) = message.error_code {
        println!(
            "  {}      {} {}",
            "Error:".red(),
            code,
            message.error_message.as_deref().unwrap_or("")
        );
    }
    println!();
    println!("  {}", message.body);
    println!();

    let media = &detail.record.media;
    if media.is_empty() {
        println!("{}", "No media.".dimmed());
        return Ok(());
    }

    let mut table = new_table(&["Media", "Content Type", "URL"]);
    for item in media {
        table.add_row(vec![
            Cell::new(&item.sid),
            Cell::new(&item.content_type),
            Cell::new(&item.url),
        ]);
    }
    println!("{table}");

    Ok(())
}
