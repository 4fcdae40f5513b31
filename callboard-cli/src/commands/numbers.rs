use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{Cell, Color};

use callboard_core::{NumberCapabilities, NumberUpdate, PhoneNumber};

use super::{
    account_cell, account_label, format_date, is_json, new_table, or_dash, print_json,
    print_scope_header,
};
use crate::context::AppContext;

#[derive(Subcommand)]
pub enum NumbersCommand {
    #[command(about = "List phone numbers")]
    List {
        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Show one phone number")]
    Show {
        #[arg(help = "Phone number SID")]
        sid: String,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Change the webhooks or name of a phone number")]
    Update {
        #[arg(help = "Phone number SID")]
        sid: String,

        #[arg(long)]
        voice_url: Option<String>,

        #[arg(long, help = "GET or POST")]
        voice_method: Option<String>,

        #[arg(long)]
        sms_url: Option<String>,

        #[arg(long, help = "GET or POST")]
        sms_method: Option<String>,

        #[arg(long)]
        status_callback: Option<String>,

        #[arg(long, help = "GET or POST")]
        status_callback_method: Option<String>,

        #[arg(long)]
        friendly_name: Option<String>,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Release a phone number from its account")]
    Release {
        #[arg(help = "Phone number SID")]
        sid: String,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },
}

pub async fn handle_numbers_command(ctx: &AppContext, cmd: Option<NumbersCommand>) -> Result<()> {
    match cmd.unwrap_or(NumbersCommand::List {
        format: "text".to_string(),
    }) {
        NumbersCommand::List { format } => cmd_numbers_list(ctx, &format).await,
        NumbersCommand::Show { sid, format } => cmd_numbers_show(ctx, &sid, &format).await,
        NumbersCommand::Update {
            sid,
            voice_url,
            voice_method,
            sms_url,
            sms_method,
            status_callback,
            status_callback_method,
            friendly_name,
            format,
        } => {
            let update = NumberUpdate {
                voice_url,
                voice_method: voice_method.map(|m| m.to_uppercase()),
                sms_url,
                sms_method: sms_method.map(|m| m.to_uppercase()),
                status_callback,
                status_callback_method: status_callback_method.map(|m| m.to_uppercase()),
                friendly_name,
            };
            cmd_numbers_update(ctx, &sid, &update, &format).await
        }
        NumbersCommand::Release { sid, format } => cmd_numbers_release(ctx, &sid, &format).await,
    }
}

fn format_capabilities(caps: &NumberCapabilities) -> String {
    let flags: Vec<&str> = [
        (caps.voice, "voice"),
        (caps.sms, "sms"),
        (caps.mms, "mms"),
        (caps.fax, "fax"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect();

    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(", ")
    }
}

async fn cmd_numbers_list(ctx: &AppContext, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let numbers = ctx.board.fanout.list_numbers(&scope, None).await?;

    if is_json(format) {
        return print_json(&numbers);
    }

    let registry = ctx.registry();
    print_scope_header("Phone Numbers", &scope, registry);

    if numbers.is_empty() {
        println!("{}", "No phone numbers found.".yellow());
        return Ok(());
    }

    let mut table = new_table(&[
        "SID",
        "Account",
        "Number",
        "Name",
        "Voice URL",
        "SMS URL",
        "Capabilities",
    ]);
    for number in &numbers {
        let record = &number.record;
        table.add_row(vec![
            Cell::new(&record.sid),
            account_cell(registry, &number.account_id),
            Cell::new(&record.phone_number).fg(Color::Cyan),
            Cell::new(&record.friendly_name),
            Cell::new(or_dash(record.voice_url.as_deref())),
            Cell::new(or_dash(record.sms_url.as_deref())),
            Cell::new(format_capabilities(&record.capabilities)),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} {} number(s)", "→".blue(), numbers.len());

    Ok(())
}

fn print_number(ctx: &AppContext, account_id: &str, number: &PhoneNumber) {
    println!("{}", format!("Number {}", number.phone_number).cyan().bold());
    println!();
    println!("  SID:              {}", number.sid);
    println!("  Account:          {}", account_label(ctx.registry(), account_id));
    println!("  Name:             {}", number.friendly_name);
    println!(
        "  Voice URL:        {} {}",
        or_dash(number.voice_url.as_deref()),
        number.voice_method.as_deref().unwrap_or("").dimmed()
    );
    println!(
        "  SMS URL:          {} {}",
        or_dash(number.sms_url.as_deref()),
        number.sms_method.as_deref().unwrap_or("").dimmed()
    );
    println!(
        "  Status Callback:  {} {}",
        or_dash(number.status_callback.as_deref()),
        number
            .status_callback_method
            .as_deref()
            .unwrap_or("")
            .dimmed()
    );
    println!(
        "  Capabilities:     {}",
        format_capabilities(&number.capabilities)
    );
    println!("  Created:          {}", format_date(number.date_created));
}

async fn cmd_numbers_show(ctx: &AppContext, sid: &str, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let number = ctx.board.resolver.number_detail(&scope, sid).await?;

    if is_json(format) {
        return print_json(&number);
    }

    print_number(ctx, &number.account_id, &number.record);
    Ok(())
}

async fn cmd_numbers_update(
    ctx: &AppContext,
    sid: &str,
    update: &NumberUpdate,
    format: &str,
) -> Result<()> {
    let scope = ctx.scope()?;
    let number = ctx.board.numbers.update(&scope, sid, update).await?;

    if is_json(format) {
        return print_json(&number);
    }

    println!("  {} Number updated", "✓".green());
    println!();
    print_number(ctx, &number.account_id, &number.record);
    Ok(())
}

async fn cmd_numbers_release(ctx: &AppContext, sid: &str, format: &str) -> Result<()> {
    let scope = ctx.scope()?;
    let account_id = ctx.board.numbers.release(&scope, sid).await?;

    if is_json(format) {
        return print_json(&serde_json::json!({
            "sid": sid,
            "accountId": account_id,
            "released": true,
        }));
    }

    println!(
        "  {} Released {} from {}",
        "✓".green(),
        sid,
        account_label(ctx.registry(), &account_id)
    );
    Ok(())
}
