use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use callboard_core::{ProbeStatus, WebhookKind, WebhookProbeResult};

use super::{is_json, print_json};
use crate::context::AppContext;

#[derive(Subcommand)]
pub enum WebhooksCommand {
    #[command(about = "Send a test event to a webhook configured on one of your numbers")]
    Test {
        #[arg(long, help = "Webhook URL, exactly as configured on the number")]
        url: String,

        #[arg(long, default_value = "voice", help = "Event type (voice, sms)")]
        kind: String,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },
}

pub async fn handle_webhooks_command(ctx: &AppContext, cmd: WebhooksCommand) -> Result<()> {
    match cmd {
        WebhooksCommand::Test { url, kind, format } => {
            let kind: WebhookKind = kind.parse()?;
            cmd_webhooks_test(ctx, &url, kind, &format).await
        }
    }
}

async fn cmd_webhooks_test(
    ctx: &AppContext,
    url: &str,
    kind: WebhookKind,
    format: &str,
) -> Result<()> {
    let scope = ctx.scope()?;
    let result = ctx.board.webhooks.test(&scope, url, kind).await?;

    if is_json(format) {
        return print_json(&result);
    }

    print_result(url, kind, &result);
    Ok(())
}

fn print_result(url: &str, kind: WebhookKind, result: &WebhookProbeResult) {
    println!("{}", "Webhook Test".cyan().bold());
    println!("  {} {} ({})", "→".blue(), url, kind);
    println!();

    let status = match result.status {
        ProbeStatus::Healthy => format!("✓ {}", result.status).green().bold(),
        ProbeStatus::Unhealthy => format!("✗ {}", result.status).red().bold(),
        ProbeStatus::Unreachable => format!("✗ {}", result.status).yellow().bold(),
    };
    println!("  Status:        {}", status);

    if let Some(code) = result.http_status {
        println!("  HTTP status:   {}", code);
    }
    println!("  Response time: {}ms", result.response_time_ms);

    if let Some(error) = &result.error {
        println!("  Error:         {}", error.dimmed());
    }
}
