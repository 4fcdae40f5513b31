use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use callboard_core::{CallboardConfig, CallboardError, CliErrorDisplay, LoggingConfig};

mod commands;
mod context;

use commands::{
    handle_accounts_command, handle_activity_command, handle_alerts_command,
    handle_calls_command, handle_costs_command, handle_messages_command, handle_numbers_command,
    handle_staleness_command, handle_stats_command, handle_webhooks_command, AlertsCommand,
    CallsCommand, MessagesCommand, NumbersCommand, WebhooksCommand,
};
use context::AppContext;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "callboard")]
#[command(author = "Rohit Ghumare <ghumare64@gmail.com>")]
#[command(version = VERSION)]
#[command(about = "Callboard - calls, messages, numbers and costs across telephony accounts")]
#[command(long_about = r#"
Callboard reads calls, messages, phone numbers and debugger alerts from one or
more provider accounts and merges them into a single view. It also flags
numbers with no recent activity, estimates spend and checks webhook health.

Accounts are read from accounts.json (see accounts.path in callboard.toml).
Commands act on the first account unless --account names another one or
'all'.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        short,
        long,
        global = true,
        env = "CALLBOARD_ACCOUNT",
        help = "Account id, or 'all' for every account"
    )]
    account: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List configured accounts")]
    Accounts {
        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "List and inspect calls")]
    Calls {
        #[command(subcommand)]
        action: Option<CallsCommand>,
    },

    #[command(about = "List and inspect messages")]
    Messages {
        #[command(subcommand)]
        action: Option<MessagesCommand>,
    },

    #[command(about = "List, inspect, update and release phone numbers")]
    Numbers {
        #[command(subcommand)]
        action: Option<NumbersCommand>,
    },

    #[command(about = "List and inspect debugger alerts")]
    Alerts {
        #[command(subcommand)]
        action: Option<AlertsCommand>,
    },

    #[command(about = "Show number, call and message counts")]
    Stats {
        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Show the latest calls and messages")]
    Activity {
        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Find numbers and accounts with no recent activity")]
    Staleness {
        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Estimate call and message spend")]
    Costs {
        #[arg(
            short,
            long,
            default_value = "30d",
            help = "Time period (7d, 30d, 90d, all)"
        )]
        period: String,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Check configured webhook endpoints")]
    Webhooks {
        #[command(subcommand)]
        action: WebhooksCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CallboardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.verbose, &LoggingConfig::default());
            report_error(&anyhow::Error::new(CallboardError::from(e)));
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose, &config.logging);

    match run(cli, config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<CallboardError>() {
        Some(e) => eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(e)),
        None => eprintln!("{}: {}", "Error".red().bold(), error),
    }
}

async fn run(cli: Cli, config: CallboardConfig) -> anyhow::Result<()> {
    let ctx = AppContext::new(config, cli.account.as_deref())?;

    match cli.command {
        Commands::Accounts { format } => handle_accounts_command(&ctx, &format),
        Commands::Calls { action } => handle_calls_command(&ctx, action).await,
        Commands::Messages { action } => handle_messages_command(&ctx, action).await,
        Commands::Numbers { action } => handle_numbers_command(&ctx, action).await,
        Commands::Alerts { action } => handle_alerts_command(&ctx, action).await,
        Commands::Stats { format } => handle_stats_command(&ctx, &format).await,
        Commands::Activity { format } => handle_activity_command(&ctx, &format).await,
        Commands::Staleness { format } => handle_staleness_command(&ctx, &format).await,
        Commands::Costs { period, format } => handle_costs_command(&ctx, &period, &format).await,
        Commands::Webhooks { action } => handle_webhooks_command(&ctx, action).await,
    }
}
