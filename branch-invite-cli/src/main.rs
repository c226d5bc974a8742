use anyhow::{Context, Result};
use branch_invite_core::config::{Config, LoadConfig};
use branch_invite_core::logging::{init_logging_with_config, LogFormat, LogLevel};
use branch_invite_core::provider::SendAction;
use branch_invite_core::{
    CompletionEvent, Contact, InviteContactProvider, ProviderRegistry, Segment, SendError,
    StaticProvider,
};
use clap::{Parser, Subcommand, ValueEnum};
use fixture::ProviderFixture;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod fixture;

#[derive(Parser, Debug)]
#[command(name = "branch-invite")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long, global = true)]
    json_logs: bool,

    /// TOML configuration file; BRANCH_INVITE_* variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every provider in a fixture and print one segment per provider
    Segments {
        /// JSON file describing the providers
        #[arg(short, long)]
        fixture: PathBuf,
    },
    /// Load a fixture, invite contacts through one channel and print the outcome
    Send {
        /// JSON file describing the providers
        #[arg(short, long)]
        fixture: PathBuf,

        /// Channel to send through
        #[arg(long)]
        channel: String,

        /// Handles of the contacts to invite, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        select: Vec<String>,

        /// Link embedded in the invite
        #[arg(long)]
        invite_url: String,

        /// What the simulated user does in the sending UI
        #[arg(long, value_enum, default_value_t = Action::Sent)]
        action: Action,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Sent,
    Cancel,
    Fail,
}

impl Action {
    fn to_send_action(self) -> SendAction {
        match self {
            Action::Sent => SendAction::Send,
            Action::Cancel => SendAction::Cancel,
            Action::Fail => SendAction::Fail(SendError::Rejected(
                "The channel refused the invite".to_string(),
            )),
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    if let Some(level) = &args.log_level {
        match LogLevel::parse(level) {
            Some(_) => config.logging.level = level.clone(),
            None => eprintln!(
                "Invalid log level '{}', using '{}'",
                level, config.logging.level
            ),
        }
    }
    if args.json_logs {
        config.logging.format = LogFormat::Json;
    }

    Ok(config)
}

/// Register every fixture provider with a fresh registry
fn build_session(
    fixtures: Vec<ProviderFixture>,
    config: LoadConfig,
) -> Result<(ProviderRegistry, Vec<Arc<StaticProvider>>)> {
    let registry = ProviderRegistry::new(config);
    let mut providers = Vec::with_capacity(fixtures.len());

    for fixture in fixtures {
        let provider = Arc::new(fixture.into_provider());
        registry.register(provider.clone())?;
        providers.push(provider);
    }

    info!(
        session = %registry.session_id(),
        providers = providers.len(),
        "Session ready"
    );
    Ok((registry, providers))
}

async fn load_segments(fixtures: Vec<ProviderFixture>, config: LoadConfig) -> Result<Vec<Segment>> {
    let (registry, _providers) = build_session(fixtures, config)?;

    for report in registry.load_all().await {
        match &report.status {
            Ok(()) => info!(
                channel = %report.channel,
                contacts = report.contact_count,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Provider loaded"
            ),
            Err(e) => warn!(
                channel = %report.channel,
                error = %e,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Provider failed to load"
            ),
        }
    }

    Ok(registry.segments())
}

async fn send_invite(
    fixtures: Vec<ProviderFixture>,
    config: LoadConfig,
    channel: &str,
    handles: &[String],
    invite_url: &str,
    action: Action,
) -> Result<CompletionEvent> {
    let (registry, providers) = build_session(fixtures, config)?;
    if let Some(provider) = providers.iter().find(|p| p.channel().as_str() == channel) {
        provider.set_send_action(action.to_send_action());
    }

    let mut events = registry.completion_events()?;
    registry.load_all().await;

    let snapshot = registry
        .provider(channel)
        .map(|p| p.contacts())
        .unwrap_or_default();
    // Unknown handles are passed through so the registry reports them
    let selection: Vec<Contact> = handles
        .iter()
        .map(|handle| {
            snapshot
                .iter()
                .find(|c| c.handle().as_str() == handle)
                .cloned()
                .unwrap_or_else(|| Contact::new(handle.as_str(), handle.as_str()))
        })
        .collect();

    let controller = registry
        .sending_controller(channel, &selection, invite_url)
        .with_context(|| format!("Cannot send invites through '{}'", channel))?;
    controller.present().await;

    events
        .next()
        .await
        .context("Completion stream closed without an outcome")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;
    init_logging_with_config(config.logging.to_log_config()?)?;

    info!("Branch invite CLI started");

    match args.command {
        Command::Segments { fixture } => {
            let fixtures = fixture::load(&fixture)?;
            let segments = load_segments(fixtures, config.load).await?;
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
        Command::Send {
            fixture,
            channel,
            select,
            invite_url,
            action,
        } => {
            let fixtures = fixture::load(&fixture)?;
            let event =
                send_invite(fixtures, config.load, &channel, &select, &invite_url, action).await?;

            info!(channel = %event.channel, outcome = %event.outcome, "Invite flow finished");
            let summary = serde_json::json!({
                "channel": event.channel,
                "outcome": event.outcome.to_string(),
                "sent": event.outcome.is_sent(),
                "error": event.outcome.is_error(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
