mod cache;
mod cmd;
mod config;
mod context;
mod display;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::prompt::prompt_value;
use crate::cmd::walk::{self, Credentials, WalkCommandArgs, resolve_credentials};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::display::{OutputFormat, render};
use crate::domain::tracker::{TrackerKind, TrackerLink};
use crate::error::{AppError, AppResult};
use crate::infra::azure::AzureBoardsClient;
use crate::infra::http::BasicAuth;
use crate::infra::jira::JiraClient;
use crate::services::IssueTrackerService;

#[derive(Parser)]
#[command(
    name = "tangle",
    author,
    version,
    about = "Walk a Jira or Azure Boards ticket graph and print its hierarchy"
)]
struct Cli {
    /// Log traversal details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect a ticket and everything reachable from it.
    Walk(WalkArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct WalkArgs {
    /// Ticket or work item URL to start from.
    link: String,
    /// Account name (Jira email). Azure tokens need none.
    #[arg(short, long)]
    user: Option<String>,
    /// API token or personal access token.
    #[arg(short, long, env = "TANGLE_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Tracker type, when it cannot be told from the link's host.
    #[arg(long)]
    tracker: Option<TrackerKind>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Both)]
    format: OutputFormat,
    /// Skip the per-ticket parent link search.
    #[arg(long)]
    no_parent_search: bool,
    /// Fail instead of prompting for missing credentials.
    #[arg(long)]
    no_prompt: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run(cli.command).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tangle=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tangle=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands) -> AppResult<()> {
    match command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(())
        }
        Commands::Walk(args) => run_walk(args).await,
    }
}

async fn run_walk(args: WalkArgs) -> AppResult<()> {
    let link = TrackerLink::parse(&args.link, args.tracker).ok_or_else(|| {
        AppError::InvalidLinkFormat(format!(
            "'{}' does not point at a Jira issue or Azure Boards work item",
            args.link
        ))
    })?;
    tracing::debug!(
        tracker = %link.tracker,
        base_url = %link.base_url,
        project = ?link.project,
        root = %link.key,
        "parsed link"
    );

    let config = AppConfig::load()?;

    let mut prompt = prompt_value;
    let ask: Option<&mut dyn FnMut(&str) -> AppResult<String>> =
        if args.no_prompt { None } else { Some(&mut prompt) };
    let credentials = resolve_credentials(&config, link.tracker, args.user, args.token, ask)?;

    let parent_search = config.parent_search && !args.no_parent_search;
    let issue_tracker = build_tracker(&link, credentials, &config, parent_search);
    let context = AppContext::new(config, issue_tracker);

    let report = walk::run(
        &context,
        WalkCommandArgs {
            root: link.key,
            parent_search,
        },
    )
    .await?;

    println!("{}", render(&report, args.format)?);
    Ok(())
}

fn build_tracker(
    link: &TrackerLink,
    credentials: Credentials,
    config: &AppConfig,
    parent_search: bool,
) -> Arc<dyn IssueTrackerService> {
    let auth = BasicAuth::new(credentials.user, credentials.token);
    match link.tracker {
        TrackerKind::Jira => Arc::new(JiraClient::new(
            &link.base_url,
            auth,
            parent_search.then(|| config.parent_search_jql.clone()),
        )),
        TrackerKind::Azure => Arc::new(AzureBoardsClient::new(&link.base_url, auth)),
    }
}
