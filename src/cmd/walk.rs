use secrecy::{ExposeSecret, SecretString};

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::ticket::TicketKey;
use crate::domain::tracker::TrackerKind;
use crate::error::{AppError, AppResult};
use crate::workflow::traversal::{TraversalOptions, TraversalReport};
use crate::workflow::walk::walk_ticket_graph;

#[derive(Debug, Clone)]
pub struct WalkCommandArgs {
    pub root: TicketKey,
    pub parent_search: bool,
}

pub async fn run(ctx: &AppContext, args: WalkCommandArgs) -> AppResult<TraversalReport> {
    let options = TraversalOptions {
        parent_search: args.parent_search,
    };
    walk_ticket_graph(ctx, args.root, options).await
}

pub struct Credentials {
    pub user: String,
    pub token: SecretString,
}

/// Picks the account and token from flags, then config, then `ask`.
/// Jira needs an account; Azure tokens work with an empty one.
pub fn resolve_credentials(
    config: &AppConfig,
    tracker: TrackerKind,
    user_flag: Option<String>,
    token_flag: Option<String>,
    mut ask: Option<&mut dyn FnMut(&str) -> AppResult<String>>,
) -> AppResult<Credentials> {
    let user = match user_flag.or_else(|| config.user_for(tracker).map(str::to_string)) {
        Some(user) => user,
        None if tracker == TrackerKind::Azure => String::new(),
        None => match ask.as_mut() {
            Some(ask) => ask("Jira email (username)")?,
            None => {
                return Err(AppError::Configuration(
                    "no Jira email configured; pass --user or run `tangle config init`"
                        .to_string(),
                ));
            }
        },
    };

    let token = match token_flag {
        Some(token) => SecretString::from(token),
        None => match config.token_for(tracker) {
            Some(token) => SecretString::from(token.expose_secret().to_string()),
            None => {
                let label = match tracker {
                    TrackerKind::Jira => "Jira API token",
                    TrackerKind::Azure => "Azure DevOps personal access token",
                };
                let entered = match ask.as_mut() {
                    Some(ask) => ask(label)?,
                    None => String::new(),
                };
                if entered.is_empty() {
                    return Err(AppError::Configuration(format!("no {label} provided")));
                }
                SecretString::from(entered)
            }
        },
    };

    Ok(Credentials { user, token })
}
