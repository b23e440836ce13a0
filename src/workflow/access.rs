use reqwest::StatusCode;

use crate::cache::CachedFetcher;
use crate::domain::ticket::TicketKey;
use crate::error::{AppError, AppResult, FetchError};

/// Checks credentials and read access to the root ticket before walking.
/// The root record lands in the fetcher's cache on success.
pub async fn validate_access(fetcher: &mut CachedFetcher<'_>, root: &TicketKey) -> AppResult<()> {
    let tracker = fetcher.tracker();
    let scope = tracker
        .verify_credentials()
        .await
        .map_err(|err| classify(err, &format!("{} credentials were rejected", tracker.tracker())))?;

    if let Some(account) = &scope.account {
        tracing::info!(account = %account, "authenticated");
    }
    if let Some(projects) = &scope.projects
        && projects.is_empty()
    {
        return Err(AppError::AccessDenied(
            "no projects are visible to these credentials".to_string(),
        ));
    }

    let record = fetcher
        .fetch_strict(root)
        .await
        .map_err(|err| classify(err, &format!("cannot read {root}")))?;

    if let (Some(projects), Some(owner)) = (&scope.projects, tracker.owning_project(&record))
        && !projects.iter().any(|project| project == &owner)
    {
        return Err(AppError::AccessDenied(format!(
            "{root} belongs to project '{owner}', which is not part of this organization"
        )));
    }

    Ok(())
}

fn classify(err: FetchError, context: &str) -> AppError {
    match err.status() {
        Some(StatusCode::UNAUTHORIZED | StatusCode::NON_AUTHORITATIVE_INFORMATION) => {
            AppError::AuthenticationFailure(format!("{context}: {err}"))
        }
        Some(StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) => {
            AppError::AccessDenied(format!("{context}: {err}"))
        }
        _ => AppError::IssueTracker(format!("{context}: {err}")),
    }
}
