use crate::cache::CachedFetcher;
use crate::context::AppContext;
use crate::domain::fields::{FieldNormalizer, FieldTable};
use crate::domain::ticket::TicketKey;
use crate::error::AppResult;
use crate::workflow::access::validate_access;
use crate::workflow::traversal::{TraversalOptions, TraversalReport, TraversalSession};

pub async fn walk_ticket_graph(
    ctx: &AppContext,
    root: TicketKey,
    options: TraversalOptions,
) -> AppResult<TraversalReport> {
    let tracker = ctx.issue_tracker.as_ref();
    let mut fetcher = CachedFetcher::new(tracker);

    validate_access(&mut fetcher, &root).await?;

    let table = FieldTable::for_tracker(
        tracker.tracker(),
        ctx.config.acceptance_criteria_field.as_deref(),
    );
    let session = TraversalSession::new(fetcher, FieldNormalizer::new(table), options);
    let report = session.run(root).await;

    if !report.pruned.is_empty() {
        tracing::warn!(
            count = report.pruned.len(),
            keys = ?report.pruned,
            "some linked tickets could not be read and were left out"
        );
    }
    tracing::info!(
        tickets = report.descriptions.len(),
        fetches = report.fetches,
        "walk complete"
    );

    Ok(report)
}
