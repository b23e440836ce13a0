use async_trait::async_trait;

use crate::domain::ticket::{RawTicketRecord, TicketKey};
use crate::domain::tracker::TrackerKind;
use crate::error::FetchResult;

/// What the credentials can see, as reported by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountScope {
    pub account: Option<String>,
    /// Projects visible to the account, for trackers that list them.
    pub projects: Option<Vec<String>>,
}

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    fn tracker(&self) -> TrackerKind;

    /// Confirms the credentials are accepted by the tracker instance.
    async fn verify_credentials(&self) -> FetchResult<AccountScope>;

    /// One read of one ticket, relations included.
    async fn fetch_ticket(&self, key: &TicketKey) -> FetchResult<RawTicketRecord>;

    /// Keys of tickets whose parent link field names `key`. Trackers that
    /// expose children on the record itself need no search.
    async fn search_children(&self, _key: &TicketKey) -> FetchResult<Vec<TicketKey>> {
        Ok(Vec::new())
    }

    /// Project a fetched record belongs to, when the tracker records one.
    fn owning_project(&self, _record: &RawTicketRecord) -> Option<String> {
        None
    }
}
