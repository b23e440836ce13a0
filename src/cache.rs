use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ticket::{RawTicketRecord, TicketKey};
use crate::error::FetchResult;
use crate::services::IssueTrackerService;

/// Fetched records for one run. A `None` entry remembers a failed fetch.
#[derive(Debug, Default)]
pub struct TicketCache {
    entries: HashMap<TicketKey, Option<Arc<RawTicketRecord>>>,
}

impl TicketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TicketKey) -> Option<&Option<Arc<RawTicketRecord>>> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: TicketKey, record: Option<Arc<RawTicketRecord>>) {
        self.entries.insert(key, record);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads tickets through the tracker at most once per key.
pub struct CachedFetcher<'a> {
    tracker: &'a dyn IssueTrackerService,
    cache: TicketCache,
    fetches: usize,
}

impl<'a> CachedFetcher<'a> {
    pub fn new(tracker: &'a dyn IssueTrackerService) -> Self {
        Self {
            tracker,
            cache: TicketCache::new(),
            fetches: 0,
        }
    }

    pub fn tracker(&self) -> &'a dyn IssueTrackerService {
        self.tracker
    }

    /// Network reads issued so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    #[cfg(test)]
    pub fn cache(&self) -> &TicketCache {
        &self.cache
    }

    /// Returns the record, or `None` when it cannot be read. Failures are
    /// logged and remembered, never raised.
    pub async fn fetch(&mut self, key: &TicketKey) -> Option<Arc<RawTicketRecord>> {
        if let Some(cached) = self.cache.get(key) {
            tracing::debug!(ticket = %key, hit = cached.is_some(), "ticket cache hit");
            return cached.clone();
        }

        self.fetches += 1;
        let record = match self.tracker.fetch_ticket(key).await {
            Ok(record) => Some(Arc::new(record)),
            Err(err) => {
                tracing::warn!(ticket = %key, "failed to retrieve ticket: {err}");
                None
            }
        };
        self.cache.insert(key.clone(), record.clone());
        record
    }

    /// Like [`fetch`](Self::fetch) but hands the error back to the caller.
    /// Only successful reads are cached.
    pub async fn fetch_strict(&mut self, key: &TicketKey) -> FetchResult<Arc<RawTicketRecord>> {
        if let Some(Some(cached)) = self.cache.get(key) {
            return Ok(cached.clone());
        }

        self.fetches += 1;
        let record = Arc::new(self.tracker.fetch_ticket(key).await?);
        self.cache.insert(key.clone(), Some(record.clone()));
        Ok(record)
    }

    /// Tickets whose parent link points at `key`. Search failures yield
    /// nothing.
    pub async fn search_children(&self, key: &TicketKey) -> Vec<TicketKey> {
        match self.tracker.search_children(key).await {
            Ok(children) => children,
            Err(err) => {
                tracing::warn!(ticket = %key, "parent link search failed: {err}");
                Vec::new()
            }
        }
    }
}
