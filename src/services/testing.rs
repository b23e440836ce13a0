//! In-memory tracker for exercising the traversal without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::domain::ticket::{RawTicketRecord, TicketKey};
use crate::domain::tracker::TrackerKind;
use crate::error::{FetchError, FetchResult};
use crate::services::{AccountScope, IssueTrackerService};

pub struct FakeTracker {
    kind: TrackerKind,
    records: HashMap<String, Value>,
    failures: HashMap<String, StatusCode>,
    searches: HashMap<String, Vec<String>>,
    scope: FetchResult<AccountScope>,
    fetch_counts: Mutex<HashMap<String, usize>>,
    search_counts: Mutex<HashMap<String, usize>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self {
            kind: TrackerKind::Jira,
            records: HashMap::new(),
            failures: HashMap::new(),
            searches: HashMap::new(),
            scope: Ok(AccountScope::default()),
            fetch_counts: Mutex::new(HashMap::new()),
            search_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_kind(mut self, kind: TrackerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Jira-shaped story whose subtasks are `children`.
    pub fn with_ticket(mut self, key: &str, children: &[&str]) -> Self {
        let subtasks: Vec<Value> = children.iter().map(|child| json!({ "key": child })).collect();
        self.records.insert(
            key.to_string(),
            json!({
                "key": key,
                "fields": {
                    "summary": format!("Ticket {key}"),
                    "issuetype": { "name": "Story" },
                    "status": { "name": "Open" },
                    "description": format!("<p>About {key}</p>"),
                    "subtasks": subtasks,
                    "issuelinks": []
                }
            }),
        );
        self
    }

    /// Adds outward issue links to an existing ticket.
    pub fn with_links(mut self, key: &str, linked: &[&str]) -> Self {
        let links = self
            .records
            .get_mut(key)
            .and_then(|record| record.pointer_mut("/fields/issuelinks"))
            .and_then(Value::as_array_mut)
            .expect("ticket registered before links");
        links.extend(linked.iter().map(|other| json!({ "outwardIssue": { "key": other } })));
        self
    }

    pub fn with_record(mut self, key: &str, record: Value) -> Self {
        self.records.insert(key.to_string(), record);
        self
    }

    pub fn with_failure(mut self, key: &str, status: StatusCode) -> Self {
        self.failures.insert(key.to_string(), status);
        self
    }

    pub fn with_search(mut self, key: &str, children: &[&str]) -> Self {
        self.searches.insert(
            key.to_string(),
            children.iter().map(|child| child.to_string()).collect(),
        );
        self
    }

    pub fn with_scope(mut self, scope: FetchResult<AccountScope>) -> Self {
        self.scope = scope;
        self
    }

    pub fn fetch_count(&self, key: &str) -> usize {
        self.fetch_counts.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetch_counts.lock().unwrap().values().sum()
    }

    pub fn search_count(&self, key: &str) -> usize {
        self.search_counts.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

fn status_error(status: StatusCode) -> FetchError {
    FetchError::Status {
        status,
        body: String::new(),
    }
}

#[async_trait]
impl IssueTrackerService for FakeTracker {
    fn tracker(&self) -> TrackerKind {
        self.kind
    }

    async fn verify_credentials(&self) -> FetchResult<AccountScope> {
        match &self.scope {
            Ok(scope) => Ok(scope.clone()),
            Err(err) => Err(status_error(err.status().unwrap_or(StatusCode::UNAUTHORIZED))),
        }
    }

    async fn fetch_ticket(&self, key: &TicketKey) -> FetchResult<RawTicketRecord> {
        *self
            .fetch_counts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default() += 1;

        if let Some(status) = self.failures.get(key.as_str()) {
            return Err(status_error(*status));
        }
        self.records
            .get(key.as_str())
            .cloned()
            .map(RawTicketRecord::new)
            .ok_or_else(|| status_error(StatusCode::NOT_FOUND))
    }

    async fn search_children(&self, key: &TicketKey) -> FetchResult<Vec<TicketKey>> {
        *self
            .search_counts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default() += 1;

        Ok(self
            .searches
            .get(key.as_str())
            .map(|children| children.iter().map(|child| TicketKey::from(child.as_str())).collect())
            .unwrap_or_default())
    }

    fn owning_project(&self, record: &RawTicketRecord) -> Option<String> {
        record
            .field("System.TeamProject")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}
