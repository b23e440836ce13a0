use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::ticket::{RawTicketRecord, TicketKey};
use crate::domain::tracker::TrackerKind;
use crate::error::{FetchError, FetchResult};
use crate::infra::http::{BasicAuth, get_json, trim_base_url};
use crate::services::{AccountScope, IssueTrackerService};

const API_VERSION: &str = "7.0";
const PROJECT_PAGE_SIZE: usize = 1000;

/// Work items are read through the organization-level route, so children
/// living in other projects of the same organization resolve as well.
pub struct AzureBoardsClient {
    http: Client,
    organization_url: String,
    auth: BasicAuth,
}

impl AzureBoardsClient {
    pub fn new(organization_url: &str, auth: BasicAuth) -> Self {
        Self {
            http: Client::new(),
            organization_url: trim_base_url(organization_url),
            auth,
        }
    }

    fn projects_endpoint(&self) -> String {
        format!(
            "{}/_apis/projects?$top={PROJECT_PAGE_SIZE}&api-version={API_VERSION}",
            self.organization_url
        )
    }

    fn work_item_endpoint(&self, id: &TicketKey) -> String {
        format!(
            "{}/_apis/wit/workitems/{id}?$expand=relations&api-version={API_VERSION}",
            self.organization_url
        )
    }
}

#[async_trait]
impl IssueTrackerService for AzureBoardsClient {
    fn tracker(&self) -> TrackerKind {
        TrackerKind::Azure
    }

    async fn verify_credentials(&self) -> FetchResult<AccountScope> {
        let payload = get_json(&self.http, &self.projects_endpoint(), &self.auth).await?;
        let listing: AzureProjectList = serde_json::from_value(payload).map_err(|err| {
            FetchError::Decode(format!("failed to parse Azure project list: {err}"))
        })?;

        Ok(AccountScope {
            account: None,
            projects: Some(
                listing
                    .value
                    .into_iter()
                    .map(|project| project.name)
                    .collect(),
            ),
        })
    }

    async fn fetch_ticket(&self, key: &TicketKey) -> FetchResult<RawTicketRecord> {
        let payload = get_json(&self.http, &self.work_item_endpoint(key), &self.auth).await?;
        if payload.get("fields").is_none() {
            return Err(FetchError::Decode(format!(
                "work item {key} has no fields object"
            )));
        }
        Ok(RawTicketRecord::new(payload))
    }

    fn owning_project(&self, record: &RawTicketRecord) -> Option<String> {
        record
            .field("System.TeamProject")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[derive(Deserialize)]
struct AzureProjectList {
    #[serde(default)]
    value: Vec<AzureProject>,
}

#[derive(Deserialize)]
struct AzureProject {
    name: String,
}
