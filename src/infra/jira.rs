use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::domain::ticket::{RawTicketRecord, TicketKey};
use crate::domain::tracker::TrackerKind;
use crate::error::{FetchError, FetchResult};
use crate::infra::http::{BasicAuth, get_json, trim_base_url};
use crate::services::{AccountScope, IssueTrackerService};

pub const DEFAULT_PARENT_SEARCH_JQL: &str = "parent = \"{key}\"";
const SEARCH_PAGE_SIZE: usize = 100;

pub struct JiraClient {
    http: Client,
    base_url: String,
    auth: BasicAuth,
    /// JQL template with a `{key}` placeholder; `None` disables the search.
    parent_search_jql: Option<String>,
}

impl JiraClient {
    pub fn new(base_url: &str, auth: BasicAuth, parent_search_jql: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: trim_base_url(base_url),
            auth,
            parent_search_jql,
        }
    }

    fn issue_endpoint(&self, key: &TicketKey) -> String {
        format!("{}/rest/api/2/issue/{}?expand=names", self.base_url, key)
    }

    fn myself_endpoint(&self) -> String {
        format!("{}/rest/api/2/myself", self.base_url)
    }

    fn search_endpoint(&self, jql: &str) -> FetchResult<Url> {
        let page_size = SEARCH_PAGE_SIZE.to_string();
        Url::parse_with_params(
            &format!("{}/rest/api/2/search", self.base_url),
            [
                ("jql", jql),
                ("fields", "key"),
                ("maxResults", page_size.as_str()),
            ],
        )
        .map_err(|err| FetchError::Transport(format!("invalid search URL: {err}")))
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    fn tracker(&self) -> TrackerKind {
        TrackerKind::Jira
    }

    async fn verify_credentials(&self) -> FetchResult<AccountScope> {
        let payload = get_json(&self.http, &self.myself_endpoint(), &self.auth).await?;
        let myself: JiraMyself = serde_json::from_value(payload)
            .map_err(|err| FetchError::Decode(format!("failed to parse Jira account: {err}")))?;

        Ok(AccountScope {
            account: myself.display_name.or(myself.email_address),
            projects: None,
        })
    }

    async fn fetch_ticket(&self, key: &TicketKey) -> FetchResult<RawTicketRecord> {
        let payload = get_json(&self.http, &self.issue_endpoint(key), &self.auth).await?;
        if payload.get("fields").is_none() {
            return Err(FetchError::Decode(format!(
                "Jira issue {key} has no fields object"
            )));
        }
        Ok(RawTicketRecord::new(payload))
    }

    async fn search_children(&self, key: &TicketKey) -> FetchResult<Vec<TicketKey>> {
        let Some(template) = &self.parent_search_jql else {
            return Ok(Vec::new());
        };

        let jql = template.replace("{key}", key.as_str());
        let endpoint = self.search_endpoint(&jql)?;
        let payload = get_json(&self.http, endpoint.as_str(), &self.auth).await?;
        let results: JiraSearchResponse = serde_json::from_value(payload)
            .map_err(|err| FetchError::Decode(format!("failed to parse Jira search: {err}")))?;

        if let Some(total) = results.total
            && total > results.issues.len()
        {
            tracing::warn!(
                ticket = %key,
                total,
                returned = results.issues.len(),
                "parent link search truncated"
            );
        }

        Ok(results
            .issues
            .into_iter()
            .map(|issue| TicketKey(issue.key))
            .collect())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraMyself {
    display_name: Option<String>,
    email_address: Option<String>,
}

#[derive(Deserialize)]
struct JiraSearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssueRef>,
    total: Option<usize>,
}

#[derive(Deserialize)]
struct JiraIssueRef {
    key: String,
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(jql: Option<&str>) -> JiraClient {
        JiraClient::new(
            "https://acme.atlassian.net/",
            BasicAuth::new("dev@example.com", SecretString::from("token".to_string())),
            jql.map(str::to_string),
        )
    }

    #[test]
    fn builds_issue_endpoint_with_field_names() {
        let client = client(None);
        assert_eq!(
            client.issue_endpoint(&TicketKey::from("COM-1258")),
            "https://acme.atlassian.net/rest/api/2/issue/COM-1258?expand=names"
        );
        assert_eq!(
            client.myself_endpoint(),
            "https://acme.atlassian.net/rest/api/2/myself"
        );
    }

    #[test]
    fn encodes_search_jql() {
        let client = client(Some(DEFAULT_PARENT_SEARCH_JQL));
        let url = client.search_endpoint("parent = \"COM-1\"").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(url.path(), "/rest/api/2/search");
        assert_eq!(pairs[0], ("jql".to_string(), "parent = \"COM-1\"".to_string()));
        assert_eq!(pairs[1], ("fields".to_string(), "key".to_string()));
        assert_eq!(pairs[2], ("maxResults".to_string(), "100".to_string()));
    }

    #[tokio::test]
    async fn disabled_search_makes_no_request() {
        let client = client(None);
        let children = client
            .search_children(&TicketKey::from("COM-1"))
            .await
            .unwrap();
        assert!(children.is_empty());
    }

    #[test]
    fn parses_search_response() {
        let parsed: JiraSearchResponse = serde_json::from_value(serde_json::json!({
            "startAt": 0,
            "total": 2,
            "issues": [{ "key": "COM-2", "id": "1" }, { "key": "COM-3", "id": "2" }]
        }))
        .unwrap();
        let keys: Vec<_> = parsed.issues.into_iter().map(|issue| issue.key).collect();
        assert_eq!(keys, vec!["COM-2", "COM-3"]);
        assert_eq!(parsed.total, Some(2));
    }
}
