use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::domain::ticket::TicketKey;

static JIRA_BROWSE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/browse/([A-Z][A-Z0-9_]*-\d+)").expect("static regex compiles")
});
static JIRA_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*-\d+$").expect("static regex compiles"));

const AZURE_HOST: &str = "dev.azure.com";
const LEGACY_AZURE_SUFFIX: &str = ".visualstudio.com";
/// Collection segment that legacy hosts put in front of the project.
const LEGACY_COLLECTION: &str = "DefaultCollection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerKind {
    Jira,
    Azure,
}

impl TrackerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::Jira => "jira",
            TrackerKind::Azure => "azure",
        }
    }

    fn detect(host: &str) -> Self {
        if host == AZURE_HOST || host.ends_with(LEGACY_AZURE_SUFFIX) {
            TrackerKind::Azure
        } else {
            TrackerKind::Jira
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "jira" => Ok(TrackerKind::Jira),
            "azure" | "ado" | "azure-devops" => Ok(TrackerKind::Azure),
            other => Err(format!(
                "unknown tracker '{other}', expected 'jira' or 'azure'"
            )),
        }
    }
}

/// Where a ticket link points: the tracker's API origin and the ticket itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerLink {
    pub tracker: TrackerKind,
    pub base_url: String,
    pub key: TicketKey,
    /// Azure project named in the link, kept percent-encoded.
    pub project: Option<String>,
}

impl TrackerLink {
    /// Parses a ticket or work item URL. Returns `None` when no known
    /// addressing scheme matches; the tracker is detected from the host
    /// unless `tracker` forces one.
    pub fn parse(input: &str, tracker: Option<TrackerKind>) -> Option<Self> {
        let trimmed = input.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).ok()?;
        let host = url.host_str()?;
        match tracker.unwrap_or_else(|| TrackerKind::detect(host)) {
            TrackerKind::Jira => Self::parse_jira(&url),
            TrackerKind::Azure => Self::parse_azure(&url, host),
        }
    }

    fn parse_jira(url: &Url) -> Option<Self> {
        let key = JIRA_BROWSE_KEY
            .captures(url.path())
            .and_then(|captures| captures.get(1))
            .map(|key| key.as_str().to_string())
            .or_else(|| {
                query_value(url, "selectedIssue").filter(|value| JIRA_KEY.is_match(value))
            })?;

        Some(Self {
            tracker: TrackerKind::Jira,
            base_url: url.origin().ascii_serialization(),
            key: TicketKey(key),
            project: None,
        })
    }

    fn parse_azure(url: &Url, host: &str) -> Option<Self> {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let key = query_value(url, "workitem")
            .or_else(|| segments.last().map(|last| last.to_string()))
            .filter(|candidate| is_work_item_id(candidate))?;

        let (base_url, project_segment) = if host.ends_with(LEGACY_AZURE_SUFFIX) {
            let mut rest = segments.iter();
            let mut first = rest.next();
            if first.is_some_and(|segment| segment.eq_ignore_ascii_case(LEGACY_COLLECTION)) {
                first = rest.next();
            }
            (url.origin().ascii_serialization(), first)
        } else {
            let organization = segments.first()?;
            (
                format!("{}/{organization}", url.origin().ascii_serialization()),
                segments.get(1),
            )
        };

        let project = project_segment
            .filter(|segment| !segment.starts_with('_') && !is_work_item_id(segment))
            .map(|segment| segment.to_string());

        Some(Self {
            tracker: TrackerKind::Azure,
            base_url,
            key: TicketKey(key),
            project,
        })
    }
}

fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn is_work_item_id(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jira_browse_link() {
        let link =
            TrackerLink::parse("https://acme.atlassian.net/browse/COM-1258", None).unwrap();
        assert_eq!(link.tracker, TrackerKind::Jira);
        assert_eq!(link.base_url, "https://acme.atlassian.net");
        assert_eq!(link.key.as_str(), "COM-1258");
        assert_eq!(link.project, None);
    }

    #[test]
    fn parses_jira_board_link_with_selected_issue() {
        let link = TrackerLink::parse(
            "https://jira.internal:8443/secure/RapidBoard.jspa?rapidView=7&selectedIssue=OPS-42",
            None,
        )
        .unwrap();
        assert_eq!(link.base_url, "https://jira.internal:8443");
        assert_eq!(link.key.as_str(), "OPS-42");
    }

    #[test]
    fn parses_azure_edit_link_with_project() {
        let link = TrackerLink::parse(
            "https://dev.azure.com/contoso/Fabrikam%20Web/_workitems/edit/4711/",
            None,
        )
        .unwrap();
        assert_eq!(link.tracker, TrackerKind::Azure);
        assert_eq!(link.base_url, "https://dev.azure.com/contoso");
        assert_eq!(link.key.as_str(), "4711");
        assert_eq!(link.project.as_deref(), Some("Fabrikam%20Web"));
    }

    #[test]
    fn parses_azure_workitem_query_parameter() {
        let link = TrackerLink::parse(
            "https://dev.azure.com/contoso/web/_boards/board/t/web%20Team/Epics?workitem=88",
            None,
        )
        .unwrap();
        assert_eq!(link.key.as_str(), "88");
        assert_eq!(link.project.as_deref(), Some("web"));
    }

    #[test]
    fn parses_legacy_visualstudio_host() {
        let link =
            TrackerLink::parse("https://contoso.visualstudio.com/web/_workitems/edit/12", None)
                .unwrap();
        assert_eq!(link.tracker, TrackerKind::Azure);
        assert_eq!(link.base_url, "https://contoso.visualstudio.com");
        assert_eq!(link.project.as_deref(), Some("web"));
    }

    #[test]
    fn skips_default_collection_on_legacy_host() {
        let link = TrackerLink::parse(
            "https://contoso.visualstudio.com/DefaultCollection/web/_workitems/edit/12",
            None,
        )
        .unwrap();
        assert_eq!(link.base_url, "https://contoso.visualstudio.com");
        assert_eq!(link.project.as_deref(), Some("web"));
        assert_eq!(link.key.as_str(), "12");

        let bare = TrackerLink::parse(
            "https://contoso.visualstudio.com/DefaultCollection/_workitems/edit/13",
            None,
        )
        .unwrap();
        assert_eq!(bare.project, None);
    }

    #[test]
    fn forced_tracker_overrides_host_detection() {
        let link = TrackerLink::parse(
            "https://tfs.corp.example/DefaultCollection/_workitems/edit/5",
            Some(TrackerKind::Azure),
        )
        .unwrap();
        assert_eq!(link.tracker, TrackerKind::Azure);
        assert_eq!(link.base_url, "https://tfs.corp.example/DefaultCollection");
        assert_eq!(link.key.as_str(), "5");
    }

    #[test]
    fn rejects_links_without_a_ticket() {
        assert_eq!(TrackerLink::parse("https://acme.atlassian.net/projects/COM", None), None);
        assert_eq!(TrackerLink::parse("https://dev.azure.com/contoso/web", None), None);
        assert_eq!(TrackerLink::parse("not a url", None), None);
        assert_eq!(
            TrackerLink::parse("https://dev.azure.com/contoso/web?workitem=abc", None),
            None
        );
    }

    #[test]
    fn parses_tracker_kind() {
        assert_eq!("Jira".parse::<TrackerKind>(), Ok(TrackerKind::Jira));
        assert_eq!("ado".parse::<TrackerKind>(), Ok(TrackerKind::Azure));
        assert!("gitlab".parse::<TrackerKind>().is_err());
    }
}
