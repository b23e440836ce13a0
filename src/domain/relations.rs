use serde_json::Value;

use crate::domain::ticket::{RawTicketRecord, TicketKey};

const AZURE_CHILD: &str = "System.LinkTypes.Hierarchy-Forward";
const AZURE_PARENT: &str = "System.LinkTypes.Hierarchy-Reverse";
const AZURE_RELATED: &str = "System.LinkTypes.Related";

/// Neighbours of one ticket, in the order they should be explored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    pub parent: Option<TicketKey>,
    pub related: Vec<TicketKey>,
}

/// Collects every relation shape the record carries.
///
/// Order: hierarchy children (Azure forward links, Jira subtasks), then
/// `searched_children` from a parent-link query, then generic links (Jira
/// issue links, Azure related links). Generic links pointing at `caller` or
/// at the explicit parent are skipped. Duplicates keep their first position.
pub fn resolve_relations(
    record: &RawTicketRecord,
    current: &TicketKey,
    caller: Option<&TicketKey>,
    searched_children: &[TicketKey],
) -> Relations {
    let mut parent = None;
    let mut children = Vec::new();
    let mut generic = Vec::new();

    for relation in record.relations() {
        let Some(target) = relation
            .get("url")
            .and_then(Value::as_str)
            .and_then(work_item_id_from_url)
        else {
            continue;
        };
        match relation.get("rel").and_then(Value::as_str) {
            Some(AZURE_CHILD) => children.push(target),
            Some(AZURE_PARENT) => parent = parent.or(Some(target)),
            Some(AZURE_RELATED) => generic.push(target),
            _ => {}
        }
    }

    if let Some(key) = record.field("parent").and_then(issue_key) {
        parent = parent.or(Some(key));
    }

    let subtasks = record.field("subtasks").and_then(Value::as_array);
    children.extend(subtasks.into_iter().flatten().filter_map(issue_key));

    let links = record.field("issuelinks").and_then(Value::as_array);
    for link in links.into_iter().flatten() {
        let linked = link
            .get("inwardIssue")
            .or_else(|| link.get("outwardIssue"))
            .and_then(issue_key);
        generic.extend(linked);
    }

    let mut related: Vec<TicketKey> = Vec::new();
    let mut push = |key: TicketKey| {
        if &key != current && !related.contains(&key) {
            related.push(key);
        }
    };

    children.into_iter().for_each(&mut push);
    searched_children.iter().cloned().for_each(&mut push);
    generic
        .into_iter()
        .filter(|key| Some(key) != caller && Some(key) != parent.as_ref())
        .for_each(&mut push);

    Relations { parent, related }
}

fn issue_key(issue: &Value) -> Option<TicketKey> {
    issue
        .get("key")
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
        .map(TicketKey::from)
}

fn work_item_id_from_url(url: &str) -> Option<TicketKey> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .map(TicketKey::from)
}
