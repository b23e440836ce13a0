//! Field normalization.
//!
//! Trackers name the same concept differently, and custom fields differ per
//! instance. Each tracker gets a [`FieldTable`] that lists, per logical
//! field, the exact field ids to try first and the name fragments to fall
//! back on. Missing fields degrade to placeholders and never fail.

use serde_json::{Map, Value};

use crate::domain::markup::strip_markup;
use crate::domain::ticket::{RawTicketRecord, TicketDescription, TicketKey};
use crate::domain::tracker::TrackerKind;

pub const DEFAULT_JIRA_ACCEPTANCE_FIELD: &str = "customfield_10000";

const NO_TYPE: &str = "No type available";
const NO_TITLE: &str = "No summary available";
const NO_DESCRIPTION: &str = "No description available";
const NO_STATUS: &str = "No status available";
pub const NO_ACCEPTANCE_CRITERIA: &str = "No acceptance criteria available";
const NO_REPRO_STEPS: &str = "No Repro Steps available";
const NO_TEST_STEPS: &str = "No Steps available";

/// Lookup order for one logical field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    exact: Vec<String>,
    fragments: &'static [&'static str],
}

impl FieldRule {
    fn exact(ids: &[&str]) -> Self {
        Self {
            exact: ids.iter().map(|id| id.to_string()).collect(),
            fragments: &[],
        }
    }

    fn with_fragments(mut self, fragments: &'static [&'static str]) -> Self {
        self.fragments = fragments;
        self
    }

    /// Exact ids in order, then each fragment against field ids (sorted),
    /// then each fragment against display names when the record has them.
    /// The first non-empty value wins.
    fn resolve(&self, record: &RawTicketRecord) -> Option<String> {
        let fields = record.fields()?;

        for id in &self.exact {
            if let Some(text) = fields.get(id).and_then(value_text) {
                return Some(text);
            }
        }

        for fragment in self.fragments {
            let fragment = fragment.to_lowercase();
            let by_id = fields
                .iter()
                .filter(|(id, _)| id.to_lowercase().contains(&fragment))
                .find_map(|(_, value)| value_text(value));
            if by_id.is_some() {
                return by_id;
            }
        }

        let names = record.field_names()?;
        self.fragments.iter().find_map(|fragment| {
            let fragment = fragment.to_lowercase();
            names
                .iter()
                .filter(|(_, name)| {
                    name.as_str()
                        .is_some_and(|name| name.to_lowercase().contains(&fragment))
                })
                .find_map(|(id, _)| fields.get(id).and_then(value_text))
        })
    }
}

#[derive(Debug, Clone)]
pub struct FieldTable {
    item_type: FieldRule,
    title: FieldRule,
    description: FieldRule,
    status: FieldRule,
    acceptance_criteria: FieldRule,
    repro_steps: FieldRule,
    test_steps: FieldRule,
}

impl FieldTable {
    pub fn for_tracker(tracker: TrackerKind, acceptance_field: Option<&str>) -> Self {
        match tracker {
            TrackerKind::Jira => {
                Self::jira(acceptance_field.unwrap_or(DEFAULT_JIRA_ACCEPTANCE_FIELD))
            }
            TrackerKind::Azure => Self::azure(),
        }
    }

    pub fn jira(acceptance_field: &str) -> Self {
        Self {
            item_type: FieldRule::exact(&["issuetype"]),
            title: FieldRule::exact(&["summary"]),
            description: FieldRule::exact(&["description"]),
            status: FieldRule::exact(&["status"]),
            acceptance_criteria: FieldRule::exact(&[acceptance_field])
                .with_fragments(&["AcceptanceCriteria", "Acceptance Criteria"]),
            repro_steps: FieldRule::exact(&[])
                .with_fragments(&["ReproSteps", "Repro Steps", "Steps to Reproduce"]),
            test_steps: FieldRule::exact(&[]).with_fragments(&["TestSteps", "Test Steps"]),
        }
    }

    pub fn azure() -> Self {
        Self {
            item_type: FieldRule::exact(&["System.WorkItemType"]),
            title: FieldRule::exact(&["System.Title"]),
            description: FieldRule::exact(&["System.Description"]),
            status: FieldRule::exact(&["System.State"]),
            acceptance_criteria: FieldRule::exact(&["Microsoft.VSTS.Common.AcceptanceCriteria"])
                .with_fragments(&["AcceptanceCriteria"]),
            repro_steps: FieldRule::exact(&["Microsoft.VSTS.TCM.ReproSteps"])
                .with_fragments(&["ReproSteps"]),
            test_steps: FieldRule::exact(&["Microsoft.VSTS.TCM.Steps"])
                .with_fragments(&["Steps"]),
        }
    }
}

/// Decides which text the summary is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Defect,
    TestCase,
    Other,
}

impl ItemCategory {
    pub fn from_type(item_type: &str) -> Self {
        match item_type.trim().to_lowercase().as_str() {
            "bug" | "defect" => ItemCategory::Defect,
            "test case" | "test" => ItemCategory::TestCase,
            _ => ItemCategory::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    table: FieldTable,
}

impl FieldNormalizer {
    pub fn new(table: FieldTable) -> Self {
        Self { table }
    }

    pub fn describe(&self, key: &TicketKey, record: &RawTicketRecord) -> TicketDescription {
        let table = &self.table;
        let field = |rule: &FieldRule, name: &str| {
            let value = rule.resolve(record).map(|raw| strip_markup(&raw));
            if value.is_none() {
                tracing::debug!(ticket = %key, field = name, "field missing, using placeholder");
            }
            value
        };

        let item_type = field(&table.item_type, "type");
        let description = field(&table.description, "description");
        let acceptance_criteria = field(&table.acceptance_criteria, "acceptance criteria");

        let category = ItemCategory::from_type(item_type.as_deref().unwrap_or_default());
        let summary = match category {
            ItemCategory::Defect => format!(
                "Repro Steps: {}",
                field(&table.repro_steps, "repro steps").as_deref().unwrap_or(NO_REPRO_STEPS)
            ),
            ItemCategory::TestCase => format!(
                "Steps: {}",
                field(&table.test_steps, "test steps").as_deref().unwrap_or(NO_TEST_STEPS)
            ),
            ItemCategory::Other => {
                let mut text = format!(
                    "Description: {}",
                    description.as_deref().unwrap_or(NO_DESCRIPTION)
                );
                if let Some(criteria) = &acceptance_criteria {
                    text.push_str("\nAcceptance Criteria: ");
                    text.push_str(criteria);
                }
                text
            }
        };

        TicketDescription {
            key: key.clone(),
            item_type: item_type.unwrap_or_else(|| NO_TYPE.to_string()),
            title: field(&table.title, "title").unwrap_or_else(|| NO_TITLE.to_string()),
            summary,
            description: description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            status: field(&table.status, "status").unwrap_or_else(|| NO_STATUS.to_string()),
            acceptance_criteria: acceptance_criteria
                .unwrap_or_else(|| NO_ACCEPTANCE_CRITERIA.to_string()),
            comments: comments(record),
            parent: None,
        }
    }
}

fn comments(record: &RawTicketRecord) -> Vec<String> {
    record
        .field("comment")
        .and_then(|comment| comment.get("comments"))
        .and_then(Value::as_array)
        .map(|comments| {
            comments
                .iter()
                .filter_map(|comment| comment.get("body").and_then(value_text))
                .map(|body| strip_markup(&body))
                .filter(|body| !body.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Text carried by a field value. Named objects (status, issue type) yield
/// their name, Atlassian documents yield their text nodes.
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(object) if object.get("type").and_then(Value::as_str) == Some("doc") => {
            let mut parts = Vec::new();
            collect_document_text(object, &mut parts);
            parts.join(" ")
        }
        Value::Object(object) => ["name", "value", "displayName"]
            .iter()
            .find_map(|name| object.get(*name).and_then(Value::as_str))?
            .to_string(),
        Value::Null => return None,
    };

    if text.trim().is_empty() { None } else { Some(text) }
}

fn collect_document_text(node: &Map<String, Value>, parts: &mut Vec<String>) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        parts.push(text.to_string());
    }
    let children = node.get("content").and_then(Value::as_array);
    for child in children.into_iter().flatten() {
        if let Some(child) = child.as_object() {
            collect_document_text(child, parts);
        }
    }
}
