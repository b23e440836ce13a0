use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Ticket identifier as the tracker spells it (`PROJ-12`, `4711`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TicketKey(pub String);

impl TicketKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Unmodified tracker payload for one ticket.
#[derive(Debug, Clone)]
pub struct RawTicketRecord(Value);

impl RawTicketRecord {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.0.get("fields").and_then(Value::as_object)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields().and_then(|fields| fields.get(name))
    }

    /// Field id to display name map, present on Jira reads made with `expand=names`.
    pub fn field_names(&self) -> Option<&Map<String, Value>> {
        self.0.get("names").and_then(Value::as_object)
    }

    /// Azure work item relation list.
    pub fn relations(&self) -> &[Value] {
        self.0
            .get("relations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketDescription {
    pub key: TicketKey,
    pub item_type: String,
    pub title: String,
    /// Repro steps, test steps or description, depending on the item type.
    pub summary: String,
    pub description: String,
    pub status: String,
    pub acceptance_criteria: String,
    pub comments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<TicketKey>,
}
