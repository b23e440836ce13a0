use std::collections::HashMap;
use std::fmt::Write as _;

use clap::ValueEnum;

use crate::domain::fields::{ItemCategory, NO_ACCEPTANCE_CRITERIA};
use crate::domain::ticket::{TicketDescription, TicketKey};
use crate::error::AppResult;
use crate::workflow::traversal::TraversalReport;

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Indented ticket tree with descriptions.
    Tree,
    /// Hierarchy and tickets as JSON.
    Json,
    /// Tree followed by the JSON dump.
    #[default]
    Both,
}

pub fn render(report: &TraversalReport, format: OutputFormat) -> AppResult<String> {
    Ok(match format {
        OutputFormat::Tree => render_tree(report),
        OutputFormat::Json => render_json(report)?,
        OutputFormat::Both => format!(
            "{}\nHierarchy (JSON):\n{}",
            render_tree(report),
            render_json(report)?
        ),
    })
}

pub fn render_json(report: &TraversalReport) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Pre-order rendering from the root bucket, one block per ticket.
pub fn render_tree(report: &TraversalReport) -> String {
    let lookup: HashMap<&TicketKey, &TicketDescription> = report
        .descriptions
        .iter()
        .map(|description| (&description.key, description))
        .collect();

    let mut out = String::new();
    for root in report.hierarchy.roots() {
        render_node(&mut out, report, &lookup, root, 0);
    }
    out
}

fn render_node(
    out: &mut String,
    report: &TraversalReport,
    lookup: &HashMap<&TicketKey, &TicketDescription>,
    key: &TicketKey,
    depth: usize,
) {
    let indent = INDENT.repeat(depth);
    match lookup.get(key) {
        Some(description) => write_description(out, description, &indent),
        None => {
            let _ = writeln!(out, "{indent}{key}");
        }
    }
    out.push('\n');

    for child in report.hierarchy.children(Some(key)) {
        render_node(out, report, lookup, child, depth + 1);
    }
}

fn write_description(out: &mut String, description: &TicketDescription, indent: &str) {
    let _ = writeln!(
        out,
        "{indent}{} [{}] {} ({})",
        description.key, description.item_type, description.title, description.status
    );
    let body_indent = format!("{indent}{INDENT}");
    if let Some(parent) = &description.parent {
        let _ = writeln!(out, "{body_indent}Parent: {parent}");
    }
    for line in description.summary.lines() {
        let _ = writeln!(out, "{body_indent}{line}");
    }
    // Only description-based summaries already carry the criteria.
    if ItemCategory::from_type(&description.item_type) != ItemCategory::Other
        && description.acceptance_criteria != NO_ACCEPTANCE_CRITERIA
    {
        let _ = writeln!(
            out,
            "{body_indent}Acceptance Criteria: {}",
            description.acceptance_criteria
        );
    }
    if !description.comments.is_empty() {
        let _ = writeln!(out, "{body_indent}Comments:");
        for comment in &description.comments {
            let _ = writeln!(out, "{body_indent}- {comment}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hierarchy::HierarchyMap;

    fn description(key: &str, summary: &str) -> TicketDescription {
        TicketDescription {
            key: TicketKey::from(key),
            item_type: "Story".to_string(),
            title: format!("Title {key}"),
            summary: summary.to_string(),
            description: "No description available".to_string(),
            status: "Open".to_string(),
            acceptance_criteria: "No acceptance criteria available".to_string(),
            comments: Vec::new(),
            parent: None,
        }
    }

    fn report() -> TraversalReport {
        let mut hierarchy = HierarchyMap::new();
        hierarchy.record(None, TicketKey::from("EPIC-1"));
        hierarchy.record(Some(&TicketKey::from("EPIC-1")), TicketKey::from("STORY-2"));

        let mut story = description("STORY-2", "Repro Steps: Step 1");
        story.comments = vec!["Confirmed".to_string()];
        story.parent = Some(TicketKey::from("EPIC-1"));

        TraversalReport {
            root: TicketKey::from("EPIC-1"),
            hierarchy,
            descriptions: vec![
                description("EPIC-1", "Description: Big\nAcceptance Criteria: Done"),
                story,
            ],
            pruned: Vec::new(),
            fetches: 2,
        }
    }

    #[test]
    fn renders_indented_tree() {
        let expected = "\
EPIC-1 [Story] Title EPIC-1 (Open)
  Description: Big
  Acceptance Criteria: Done

  STORY-2 [Story] Title STORY-2 (Open)
    Parent: EPIC-1
    Repro Steps: Step 1
    Comments:
    - Confirmed

";
        assert_eq!(render_tree(&report()), expected);
    }

    #[test]
    fn defects_show_acceptance_criteria_after_repro_steps() {
        let mut hierarchy = HierarchyMap::new();
        hierarchy.record(None, TicketKey::from("BUG-7"));

        let mut bug = description("BUG-7", "Repro Steps: Click pay");
        bug.item_type = "Bug".to_string();
        bug.acceptance_criteria = "Payment succeeds".to_string();
        let mut report = TraversalReport {
            root: TicketKey::from("BUG-7"),
            hierarchy,
            descriptions: vec![bug],
            pruned: Vec::new(),
            fetches: 1,
        };

        assert_eq!(
            render_tree(&report),
            "BUG-7 [Bug] Title BUG-7 (Open)\n  Repro Steps: Click pay\n  Acceptance Criteria: Payment succeeds\n\n"
        );

        report.descriptions[0].acceptance_criteria = NO_ACCEPTANCE_CRITERIA.to_string();
        assert!(!render_tree(&report).contains("Acceptance Criteria"));
    }

    #[test]
    fn renders_json_dump() {
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&report()).unwrap()).unwrap();
        assert_eq!(value["root"], "EPIC-1");
        assert_eq!(value["hierarchy"]["(root)"][0], "EPIC-1");
        assert_eq!(value["hierarchy"]["EPIC-1"][0], "STORY-2");
        assert_eq!(value["tickets"][1]["parent"], "EPIC-1");
        assert!(value["tickets"][0].get("parent").is_none());
        assert!(value.get("pruned").is_none());
    }

    #[test]
    fn both_format_prints_tree_then_json() {
        let rendered = render(&report(), OutputFormat::Both).unwrap();
        let tree_end = rendered.find("Hierarchy (JSON):").unwrap();
        assert!(rendered.starts_with("EPIC-1 [Story]"));
        assert!(rendered[tree_end..].contains("\"(root)\""));
    }
}
