//! Format nodes, trees, reports and check results as text.

use crate::api::RemovedSubtree;
use crate::check::{CheckReport, Violation};
use crate::maintainer::{InsertOutcome, RemoveOutcome};
use crate::store::Node;
use crate::tree::{RebuildAllReport, RebuildReport, TreeNode};
use crate::types::NodeId;
use comfy_table::presets::{UTF8_BORDERS_ONLY, UTF8_FULL};
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn bound(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn metadata(node: &Node) -> String {
    node.metadata
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One row per node: id, parent, bounds and metadata.
pub fn format_node_table(title: &str, nodes: &[Node]) -> String {
    let mut out = format!("{}\n\n", format_section_heading(title));
    if nodes.is_empty() {
        out.push_str("No nodes.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Parent", "Left", "Right", "Metadata"]);
    for node in nodes {
        table.add_row(vec![
            node.id.to_string(),
            node.parent_id
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            bound(node.left()),
            bound(node.right()),
            metadata(node),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Indented outline, one line per node in pre-order.
pub fn format_tree_text(roots: &[TreeNode]) -> String {
    if roots.is_empty() {
        return "Empty tree.\n".to_string();
    }
    let base = roots.iter().map(|r| r.level).min().unwrap_or(0);
    let mut out = String::new();
    for root in roots {
        for entry in root.iter() {
            let indent = "  ".repeat(entry.level - base);
            let interval = entry
                .node
                .interval
                .map(|i| i.to_string())
                .unwrap_or_else(|| "(unplaced)".to_string());
            let meta = metadata(&entry.node);
            if meta.is_empty() {
                out.push_str(&format!("{}{} {}\n", indent, entry.node.id.bold(), interval));
            } else {
                out.push_str(&format!(
                    "{}{} {} {}\n",
                    indent,
                    entry.node.id.bold(),
                    interval,
                    meta
                ));
            }
        }
    }
    out
}

pub fn format_insert_text(node: &Node, outcome: &InsertOutcome) -> String {
    match outcome {
        InsertOutcome::Placed(interval) => format!("Added node {} at {}", node.id, interval),
        InsertOutcome::Skipped(reason) => format!(
            "Added node {} without an interval ({:?}); run 'nestedset rebuild' to place it",
            node.id, reason
        ),
    }
}

pub fn format_remove_text(removed: &[NodeId], outcome: &RemoveOutcome) -> String {
    let gap = match outcome {
        RemoveOutcome::Closed { pivot, width } => {
            format!("closed gap of {} after bound {}", width, pivot)
        }
        RemoveOutcome::Skipped(reason) => format!("interval space untouched ({:?})", reason),
    };
    format!("Removed {} node(s); {}", removed.len(), gap)
}

pub fn format_removed_subtree_text(result: &RemovedSubtree) -> String {
    format_remove_text(&result.removed, &result.outcome)
}

pub fn format_rebuild_text(report: &RebuildReport) -> String {
    format!(
        "Rebuilt tree {}: {} node(s), bounds ({}, {}) in {} ms",
        report.root, report.nodes, report.left, report.right, report.duration_ms
    )
}

pub fn format_rebuild_all_text(report: &RebuildAllReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Rebuild"));
    if report.trees.is_empty() {
        out.push_str("No roots found.\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Root", "Nodes", "Left", "Right", "Duration (ms)"]);
        for tree in &report.trees {
            table.add_row(vec![
                tree.root.to_string(),
                tree.nodes.to_string(),
                tree.left.to_string(),
                tree.right.to_string(),
                tree.duration_ms.to_string(),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }
    out.push_str(&format!("  Total nodes: {}\n", report.nodes()));
    out.push_str(&format!("  Cleared intervals: {}\n", report.cleared));
    out
}

pub fn format_check_text(report: &CheckReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Index Check"));
    out.push_str(&format!("  Nodes: {}\n", report.nodes));
    out.push_str(&format!("  Unbuilt: {}\n", report.unbuilt.len()));
    if report.is_consistent() {
        out.push_str(&format!("  Status: {}\n", "consistent".green()));
        return out;
    }
    out.push_str(&format!(
        "  Status: {} ({} violation(s))\n\n",
        "inconsistent".red(),
        report.violations.len()
    ));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "Node", "Detail"]);
    for violation in &report.violations {
        let (kind, node, detail) = match violation {
            Violation::Malformed { id } => ("malformed", *id, "right <= left".to_string()),
            Violation::Crossing { outer, inner } => (
                "crossing",
                *inner,
                format!("overlaps {} without nesting", outer),
            ),
            Violation::Misplaced {
                id,
                parent,
                enclosing,
            } => (
                "misplaced",
                *id,
                format!(
                    "parent {} but enclosed by {}",
                    parent.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                    enclosing.map(|e| e.to_string()).unwrap_or_else(|| "-".into())
                ),
            ),
        };
        table.add_row(vec![kind.to_string(), node.to_string(), detail]);
    }
    out.push_str(&format!("{}\n", table));
    out
}
