use nestedset::config::NestedSetConfig;
use nestedset::tooling::cli::{CliContext, Commands, OutputFormat};
use nestedset::{Node, NodeId};
use std::fs;
use tempfile::TempDir;

fn context(temp_dir: &TempDir) -> CliContext {
    CliContext::with_config(
        Some(temp_dir.path().join("store")),
        NestedSetConfig::default(),
    )
    .unwrap()
}

fn add(cli: &CliContext, parent: Option<NodeId>, name: &str) -> Node {
    let output = cli
        .execute(&Commands::Add {
            parent,
            meta: vec![("name".to_string(), name.to_string())],
            format: OutputFormat::Json,
        })
        .unwrap();
    serde_json::from_str(&output).unwrap()
}

#[test]
fn node_list_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir);
    let root = add(&cli, None, "root");
    let a = add(&cli, Some(root.id), "a");
    add(&cli, Some(a.id), "c");

    let output = cli
        .execute(&Commands::Descendants {
            id: root.id,
            format: OutputFormat::Json,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let nodes = parsed.as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    for node in nodes {
        assert!(node.get("id").and_then(|v| v.as_u64()).is_some());
        assert!(node.get("parent_id").and_then(|v| v.as_u64()).is_some());
        assert!(node.get("interval").and_then(|v| v.get("left")).is_some());
        assert!(node.get("metadata").and_then(|v| v.get("name")).is_some());
    }
}

#[test]
fn unwrapped_tree_json_is_list_of_children() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir);
    let root = add(&cli, None, "root");
    add(&cli, Some(root.id), "a");
    add(&cli, Some(root.id), "b");

    let output = cli
        .execute(&Commands::Tree {
            root: Some(root.id),
            unwrap: true,
            format: OutputFormat::Json,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let children = parsed.as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["metadata"]["name"], "a");
    assert_eq!(children[0]["level"], 1);
    assert_eq!(children[0]["path"], root.id.to_string());
}

#[test]
fn config_file_sets_default_root_and_separator() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("store");
    let seeded = CliContext::with_config(Some(store_path.clone()), NestedSetConfig::default())
        .unwrap();
    let root = add(&seeded, None, "root");
    let a = add(&seeded, Some(root.id), "a");
    add(&seeded, Some(a.id), "c");
    drop(seeded);

    let config_path = temp_dir.path().join("nestedset.toml");
    fs::write(
        &config_path,
        format!("[tree]\nroot = {}\nseparator = \"/\"\n", root.id),
    )
    .unwrap();
    let cli = CliContext::new(Some(store_path), Some(config_path)).unwrap();

    let output = cli
        .execute(&Commands::Tree {
            root: None,
            unwrap: false,
            format: OutputFormat::Json,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["id"], root.id.0);
    assert_eq!(
        parsed["children"][0]["children"][0]["path"],
        format!("{}/{}", root.id, a.id)
    );
}

#[test]
fn rebuild_json_reports_every_tree() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir);
    let first = add(&cli, None, "first");
    add(&cli, Some(first.id), "a");
    add(&cli, None, "second");

    let output = cli
        .execute(&Commands::Rebuild {
            root: None,
            left: 1,
            format: OutputFormat::Json,
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["trees"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["nodes"], 3);
    assert_eq!(parsed["cleared"], 0);
    assert_eq!(parsed["trees"][1]["left"], 5);
}

#[test]
fn text_outputs_render() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir);
    let root = add(&cli, None, "root");
    let a = add(&cli, Some(root.id), "a");

    let tree = cli
        .execute(&Commands::Tree {
            root: Some(root.id),
            unwrap: false,
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(tree.contains("(1, 4)"));
    assert!(tree.contains("name=a"));

    let siblings = cli
        .execute(&Commands::Siblings {
            id: a.id,
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(siblings.contains("No nodes."));

    let check = cli
        .execute(&Commands::Check {
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(check.contains("consistent"));
}
