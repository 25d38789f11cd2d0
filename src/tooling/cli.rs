//! CLI Tooling
//!
//! Command-line interface over a sled-backed collection. Every command opens
//! the store, runs one `NestedSet` operation and renders the result as text
//! or JSON.

use crate::api::NestedSet;
use crate::check;
use crate::config::{ConfigLoader, NestedSetConfig};
use crate::error::{ApiError, StorageError};
use crate::logging::LoggingConfig;
use crate::maintainer::{InsertOutcome, SkipReason};
use crate::store::{Node, RecordStore, SledRecordStore};
use crate::tooling::format::{
    format_check_text, format_insert_text, format_node_table, format_rebuild_all_text,
    format_rebuild_text, format_remove_text, format_removed_subtree_text, format_tree_text,
};
use crate::tree::SubtreeView;
use crate::types::NodeId;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Nestedset CLI - nested-set interval index over a local record store
#[derive(Parser)]
#[command(name = "nestedset")]
#[command(about = "Maintain and query a nested-set interval index")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Record store directory (overrides config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply the logging flags on top of the configured logging section.
    ///
    /// `--log-level` wins over `--verbose`; with neither, the configured
    /// level (file or `NESTEDSET__LOGGING__LEVEL`) is kept.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        } else if self.verbose {
            config.level = "debug".to_string();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if self.log_file.is_some() {
            config.file = self.log_file.clone();
        }
        config
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a node; without --parent a new placed root is created
    Add {
        /// Parent node ID
        #[arg(long)]
        parent: Option<NodeId>,
        /// Metadata entry (key=value), repeatable
        #[arg(long = "meta", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Remove a node and close the gap it leaves
    Remove {
        id: NodeId,
        /// Also remove every descendant
        #[arg(long)]
        subtree: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Recompute intervals from parent pointers
    Rebuild {
        /// Rebuild only the tree below this node (default: every tree)
        #[arg(long)]
        root: Option<NodeId>,
        /// Left bound assigned to --root
        #[arg(long, default_value = "1")]
        left: u64,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show a subtree (default root from config)
    Tree {
        #[arg(long)]
        root: Option<NodeId>,
        /// Show only the root's children, without the root itself
        #[arg(long)]
        unwrap: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the ancestors of a node, root first
    Ancestors {
        id: NodeId,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the descendants of a node in pre-order
    Descendants {
        id: NodeId,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the siblings of a node
    Siblings {
        id: NodeId,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the direct children of a node
    Children {
        id: NodeId,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the depth of a node (root = 0)
    Level { id: NodeId },
    /// Show a single node
    Show {
        id: NodeId,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Verify the interval index against parent pointers
    Check {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid metadata entry '{}': expected key=value", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid metadata entry '{}': empty key", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Add { .. } => "add",
        Commands::Remove { .. } => "remove",
        Commands::Rebuild { .. } => "rebuild",
        Commands::Tree { .. } => "tree",
        Commands::Ancestors { .. } => "ancestors",
        Commands::Descendants { .. } => "descendants",
        Commands::Siblings { .. } => "siblings",
        Commands::Children { .. } => "children",
        Commands::Level { .. } => "level",
        Commands::Show { .. } => "show",
        Commands::Check { .. } => "check",
        Commands::Config => "config",
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(StorageError::Serialization(e.to_string())))
}

/// CLI context for executing commands
pub struct CliContext {
    api: NestedSet,
    store: Arc<SledRecordStore>,
    config: NestedSetConfig,
}

impl CliContext {
    /// Load configuration and open the record store.
    pub fn new(store_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Self::with_config(store_path, config)
    }

    pub fn with_config(
        store_path: Option<PathBuf>,
        config: NestedSetConfig,
    ) -> Result<Self, ApiError> {
        let path = config.store.resolve_path(store_path)?;
        std::fs::create_dir_all(&path).map_err(StorageError::IoError)?;
        let store = Arc::new(SledRecordStore::new(&path)?);
        let api = NestedSet::with_config(store.clone(), config.tree.clone());
        Ok(CliContext { api, store, config })
    }

    /// Get a reference to the underlying API
    pub fn api(&self) -> &NestedSet {
        &self.api
    }

    pub fn config(&self) -> &NestedSetConfig {
        &self.config
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        self.store.flush()?;
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Add {
                parent,
                meta,
                format,
            } => self.handle_add(*parent, meta, *format),
            Commands::Remove {
                id,
                subtree,
                format,
            } => self.handle_remove(id, *subtree, *format),
            Commands::Rebuild { root, left, format } => self.handle_rebuild(*root, *left, *format),
            Commands::Tree {
                root,
                unwrap,
                format,
            } => self.handle_tree(*root, *unwrap, *format),
            Commands::Ancestors { id, format } => {
                self.render_nodes("Ancestors", self.api.ancestors(id)?, *format)
            }
            Commands::Descendants { id, format } => {
                self.render_nodes("Descendants", self.api.descendants(id)?, *format)
            }
            Commands::Siblings { id, format } => {
                self.render_nodes("Siblings", self.api.siblings(id)?, *format)
            }
            Commands::Children { id, format } => {
                self.render_nodes("Children", self.api.children(id)?, *format)
            }
            Commands::Level { id } => Ok(match self.api.level(id)? {
                Some(level) => level.to_string(),
                None => format!("Node {} has no interval; run 'nestedset rebuild'", id),
            }),
            Commands::Show { id, format } => {
                let node = self
                    .api
                    .get(id)?
                    .ok_or(ApiError::NodeNotFound(*id))?;
                match format {
                    OutputFormat::Json => to_json(&node),
                    OutputFormat::Text => Ok(format_node_table("Node", &[node])),
                }
            }
            Commands::Check { format } => {
                let report = check::verify(self.store.as_ref())?;
                match format {
                    OutputFormat::Json => to_json(&report),
                    OutputFormat::Text => Ok(format_check_text(&report)),
                }
            }
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn handle_add(
        &self,
        parent: Option<NodeId>,
        meta: &[(String, String)],
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let metadata: BTreeMap<String, String> = meta.iter().cloned().collect();
        let (node, outcome) = match parent {
            Some(parent) => {
                if self.store.find_by_id(&parent)?.is_none() {
                    return Err(ApiError::NodeNotFound(parent));
                }
                self.api.insert(Some(parent), metadata)?
            }
            None => {
                let node = self.api.insert_root(metadata)?;
                let outcome = node
                    .interval
                    .map(InsertOutcome::Placed)
                    .unwrap_or(InsertOutcome::Skipped(SkipReason::Root));
                (node, outcome)
            }
        };
        match format {
            OutputFormat::Json => to_json(&node),
            OutputFormat::Text => Ok(format_insert_text(&node, &outcome)),
        }
    }

    fn handle_remove(
        &self,
        id: &NodeId,
        subtree: bool,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        if subtree {
            let result = self.api.remove_subtree(id)?;
            return match format {
                OutputFormat::Json => to_json(&json!({ "removed": result.removed })),
                OutputFormat::Text => Ok(format_removed_subtree_text(&result)),
            };
        }
        let outcome = self.api.remove(id)?;
        match format {
            OutputFormat::Json => to_json(&json!({ "removed": [id] })),
            OutputFormat::Text => Ok(format_remove_text(&[*id], &outcome)),
        }
    }

    fn handle_rebuild(
        &self,
        root: Option<NodeId>,
        left: u64,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        match root {
            Some(root) => {
                let report = self.api.rebuild(&root, left)?;
                match format {
                    OutputFormat::Json => to_json(&json!({
                        "root": report.root,
                        "nodes": report.nodes,
                        "left": report.left,
                        "right": report.right,
                        "duration_ms": report.duration_ms,
                    })),
                    OutputFormat::Text => Ok(format_rebuild_text(&report)),
                }
            }
            None => {
                let report = self.api.rebuild_all()?;
                match format {
                    OutputFormat::Json => to_json(&json!({
                        "trees": report.trees.iter().map(|t| json!({
                            "root": t.root,
                            "nodes": t.nodes,
                            "left": t.left,
                            "right": t.right,
                        })).collect::<Vec<_>>(),
                        "nodes": report.nodes(),
                        "cleared": report.cleared,
                    })),
                    OutputFormat::Text => Ok(format_rebuild_all_text(&report)),
                }
            }
        }
    }

    fn handle_tree(
        &self,
        root: Option<NodeId>,
        unwrap: bool,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let view = match self.api.subtree_view(root, !unwrap)? {
            Some(view) => view,
            None => {
                return match root.or(self.config.tree.root) {
                    Some(id) => Err(ApiError::NodeNotFound(id)),
                    None => Err(ApiError::ConfigError(
                        "No root given; pass --root or set tree.root in config".to_string(),
                    )),
                };
            }
        };
        match format {
            OutputFormat::Json => to_json(&view),
            OutputFormat::Text => Ok(match view {
                SubtreeView::Wrapped(tree) => format_tree_text(&[tree]),
                SubtreeView::Unwrapped(children) => format_tree_text(&children),
            }),
        }
    }

    fn render_nodes(
        &self,
        title: &str,
        nodes: Vec<Node>,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        match format {
            OutputFormat::Json => to_json(&nodes),
            OutputFormat::Text => Ok(format_node_table(title, &nodes)),
        }
    }
}
