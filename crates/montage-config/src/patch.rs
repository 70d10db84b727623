//! Patch file format and operations.

use std::path::Path;
use std::sync::Arc;

use montage_core::{Edge, EffectNode, NodeDescription, PluginCatalog, PortRef, register_root};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A complete root graph stored as TOML.
///
/// The graph section is a [`NodeDescription`]: names, slot names and
/// connections by declaration position. Ids are never stored, so a patch
/// rebuilt from disk describes itself exactly as the graph it was captured
/// from.
///
/// # TOML Format
///
/// ```toml
/// name = "Inverted gray"
/// description = "A solid source through an inverter"
///
/// [graph]
/// name = "main"
///
/// [[graph.children]]
/// name = "src"
/// type = "solid"
///
/// [[graph.children]]
/// name = "inv"
/// type = "invert"
///
/// [[graph.edges]]
/// from = { node = "src", port = 0 }
/// to = { node = "inv", port = 0 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patch {
    /// Name of the patch.
    pub name: String,

    /// Optional description of the patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The root graph. Its name is the root's name once installed.
    pub graph: NodeDescription,
}

impl Patch {
    /// Create a patch around a graph description.
    pub fn new(name: impl Into<String>, graph: NodeDescription) -> Self {
        Self {
            name: name.into(),
            description: None,
            graph,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Snapshot a live graph.
    pub fn capture(name: impl Into<String>, node: &EffectNode) -> Self {
        Self::new(name, node.describe())
    }

    /// The demo patch: a solid source split into an inverted and a plain
    /// branch, mixed back together and observed by a probe.
    ///
    /// ```text
    /// src ─► dup ─out0─► inv ─► mix.a
    ///            └out1────────► mix.b ─► sink
    /// ```
    pub fn demo() -> Self {
        fn leaf(name: &str, effect: &str) -> NodeDescription {
            NodeDescription {
                name: name.to_string(),
                type_name: Some(effect.to_string()),
                ..NodeDescription::default()
            }
        }
        fn edge(from: (&str, usize), to: (&str, usize)) -> Edge {
            Edge {
                from: PortRef::child(from.0, from.1),
                to: PortRef::child(to.0, to.1),
            }
        }

        let graph = NodeDescription {
            name: "main".to_string(),
            children: vec![
                leaf("src", "solid"),
                leaf("dup", "duplicate"),
                leaf("inv", "invert"),
                leaf("mix", "mixer"),
                leaf("sink", "probe"),
            ],
            edges: vec![
                edge(("src", 0), ("dup", 0)),
                edge(("dup", 0), ("inv", 0)),
                edge(("dup", 1), ("mix", 1)),
                edge(("inv", 0), ("mix", 0)),
                edge(("mix", 0), ("sink", 0)),
            ],
            ..NodeDescription::default()
        };
        Self::new("Demo", graph).with_description("Solid source blended with its inverse")
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let patch: Patch = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), name = %patch.name, "loaded patch");
        Ok(patch)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the patch to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), name = %self.name, "saved patch");
        Ok(())
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of nodes in the graph, root included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Build a detached root graph from this patch.
    pub fn instantiate(&self, catalog: Arc<PluginCatalog>) -> Result<Arc<EffectNode>, ConfigError> {
        let root = EffectNode::root_from_description(&self.graph, catalog)?;
        tracing::debug!(
            patch = %self.name,
            root = %root.instance_name(),
            nodes = self.node_count(),
            "instantiated patch"
        );
        Ok(root)
    }

    /// Build the graph and register it in the process-wide root table under
    /// the graph's name.
    pub fn install(&self, catalog: Arc<PluginCatalog>) -> Result<Arc<EffectNode>, ConfigError> {
        let root = self.instantiate(catalog)?;
        register_root(Arc::clone(&root))?;
        tracing::info!(patch = %self.name, root = %root.instance_name(), "installed patch");
        Ok(root)
    }
}
