//! Shared CLI helpers used across multiple commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use montage_config::{Patch, validate_patch};
use montage_core::EffectNode;
use montage_registry::EffectRegistry;

/// Load a patch file and check it against the registry.
pub fn load_patch(path: &Path, registry: &EffectRegistry) -> anyhow::Result<Patch> {
    let patch = Patch::load(path)?;
    validate_patch(&patch, registry)
        .with_context(|| format!("patch '{}' is invalid", path.display()))?;
    Ok(patch)
}

/// Every leaf of type `type_name` below `node`, with its path from `node`.
pub fn leaves_of_type(node: &Arc<EffectNode>, type_name: &str) -> Vec<(String, Arc<EffectNode>)> {
    let mut found = Vec::new();
    collect(node, node.instance_name(), type_name, &mut found);
    found
}

fn collect(
    node: &Arc<EffectNode>,
    path: &str,
    type_name: &str,
    found: &mut Vec<(String, Arc<EffectNode>)>,
) {
    for child in node.children() {
        let child_path = format!("{path}/{}", child.instance_name());
        if child.is_leaf() {
            if child.type_name() == type_name {
                found.push((child_path, child));
            }
        } else {
            collect(&child, &child_path, type_name, found);
        }
    }
}

/// Format a packed RGBA pixel as `#rrggbbaa`.
pub fn hex_color(pixel: u32) -> String {
    format!("#{pixel:08x}")
}
