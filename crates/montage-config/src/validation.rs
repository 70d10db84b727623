//! Patch validation.
//!
//! Checks a [`Patch`](crate::Patch) against an [`EffectRegistry`] without
//! building anything: every leaf type must exist, names must be usable, and
//! every edge must join a declared output to a declared input with neither
//! end used twice. Nodes are reported by their path from the root, e.g.
//! `main/fx/inv`.
//!
//! # Example
//!
//! ```rust
//! use montage_config::{Patch, PatchValidator};
//!
//! let validator = PatchValidator::new();
//! validator.validate(&Patch::demo()).expect("demo patch is valid");
//! ```

use std::collections::HashSet;

use montage_core::{Edge, NodeDescription, PortRef};
use montage_registry::EffectRegistry;
use thiserror::Error;

use crate::patch::Patch;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A leaf names a type the registry does not know.
    #[error("unknown effect type '{effect}' at '{node}'")]
    UnknownEffect {
        /// Path of the offending node.
        node: String,
        /// The unregistered type name.
        effect: String,
    },

    /// A node or root has an empty name.
    #[error("empty node name under '{parent}'")]
    EmptyName {
        /// Path of the container holding the unnamed node.
        parent: String,
    },

    /// Two children of one container share a name.
    #[error("duplicate child '{child}' in '{container}'")]
    DuplicateChild {
        /// Path of the container.
        container: String,
        /// The repeated name.
        child: String,
    },

    /// Two slots of one node share a name.
    #[error("duplicate slot '{slot}' on '{node}'")]
    DuplicateSlot {
        /// Path of the node.
        node: String,
        /// The repeated slot name.
        slot: String,
    },

    /// A leaf description carries children or edges.
    #[error("typed node '{node}' cannot own children or edges")]
    TypedContainer {
        /// Path of the node.
        node: String,
    },

    /// An edge names a child that is not in the container.
    #[error("edge in '{container}' references unknown node '{node}'")]
    UnknownNode {
        /// Path of the container owning the edge.
        container: String,
        /// The missing child name.
        node: String,
    },

    /// An edge end points past the declared slots.
    #[error("edge in '{container}' uses undeclared {direction} #{port} of '{node}'")]
    UndeclaredPort {
        /// Path of the container owning the edge.
        container: String,
        /// Child name, or the container's own path for internal slots.
        node: String,
        /// `"output"` or `"input"`.
        direction: &'static str,
        /// Declaration position.
        port: usize,
    },

    /// Two edges share an output or an input.
    #[error("{direction} #{port} of '{node}' is connected more than once in '{container}'")]
    PortReused {
        /// Path of the container owning the edges.
        container: String,
        /// Child name, or the container's own path for internal slots.
        node: String,
        /// `"output"` or `"input"`.
        direction: &'static str,
        /// Declaration position.
        port: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validator for patches, backed by an effect registry.
pub struct PatchValidator {
    registry: EffectRegistry,
}

impl Default for PatchValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchValidator {
    /// Create a validator over the built-in effects.
    pub fn new() -> Self {
        Self::with_registry(EffectRegistry::new())
    }

    /// Create a validator over a specific registry.
    pub fn with_registry(registry: EffectRegistry) -> Self {
        Self { registry }
    }

    /// Validate that an effect type exists.
    pub fn validate_effect(&self, effect_type: &str) -> ValidationResult<()> {
        if self.registry.get(effect_type).is_some() {
            Ok(())
        } else {
            Err(ValidationError::UnknownEffect {
                node: String::new(),
                effect: effect_type.to_string(),
            })
        }
    }

    /// Validate a whole patch, collecting every problem found.
    pub fn validate(&self, patch: &Patch) -> ValidationResult<()> {
        validate_patch(patch, &self.registry)
    }
}

/// Validate a patch against a registry.
pub fn validate_patch(patch: &Patch, registry: &EffectRegistry) -> ValidationResult<()> {
    let checker = Checker { registry };
    let mut errors = Vec::new();
    if patch.graph.type_name.is_some() {
        errors.push(ValidationError::TypedContainer {
            node: patch.graph.name.clone(),
        });
    }
    if patch.graph.name.is_empty() {
        errors.push(ValidationError::EmptyName {
            parent: String::new(),
        });
    }
    checker.check_node(&patch.graph, &patch.graph.name, &mut errors);

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

struct Checker<'a> {
    registry: &'a EffectRegistry,
}

impl Checker<'_> {
    fn check_node(&self, desc: &NodeDescription, path: &str, errors: &mut Vec<ValidationError>) {
        if let Some(effect) = &desc.type_name {
            if self.registry.get(effect).is_none() {
                errors.push(ValidationError::UnknownEffect {
                    node: path.to_string(),
                    effect: effect.clone(),
                });
            }
            if !desc.children.is_empty() || !desc.edges.is_empty() {
                errors.push(ValidationError::TypedContainer {
                    node: path.to_string(),
                });
            }
            return;
        }

        for slot in duplicates(desc.inputs.iter())
            .into_iter()
            .chain(duplicates(desc.outputs.iter()))
        {
            errors.push(ValidationError::DuplicateSlot {
                node: path.to_string(),
                slot,
            });
        }
        for child in duplicates(desc.children.iter().map(|c| &c.name)) {
            errors.push(ValidationError::DuplicateChild {
                container: path.to_string(),
                child,
            });
        }
        for child in &desc.children {
            if child.name.is_empty() {
                errors.push(ValidationError::EmptyName {
                    parent: path.to_string(),
                });
                continue;
            }
            self.check_node(child, &format!("{path}/{}", child.name), errors);
        }
        self.check_edges(desc, path, errors);
    }

    fn check_edges(&self, desc: &NodeDescription, path: &str, errors: &mut Vec<ValidationError>) {
        let mut used_outputs = HashSet::new();
        let mut used_inputs = HashSet::new();

        for Edge { from, to } in &desc.edges {
            for (port, direction, used) in [
                (from, "output", &mut used_outputs),
                (to, "input", &mut used_inputs),
            ] {
                let node_label = port.node.as_deref().unwrap_or(path).to_string();
                let Some(count) = self.port_count(desc, port, direction) else {
                    errors.push(ValidationError::UnknownNode {
                        container: path.to_string(),
                        node: node_label,
                    });
                    continue;
                };
                if port.port >= count {
                    errors.push(ValidationError::UndeclaredPort {
                        container: path.to_string(),
                        node: node_label,
                        direction,
                        port: port.port,
                    });
                } else if !used.insert(port.clone()) {
                    errors.push(ValidationError::PortReused {
                        container: path.to_string(),
                        node: node_label,
                        direction,
                        port: port.port,
                    });
                }
            }
        }
    }

    /// Slots an edge end can address, or `None` if its node is unknown.
    ///
    /// The container's own end addresses its internal slots: an edge leaving
    /// the container starts at the mirror of an external input, one entering
    /// it ends at the mirror of an external output.
    fn port_count(&self, desc: &NodeDescription, port: &PortRef, direction: &str) -> Option<usize> {
        let Some(name) = &port.node else {
            return Some(match direction {
                "output" => desc.inputs.len(),
                _ => desc.outputs.len(),
            });
        };
        let child = desc.child(name)?;
        let count = match &child.type_name {
            Some(effect) => {
                let Some(descriptor) = self.registry.get(effect) else {
                    // reported as an unknown effect already
                    return Some(usize::MAX);
                };
                match direction {
                    "output" => descriptor.outputs.len(),
                    _ => descriptor.inputs.len(),
                }
            }
            None => match direction {
                "output" => child.outputs.len(),
                _ => child.inputs.len(),
            },
        };
        Some(count)
    }
}

/// Names appearing more than once, each reported once, ignoring empty names.
fn duplicates<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut out = Vec::new();
    for name in names.filter(|n| !n.is_empty()) {
        if !seen.insert(name) && reported.insert(name) {
            out.push(name.clone());
        }
    }
    out
}
