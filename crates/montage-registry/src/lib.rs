//! Effect registry for montage's built-in plugins.
//!
//! This crate provides a centralized registry for discovering and
//! instantiating the effects that ship with montage. It enables type selection
//! by name and carries the slot layout of every effect so front ends can
//! describe them without building a graph.
//!
//! # Features
//!
//! - **Effect Discovery**: List all available effects with metadata
//! - **Factory Pattern**: Create plugins by id at runtime
//! - **Category System**: Effects organized by role (source, filter, ...)
//! - **Catalog Building**: Produce the [`PluginCatalog`] graphs instantiate from
//!
//! # Example
//!
//! ```rust
//! use montage_core::EffectNode;
//! use montage_registry::{EffectCategory, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//!
//! for effect in registry.effects_in_category(EffectCategory::Source) {
//!     println!("{}: {}", effect.id, effect.description);
//! }
//!
//! let root = EffectNode::new_root("demo", registry.shared_catalog());
//! let solid = root.create_child("solid", None).unwrap();
//! assert_eq!(solid.instance_name(), "solid_1");
//! ```

use std::sync::Arc;

use montage_core::{EffectPlugin, PluginCatalog};
use montage_effects::{Duplicate, FrameProbe, Invert, Mixer, SolidColor};

/// Category of effect for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Nodes that produce frames without inputs
    Source,
    /// Single-input frame transforms
    Filter,
    /// Nodes combining several inputs
    Mixer,
    /// Routing and observation helpers
    Utility,
}

impl EffectCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Source => "Source",
            EffectCategory::Filter => "Filter",
            EffectCategory::Mixer => "Mixer",
            EffectCategory::Utility => "Utility",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            EffectCategory::Source => "Generators that emit frames on every render",
            EffectCategory::Filter => "Per-pixel transforms with one input and one output",
            EffectCategory::Mixer => "Blends of two or more inputs",
            EffectCategory::Utility => "Fan-out, probes, and other routing helpers",
        }
    }
}

/// Describes an effect in the registry.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    /// Unique identifier, also the type name in the plugin catalog.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the effect.
    pub description: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
    /// Input slot names in declaration order.
    pub inputs: &'static [&'static str],
    /// Output slot names in declaration order.
    pub outputs: &'static [&'static str],
}

/// Factory function type for creating plugins.
type EffectFactory = fn() -> Box<dyn EffectPlugin>;

struct RegistryEntry {
    descriptor: EffectDescriptor,
    factory: EffectFactory,
}

/// Registry of all built-in effects.
pub struct EffectRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Create a new registry with all built-in effects registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(5),
        };
        registry.register_builtin_effects();
        registry
    }

    fn register_builtin_effects(&mut self) {
        self.register(
            EffectDescriptor {
                id: "solid",
                name: "Solid Color",
                description: "Emits frames filled with one colour",
                category: EffectCategory::Source,
                inputs: &[],
                outputs: &["out"],
            },
            || Box::new(SolidColor::default()),
        );

        self.register(
            EffectDescriptor {
                id: "invert",
                name: "Invert",
                description: "Inverts colour channels, keeps alpha",
                category: EffectCategory::Filter,
                inputs: &["in"],
                outputs: &["out"],
            },
            || Box::new(Invert),
        );

        self.register(
            EffectDescriptor {
                id: "mixer",
                name: "Mixer",
                description: "Blends two inputs at equal weight",
                category: EffectCategory::Mixer,
                inputs: &["a", "b"],
                outputs: &["out"],
            },
            || Box::new(Mixer::default()),
        );

        self.register(
            EffectDescriptor {
                id: "duplicate",
                name: "Duplicate",
                description: "Copies one input to two outputs",
                category: EffectCategory::Utility,
                inputs: &["in"],
                outputs: &["out0", "out1"],
            },
            || Box::new(Duplicate),
        );

        self.register(
            EffectDescriptor {
                id: "probe",
                name: "Frame Probe",
                description: "Sink that keeps the last frame it received",
                category: EffectCategory::Utility,
                inputs: &["in"],
                outputs: &[],
            },
            || Box::new(FrameProbe::new()),
        );
    }

    fn register(&mut self, descriptor: EffectDescriptor, factory: EffectFactory) {
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
    }

    /// Returns descriptors for all registered effects.
    pub fn all_effects(&self) -> Vec<&EffectDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for effects in a specific category.
    pub fn effects_in_category(&self, category: EffectCategory) -> Vec<&EffectDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by effect id.
    pub fn get(&self, id: &str) -> Option<&EffectDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Create a plugin instance by id.
    pub fn create(&self, id: &str) -> Option<Box<dyn EffectPlugin>> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| (e.factory)())
    }

    /// Build a plugin catalog holding every registered effect, keyed by id.
    ///
    /// Catalog type ids follow registration order, starting at 1.
    pub fn catalog(&self) -> PluginCatalog {
        let mut catalog = PluginCatalog::new();
        for entry in &self.entries {
            let registered = catalog.register_boxed(
                entry.descriptor.id,
                entry.descriptor.description,
                entry.factory,
            );
            debug_assert!(
                registered.is_ok(),
                "built-in effect ids must be unique: {}",
                entry.descriptor.id
            );
        }
        catalog
    }

    /// [`catalog`](Self::catalog) wrapped for sharing between graphs.
    pub fn shared_catalog(&self) -> Arc<PluginCatalog> {
        Arc::new(self.catalog())
    }

    /// Returns the number of registered effects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no effects are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
