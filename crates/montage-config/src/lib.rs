//! Patch files for montage effect graphs.
//!
//! A patch is a TOML document holding one complete root graph: containers,
//! typed leaves, slot names and the connections between them. This crate
//! loads and saves patches, captures them from live graphs, validates them
//! against the effect registry and builds graphs from them.
//!
//! # Features
//!
//! - **Patch Files**: Load and save graphs as TOML
//! - **Capture**: Snapshot any live subtree into a patch
//! - **Validation**: Check types, names and edges before building anything
//! - **Installation**: Build a patch and register it as a named root
//!
//! # Example
//!
//! ```rust,no_run
//! use montage_config::{Patch, validate_patch};
//! use montage_registry::EffectRegistry;
//!
//! let registry = EffectRegistry::new();
//! let patch = Patch::load("demo.toml").unwrap();
//! validate_patch(&patch, &registry).unwrap();
//!
//! let root = patch.install(registry.shared_catalog()).unwrap();
//! root.render();
//!
//! Patch::capture("snapshot", &root).save("snapshot.toml").unwrap();
//! ```

mod error;
mod patch;

/// Patch validation.
pub mod validation;

pub use error::ConfigError;
pub use patch::Patch;
pub use validation::{PatchValidator, ValidationError, ValidationResult, validate_patch};

/// Re-export commonly used types from montage-registry
pub use montage_registry::{EffectCategory, EffectDescriptor, EffectRegistry};
