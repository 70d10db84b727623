//! Montage Effects - Built-in video effect plugins
//!
//! This crate provides the leaf plugins that ship with montage, built on
//! montage-core's [`EffectPlugin`](montage_core::EffectPlugin) contract:
//!
//! - [`SolidColor`] - Source emitting frames of one colour
//! - [`Invert`] - Inverts the colour channels, keeps alpha
//! - [`Mixer`] - Blends two inputs with a fixed weight
//! - [`Duplicate`] - Copies one input to two outputs (explicit fan-out)
//! - [`FrameProbe`] - Sink that records the last frame it received
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use montage_core::{EffectNode, PluginCatalog};
//! use montage_effects::{FrameProbe, Invert, SolidColor};
//!
//! let probe = FrameProbe::new();
//! let handle = probe.handle();
//!
//! let mut catalog = PluginCatalog::new();
//! catalog.register("solid", "", || SolidColor::new(2, 2, 0x0000_00ff)).unwrap();
//! catalog.register("invert", "", || Invert).unwrap();
//! catalog.register("probe", "", move || probe.clone()).unwrap();
//!
//! let root = EffectNode::new_root("demo", Arc::new(catalog));
//! let src = root.create_child("solid", Some("src")).unwrap();
//! let inv = root.create_child("invert", Some("inv")).unwrap();
//! root.create_child("probe", Some("probe")).unwrap();
//! src.connect_sibling("out", "inv", "in").unwrap();
//! inv.connect_sibling("out", "probe", "in").unwrap();
//!
//! root.render();
//! assert_eq!(handle.last().unwrap().pixels()[0], 0xffff_ffff);
//! ```

pub mod duplicate;
pub mod invert;
pub mod mixer;
pub mod probe;
pub mod solid;

// Re-export main types at crate root
pub use duplicate::Duplicate;
pub use invert::Invert;
pub use mixer::Mixer;
pub use probe::{FrameProbe, ProbeHandle};
pub use solid::SolidColor;
