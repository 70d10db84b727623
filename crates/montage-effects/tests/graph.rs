//! Built-in effects wired into real graphs.

use std::sync::Arc;

use montage_core::{EffectNode, PluginCatalog, rgba};
use montage_effects::{Duplicate, FrameProbe, Invert, Mixer, ProbeHandle, SolidColor};

const BLACK: u32 = rgba(0, 0, 0, 255);

fn catalog(probe: &FrameProbe) -> Arc<PluginCatalog> {
    let probe = probe.clone();
    let mut catalog = PluginCatalog::new();
    catalog
        .register("solid", "black 2x2 source", || SolidColor::new(2, 2, BLACK))
        .unwrap();
    catalog.register("invert", "", || Invert).unwrap();
    catalog.register("mixer", "", || Mixer::new(0.5)).unwrap();
    catalog.register("duplicate", "", || Duplicate).unwrap();
    catalog
        .register("probe", "", move || probe.clone())
        .unwrap();
    Arc::new(catalog)
}

fn setup(name: &str) -> (Arc<EffectNode>, ProbeHandle) {
    let probe = FrameProbe::new();
    let handle = probe.handle();
    (EffectNode::new_root(name, catalog(&probe)), handle)
}

#[test]
fn invert_chain_reaches_probe() {
    let (root, handle) = setup("invert_chain");
    let src = root.create_child("solid", None).unwrap();
    let inv = root.create_child("invert", None).unwrap();
    root.create_child("probe", Some("sink")).unwrap();
    src.connect_sibling("out", inv.instance_name(), "in").unwrap();
    inv.connect_sibling("out", "sink", "in").unwrap();

    root.render();
    let frame = handle.last().unwrap();
    assert_eq!(frame.pixels(), &[rgba(255, 255, 255, 255); 4]);
    assert_eq!(handle.frames(), 1);

    root.render();
    assert_eq!(handle.last().unwrap().pts(), 1);
    assert_eq!(handle.renders(), 2);
}

#[test]
fn duplicate_feeds_both_mixer_inputs() {
    let (root, handle) = setup("dup_mix");
    let src = root.create_child("solid", Some("src")).unwrap();
    let dup = root.create_child("duplicate", Some("dup")).unwrap();
    let inv = root.create_child("invert", Some("inv")).unwrap();
    let mix = root.create_child("mixer", Some("mix")).unwrap();
    root.create_child("probe", Some("sink")).unwrap();

    src.connect_sibling("out", "dup", "in").unwrap();
    dup.connect_sibling("out0", "inv", "in").unwrap();
    inv.connect_sibling("out", "mix", "a").unwrap();
    dup.connect_sibling("out1", "mix", "b").unwrap();
    mix.connect_sibling("out", "sink", "in").unwrap();

    root.render();
    // white and black at half weight
    assert_eq!(handle.last().unwrap().pixels()[0], rgba(128, 128, 128, 255));
    assert_eq!(handle.renders(), 1);
}

#[test]
fn duplicate_outputs_share_pixels() {
    let (root, _) = setup("dup_share");
    let src = root.create_child("solid", Some("src")).unwrap();
    let dup = root.create_child("duplicate", Some("dup")).unwrap();
    root.create_child("probe", Some("p")).unwrap();
    src.connect_sibling("out", "dup", "in").unwrap();
    dup.connect_sibling("out0", "p", "in").unwrap();

    root.render();
    let a = dup.output_value("out0").unwrap().unwrap();
    let b = dup.output_value("out1").unwrap().unwrap();
    assert!(a.shares_pixels_with(&b));
}

#[test]
fn mixer_passes_single_input_through() {
    let (root, handle) = setup("mix_single");
    let src = root.create_child("solid", Some("src")).unwrap();
    let mix = root.create_child("mixer", Some("mix")).unwrap();
    root.create_child("probe", Some("sink")).unwrap();
    src.connect_sibling("out", "mix", "b").unwrap();
    mix.connect_sibling("out", "sink", "in").unwrap();

    root.render();
    assert_eq!(handle.last().unwrap().pixels()[0], BLACK);
}

#[test]
fn effects_inside_a_group() {
    let (root, handle) = setup("grouped");
    let src = root.create_child("solid", Some("src")).unwrap();
    let group = root.create_empty_child(Some("fx")).unwrap();
    root.create_child("probe", Some("sink")).unwrap();
    group.create_input(Some("in")).unwrap();
    group.create_output(Some("out")).unwrap();
    group.create_child("invert", Some("inv")).unwrap();

    src.connect_sibling("out", "fx", "in").unwrap();
    group.connect_parent_to_child("in", "inv", "in").unwrap();
    group.child("inv").unwrap().connect_child_to_parent("out", "out").unwrap();
    group.connect_sibling("out", "sink", "in").unwrap();

    root.render();
    assert_eq!(handle.last().unwrap().pixels()[0], rgba(255, 255, 255, 255));
}

#[test]
fn unconnected_probe_counts_empty_renders() {
    let (root, handle) = setup("lonely");
    let probe = root.create_child("probe", None).unwrap();
    assert_eq!(probe.instance_name(), "probe_1");
    root.render();
    // never scheduled: no connected outputs
    assert_eq!(handle.renders(), 0);
    assert!(handle.last().is_none());
}
