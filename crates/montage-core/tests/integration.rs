//! Integration tests for the montage-core effect graph.
//!
//! Builds small graphs from counting plugins and checks the render order,
//! the once-per-pass guarantee, the cycle policy, the connection bookkeeping
//! and the describe/rebuild round trip. The last section hammers one graph
//! from several threads at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use montage_core::{
    EffectNode, EffectPlugin, Frame, GraphError, GraphResult, NodeSetup, PluginCatalog,
    RenderContext, Scope,
};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<&'static str>>>;

/// Leaf with a configurable number of inputs and outputs. Every render is
/// logged; outputs carry the sum of the inputs plus one.
struct Probe {
    label: &'static str,
    inputs: usize,
    outputs: usize,
    log: Log,
    renders: Arc<AtomicUsize>,
}

impl EffectPlugin for Probe {
    fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
        for i in 0..self.inputs {
            setup.add_input(&format!("in{i}"))?;
        }
        for i in 0..self.outputs {
            setup.add_output(&format!("out{i}"))?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        self.log.lock().push(self.label);
        self.renders.fetch_add(1, Ordering::SeqCst);
        let sum: u32 = (0..ctx.input_count())
            .filter_map(|i| ctx.input_at(i))
            .map(|f| f.pixels()[0])
            .sum();
        for i in 0..ctx.output_count() {
            ctx.emit_at(i, Frame::solid(1, 1, sum + 1));
        }
    }
}

struct Fixture {
    log: Log,
    renders: Vec<(&'static str, Arc<AtomicUsize>)>,
    catalog: Arc<PluginCatalog>,
}

impl Fixture {
    /// One plugin type per `(label, inputs, outputs)`.
    fn new(types: &[(&'static str, usize, usize)]) -> Self {
        let log = Log::default();
        let mut catalog = PluginCatalog::new();
        let mut renders = Vec::new();
        for &(label, inputs, outputs) in types {
            let counter = Arc::new(AtomicUsize::new(0));
            let (l, c) = (Arc::clone(&log), Arc::clone(&counter));
            catalog
                .register(label, "test probe", move || Probe {
                    label,
                    inputs,
                    outputs,
                    log: Arc::clone(&l),
                    renders: Arc::clone(&c),
                })
                .unwrap();
            renders.push((label, counter));
        }
        Self {
            log,
            renders,
            catalog: Arc::new(catalog),
        }
    }

    fn renders(&self, label: &str) -> usize {
        self.renders
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, c)| c.load(Ordering::SeqCst))
            .unwrap()
    }

    fn root(&self, name: &str) -> Arc<EffectNode> {
        EffectNode::new_root(name, Arc::clone(&self.catalog))
    }
}

// ============================================================================
// 1. Render order
// ============================================================================

#[test]
fn source_renders_before_consumer() {
    let fx = Fixture::new(&[("A", 0, 1), ("B", 1, 1)]);
    let root = fx.root("R");
    let a = root.create_child("A", Some("A")).unwrap();
    let b = root.create_child("B", Some("B")).unwrap();

    a.connect_sibling("out0", "B", "in0").unwrap();
    root.render();
    assert_eq!(*fx.log.lock(), vec!["A", "B"]);
    assert_eq!(b.output_value("out0").unwrap().unwrap().pixels()[0], 2);

    a.disconnect_output("out0").unwrap();
    assert!(matches!(
        a.disconnect_output("out0"),
        Err(GraphError::NotConnected { .. })
    ));
}

#[test]
fn diamond_sink_renders_once() {
    let fx = Fixture::new(&[("src", 0, 2), ("left", 1, 1), ("right", 1, 1), ("sink", 2, 0)]);
    let root = fx.root("diamond");
    let src = root.create_child("src", Some("src")).unwrap();
    let left = root.create_child("left", Some("left")).unwrap();
    let right = root.create_child("right", Some("right")).unwrap();
    let sink = root.create_child("sink", Some("sink")).unwrap();

    src.connect_sibling("out0", "left", "in0").unwrap();
    src.connect_sibling("out1", "right", "in0").unwrap();
    left.connect_sibling("out0", "sink", "in0").unwrap();
    right.connect_sibling("out0", "sink", "in1").unwrap();

    root.render();
    assert_eq!(fx.renders("sink"), 1);
    assert_eq!(*fx.log.lock(), vec!["src", "left", "right", "sink"]);
    assert_eq!(sink.input_value("in0").unwrap().unwrap().pixels()[0], 2);
    assert_eq!(sink.input_value("in1").unwrap().unwrap().pixels()[0], 2);

    root.render();
    assert_eq!(fx.renders("sink"), 2, "visited marks reset between passes");
    for node in [&src, &left, &right, &sink] {
        assert!(!node.is_visited());
    }
}

#[test]
fn isolated_cycle_is_never_rendered() {
    let fx = Fixture::new(&[("ping", 1, 1), ("pong", 1, 1), ("src", 0, 1), ("dst", 1, 0)]);
    let root = fx.root("cycle");
    let ping = root.create_child("ping", Some("ping")).unwrap();
    let pong = root.create_child("pong", Some("pong")).unwrap();
    ping.connect_sibling("out0", "pong", "in0").unwrap();
    pong.connect_sibling("out0", "ping", "in0").unwrap();

    // An unrelated chain still renders.
    let src = root.create_child("src", Some("src")).unwrap();
    root.create_child("dst", Some("dst")).unwrap();
    src.connect_sibling("out0", "dst", "in0").unwrap();

    root.render();
    assert_eq!(fx.renders("ping"), 0);
    assert_eq!(fx.renders("pong"), 0);
    assert_eq!(fx.renders("src"), 1);
    assert_eq!(fx.renders("dst"), 1);
}

#[test]
fn nested_groups_bridge_in_both_directions() {
    let fx = Fixture::new(&[("src", 0, 1), ("inner", 1, 1), ("sink", 1, 0)]);
    let root = fx.root("nested");
    let src = root.create_child("src", Some("src")).unwrap();
    let outer = root.create_empty_child(Some("outer")).unwrap();
    outer.create_input(Some("in")).unwrap();
    outer.create_output(Some("out")).unwrap();
    let inner_group = outer.create_empty_child(Some("inner_group")).unwrap();
    inner_group.create_input(Some("in")).unwrap();
    inner_group.create_output(Some("out")).unwrap();
    let leaf = inner_group.create_child("inner", Some("leaf")).unwrap();
    let sink = root.create_child("sink", Some("sink")).unwrap();

    src.connect_sibling("out0", "outer", "in").unwrap();
    outer.connect_parent_to_child("in", "inner_group", "in").unwrap();
    inner_group.connect_parent_to_child("in", "leaf", "in0").unwrap();
    leaf.connect_child_to_parent("out0", "out").unwrap();
    inner_group.connect_child_to_parent("out", "out").unwrap();
    outer.connect_sibling("out", "sink", "in0").unwrap();

    root.render();
    assert_eq!(*fx.log.lock(), vec!["src", "inner", "sink"]);
    assert_eq!(sink.input_value("in0").unwrap().unwrap().pixels()[0], 2);
}

// ============================================================================
// 2. Connection bookkeeping
// ============================================================================

#[test]
fn connect_then_disconnect_restores_reference_sets() {
    let fx = Fixture::new(&[("a", 0, 1), ("b", 1, 0)]);
    let root = fx.root("refs");
    let a = root.create_child("a", Some("a")).unwrap();
    let b = root.create_child("b", Some("b")).unwrap();

    let before = (
        a.connected_outputs(Scope::External).unwrap(),
        b.connected_inputs(Scope::External).unwrap(),
    );
    a.connect_sibling("out0", "b", "in0").unwrap();
    assert_eq!(a.connected_outputs(Scope::External).unwrap().len(), 1);
    assert_eq!(b.connected_inputs(Scope::External).unwrap().len(), 1);

    a.disconnect_output("out0").unwrap();
    let after = (
        a.connected_outputs(Scope::External).unwrap(),
        b.connected_inputs(Scope::External).unwrap(),
    );
    assert_eq!(before, after);
    assert_eq!(b.input_value("in0").unwrap(), None);
}

#[test]
fn connected_slot_cannot_be_deleted() {
    let fx = Fixture::new(&[("a", 0, 1)]);
    let root = fx.root("slots");
    let group = root.create_empty_child(Some("g")).unwrap();
    group.create_input(Some("in")).unwrap();
    let a = root.create_child("a", Some("a")).unwrap();
    a.connect_sibling("out0", "g", "in").unwrap();

    assert!(matches!(
        group.delete_input("in"),
        Err(GraphError::SlotInUse { .. })
    ));
    a.disconnect_output("out0").unwrap();
    group.delete_input("in").unwrap();
    assert_eq!(group.input_count(), 0);
}

#[test]
fn mirror_in_use_blocks_delete() {
    let fx = Fixture::new(&[("b", 1, 0)]);
    let root = fx.root("mirror");
    let group = root.create_empty_child(Some("g")).unwrap();
    group.create_input(Some("in")).unwrap();
    group.create_child("b", Some("b")).unwrap();
    group.connect_parent_to_child("in", "b", "in0").unwrap();

    let err = group.delete_input("in").unwrap_err();
    assert!(err.to_string().contains("internal output"), "{err}");
}

// ============================================================================
// 3. Describe / rebuild
// ============================================================================

#[test]
fn description_survives_delete_and_rebuild() {
    let fx = Fixture::new(&[("src", 0, 1), ("mid", 1, 1), ("sink", 1, 0)]);
    let root = fx.root("persist");
    let group = root.create_empty_child(Some("chain")).unwrap();
    group.create_input(Some("in")).unwrap();
    group.create_output(Some("out")).unwrap();
    let mid = group.create_child("mid", None).unwrap();
    group
        .connect_parent_to_child("in", mid.instance_name(), "in0")
        .unwrap();
    mid.connect_child_to_parent("out0", "out").unwrap();
    let src = root.create_child("src", Some("src")).unwrap();
    root.create_child("sink", Some("sink")).unwrap();
    src.connect_sibling("out0", "chain", "in").unwrap();
    group.connect_sibling("out", "sink", "in0").unwrap();

    let desc = group.describe();
    src.disconnect_output("out0").unwrap();
    group.disconnect_output("out").unwrap();
    root.delete_child("chain").unwrap();
    assert_eq!(root.child_count(), 2);

    let rebuilt = root.build_child(&desc).unwrap();
    assert_eq!(rebuilt.describe(), desc);
    assert_ne!(rebuilt.serial(), group.serial());
}

#[test]
fn whole_root_round_trip() {
    let fx = Fixture::new(&[("src", 0, 1), ("sink", 1, 0)]);
    let root = fx.root("roundtrip");
    let src = root.create_child("src", Some("src")).unwrap();
    root.create_child("sink", Some("sink")).unwrap();
    src.connect_sibling("out0", "sink", "in0").unwrap();

    let desc = root.describe();
    let copy = EffectNode::root_from_description(&desc, Arc::clone(&fx.catalog)).unwrap();
    assert_eq!(copy.describe(), desc);

    copy.render();
    assert_eq!(fx.renders("sink"), 1);
}

// ============================================================================
// 4. Root table
// ============================================================================

#[test]
fn named_roots_are_process_wide() {
    let fx = Fixture::new(&[]);
    let created = montage_core::create_root("integration-root", Arc::clone(&fx.catalog)).unwrap();
    let found = thread::spawn(|| montage_core::root("integration-root").unwrap())
        .join()
        .unwrap();
    assert!(Arc::ptr_eq(&created, &found));
    montage_core::delete_root("integration-root").unwrap();
    assert!(montage_core::root("integration-root").is_err());
}

// ============================================================================
// 5. Concurrency
// ============================================================================

#[test]
fn concurrent_rewiring_and_rendering() {
    let fx = Fixture::new(&[("src", 0, 1), ("dst", 1, 0)]);
    let root = fx.root("concurrent");
    let sources: Vec<_> = (0..4)
        .map(|i| root.create_child("src", Some(&format!("src{i}"))).unwrap())
        .collect();
    for i in 0..4 {
        root.create_child("dst", Some(&format!("dst{i}"))).unwrap();
    }

    let renderer = {
        let root = Arc::clone(&root);
        thread::spawn(move || {
            for _ in 0..200 {
                root.render();
            }
        })
    };

    let workers: Vec<_> = sources
        .into_iter()
        .enumerate()
        .map(|(i, src)| {
            thread::spawn(move || {
                let dst = format!("dst{i}");
                for _ in 0..100 {
                    src.connect_sibling("out0", dst.as_str(), "in0").unwrap();
                    src.disconnect_output("out0").unwrap();
                }
                src.connect_sibling("out0", dst.as_str(), "in0").unwrap();
            })
        })
        .collect();

    // Structural churn on the same container.
    let churn = {
        let root = Arc::clone(&root);
        thread::spawn(move || {
            for _ in 0..50 {
                let g = root.create_empty_child(None).unwrap();
                root.delete_child(g.instance_id()).unwrap();
            }
        })
    };

    for w in workers {
        w.join().unwrap();
    }
    churn.join().unwrap();
    renderer.join().unwrap();

    for child in root.children().iter().filter(|c| c.is_leaf()) {
        assert!(child.connected_output_count(Scope::External).unwrap() <= 1);
        assert!(!child.is_visited());
    }
    for i in 0..4 {
        let dst = root.child(format!("dst{i}")).unwrap();
        assert_eq!(dst.connected_input_count(Scope::External).unwrap(), 1);
    }
}
