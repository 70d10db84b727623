//! Per-frame render pass.
//!
//! A leaf hands its slots to its plugin. A container renders its children
//! breadth-first from their entry points:
//!
//! 1. Seed the queue with every child that has no connected input but at
//!    least one connected output, then with every child fed by one of the
//!    container's connected internal outputs.
//! 2. Pop a child, render it, enqueue the children its connected outputs feed.
//!
//! A child is marked visited when it is enqueued, so a node reachable along
//! several paths renders once per pass. Children never reached (isolated
//! nodes, cycles with no entry point) do not render at all. Visited marks are
//! cleared on every child at the end of the pass.

use std::collections::VecDeque;
use std::sync::Arc;

use super::{Container, EffectNode, NodeKind, NodeState};
use crate::plugin::RenderContext;
use crate::slot::{Endpoint, OutputSlot};

impl EffectNode {
    /// Render this node once.
    ///
    /// Holds the node's write lock for the whole pass, so structural changes
    /// on other threads wait for the pass to end.
    pub fn render(&self) {
        let is_root = self.is_root();
        let mut state = self.state.write();
        let NodeState {
            inputs,
            outputs,
            kind,
            ..
        } = &mut *state;

        match kind {
            NodeKind::Leaf(plugin) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(node = %self.instance_name, "render leaf");
                plugin.render(&mut RenderContext::new(inputs, outputs));
            }
            NodeKind::Container(c) => {
                if !is_root {
                    for (index, input) in inputs.iter().enumerate() {
                        if let Some(mirror) = c.internal_outputs.at_mut(index) {
                            mirror.forward(input.value());
                        }
                    }
                }

                self.render_children(c);

                if !is_root {
                    for (index, mirror) in c.internal_inputs.iter().enumerate() {
                        if let Some(output) = outputs.at_mut(index) {
                            output.forward(mirror.value());
                        }
                    }
                }

                #[cfg(feature = "tracing")]
                {
                    let skipped: Vec<&str> = c
                        .children
                        .iter()
                        .filter(|child| !child.state.read().visited)
                        .map(|child| child.instance_name.as_str())
                        .collect();
                    if !skipped.is_empty() {
                        tracing::debug!(
                            container = %self.instance_name,
                            ?skipped,
                            "children not reached by this render pass"
                        );
                    }
                }

                for child in c.children.iter() {
                    child.state.write().visited = false;
                }
            }
        }
    }

    fn render_children(&self, c: &Container) {
        let mut queue = VecDeque::new();

        for child in c.children.iter() {
            let mut state = child.state.write();
            if state.connected_inputs.is_empty() && !state.connected_outputs.is_empty() {
                state.visited = true;
                queue.push_back(Arc::clone(child));
            }
        }

        for &id in c.connected_internal_outputs.ids() {
            if let Some(link) = c.internal_outputs.by_id(id).and_then(OutputSlot::link) {
                self.enqueue(&link.target, &mut queue);
            }
        }

        while let Some(node) = queue.pop_front() {
            node.render();
            let downstream: Vec<Endpoint> = {
                let state = node.state.read();
                state
                    .connected_outputs
                    .ids()
                    .iter()
                    .filter_map(|&id| state.outputs.by_id(id)?.link())
                    .map(|link| link.target.clone())
                    .collect()
            };
            for target in &downstream {
                self.enqueue(target, &mut queue);
            }
        }
    }

    /// Queue the node behind `target` unless it is this container or was
    /// already queued this pass.
    fn enqueue(&self, target: &Endpoint, queue: &mut VecDeque<Arc<EffectNode>>) {
        if target.serial == self.serial {
            return;
        }
        let Some(node) = target.node.upgrade() else {
            return;
        };
        {
            let mut state = node.state.write();
            if state.visited {
                return;
            }
            state.visited = true;
        }
        queue.push_back(node);
    }
}
