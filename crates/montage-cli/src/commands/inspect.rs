//! Patch inspection command.

use std::path::PathBuf;

use clap::Args;
use montage_core::{NodeDescription, PortRef};
use montage_registry::EffectRegistry;

use super::common::load_patch;

#[derive(Args)]
pub struct InspectArgs {
    /// Patch file to inspect
    #[arg(value_name = "PATCH")]
    patch: PathBuf,

    /// Print the patch as JSON instead of a tree
    #[arg(long)]
    json: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();
    let patch = load_patch(&args.patch, &registry)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&patch)?);
        return Ok(());
    }

    println!("Patch: {}", patch.name);
    if let Some(description) = &patch.description {
        println!("{description}");
    }
    println!("Nodes: {}", patch.node_count());
    println!();
    print_node(&patch.graph, 0);
    Ok(())
}

fn print_node(desc: &NodeDescription, depth: usize) {
    let indent = "  ".repeat(depth);
    match &desc.type_name {
        Some(effect) => println!("{indent}{} [{effect}]", desc.name),
        None => {
            println!("{indent}{}/", desc.name);
            if !desc.inputs.is_empty() {
                println!("{indent}  inputs:  {}", desc.inputs.join(", "));
            }
            if !desc.outputs.is_empty() {
                println!("{indent}  outputs: {}", desc.outputs.join(", "));
            }
        }
    }
    for child in &desc.children {
        print_node(child, depth + 1);
    }
    for edge in &desc.edges {
        println!(
            "{indent}  {} -> {}",
            port_label(&edge.from, desc),
            port_label(&edge.to, desc)
        );
    }
}

fn port_label(port: &PortRef, container: &NodeDescription) -> String {
    match &port.node {
        Some(node) => format!("{node}.{}", port.port),
        None => format!("{}.{}", container.name, port.port),
    }
}
