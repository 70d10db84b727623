//! Patch rendering command.
//!
//! Builds the patch as a named root, runs the requested number of render
//! passes and reports what reached every probe.

use std::path::PathBuf;

use clap::Args;
use montage_core::delete_root;
use montage_registry::EffectRegistry;
use serde::Serialize;

use super::common::{hex_color, leaves_of_type, load_patch};

#[derive(Args)]
pub struct RenderArgs {
    /// Patch file to render
    #[arg(value_name = "PATCH")]
    patch: PathBuf,

    /// Number of render passes
    #[arg(short, long, default_value = "1")]
    frames: u32,

    /// Print the probe report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ProbeReport {
    probe: String,
    width: Option<u32>,
    height: Option<u32>,
    pts: Option<i64>,
    first_pixel: Option<String>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();
    let patch = load_patch(&args.patch, &registry)?;
    let root = patch.install(registry.shared_catalog())?;

    tracing::info!(patch = %patch.name, frames = args.frames, "rendering");
    for frame in 0..args.frames {
        root.render();
        tracing::debug!(frame, "pass complete");
    }

    let reports: Vec<ProbeReport> = leaves_of_type(&root, "probe")
        .into_iter()
        .map(|(path, node)| {
            let frame = node.input_value("in").ok().flatten();
            ProbeReport {
                probe: path,
                width: frame.as_ref().map(|f| f.width()),
                height: frame.as_ref().map(|f| f.height()),
                pts: frame.as_ref().map(|f| f.pts()),
                first_pixel: frame
                    .as_ref()
                    .and_then(|f| f.pixels().first().copied())
                    .map(hex_color),
            }
        })
        .collect();

    delete_root(root.instance_name())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("Rendered {} frame(s) of '{}'", args.frames, patch.name);
    if reports.is_empty() {
        println!("No probes in this patch.");
    }
    for report in &reports {
        match (report.width, report.height, report.pts, &report.first_pixel) {
            (Some(w), Some(h), Some(pts), Some(px)) => {
                println!("  {}: {w}x{h} pts={pts} first pixel {px}", report.probe);
            }
            _ => println!("  {}: no frame", report.probe),
        }
    }
    Ok(())
}
