//! Demo patch generation command.

use std::path::PathBuf;

use clap::Args;
use montage_config::Patch;

#[derive(Args)]
pub struct NewArgs {
    /// Where to write the patch
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: NewArgs) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        anyhow::bail!(
            "'{}' already exists (use --force to overwrite)",
            args.path.display()
        );
    }
    let patch = Patch::demo();
    patch.save(&args.path)?;
    println!(
        "Wrote patch '{}' ({} nodes) to {}",
        patch.name,
        patch.node_count(),
        args.path.display()
    );
    Ok(())
}
