//! Effect type listing command.

use clap::Args;
use montage_registry::{EffectCategory, EffectDescriptor, EffectRegistry};

#[derive(Args)]
pub struct TypesArgs {
    /// Show details for a specific effect type
    #[arg(value_name = "TYPE")]
    effect: Option<String>,
}

pub fn run(args: TypesArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();

    if let Some(id) = &args.effect {
        let effect = registry
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect type: {}", id))?;
        print_details(effect);
        return Ok(());
    }

    println!("Available Effects");
    println!("=================");

    for category in [
        EffectCategory::Source,
        EffectCategory::Filter,
        EffectCategory::Mixer,
        EffectCategory::Utility,
    ] {
        let effects = registry.effects_in_category(category);
        if effects.is_empty() {
            continue;
        }
        println!();
        println!("{}:", category.name());
        for effect in effects {
            println!("  {:12} - {}", effect.id, effect.description);
        }
    }

    println!();
    println!("Use 'montage types <type>' for slot details.");
    Ok(())
}

fn print_details(effect: &EffectDescriptor) {
    println!("{} ({})", effect.name, effect.id);
    println!("{}", "=".repeat(effect.name.len() + effect.id.len() + 3));
    println!();
    println!("{}", effect.description);
    println!();
    println!("Category: {}", effect.category.name());
    println!("Inputs:   {}", slot_list(effect.inputs));
    println!("Outputs:  {}", slot_list(effect.outputs));
}

fn slot_list(slots: &[&str]) -> String {
    if slots.is_empty() {
        "(none)".to_string()
    } else {
        slots.join(", ")
    }
}
