use packquote_core::config::ConfigOverrides;
use packquote_core::{CatalogRegistry, ProcessCategory};

use crate::commands::{load_engine, CommandResult};

pub fn run(json_output: bool) -> CommandResult {
    let (_, engine) = match load_engine("catalog", ConfigOverrides::default()) {
        Ok(loaded) => loaded,
        Err(result) => return result,
    };

    if json_output {
        return match serde_json::to_string_pretty(engine.catalog().data()) {
            Ok(body) => CommandResult::output(body),
            Err(error) => CommandResult::failure("catalog", "serialization", error.to_string(), 1),
        };
    }

    CommandResult::output(render_human(engine.catalog()))
}

fn render_human(catalog: &CatalogRegistry) -> String {
    let mut lines = vec!["bag types:".to_string()];
    for bag_type in catalog.bag_types() {
        lines.push(format!(
            "- {} ({} / {}) x{}",
            bag_type.id, bag_type.name_en, bag_type.name, bag_type.multiplier
        ));
    }

    lines.push("sizes:".to_string());
    for size in catalog.bag_sizes() {
        if size.is_custom() {
            lines.push(format!("- {} (caller supplies width/height/gusset)", size.id));
        } else {
            lines.push(format!(
                "- {} {} {}x{}x{} mm, {} m²",
                size.id,
                size.label_en,
                size.width_mm,
                size.height_mm,
                size.gusset_mm,
                size.surface_area
            ));
        }
    }

    lines.push("materials:".to_string());
    for material in catalog.materials() {
        let eco = if material.is_eco { ", eco" } else { "" };
        lines.push(format!(
            "- {} {} [{}] ${}/m², {:?} barrier{eco}",
            material.id, material.name, material.layers, material.cost_per_sqm, material.barrier
        ));
    }

    for (category, title) in [
        (ProcessCategory::Printing, "printing:"),
        (ProcessCategory::Finish, "finishes:"),
        (ProcessCategory::Feature, "features:"),
        (ProcessCategory::Accessory, "accessories:"),
    ] {
        lines.push(title.to_string());
        for process in catalog.processes_in(category) {
            lines.push(format!(
                "- {} {} ({:?} {})",
                process.id, process.name_en, process.cost_type, process.cost
            ));
        }
    }

    lines.push("quantity tiers:".to_string());
    for tier in catalog.tiers() {
        lines.push(format!("- {}..={} x{}", tier.min, tier.max, tier.discount));
    }
    lines.push(format!("- above last tier x{}", catalog.overflow_discount()));

    lines.join("\n")
}
