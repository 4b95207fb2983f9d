use clap::{ArgGroup, Args};
use packquote_core::config::ConfigOverrides;
use packquote_core::{BagTypeId, Configurator, MaterialId, ProcessId, Selection, SelectionError};
use serde::Serialize;

use crate::commands::{load_engine, CommandResult, EXIT_REJECTED};

#[derive(Debug, Clone, Args)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["add", "remove", "group", "set_material", "set_bag_type"])
))]
pub struct SelectArgs {
    #[arg(long, default_value = "stand-up")]
    pub bag_type: String,
    #[arg(long, default_value = "pet-pe")]
    pub material: String,
    #[arg(long = "process", help = "Already-selected process option; repeat for several")]
    pub processes: Vec<String>,
    #[arg(long, help = "Select a process option, clearing whatever it conflicts with")]
    pub add: Option<String>,
    #[arg(long, help = "Deselect a process option")]
    pub remove: Option<String>,
    #[arg(long, requires = "option", help = "Single-select option group code, e.g. zipper")]
    pub group: Option<String>,
    #[arg(long, help = "Group member to select, or `none` to clear the group")]
    pub option: Option<String>,
    #[arg(long, help = "Switch to another material")]
    pub set_material: Option<String>,
    #[arg(long, help = "Switch to another bag type")]
    pub set_bag_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct SelectionReport {
    selection: Selection,
    disabled_options: Vec<ProcessId>,
    available_materials: Vec<MaterialId>,
}

pub fn run(args: &SelectArgs) -> CommandResult {
    let (_, engine) = match load_engine("select", ConfigOverrides::default()) {
        Ok(loaded) => loaded,
        Err(result) => return result,
    };
    let configurator = engine.configurator();

    let outcome = starting_selection(&configurator, args)
        .and_then(|start| apply(&configurator, &start, args));
    let selection = match outcome {
        Ok(selection) => selection,
        Err(error) => {
            return CommandResult::failure(
                "select",
                "selection_rejected",
                error.to_string(),
                EXIT_REJECTED,
            )
        }
    };

    let report = SelectionReport {
        disabled_options: configurator.disabled_options(&selection),
        available_materials: configurator
            .available_materials(&selection)
            .into_iter()
            .map(|material| material.id.clone())
            .collect(),
        selection,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(body) => CommandResult::output(body),
        Err(error) => CommandResult::failure("select", "serialization", error.to_string(), 1),
    }
}

fn starting_selection(
    configurator: &Configurator<'_>,
    args: &SelectArgs,
) -> Result<Selection, SelectionError> {
    configurator.normalize(&Selection {
        bag_type: BagTypeId::new(&args.bag_type),
        material: MaterialId::new(&args.material),
        processes: args.processes.iter().map(ProcessId::new).collect(),
    })
}

fn apply(
    configurator: &Configurator<'_>,
    selection: &Selection,
    args: &SelectArgs,
) -> Result<Selection, SelectionError> {
    if let Some(process) = &args.add {
        return configurator.select(selection, &ProcessId::new(process));
    }
    if let Some(process) = &args.remove {
        return Ok(configurator.deselect(selection, &ProcessId::new(process)));
    }
    if let Some(group) = &args.group {
        let choice = args.option.as_deref().filter(|option| *option != "none").map(ProcessId::new);
        return configurator.select_group(selection, group, choice.as_ref());
    }
    if let Some(material) = &args.set_material {
        return configurator.set_material(selection, &MaterialId::new(material));
    }
    if let Some(bag_type) = &args.set_bag_type {
        return configurator.set_bag_type(selection, &BagTypeId::new(bag_type));
    }
    Ok(selection.clone())
}
