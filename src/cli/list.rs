//! List command implementation.
//!
//! Prints the registry's elements with their usage lines.

use clap::Args;
use serde::Serialize;

use crate::config::Config;
use crate::elements::builtin_registry;
use crate::error::{DarkroomError, Result};
use crate::output::{plural, Printer};
use crate::registry::Registry;

/// List the available elements
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print JSON to stdout instead of a table
    #[arg(long)]
    pub json: bool,
}

/// One element as printed by `list --json`.
#[derive(Debug, Serialize, PartialEq)]
pub struct ElementHelp {
    pub name: &'static str,
    pub usage: Vec<HelpLine>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HelpLine {
    pub usage: &'static str,
    pub description: &'static str,
}

pub fn run(args: ListArgs, config: &Config, printer: &Printer) -> Result<()> {
    let registry = builtin_registry(config)?;
    let listing = describe(&registry);

    if args.json {
        let json = serde_json::to_string_pretty(&listing)
            .map_err(|e| DarkroomError::element("list", e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    for element in &listing {
        for line in &element.usage {
            printer.info(element.name, &format!("{}  {}", line.usage, printer.dim(line.description)));
        }
    }
    printer.status("Listed", &plural(listing.len(), "element", "elements"));
    Ok(())
}

/// Registry contents in registration order.
pub fn describe(registry: &Registry) -> Vec<ElementHelp> {
    registry
        .decodables()
        .map(|decodable| ElementHelp {
            name: decodable.name,
            usage: decodable
                .help
                .iter()
                .map(|&(usage, description)| HelpLine { usage, description })
                .collect(),
        })
        .collect()
}
