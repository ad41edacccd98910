//! `rlst outputs` — List the outputs the deployment publishes.

use clap::Args;
use relaystack_synth::synthesizer::Synthesizer;

use super::GlobalArgs;

/// Arguments for the `outputs` command.
#[derive(Args, Debug)]
pub struct OutputsArgs {
    /// Include outputs published by nested units.
    #[arg(short, long)]
    pub all: bool,
}

/// Executes the `outputs` command.
///
/// Values are resolved by the provisioning engine after apply; this only
/// shows which attribute each output will carry.
///
/// # Errors
///
/// Returns an error if configuration or composition fails.
pub fn execute(args: OutputsArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = global.load_config()?;
    let engine = relaystack_units::root::synthesize(&config, &global.compute_options())?;
    let rows = output_rows(&engine, args.all);
    if rows.is_empty() {
        println!("No outputs published.");
        return Ok(());
    }

    println!("{:<28} {:<24} {:<16} DESCRIPTION", "OUTPUT", "RESOURCE", "ATTRIBUTE");
    for row in &rows {
        println!(
            "{:<28} {:<24} {:<16} {}",
            row.name, row.resource, row.attribute, row.description
        );
    }
    Ok(())
}

/// One printed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    /// Output name.
    pub name: String,
    /// Logical id of the source resource.
    pub resource: String,
    /// Attribute on that resource.
    pub attribute: String,
    /// Description.
    pub description: String,
}

/// Collects outputs, root-level ones only unless `all` is set.
#[must_use]
pub fn output_rows(engine: &Synthesizer, all: bool) -> Vec<OutputRow> {
    let root_outputs = [
        relaystack_units::root::PUBLIC_IP_OUTPUT,
        relaystack_units::root::PUBLIC_DNS_OUTPUT,
    ];
    engine
        .outputs()
        .iter()
        .filter(|(name, _)| all || root_outputs.contains(&name.as_str()))
        .map(|(name, out)| OutputRow {
            name: name.clone(),
            resource: out.value.resource().logical_id().to_string(),
            attribute: out.value.attribute().to_string(),
            description: out.description.clone(),
        })
        .collect()
}
