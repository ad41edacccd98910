//! `rlst plan` — Display the declared resources in apply order.

use clap::Args;
use relaystack_synth::engine::Engine;
use relaystack_synth::synthesizer::Synthesizer;

use super::GlobalArgs;
use crate::output::{count_noun, format_summary, rule};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Also list each resource's direct dependencies.
    #[arg(long)]
    pub dependencies: bool,
}

/// Executes the `plan` command.
///
/// Composes the deployment, resolves the dependency graph, and prints the
/// order in which resources would be created. Property values, and with
/// them the bootstrap script, are never printed.
///
/// # Errors
///
/// Returns an error if configuration, composition, or graph resolution
/// fails.
pub fn execute(args: PlanArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = global.load_config()?;
    let engine = relaystack_units::root::synthesize(&config, &global.compute_options())?;
    for line in render_plan(&engine, args.dependencies)? {
        println!("{line}");
    }
    Ok(())
}

/// Builds the plan listing.
///
/// # Errors
///
/// Returns an error if the dependency graph cannot be ordered.
pub fn render_plan(engine: &Synthesizer, dependencies: bool) -> anyhow::Result<Vec<String>> {
    let order = engine.apply_order()?;
    let mut lines = vec![
        format!("Deployment Plan for: {}", engine.region()),
        rule(),
        String::new(),
    ];

    for id in &order {
        let Some(resource) = engine.resource(id) else {
            continue;
        };
        lines.push(format!("  + {id}"));
        lines.push(format!("      type: {}", resource.reference.kind()));
        if dependencies {
            let deps = engine.dependencies_of(id);
            if !deps.is_empty() {
                let names: Vec<String> = deps.iter().map(ToString::to_string).collect();
                lines.push(format!("      after: {}", names.join(", ")));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("  {} will be created.", count_noun(order.len(), "resource")));
    lines.push(String::new());
    lines.push("  Summary:".to_string());
    lines.extend(format_summary(&engine.summary()).into_iter().map(|l| format!("    {l}")));

    if !engine.outputs().is_empty() {
        lines.push(String::new());
        lines.push("  Outputs:".to_string());
        for (name, output) in engine.outputs() {
            lines.push(format!("    {name} <- {:?}", output.value));
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use relaystack_common::types::{Region, SecretKey};

    use super::*;

    fn engine() -> Synthesizer {
        let mut engine = Synthesizer::new(Region::new("us-east-1").expect("region"));
        let _ = relaystack_units::root::compose(&mut engine, &SecretKey::new("sk-plan").expect("key"))
            .expect("compose");
        engine
    }

    #[test]
    fn plan_lists_network_before_instance() {
        let lines = render_plan(&engine(), false).expect("plan");
        let pos = |needle: &str| lines.iter().position(|l| l == needle).expect(needle);
        assert!(pos("  + NetworkVpc") < pos("  + LitellmInstance"));
        assert!(lines.iter().any(|l| l == "  15 resources will be created."));
    }

    #[test]
    fn plan_shows_dependencies_on_request() {
        let lines = render_plan(&engine(), true).expect("plan");
        assert!(lines.iter().any(|l| l.starts_with("      after: ") && l.contains("NetworkVpc")));
    }

    #[test]
    fn plan_never_prints_the_secret() {
        let lines = render_plan(&engine(), true).expect("plan");
        assert!(lines.iter().all(|l| !l.contains("sk-plan")));
        assert!(lines.iter().any(|l| l == "    publicIp <- Deferred(LitellmInstance.PublicIp)"));
    }
}
