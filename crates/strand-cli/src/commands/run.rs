//! Run command - execute call scenarios against the provider

use super::Target;
use anyhow::{bail, Result};
use strand_adapter::scenarios::run_all;
use strand_adapter::Scenario;

pub fn run(target: &Target, names: &[String], json: bool) -> Result<()> {
    let scenarios = select(names)?;
    let bridge = target.open()?;
    tracing::info!(origin = %bridge.origin(), count = scenarios.len(), "running scenarios");

    let results = run_all(&bridge, &scenarios);

    let mut failed = 0;
    if json {
        let entries = results
            .iter()
            .map(|(scenario, result)| match result {
                Ok(report) => serde_json::to_value(report),
                Err(e) => Ok(serde_json::json!({
                    "scenario": scenario.name(),
                    "shape": scenario.shape(),
                    "error": e.to_string(),
                })),
            })
            .collect::<Result<Vec<_>, _>>()?;
        failed = results.iter().filter(|(_, r)| r.is_err()).count();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (scenario, result) in &results {
            match result {
                Ok(report) => println!("{}", report),
                Err(e) => {
                    failed += 1;
                    eprintln!("{:<12} failed: {}", scenario.name(), e);
                }
            }
        }
    }

    tracing::debug!(
        violations = bridge.contract_violations(),
        live = bridge.live_allocations(),
        "provider ledger after run"
    );
    if failed > 0 {
        bail!("{} of {} scenario(s) failed", failed, results.len());
    }
    Ok(())
}

/// Scenarios named on the command line, or all of them
fn select(names: &[String]) -> Result<Vec<Scenario>> {
    if names.is_empty() {
        return Ok(Scenario::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| match Scenario::from_name(name) {
            Some(scenario) => Ok(scenario),
            None => {
                let known: Vec<&str> = Scenario::ALL.iter().map(Scenario::name).collect();
                bail!("unknown scenario '{}' (expected one of: {})", name, known.join(", "))
            }
        })
        .collect()
}
