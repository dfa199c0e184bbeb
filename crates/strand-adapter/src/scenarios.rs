//! Independent call scenarios, one per boundary shape
//!
//! No scenario depends on state left by another; each one that allocates
//! also releases before it returns.

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use crate::types::Pair;
use crate::value::Value;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Add,
    CountChars,
    Chant,
    SumEven,
    Swap,
    Census,
    FixedArray,
    Primes,
}

impl Scenario {
    pub const ALL: [Scenario; 8] = [
        Scenario::Add,
        Scenario::CountChars,
        Scenario::Chant,
        Scenario::SumEven,
        Scenario::Swap,
        Scenario::Census,
        Scenario::FixedArray,
        Scenario::Primes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Add => "add",
            Scenario::CountChars => "count_chars",
            Scenario::Chant => "chant",
            Scenario::SumEven => "sum_even",
            Scenario::Swap => "swap",
            Scenario::Census => "census",
            Scenario::FixedArray => "fixed_array",
            Scenario::Primes => "primes",
        }
    }

    /// Boundary shape the scenario exercises
    pub fn shape(&self) -> &'static str {
        match self {
            Scenario::Add => "scalar arguments",
            Scenario::CountChars => "borrowed string",
            Scenario::Chant => "owned string return",
            Scenario::SumEven => "borrowed array",
            Scenario::Swap => "struct by value",
            Scenario::Census => "opaque handle lifecycle",
            Scenario::FixedArray => "fixed array return",
            Scenario::Primes => "owned vector return",
        }
    }

    /// Accepts the snake_case name or the same with dashes
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.replace('-', "_");
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn run(&self, bridge: &Bridge) -> BridgeResult<ScenarioReport> {
        let value = match self {
            Scenario::Add => Value::Int(bridge.add(1, 2).into()),
            Scenario::CountChars => Value::Int(bridge.count_chars("göes to élevên")?.into()),
            Scenario::Chant => Value::Text(bridge.chant(5)?),
            Scenario::SumEven => Value::Int(bridge.sum_even(&[1, 2, 3, 4, 5, 6]).into()),
            Scenario::Swap => {
                let swapped = bridge.swap(Pair::new(10, 20));
                Value::Pair(swapped.x, swapped.y)
            }
            Scenario::Census => {
                let difference = bridge.with_census(|census| {
                    census.populate()?;
                    let rich = census.population_or_zero("90210")?;
                    let capital = census.population_or_zero("20500")?;
                    Ok(i64::from(rich) - i64::from(capital))
                })?;
                Value::Int(difference)
            }
            Scenario::FixedArray => Value::ints(bridge.fixed_triple()?),
            Scenario::Primes => Value::ints(bridge.primes()?),
        };
        Ok(ScenarioReport {
            scenario: *self,
            shape: self.shape(),
            value,
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub shape: &'static str,
    pub value: Value,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12} {}", self.scenario.name(), self.value)
    }
}

/// Run `scenarios` in order, each independently
pub fn run_all<'a, I>(bridge: &Bridge, scenarios: I) -> Vec<(Scenario, BridgeResult<ScenarioReport>)>
where
    I: IntoIterator<Item = &'a Scenario>,
{
    scenarios
        .into_iter()
        .map(|scenario| {
            tracing::debug!(%scenario, "running scenario");
            (*scenario, scenario.run(bridge))
        })
        .collect()
}
