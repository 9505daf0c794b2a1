//! Shared fixtures for the `dendro-core` integration tests.

use dendro_core::LinkageMethod;
use serde::Deserialize;

const SCENARIOS: &str = include_str!("../fixtures/scenarios.json");

/// Named clustering input with its expected serialised output.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub method: String,
    pub optimize: bool,
    pub ignore_threshold: usize,
    pub names: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
    pub newick: String,
    pub order: Vec<String>,
}

impl Scenario {
    /// Parses the scenario's method name.
    pub fn linkage(&self) -> LinkageMethod {
        self.method
            .parse()
            .unwrap_or_else(|err| panic!("scenario {} has a bad method: {err}", self.name))
    }
}

/// Loads every scenario from the bundled fixture file.
pub fn scenarios() -> Vec<Scenario> {
    serde_json::from_str(SCENARIOS).expect("scenario fixture must be valid JSON")
}

/// Loads the scenario called `name`.
pub fn scenario(name: &str) -> Scenario {
    scenarios()
        .into_iter()
        .find(|scenario| scenario.name == name)
        .unwrap_or_else(|| panic!("no scenario named {name}"))
}
