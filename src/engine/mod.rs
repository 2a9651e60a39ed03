//! Contract of the external dialogue engine
//!
//! The engine owns the belief state, runs Bayesian inference and picks
//! actions. None of that lives in this crate: the adapter only needs to
//! - assign values into the engine's current dialogue state
//! - trigger one update cycle
//! - register a listener the engine calls back during that cycle
//! - query the posterior of a variable and read its best value
//! - load a domain description and apply settings at setup

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::error::EngineResult;
use crate::value_objects::StateValue;

/// A single variable assignment forwarded into the dialogue state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub variable: String,
    pub value: StateValue,
}

impl Assignment {
    pub fn new(variable: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
        }
    }
}

/// Opaque engine settings, read and written back during setup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub params: HashMap<String, serde_json::Value>,
}

/// A posterior distribution over the values of one variable
pub trait Posterior {
    /// Maximum-a-posteriori value, tie-breaking is up to the engine
    fn best(&self) -> StateValue;

    /// Probability of a given value (0 when unknown)
    fn probability(&self, value: &StateValue) -> f64;
}

/// Read access to the engine's current dialogue state
pub trait DialogueState {
    /// Whether the state holds a chance node for the variable
    fn has_chance_node(&self, variable: &str) -> bool;

    /// Posterior distribution of the variable
    fn query_prob(&self, variable: &str) -> EngineResult<Box<dyn Posterior + '_>>;
}

/// A module attached to the engine and notified after each update cycle
pub trait StateListener: Send + Sync {
    /// Called synchronously from within [`DialogueEngine::update`]
    fn trigger(&self, state: &dyn DialogueState, updated_vars: &HashSet<String>) -> EngineResult<()>;

    /// Engines skip listeners that report themselves as not running
    fn is_running(&self) -> bool;
}

/// The dialogue engine collaborator
pub trait DialogueEngine: Send {
    /// Assign a value into the current dialogue state without evaluating it
    fn add_to_state(&mut self, assignment: Assignment) -> EngineResult<()>;

    /// Run one inference/decision cycle over the pending assignments.
    ///
    /// May call attached listeners before returning.
    fn update(&mut self) -> EngineResult<()>;

    /// Register a listener for update cycles
    fn attach_module(&mut self, listener: Arc<dyn StateListener>);

    /// Load the domain description found at `path`
    fn load_domain(&mut self, path: &Path) -> EngineResult<()>;

    /// Current settings
    fn settings(&self) -> EngineSettings;

    /// Replace the settings
    fn change_settings(&mut self, settings: EngineSettings);

    /// Start the system after domain and settings are in place
    fn start_system(&mut self) -> EngineResult<()>;
}

/// A categorical probability table.
///
/// The best value is the one with the highest probability; among equal
/// probabilities the earliest inserted wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoricalTable {
    rows: Vec<(StateValue, f64)>,
}

impl CategoricalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row, replacing the probability of an existing value
    pub fn with_row(mut self, value: impl Into<StateValue>, probability: f64) -> Self {
        let value = value.into();
        match self.rows.iter_mut().find(|(existing, _)| *existing == value) {
            Some(row) => row.1 = probability,
            None => self.rows.push((value, probability)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &StateValue> {
        self.rows.iter().map(|(value, _)| value)
    }
}

impl Posterior for CategoricalTable {
    fn best(&self) -> StateValue {
        let mut best: Option<&(StateValue, f64)> = None;
        for row in &self.rows {
            if best.is_none_or(|current| row.1 > current.1) {
                best = Some(row);
            }
        }
        best.map(|(value, _)| value.clone())
            .unwrap_or(StateValue::None)
    }

    fn probability(&self, value: &StateValue) -> f64 {
        self.rows
            .iter()
            .find(|(existing, _)| existing == value)
            .map(|(_, probability)| *probability)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_value() {
        let table = CategoricalTable::new()
            .with_row("greet", 0.7)
            .with_row("ask", 0.2)
            .with_row("bye", 0.1);

        assert_eq!(table.best(), StateValue::from("greet"));
        assert_eq!(table.probability(&StateValue::from("ask")), 0.2);
        assert_eq!(table.probability(&StateValue::from("missing")), 0.0);
    }

    #[test]
    fn test_ties_keep_first_value() {
        let table = CategoricalTable::new().with_row("a", 0.5).with_row("b", 0.5);
        assert_eq!(table.best(), StateValue::from("a"));
    }

    #[test]
    fn test_row_replacement() {
        let table = CategoricalTable::new()
            .with_row("a", 0.6)
            .with_row("b", 0.4)
            .with_row("a", 0.1);

        assert_eq!(table.values().count(), 2);
        assert_eq!(table.best(), StateValue::from("b"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(CategoricalTable::new().best(), StateValue::None);
    }
}
