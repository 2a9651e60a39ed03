//! Shared test fixtures: a recording in-memory dialogue engine

#![allow(dead_code)]

use cim_domain_dialog_manager::{
    Assignment, CategoricalTable, DialogueEngine, DialogueState, EngineError, EngineResult,
    EngineSettings, Posterior, StateListener, StateValue,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maps the current variable values to a posterior over the decision variable
pub type Policy = Box<dyn Fn(&HashMap<String, StateValue>) -> Option<CategoricalTable> + Send>;

#[derive(Default)]
pub struct RecordingState {
    pub values: HashMap<String, StateValue>,
    pub tables: HashMap<String, CategoricalTable>,
}

impl DialogueState for RecordingState {
    fn has_chance_node(&self, variable: &str) -> bool {
        self.tables.contains_key(variable)
    }

    fn query_prob(&self, variable: &str) -> EngineResult<Box<dyn Posterior + '_>> {
        self.tables
            .get(variable)
            .map(|table| Box::new(table.clone()) as Box<dyn Posterior>)
            .ok_or_else(|| EngineError::MissingPosterior(variable.to_string()))
    }
}

/// Engine fake that records every call and runs a scripted policy on update
pub struct RecordingEngine {
    pub state: RecordingState,
    pub pending: Vec<Assignment>,
    pub forwarded: Vec<Assignment>,
    pub updates: usize,
    pub listeners: Vec<Arc<dyn StateListener>>,
    pub domain: Option<PathBuf>,
    pub settings: EngineSettings,
    pub settings_changes: usize,
    pub started: bool,
    pub fail_update: bool,
    pub decision_variable: String,
    policy: Option<Policy>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            state: RecordingState::default(),
            pending: Vec::new(),
            forwarded: Vec::new(),
            updates: 0,
            listeners: Vec::new(),
            domain: None,
            settings: EngineSettings::default(),
            settings_changes: 0,
            started: false,
            fail_update: false,
            decision_variable: "decision".to_string(),
            policy: None,
        }
    }

    /// Install a policy producing the decision posterior
    pub fn with_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&HashMap<String, StateValue>) -> Option<CategoricalTable> + Send + 'static,
    {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Policy that always decides `action`
    pub fn always(action: &'static str) -> Self {
        Self::new().with_policy(move |_| Some(CategoricalTable::new().with_row(action, 1.0)))
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogueEngine for RecordingEngine {
    fn add_to_state(&mut self, assignment: Assignment) -> EngineResult<()> {
        self.forwarded.push(assignment.clone());
        self.pending.push(assignment);
        Ok(())
    }

    fn update(&mut self) -> EngineResult<()> {
        if !self.started {
            return Err(EngineError::NotStarted);
        }
        self.updates += 1;
        if self.fail_update {
            return Err(EngineError::Inference("scripted failure".to_string()));
        }

        let mut updated = HashSet::new();
        for assignment in self.pending.drain(..) {
            updated.insert(assignment.variable.clone());
            self.state.values.insert(assignment.variable, assignment.value);
        }

        if let Some(policy) = &self.policy {
            if let Some(table) = policy(&self.state.values) {
                self.state.tables.insert(self.decision_variable.clone(), table);
                updated.insert(self.decision_variable.clone());
            }
        }

        for listener in &self.listeners {
            if listener.is_running() {
                listener.trigger(&self.state, &updated)?;
            }
        }
        Ok(())
    }

    fn attach_module(&mut self, listener: Arc<dyn StateListener>) {
        self.listeners.push(listener);
    }

    fn load_domain(&mut self, path: &Path) -> EngineResult<()> {
        if !path.exists() {
            return Err(EngineError::Domain {
                path: path.to_path_buf(),
                reason: "no such directory".to_string(),
            });
        }
        self.domain = Some(path.to_path_buf());
        Ok(())
    }

    fn settings(&self) -> EngineSettings {
        self.settings.clone()
    }

    fn change_settings(&mut self, settings: EngineSettings) {
        self.settings = settings;
        self.settings_changes += 1;
    }

    fn start_system(&mut self) -> EngineResult<()> {
        self.started = true;
        Ok(())
    }
}

/// Install a test log subscriber once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
