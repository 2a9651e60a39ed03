//! Topic Scenario Example
//!
//! This example demonstrates how to:
//! - Wire the dialogue manager module to an engine
//! - Feed key/value units through the async run loop
//! - Read the decisions the engine makes

use cim_domain_dialog_manager::{
    Assignment, CategoricalTable, DialogueEngine, DialogueManagerConfig, DialogueManagerModule,
    DialogueState, EngineResult, EngineSettings, IncrementalUnit, Posterior, StateListener,
    StateValue, UpdateMessage, UpdateType,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A toy engine that greets on topic 3 and waits otherwise
#[derive(Default)]
struct ToyEngine {
    values: HashMap<String, StateValue>,
    decision: Option<CategoricalTable>,
    pending: Vec<Assignment>,
    listeners: Vec<Arc<dyn StateListener>>,
}

impl DialogueState for ToyEngine {
    fn has_chance_node(&self, variable: &str) -> bool {
        variable == "decision" && self.decision.is_some()
    }

    fn query_prob(&self, variable: &str) -> EngineResult<Box<dyn Posterior + '_>> {
        self.decision
            .clone()
            .map(|table| Box::new(table) as Box<dyn Posterior>)
            .ok_or_else(|| cim_domain_dialog_manager::EngineError::MissingPosterior(variable.to_string()))
    }
}

impl DialogueEngine for ToyEngine {
    fn add_to_state(&mut self, assignment: Assignment) -> EngineResult<()> {
        self.pending.push(assignment);
        Ok(())
    }

    fn update(&mut self) -> EngineResult<()> {
        let mut updated: HashSet<String> = HashSet::new();
        for assignment in self.pending.drain(..) {
            updated.insert(assignment.variable.clone());
            self.values.insert(assignment.variable, assignment.value);
        }

        let greet = self.values.get("topic") == Some(&StateValue::Double(3.0));
        self.decision = Some(if greet {
            CategoricalTable::new().with_row("greet", 0.9).with_row("wait", 0.1)
        } else {
            CategoricalTable::new().with_row("wait", 0.7).with_row("greet", 0.3)
        });
        updated.insert("decision".to_string());

        for listener in &self.listeners {
            if listener.is_running() {
                listener.trigger(&*self, &updated)?;
            }
        }
        Ok(())
    }

    fn attach_module(&mut self, listener: Arc<dyn StateListener>) {
        self.listeners.push(listener);
    }

    fn load_domain(&mut self, _path: &Path) -> EngineResult<()> {
        Ok(())
    }

    fn settings(&self) -> EngineSettings {
        EngineSettings::default()
    }

    fn change_settings(&mut self, _settings: EngineSettings) {}

    fn start_system(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Dialogue Manager Example ===\n");

    let config = DialogueManagerConfig::new("domains/topics").with_variables(["topic"]);
    let (decision_tx, mut decision_rx) = mpsc::unbounded_channel();
    let mut module = DialogueManagerModule::new(config, ToyEngine::default(), decision_tx)?;
    module.setup()?;

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    for payload in [json!({"topic": "1", "mood": "happy"}), json!({"topic": "3"})] {
        println!("Sending {payload}");
        let iu = Arc::new(IncrementalUnit::new("nlu", payload));
        inbound_tx.send(UpdateMessage::from_iu(iu, UpdateType::Add))?;
    }
    drop(inbound_tx);

    module.run(inbound_rx).await?;

    while let Ok(message) = decision_rx.try_recv() {
        for (unit, _) in message {
            println!("Decision: {:?}", unit.decision);
        }
    }

    Ok(())
}
