//! Turns engine update cycles into outgoing decision units

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::config::DialogueManagerConfig;
use crate::engine::{DialogueState, StateListener};
use crate::error::EngineResult;
use crate::events::{DecisionUnit, IncrementalUnit, UpdateMessage};
use crate::value_objects::UpdateType;

/// Sender half of the outgoing decision path
pub type DecisionSender = UnboundedSender<UpdateMessage<DecisionUnit>>;

/// Listener attached to the engine.
///
/// Every trigger is handled on its own: there is no memory of earlier
/// decisions, so an unchanged best value is emitted again.
pub struct DecisionDispatcher {
    decision_variable: String,
    creator: String,
    paused: AtomicBool,
    input_iu: RwLock<Weak<IncrementalUnit>>,
    outbox: DecisionSender,
}

impl DecisionDispatcher {
    /// Create a dispatcher emitting into `outbox`
    pub fn new(config: &DialogueManagerConfig, outbox: DecisionSender) -> Self {
        Self {
            decision_variable: config.decision_variable.clone(),
            creator: config.creator.clone(),
            paused: AtomicBool::new(false),
            input_iu: RwLock::new(Weak::new()),
            outbox,
        }
    }

    /// Remember the unit emitted decisions are grounded in
    pub fn set_input(&self, iu: &Arc<IncrementalUnit>) {
        let mut slot = self.input_iu.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::downgrade(iu);
    }

    /// Most recent input unit, if something still holds it
    pub fn input_iu(&self) -> Option<Arc<IncrementalUnit>> {
        self.input_iu
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    pub fn start(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn pause(&self, to_pause: bool) {
        self.paused.store(to_pause, Ordering::SeqCst);
    }

    fn emit(&self, decision: String) {
        let mut unit = DecisionUnit::new(
            self.creator.clone(),
            self.input_iu().map(|iu| iu.id),
        );
        unit.set_act(decision);

        let message = UpdateMessage::from_iu(Arc::new(unit), UpdateType::Add);
        if self.outbox.send(message).is_err() {
            warn!("decision output channel closed, dropping decision");
        }
    }
}

impl StateListener for DecisionDispatcher {
    fn trigger(&self, state: &dyn DialogueState, updated_vars: &HashSet<String>) -> EngineResult<()> {
        if !updated_vars.contains(&self.decision_variable) {
            return Ok(());
        }
        if !state.has_chance_node(&self.decision_variable) {
            debug!(variable = %self.decision_variable, "decision variable updated without a posterior");
            return Ok(());
        }

        let action = state.query_prob(&self.decision_variable)?.best().to_string();
        info!(action = %action, "emitting dialogue decision");
        self.emit(action);
        Ok(())
    }

    fn is_running(&self) -> bool {
        !self.paused.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CategoricalTable, Posterior};
    use crate::error::EngineError;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct FixedState {
        tables: HashMap<String, CategoricalTable>,
    }

    impl DialogueState for FixedState {
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

    fn updated(vars: &[&str]) -> HashSet<String> {
        vars.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_emits_best_value() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = DecisionDispatcher::new(&DialogueManagerConfig::new("domain"), tx);
        let input = Arc::new(IncrementalUnit::new("nlu", json!({"topic": "3"})));
        dispatcher.set_input(&input);

        let mut state = FixedState::default();
        state.tables.insert(
            "decision".to_string(),
            CategoricalTable::new().with_row("greet", 0.9).with_row("wait", 0.1),
        );

        dispatcher.trigger(&state, &updated(&["decision"])).unwrap();

        let message = rx.try_recv().unwrap();
        let (unit, kind) = message.iter().next().unwrap();
        assert_eq!(kind, UpdateType::Add);
        assert_eq!(unit.decision.as_deref(), Some("greet"));
        assert!(unit.concepts.is_empty());
        assert_eq!(unit.grounded_in, Some(input.id));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_ignores_other_variables() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = DecisionDispatcher::new(&DialogueManagerConfig::new("domain"), tx);

        let mut state = FixedState::default();
        state.tables.insert("decision".to_string(), CategoricalTable::new().with_row("greet", 1.0));

        dispatcher.trigger(&state, &updated(&["topic"])).unwrap();
        dispatcher.trigger(&FixedState::default(), &updated(&["decision"])).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_input_leaves_no_provenance() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = DecisionDispatcher::new(&DialogueManagerConfig::new("domain"), tx);
        {
            let input = Arc::new(IncrementalUnit::new("nlu", json!({})));
            dispatcher.set_input(&input);
        }
        assert!(dispatcher.input_iu().is_none());

        let mut state = FixedState::default();
        state.tables.insert("decision".to_string(), CategoricalTable::new().with_row("greet", 1.0));
        dispatcher.trigger(&state, &updated(&["decision"])).unwrap();

        let message = rx.try_recv().unwrap();
        assert!(message.added().next().unwrap().grounded_in.is_none());
    }

    #[test]
    fn test_pause_flag() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let dispatcher = DecisionDispatcher::new(&DialogueManagerConfig::new("domain"), tx);
        assert!(dispatcher.is_running());

        dispatcher.pause(true);
        dispatcher.pause(true);
        assert!(!dispatcher.is_running());

        dispatcher.start();
        assert!(dispatcher.is_running());
    }
}
