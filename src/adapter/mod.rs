//! State adapter - forwards incremental state updates into the dialogue engine
//!
//! The adapter:
//! - accepts only key/value payloads, everything else is ignored
//! - filters keys through the configured allowlist
//! - normalizes values into the engine's domain
//! - caches the last forwarded value per variable
//! - runs exactly one engine update per unit that forwarded something

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::config::{self, DialogueManagerConfig};
use crate::engine::{Assignment, DialogueEngine};
use crate::error::EngineResult;
use crate::events::{IncrementalUnit, UpdateMessage};
use crate::handlers::DecisionDispatcher;
use crate::value_objects::{StateValue, UpdateType};

/// Last known values of the tracked variables.
///
/// Entries are written when a value is forwarded, not when the engine
/// confirms it, and are never evicted for the lifetime of the session.
#[derive(Debug, Clone, Default)]
pub struct VariableState {
    tracked_names: Option<BTreeSet<String>>,
    last_values: HashMap<String, StateValue>,
}

impl VariableState {
    /// Create an empty state; `None` tracks every variable
    pub fn new(tracked_names: Option<BTreeSet<String>>) -> Self {
        Self {
            tracked_names,
            last_values: HashMap::new(),
        }
    }

    pub fn tracks(&self, name: &str) -> bool {
        config::allows(self.tracked_names.as_ref(), name)
    }

    pub fn get(&self, name: &str) -> Option<&StateValue> {
        self.last_values.get(name)
    }

    /// Whether `value` equals the cached value for `name`
    pub fn is_unchanged(&self, name: &str, value: &StateValue) -> bool {
        self.last_values.get(name) == Some(value)
    }

    /// Record a value, returning the previous one
    pub fn record(&mut self, name: &str, value: StateValue) -> Option<StateValue> {
        self.last_values.insert(name.to_string(), value)
    }

    pub fn len(&self) -> usize {
        self.last_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_values.is_empty()
    }
}

/// Adapter between the pipeline's update messages and the engine's state
pub struct StateAdapter<E> {
    engine: E,
    state: VariableState,
    forward_unchanged: bool,
    dispatcher: Arc<DecisionDispatcher>,
}

impl<E: DialogueEngine> StateAdapter<E> {
    /// Create an adapter owning `engine`
    pub fn new(
        config: &DialogueManagerConfig,
        engine: E,
        dispatcher: Arc<DecisionDispatcher>,
    ) -> Self {
        Self {
            engine,
            state: VariableState::new(config.variables.clone()),
            forward_unchanged: config.forward_unchanged,
            dispatcher,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn state(&self) -> &VariableState {
        &self.state
    }

    /// Process every (unit, change) pair of a message in delivery order.
    ///
    /// Stops at the first engine failure and returns it unchanged.
    pub fn consume(&mut self, message: &UpdateMessage) -> EngineResult<()> {
        for (iu, update_type) in message.iter() {
            match update_type {
                UpdateType::Add => {
                    self.apply_add(iu)?;
                }
                UpdateType::Revoke => self.apply_revoke(iu),
            }
        }
        Ok(())
    }

    /// Forward the unit's assignments and evaluate them in one engine update.
    ///
    /// Returns whether an update was run.
    pub fn apply_add(&mut self, iu: &Arc<IncrementalUnit>) -> EngineResult<bool> {
        let Some(payload) = iu.state_payload() else {
            trace!(iu = %iu.id, "ignoring unit without key/value payload");
            return Ok(false);
        };

        debug!(iu = %iu.id, creator = %iu.creator, keys = payload.len(), "dialogue manager received unit");
        self.dispatcher.set_input(iu);

        let mut processed = false;
        for (key, raw) in payload {
            if !self.state.tracks(key) {
                continue;
            }

            let value = StateValue::normalize(raw);
            let unchanged = self.state.is_unchanged(key, &value);
            if unchanged && !self.forward_unchanged {
                trace!(variable = %key, value = %value, "skipping unchanged value");
                continue;
            }

            trace!(variable = %key, value = %value, unchanged, "forwarding assignment");
            self.state.record(key, value.clone());
            self.engine.add_to_state(Assignment::new(key.as_str(), value))?;
            processed = true;
        }

        if processed {
            debug!(iu = %iu.id, "running engine update");
            self.engine.update()?;
        }
        Ok(processed)
    }

    /// Revocations are accepted but have no effect on the engine state
    pub fn apply_revoke(&mut self, iu: &Arc<IncrementalUnit>) {
        debug!(iu = %iu.id, "ignoring revoked unit");
    }
}
