//! Dialogue manager domain module
//!
//! This domain plugs an external Bayesian-network dialogue engine into an
//! incremental dialogue pipeline as one exchangeable module. It provides:
//! - Translation of key/value incremental units into engine state assignments
//! - Batched evaluation, one engine update per forwarded unit
//! - Decision units emitted from the engine's decision variable posterior
//! - Lifecycle hooks (setup, start, pause) for the host pipeline
//!
//! Belief update, inference and policy selection live entirely in the engine,
//! which is injected through the [`engine::DialogueEngine`] trait.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod handlers;
pub mod module;
pub mod value_objects;

// Re-export main types
pub use adapter::{StateAdapter, VariableState};

pub use config::{DialogueManagerConfig, DEFAULT_DECISION_VARIABLE};

pub use engine::{
    Assignment, CategoricalTable, DialogueEngine, DialogueState,
    EngineSettings, Posterior, StateListener,
};

pub use error::{DialogueManagerError, DialogueManagerResult, EngineError, EngineResult};

pub use events::{DecisionUnit, IncrementalUnit, UpdateMessage};

pub use handlers::{DecisionDispatcher, DecisionSender};

pub use module::DialogueManagerModule;

pub use value_objects::{ConceptMap, StateValue, UpdateType};
