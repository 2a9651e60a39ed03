//! Handlers reacting to the dialogue engine

pub mod decision_dispatcher;

pub use decision_dispatcher::{DecisionDispatcher, DecisionSender};
