//! Dialogue manager module - plugs the engine into an incremental pipeline
//!
//! Control flow for one inbound message:
//! pipeline -> [`StateAdapter::consume`] -> engine update ->
//! [`DecisionDispatcher`] trigger -> outgoing decision message.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::adapter::{StateAdapter, VariableState};
use crate::config::DialogueManagerConfig;
use crate::engine::{DialogueEngine, StateListener};
use crate::error::{DialogueManagerResult, EngineResult};
use crate::events::{DecisionUnit, UpdateMessage};
use crate::handlers::{DecisionDispatcher, DecisionSender};

/// Module name reported to the pipeline
pub const NAME: &str = "Dialogue Manager Module";

/// Module description reported to the pipeline
pub const DESCRIPTION: &str =
    "A module providing dialogue management backed by a Bayesian dialogue engine";

/// Unit kinds accepted as input
pub const INPUT_IUS: &[&str] = &["Dialogue Act Incremental Unit", "Incremental Unit"];

/// Unit kind produced as output
pub const OUTPUT_IU: &str = DecisionUnit::TYPE;

/// The dialogue manager as a pipeline module
pub struct DialogueManagerModule<E> {
    config: DialogueManagerConfig,
    adapter: StateAdapter<E>,
    dispatcher: Arc<DecisionDispatcher>,
}

impl<E: DialogueEngine> DialogueManagerModule<E> {
    /// Create a module around an injected engine.
    ///
    /// Decisions are sent through `outbox`.
    pub fn new(
        config: DialogueManagerConfig,
        engine: E,
        outbox: DecisionSender,
    ) -> DialogueManagerResult<Self> {
        config.validate()?;
        let dispatcher = Arc::new(DecisionDispatcher::new(&config, outbox));
        let adapter = StateAdapter::new(&config, engine, dispatcher.clone());

        Ok(Self {
            config,
            adapter,
            dispatcher,
        })
    }

    pub fn config(&self) -> &DialogueManagerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        self.adapter.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.adapter.engine_mut()
    }

    pub fn variable_state(&self) -> &VariableState {
        self.adapter.state()
    }

    pub fn dispatcher(&self) -> &Arc<DecisionDispatcher> {
        &self.dispatcher
    }

    /// Load the domain, apply settings, attach the dispatcher and start the engine
    pub fn setup(&mut self) -> DialogueManagerResult<()> {
        let domain_dir = self.config.domain_dir.clone();
        let listener = self.dispatcher.clone();
        let engine = self.adapter.engine_mut();

        engine.load_domain(&domain_dir)?;
        let settings = engine.settings();
        engine.change_settings(settings);
        engine.attach_module(listener);
        engine.start_system()?;

        info!(domain = %domain_dir.display(), "dialogue manager set up");
        Ok(())
    }

    /// Process one inbound update message
    pub fn process_update(&mut self, message: &UpdateMessage) -> EngineResult<()> {
        self.adapter.consume(message)
    }

    pub fn start(&self) {
        self.dispatcher.start();
        info!("dialogue manager started");
    }

    pub fn pause(&self, to_pause: bool) {
        self.dispatcher.pause(to_pause);
        info!(paused = to_pause, "dialogue manager pause state changed");
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher.is_running()
    }

    /// Consume inbound messages until the channel closes.
    ///
    /// The first engine failure ends the loop.
    pub async fn run(
        &mut self,
        mut inbound: UnboundedReceiver<UpdateMessage>,
    ) -> DialogueManagerResult<()> {
        while let Some(message) = inbound.recv().await {
            self.process_update(&message)?;
        }
        info!("inbound channel closed, dialogue manager stopping");
        Ok(())
    }
}
