//! Configuration of the dialogue manager module

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{DialogueManagerError, DialogueManagerResult};

/// Default name of the variable whose posterior is the chosen action
pub const DEFAULT_DECISION_VARIABLE: &str = "decision";

/// Module configuration
///
/// # Example
///
/// ```rust
/// use cim_domain_dialog_manager::DialogueManagerConfig;
///
/// let config = DialogueManagerConfig::new("domains/restaurant")
///     .with_variables(["topic", "intent"]);
/// assert!(config.tracks("topic"));
/// assert!(!config.tracks("mood"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueManagerConfig {
    /// Location of the engine's domain description
    pub domain_dir: PathBuf,

    /// Variables forwarded to the engine; `None` forwards every key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeSet<String>>,

    /// Variable whose posterior holds the chosen action
    #[serde(default = "default_decision_variable")]
    pub decision_variable: String,

    /// Forward values even when equal to the last forwarded one
    #[serde(default = "default_forward_unchanged")]
    pub forward_unchanged: bool,

    /// Creator name stamped on emitted decision units
    #[serde(default = "default_creator")]
    pub creator: String,
}

/// Allowlist check shared by the config and the adapter's variable state
pub(crate) fn allows(variables: Option<&BTreeSet<String>>, key: &str) -> bool {
    variables.is_none_or(|variables| variables.contains(key))
}

fn default_decision_variable() -> String {
    DEFAULT_DECISION_VARIABLE.to_string()
}

fn default_forward_unchanged() -> bool {
    true
}

fn default_creator() -> String {
    crate::module::NAME.to_string()
}

impl DialogueManagerConfig {
    /// Create a configuration forwarding all variables
    pub fn new(domain_dir: impl Into<PathBuf>) -> Self {
        Self {
            domain_dir: domain_dir.into(),
            variables: None,
            decision_variable: default_decision_variable(),
            forward_unchanged: default_forward_unchanged(),
            creator: default_creator(),
        }
    }

    /// Restrict forwarding to the given variables
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = Some(variables.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_decision_variable(mut self, name: impl Into<String>) -> Self {
        self.decision_variable = name.into();
        self
    }

    pub fn with_forward_unchanged(mut self, forward: bool) -> Self {
        self.forward_unchanged = forward;
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    /// Whether a key passes the allowlist
    pub fn tracks(&self, key: &str) -> bool {
        allows(self.variables.as_ref(), key)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> DialogueManagerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> DialogueManagerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> DialogueManagerResult<()> {
        if self.domain_dir.as_os_str().is_empty() {
            return Err(DialogueManagerError::Config(
                "domain_dir must not be empty".to_string(),
            ));
        }
        if self.decision_variable.trim().is_empty() {
            return Err(DialogueManagerError::Config(
                "decision_variable must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
