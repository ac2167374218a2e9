use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::io::output::OutputFormat;
use crate::registry::wordpress;

/// Root configuration structure for wpflow
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Nonce verification check settings
    #[serde(default)]
    pub nonce: NonceConfig,

    /// Slashing contract check settings
    #[serde(default)]
    pub slashing: SlashingConfig,

    /// Paths skipped when walking directories
    #[serde(default)]
    pub ignore: IgnoreConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NonceConfig {
    /// Superglobals reported as errors when used without verification
    #[serde(default = "default_error_for")]
    pub error_for: Vec<String>,

    /// Superglobals reported as warnings; `error_for` takes precedence
    #[serde(default = "default_warn_for")]
    pub warn_for: Vec<String>,

    /// Extra functions that count as nonce verification
    #[serde(default)]
    pub custom_verification_functions: Vec<String>,

    /// Never report uses inside `isset()` / `empty()`
    #[serde(default = "default_true")]
    pub exempt_existence_checks: bool,

    /// Number of scopes whose scan state is remembered per file
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            error_for: default_error_for(),
            warn_for: default_warn_for(),
            custom_verification_functions: Vec::new(),
            exempt_existence_checks: true,
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlashingConfig {
    #[serde(default)]
    pub custom_slashing_functions: Vec<String>,

    #[serde(default)]
    pub custom_auto_slashing_functions: Vec<String>,

    /// Variables holding raw request input
    #[serde(default = "default_raw_input")]
    pub raw_input: Vec<String>,

    #[serde(default)]
    pub contracts: Vec<CustomContract>,

    #[serde(default)]
    pub selectors: Vec<SelectorConfig>,
}

impl Default for SlashingConfig {
    fn default() -> Self {
        Self {
            custom_slashing_functions: Vec::new(),
            custom_auto_slashing_functions: Vec::new(),
            raw_input: default_raw_input(),
            contracts: Vec::new(),
            selectors: Vec::new(),
        }
    }
}

/// A user-supplied function contract.
///
/// ```toml
/// [[slashing.contracts]]
/// function = "my_plugin_store"
/// kind = "partly"
/// args = [{ index = 1, slashed = ["title"] }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomContract {
    pub function: String,
    #[serde(flatten)]
    pub shape: ContractShape,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractShape {
    Fully { args: Vec<NamedArg> },
    Partly { args: Vec<KeyedArg> },
    Mixed { args: Vec<MixedArg> },
}

impl ContractShape {
    fn indices(&self) -> Vec<usize> {
        match self {
            ContractShape::Fully { args } => args.iter().map(|a| a.index).collect(),
            ContractShape::Partly { args } => args.iter().map(|a| a.index).collect(),
            ContractShape::Mixed { args } => args.iter().map(|a| a.index).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedArg {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyedArg {
    pub index: usize,
    pub slashed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixedArg {
    pub index: usize,
    #[serde(default)]
    pub slashed: Vec<String>,
    #[serde(default)]
    pub unslashed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectorConfig {
    pub function: String,
    pub argument: usize,
    pub sentinel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IgnoreConfig {
    /// Glob patterns matched against file paths
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Reject settings the analyses cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.nonce.cache_capacity == 0 {
            return Err(Error::config("nonce.cache_capacity must be at least 1"));
        }
        for contract in &self.slashing.contracts {
            if contract.function.trim().is_empty() {
                return Err(Error::config("slashing.contracts entry has an empty function name"));
            }
            if contract.shape.indices().contains(&0) {
                return Err(Error::config(format!(
                    "{}: argument indices are 1-based",
                    contract.function
                )));
            }
        }
        for pattern in &self.ignore.patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(Error::config(format!("invalid ignore pattern {pattern:?}: {e}")));
            }
        }
        for selector in &self.slashing.selectors {
            if selector.argument == 0 {
                return Err(Error::config(format!(
                    "{}: selector argument index is 1-based",
                    selector.function
                )));
            }
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_error_for() -> Vec<String> {
    strings(wordpress::NONCE_ERROR_SUPERGLOBALS)
}

fn default_warn_for() -> Vec<String> {
    strings(wordpress::NONCE_WARN_SUPERGLOBALS)
}

fn default_raw_input() -> Vec<String> {
    strings(wordpress::INPUT_SUPERGLOBALS)
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    16
}
