//! Configuration loading.
//!
//! Settings come from `.wpflow.toml`, discovered by walking up from the working
//! directory or named explicitly on the command line. Every section is optional.

mod core;
mod loader;

pub use core::{
    Config, ContractShape, CustomContract, IgnoreConfig, KeyedArg, MixedArg, NamedArg, NonceConfig,
    OutputConfig, SelectorConfig, SlashingConfig,
};
pub use loader::{
    directory_ancestors, discover_config, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
