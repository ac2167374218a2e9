use crate::config::{parse_and_validate_config, CONFIG_FILE_NAME};
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# wpflow configuration

[nonce]
# Superglobals reported as errors / warnings when used before nonce verification
error_for = ["$_POST"]
warn_for = ["$_GET", "$_REQUEST"]
# Your own wrappers around wp_verify_nonce() and friends
custom_verification_functions = []
# Never report $_POST['x'] inside isset() / empty()
exempt_existence_checks = true
cache_capacity = 16

[slashing]
custom_slashing_functions = []
custom_auto_slashing_functions = []
raw_input = ["$_COOKIE", "$_GET", "$_FILES", "$_POST", "$_REQUEST", "$_SERVER"]

# [[slashing.contracts]]
# function = "my_plugin_update_option"
# kind = "fully"
# args = [{ index = 2, name = "value" }]

# [[slashing.selectors]]
# function = "my_plugin_get_by"
# argument = 1
# sentinel = "name"

[ignore]
patterns = [
    "vendor/**",
    "node_modules/**",
]

[output]
format = "terminal"
"#;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    write_default_config(&config_path, force)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");
    Ok(())
}

pub fn write_default_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }
    io::write_file(config_path, DEFAULT_CONFIG)?;
    Ok(())
}
