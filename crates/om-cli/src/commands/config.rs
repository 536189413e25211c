//! Config command implementations

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{print_info, print_warning};
use om_core::config::{self, ConfigFile};

/// Print the effective configuration, defaults included
pub fn config_show(config_path: Option<&Path>, effective: &ConfigFile) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);

    if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
    } else {
        print_warning(&format!(
            "No configuration file found at {:?}, showing defaults",
            path
        ));
    }
    println!();

    let rendered = config::to_toml(effective).context("Failed to render configuration")?;
    println!("{}", rendered);

    Ok(())
}
