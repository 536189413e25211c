//! Machine and extension listing

use std::path::{Path, PathBuf};

use anyhow::Result;

use om_core::config::LauncherConfig;
use om_core::launch::{list_extensions, list_machines};
use om_core::LaunchError;

use crate::output::{format_names, print_warning};

fn openmsx_dir(config: &LauncherConfig, dir: Option<&Path>) -> Result<PathBuf, LaunchError> {
    dir.map(Path::to_path_buf)
        .or_else(|| config.openmsx_dir.clone())
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(LaunchError::DirectoryNotConfigured)
}

/// List machine names from `share/machines`
pub fn machines_command(config: &LauncherConfig, dir: Option<&Path>) -> Result<()> {
    let dir = openmsx_dir(config, dir)?;
    let machines = list_machines(&dir);
    if machines.is_empty() {
        print_warning(&format!("No machines found under {:?}", dir));
    } else {
        println!("{}", format_names(&machines));
    }
    Ok(())
}

/// List extension names from `share/extensions`
pub fn extensions_command(config: &LauncherConfig, dir: Option<&Path>) -> Result<()> {
    let dir = openmsx_dir(config, dir)?;
    let extensions = list_extensions(&dir);
    if extensions.is_empty() {
        print_warning(&format!("No extensions found under {:?}", dir));
    } else {
        println!("{}", format_names(&extensions));
    }
    Ok(())
}
