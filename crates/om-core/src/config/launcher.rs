//! Launcher configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to start and with which media
///
/// Every field is optional in the file; the launch plan validates what it
/// needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// openMSX folder, or the full path to the executable
    pub openmsx_dir: Option<PathBuf>,

    /// Machine name (stem of a file in `share/machines`)
    pub machine: Option<String>,

    /// Extensions to load, as names or `.xml` paths
    pub extensions: Vec<String>,

    /// Disk image for drive A
    pub disk_a: Option<String>,

    /// Disk image for drive B
    pub disk_b: Option<String>,

    /// Cartridge ROM for slot A
    pub cart_a: Option<String>,

    /// Cartridge ROM for slot B
    pub cart_b: Option<String>,
}
