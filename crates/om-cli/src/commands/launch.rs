//! Launch command implementation

use std::path::PathBuf;

use anyhow::Result;

use om_core::config::LauncherConfig;
use om_core::launch::LaunchPlan;
use om_core::LaunchError;

use crate::output::{print_error, print_info, print_success};

/// Command-line overrides for the `[launcher]` section
#[derive(Debug, Default)]
pub struct LaunchOptions {
    pub openmsx_dir: Option<PathBuf>,
    pub machine: Option<String>,
    pub extensions: Vec<String>,
    pub disk_a: Option<String>,
    pub disk_b: Option<String>,
    pub cart_a: Option<String>,
    pub cart_b: Option<String>,
    pub dry_run: bool,
}

impl LaunchOptions {
    /// Layer these overrides on top of `base`
    ///
    /// Extensions given on the command line replace the configured list.
    pub fn apply(&self, base: &LauncherConfig) -> LauncherConfig {
        let mut config = base.clone();
        if let Some(dir) = &self.openmsx_dir {
            config.openmsx_dir = Some(dir.clone());
        }
        if let Some(machine) = &self.machine {
            config.machine = Some(machine.clone());
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        let slots = [
            (&mut config.disk_a, &self.disk_a),
            (&mut config.disk_b, &self.disk_b),
            (&mut config.cart_a, &self.cart_a),
            (&mut config.cart_b, &self.cart_b),
        ];
        for (slot, value) in slots {
            if value.is_some() {
                *slot = value.clone();
            }
        }
        config
    }
}

/// Start openMSX and stay attached until it exits or Ctrl-C
pub async fn launch_command(base: &LauncherConfig, options: LaunchOptions) -> Result<()> {
    let config = options.apply(base);
    let plan = LaunchPlan::from_config(&config)?;

    if options.dry_run {
        println!("{}", plan);
        return Ok(());
    }

    let mut process = match plan.spawn().await {
        Ok(process) => process,
        Err(LaunchError::ExitedImmediately {
            status,
            stdout,
            stderr,
        }) => {
            print_error(&format!("openMSX exited immediately ({})", status));
            for output in [stdout.trim(), stderr.trim()] {
                if !output.is_empty() {
                    eprintln!("{}", output);
                }
            }
            anyhow::bail!("openMSX failed to start");
        }
        Err(e) => return Err(e.into()),
    };

    print_success(&format!("openMSX started (PID: {})", process.pid));
    if !plan.extensions.is_empty() {
        print_info(&format!("Extensions: {}", plan.extensions.join(", ")));
    }

    tokio::select! {
        status = process.wait() => {
            let status = status?;
            print_info(&format!("openMSX exited ({})", status));
        }
        _ = tokio::signal::ctrl_c() => {
            print_info("Detaching from openMSX");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_configured_values() {
        let base = LauncherConfig {
            openmsx_dir: Some(PathBuf::from("/opt/openmsx")),
            machine: Some("C-BIOS_MSX2+".to_string()),
            extensions: vec!["fmpac".to_string()],
            disk_a: Some("game.dsk".to_string()),
            ..LauncherConfig::default()
        };
        let options = LaunchOptions {
            machine: Some("Panasonic_FS-A1GT".to_string()),
            extensions: vec!["ide".to_string()],
            cart_a: Some("rom.rom".to_string()),
            ..LaunchOptions::default()
        };

        let merged = options.apply(&base);
        assert_eq!(merged.openmsx_dir, Some(PathBuf::from("/opt/openmsx")));
        assert_eq!(merged.machine.as_deref(), Some("Panasonic_FS-A1GT"));
        assert_eq!(merged.extensions, vec!["ide".to_string()]);
        assert_eq!(merged.disk_a.as_deref(), Some("game.dsk"));
        assert_eq!(merged.cart_a.as_deref(), Some("rom.rom"));
        assert_eq!(merged.cart_b, None);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let base = LauncherConfig {
            extensions: vec!["fmpac".to_string()],
            ..LauncherConfig::default()
        };
        let merged = LaunchOptions::default().apply(&base);
        assert_eq!(merged.extensions, base.extensions);
    }
}
