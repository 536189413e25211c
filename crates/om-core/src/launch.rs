//! Emulator launch planning
//!
//! Turns a [`LauncherConfig`] into the executable, working directory and
//! argument list for openMSX, and starts it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::config::LauncherConfig;
use crate::error::LaunchError;

/// Executable file name on this platform
#[cfg(windows)]
pub const EXECUTABLE_NAME: &str = "openmsx.exe";
#[cfg(not(windows))]
pub const EXECUTABLE_NAME: &str = "openmsx";

/// How long to wait before deciding the process survived startup
const STARTUP_GRACE: Duration = Duration::from_millis(250);

/// Resolve the executable and working directory
///
/// `configured` may be the openMSX folder or the full path to the
/// executable itself.
pub fn resolve_executable(configured: &Path) -> Result<(PathBuf, PathBuf), LaunchError> {
    let names_executable = configured
        .file_name()
        .map(|name| name.to_string_lossy().eq_ignore_ascii_case(EXECUTABLE_NAME))
        .unwrap_or(false);

    let (exe, working_dir) = if names_executable {
        let parent = configured
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (configured.to_path_buf(), parent)
    } else {
        (configured.join(EXECUTABLE_NAME), configured.to_path_buf())
    };

    if !exe.is_file() {
        return Err(LaunchError::ExecutableNotFound(exe));
    }

    Ok((exe, working_dir))
}

/// Directory holding machine descriptions
pub fn machines_dir(openmsx_dir: &Path) -> PathBuf {
    openmsx_dir.join("share").join("machines")
}

/// Directory holding extension descriptions
pub fn extensions_dir(openmsx_dir: &Path) -> PathBuf {
    openmsx_dir.join("share").join("extensions")
}

/// List available machine names
pub fn list_machines(openmsx_dir: &Path) -> Vec<String> {
    xml_stems(&machines_dir(openmsx_dir))
}

/// List available extension names
pub fn list_extensions(openmsx_dir: &Path) -> Vec<String> {
    xml_stems(&extensions_dir(openmsx_dir))
}

/// Sorted, de-duplicated stems of `*.xml` files in `dir`; empty if missing
fn xml_stems(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("xml"))
                .unwrap_or(false)
        })
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();

    names.sort();
    names.dedup();
    names
}

/// Reduce an extension entry to the name openMSX expects
///
/// Drops any directory part and a trailing `.xml` (any case); inner dots
/// are kept.
pub fn normalize_extension_name(ext: &str) -> String {
    let name = ext
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(ext)
        .trim();

    let cut = name.len().saturating_sub(4);
    match (name.get(..cut), name.get(cut..)) {
        (Some(stem), Some(suffix)) if suffix.eq_ignore_ascii_case(".xml") => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Everything needed to start the emulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Executable path
    pub executable: PathBuf,
    /// Working directory for the process
    pub working_dir: PathBuf,
    /// Arguments, excluding the executable
    pub args: Vec<String>,
    /// Normalized extension names that were added
    pub extensions: Vec<String>,
}

impl LaunchPlan {
    /// Build a plan from launcher configuration
    pub fn from_config(config: &LauncherConfig) -> Result<Self, LaunchError> {
        let dir = config
            .openmsx_dir
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(LaunchError::DirectoryNotConfigured)?;
        let (executable, working_dir) = resolve_executable(dir)?;

        let mut plan = Self::with_executable(executable, working_dir);
        plan.apply_media(config)?;
        Ok(plan)
    }

    /// Start an empty plan for a known executable
    pub fn with_executable(executable: PathBuf, working_dir: PathBuf) -> Self {
        Self {
            executable,
            working_dir,
            args: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Append machine, extension and media flags from configuration
    pub fn apply_media(&mut self, config: &LauncherConfig) -> Result<(), LaunchError> {
        let machine = non_empty(config.machine.as_deref()).ok_or(LaunchError::NoMachine)?;
        self.push_flag("-machine", machine);

        for ext in &config.extensions {
            let name = normalize_extension_name(ext);
            if !name.is_empty() {
                self.push_flag("-ext", &name);
                self.extensions.push(name);
            }
        }

        let slots = [
            ("-diska", &config.disk_a),
            ("-diskb", &config.disk_b),
            ("-carta", &config.cart_a),
            ("-cartb", &config.cart_b),
        ];
        for (flag, value) in slots {
            if let Some(value) = non_empty(value.as_deref()) {
                self.push_flag(flag, value);
            }
        }

        Ok(())
    }

    fn push_flag(&mut self, flag: &str, value: &str) {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
    }

    /// Human-readable command line, quoting arguments with spaces
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|arg| {
                if arg.contains(' ') {
                    format!("\"{}\"", arg)
                } else {
                    arg
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Start the emulator
    ///
    /// A process that exits within the startup grace period is reported as
    /// [`LaunchError::ExitedImmediately`] with whatever it printed.
    pub async fn spawn(&self) -> Result<LaunchedProcess, LaunchError> {
        tracing::info!(
            "Starting openMSX: {} (cwd={:?})",
            self.command_line(),
            self.working_dir
        );

        let mut command = Command::new(&self.executable);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            // CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW
            command.creation_flags(0x0000_0200 | 0x0800_0000);
        }

        let mut child = command.spawn().map_err(LaunchError::Spawn)?;

        tokio::time::sleep(STARTUP_GRACE).await;

        if let Ok(Some(status)) = child.try_wait() {
            let stdout = drain_pipe(child.stdout.take()).await;
            let stderr = drain_pipe(child.stderr.take()).await;
            tracing::warn!("openMSX exited immediately: {}", status);
            return Err(LaunchError::ExitedImmediately {
                status: status.to_string(),
                stdout,
                stderr,
            });
        }

        let pid = child.id().unwrap_or_default();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, "STDOUT"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, "STDERR"));
        }

        tracing::info!("openMSX started (PID {})", pid);
        Ok(LaunchedProcess { pid, child })
    }
}

impl fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// A successfully started emulator process
#[derive(Debug)]
pub struct LaunchedProcess {
    /// Process ID
    pub pid: u32,
    /// Child handle; dropping it does not kill the process
    pub child: Child,
}

impl LaunchedProcess {
    /// Wait for the process to exit
    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Read a pipe to the end with a short bound
async fn drain_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(2), pipe.read_to_end(&mut buf)).await;
    crate::text::decode_lossy(&buf)
}

/// Forward child output to the log, one line at a time
async fn forward_lines<R: AsyncRead + Unpin>(pipe: R, prefix: &'static str) {
    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::info!("{}: {}", prefix, line.trim_end()),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("{} reader error: {}", prefix, e);
                break;
            }
        }
    }
}
