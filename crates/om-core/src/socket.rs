//! Process liveness handle utilities
//!
//! A running openMSX instance creates `socket.<pid>` inside its rendezvous
//! directory. The file is only ever checked for presence; it is never
//! opened here.

use std::path::{Path, PathBuf};

use crate::discovery::default_rendezvous_dir;

/// Prefix of the per-process socket file name
const SOCKET_FILE_PREFIX: &str = "socket.";

/// Get the socket path for a PID inside the default rendezvous directory
pub fn socket_path(pid: u32) -> PathBuf {
    socket_path_in(&default_rendezvous_dir(), pid)
}

/// Get the socket path for a PID inside `dir`
pub fn socket_path_in(dir: &Path, pid: u32) -> PathBuf {
    dir.join(format!("{}{}", SOCKET_FILE_PREFIX, pid))
}

/// Whether the default socket file for `pid` exists
pub fn socket_exists(pid: u32) -> bool {
    socket_path(pid).exists()
}

/// Snapshot of what the filesystem and OS say about a launched process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    /// Process ID of the launched emulator
    pub pid: u32,
    /// Expected socket file path
    pub socket_path: PathBuf,
    /// Whether the socket file is present
    pub socket_present: bool,
    /// Whether the process is still running
    pub alive: bool,
}

impl ProcessHandle {
    /// Inspect a PID against the socket files in `dir`
    pub fn inspect_in(dir: &Path, pid: u32) -> Self {
        let socket_path = socket_path_in(dir, pid);
        Self {
            pid,
            socket_present: socket_path.exists(),
            socket_path,
            alive: is_process_alive(pid),
        }
    }
}

/// Check if a process with the given PID is still alive
///
/// On Unix, uses kill(pid, 0) to check if the process exists.
/// On Windows, uses OpenProcess to check if the process exists.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // pid 0 would signal our own process group
    if pid <= 0 {
        return false;
    }
    // ESRCH means no such process; EPERM means it exists but belongs to someone else
    unsafe {
        if libc::kill(pid, 0) == 0 {
            return true;
        }
        let err = std::io::Error::last_os_error();
        err.raw_os_error() == Some(libc::EPERM)
    }
}

#[cfg(windows)]
pub fn is_process_alive(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle == 0 {
            return false;
        }
        CloseHandle(handle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_socket_path_layout() {
        let path = socket_path_in(Path::new("/tmp/openmsx-default"), 4242);
        assert_eq!(path, PathBuf::from("/tmp/openmsx-default/socket.4242"));
    }

    #[test]
    fn test_default_socket_path_is_in_rendezvous_dir() {
        let path = socket_path(7);
        assert!(path.starts_with(default_rendezvous_dir()));
        assert!(path.ends_with("socket.7"));
    }

    #[test]
    fn test_socket_exists_for_unknown_pid() {
        assert!(!socket_exists(999999999));
    }

    #[test]
    fn test_inspect_missing_socket() {
        let dir = TempDir::new().unwrap();
        let handle = ProcessHandle::inspect_in(dir.path(), std::process::id());
        assert!(!handle.socket_present);
        assert!(handle.alive);
    }

    #[test]
    fn test_inspect_present_socket() {
        let dir = TempDir::new().unwrap();
        let pid = std::process::id();
        std::fs::write(socket_path_in(dir.path(), pid), b"").unwrap();
        let handle = ProcessHandle::inspect_in(dir.path(), pid);
        assert!(handle.socket_present);
    }

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn test_invalid_pid_not_alive() {
        assert!(!is_process_alive(999999999));
        assert!(!is_process_alive(0));
    }
}
