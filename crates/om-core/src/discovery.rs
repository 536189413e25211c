//! Rendezvous-file port discovery
//!
//! openMSX advertises its command port by writing a small file into a
//! per-user temp directory. The file format has varied between emulator
//! releases (a bare integer, an integer followed by text, a JSON object),
//! so discovery is tolerant: anything it cannot read or parse is simply
//! "no port yet", never an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use regex::Regex;

/// Subdirectory of the temp root used by the default openMSX instance
pub const RENDEZVOUS_DIR_NAME: &str = "openmsx-default";

/// Get the default rendezvous directory (`<temp>/openmsx-default`)
pub fn default_rendezvous_dir() -> PathBuf {
    std::env::temp_dir().join(RENDEZVOUS_DIR_NAME)
}

/// Locates the emulator's command port from its rendezvous directory
///
/// Stateless and side-effect free; safe to call from any number of polling
/// loops at once.
#[derive(Debug, Clone)]
pub struct PortDiscovery {
    dir: PathBuf,
}

impl PortDiscovery {
    /// Create a discovery over a specific directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a discovery over the default rendezvous directory
    pub fn with_default_dir() -> Self {
        Self::new(default_rendezvous_dir())
    }

    /// Directory being polled
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the port advertised by the newest rendezvous file
    ///
    /// Returns `None` when the directory is missing, holds no regular files,
    /// or the newest file cannot be read or parsed.
    pub fn discover_port(&self) -> Option<u16> {
        let newest = newest_file(&self.dir)?;

        let bytes = match fs::read(&newest) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Failed to read rendezvous file {:?}: {}", newest, e);
                return None;
            }
        };

        let port = parse_port(&crate::text::decode_lossy(&bytes));
        if port.is_none() {
            tracing::debug!("No port in rendezvous file {:?}", newest);
        }
        port
    }

    /// Async wrapper running [`discover_port`](Self::discover_port) off the runtime threads
    pub async fn discover(&self) -> Option<u16> {
        let discovery = self.clone();
        match tokio::task::spawn_blocking(move || discovery.discover_port()).await {
            Ok(port) => port,
            Err(e) => {
                tracing::debug!("Discovery task failed: {}", e);
                None
            }
        }
    }
}

impl Default for PortDiscovery {
    fn default() -> Self {
        Self::with_default_dir()
    }
}

/// Find the most recently modified regular file directly inside `dir`
///
/// Ties on modification time go to the entry listed last.
fn newest_file(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Rendezvous directory {:?} unavailable: {}", dir, e);
            return None;
        }
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        // fs::metadata follows symlinks, so a link to a file counts as a file
        let Ok(meta) = fs::metadata(&path) else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else {
            continue;
        };

        match &newest {
            Some((best, _)) if modified < *best => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest.map(|(_, path)| path)
}

/// Extract a port number from rendezvous file content
///
/// Tried in order: the whole trimmed content as an integer, the first run of
/// ASCII digits anywhere in it, and a JSON object with a `port` field.
/// Zero and out-of-range values yield `None`.
pub fn parse_port(content: &str) -> Option<u16> {
    let trimmed = content.trim();

    if let Some(port) = valid_port(trimmed) {
        return Some(port);
    }

    if let Some(port) = first_digit_run(trimmed).and_then(valid_port) {
        return Some(port);
    }

    port_from_json(trimmed)
}

fn valid_port(s: &str) -> Option<u16> {
    s.parse::<u16>().ok().filter(|port| *port != 0)
}

fn first_digit_run(s: &str) -> Option<&str> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new("[0-9]+").ok()).as_ref()?;
    re.find(s).map(|m| m.as_str())
}

fn port_from_json(s: &str) -> Option<u16> {
    let value: serde_json::Value = serde_json::from_str(s).ok()?;
    match value.get("port")? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }
    .filter(|port| *port != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_with_mtime(dir: &Path, name: &str, content: &str, mtime: SystemTime) {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(mtime).unwrap();
    }

    #[test]
    fn test_parse_sample_contents() {
        assert_eq!(parse_port("12345"), Some(12345));
        assert_eq!(parse_port("12345\nfoo"), Some(12345));
        assert_eq!(parse_port("port=12345"), Some(12345));
        assert_eq!(parse_port(r#"{"port": 12345}"#), Some(12345));
        assert_eq!(parse_port("abc"), None);
    }

    #[test]
    fn test_parse_rejects_out_of_range_and_zero() {
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port(""), None);
    }

    #[test]
    fn test_parse_json_port_as_string() {
        assert_eq!(port_from_json(r#"{"port": "9938"}"#), Some(9938));
        assert_eq!(port_from_json(r#"{"pid": 1}"#), None);
        assert_eq!(port_from_json("[1, 2]"), None);
    }

    #[test]
    fn test_parse_ignores_non_ascii_digits() {
        // Arabic-Indic digits are not a port
        assert_eq!(parse_port("port=٩٩"), None);
    }

    #[test]
    fn test_missing_directory_is_absent() {
        let dir = TempDir::new().unwrap();
        let discovery = PortDiscovery::new(dir.path().join("openmsx-default"));
        assert_eq!(discovery.discover_port(), None);
    }

    #[test]
    fn test_empty_directory_is_absent() {
        let dir = TempDir::new().unwrap();
        let discovery = PortDiscovery::new(dir.path());
        assert_eq!(discovery.discover_port(), None);
    }

    #[test]
    fn test_subdirectories_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("12345")).unwrap();
        let discovery = PortDiscovery::new(dir.path());
        assert_eq!(discovery.discover_port(), None);
    }

    #[test]
    fn test_unparsable_file_is_absent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("socket.1"), "abc").unwrap();
        let discovery = PortDiscovery::new(dir.path());
        assert_eq!(discovery.discover_port(), None);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("port"), b"\xff\xfe9938\n").unwrap();
        let discovery = PortDiscovery::new(dir.path());
        assert_eq!(discovery.discover_port(), Some(9938));
    }

    #[test]
    fn test_newest_file_wins_regardless_of_creation_order() {
        let dir = TempDir::new().unwrap();
        let base = SystemTime::now() - Duration::from_secs(600);

        // Newest written first so listing order cannot be what decides
        write_with_mtime(dir.path(), "c", "3333", base + Duration::from_secs(300));
        write_with_mtime(dir.path(), "a", "1111", base);
        write_with_mtime(dir.path(), "b", "2222", base + Duration::from_secs(100));

        let discovery = PortDiscovery::new(dir.path());
        assert_eq!(discovery.discover_port(), Some(3333));
    }

    #[test]
    fn test_newest_unparsable_file_hides_older_ones() {
        let dir = TempDir::new().unwrap();
        let base = SystemTime::now() - Duration::from_secs(600);

        write_with_mtime(dir.path(), "old", "1111", base);
        write_with_mtime(dir.path(), "new", "garbage", base + Duration::from_secs(60));

        let discovery = PortDiscovery::new(dir.path());
        assert_eq!(discovery.discover_port(), None);
    }

    #[tokio::test]
    async fn test_async_discover() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("port"), r#"{"port": 9938}"#).unwrap();
        let discovery = PortDiscovery::new(dir.path());
        assert_eq!(discovery.discover().await, Some(9938));
    }
}
