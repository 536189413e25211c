//! Output formatting utilities for the CLI
//!
//! Tables for process status, plain lists for catalogs, and colored status
//! lines for everything the console's background tasks report.

use std::io::{self, Write};

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{settings::Style, Table, Tabled};

use om_console::ConsoleEvent;
use om_core::socket::ProcessHandle;
use om_core::LivenessState;

/// Format a process inspection as an ASCII table
pub fn format_process(handle: &ProcessHandle) -> String {
    #[derive(Tabled)]
    struct ProcessRow {
        #[tabled(rename = "PID")]
        pid: u32,
        #[tabled(rename = "PROCESS")]
        process: &'static str,
        #[tabled(rename = "SOCKET")]
        socket: &'static str,
        #[tabled(rename = "PATH")]
        path: String,
    }

    let row = ProcessRow {
        pid: handle.pid,
        process: if handle.alive { "running" } else { "not running" },
        socket: if handle.socket_present {
            "present"
        } else {
            "missing"
        },
        path: handle.socket_path.display().to_string(),
    };

    Table::new([row]).with(Style::rounded()).to_string()
}

/// Format names one per line
pub fn format_names(names: &[String]) -> String {
    names.join("\n")
}

/// Print one liveness reading, colored by reachability
pub fn print_liveness(state: &LivenessState) {
    let msg = format!("openMSX {}", state);
    if state.reachable {
        print_success(&msg);
    } else {
        print_warning(&msg);
    }
}

/// Render a console event for the terminal
pub fn render_event(event: &ConsoleEvent) {
    match event {
        ConsoleEvent::Status(msg) => print_info(msg),
        ConsoleEvent::PortFound(port) => {
            print_success(&format!("Found openMSX command port {}", port))
        }
        ConsoleEvent::PortNotFound => {
            print_warning("No openMSX port file found. Is openMSX running?")
        }
        ConsoleEvent::Connected { port } => {
            print_success(&format!("Connected to openMSX on port {}", port))
        }
        ConsoleEvent::ConnectFailed(reason) => print_warning(reason),
        ConsoleEvent::Response(text) => println!("{}", text.trim_end()),
        ConsoleEvent::Failure(reason) => print_error(reason),
        ConsoleEvent::Liveness(state) => print_liveness(state),
    }
}

/// Kind of status line, which picks its color, mark and stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Success,
    Error,
    Warning,
    Info,
}

impl Tone {
    fn color(self) -> Color {
        match self {
            Tone::Success => Color::Green,
            Tone::Error => Color::Red,
            Tone::Warning => Color::Yellow,
            Tone::Info => Color::Cyan,
        }
    }

    fn mark(self) -> &'static str {
        match self {
            Tone::Success => "✓ ",
            Tone::Error => "✗ ",
            Tone::Warning => "⚠ ",
            Tone::Info => "ℹ ",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Tone::Error | Tone::Warning)
    }
}

/// Write one colored status line to `out`
fn write_status<W: Write>(out: &mut W, tone: Tone, msg: &str) -> io::Result<()> {
    crossterm::queue!(
        out,
        SetForegroundColor(tone.color()),
        Print(tone.mark()),
        ResetColor,
        Print(msg),
        Print("\n")
    )?;
    out.flush()
}

fn print_status(tone: Tone, msg: &str) {
    // a closed terminal is not worth failing a command over
    let _ = if tone.to_stderr() {
        write_status(&mut io::stderr().lock(), tone, msg)
    } else {
        write_status(&mut io::stdout().lock(), tone, msg)
    };
}

/// Print a green status line to stdout
pub fn print_success(msg: &str) {
    print_status(Tone::Success, msg);
}

/// Print a red status line to stderr
pub fn print_error(msg: &str) {
    print_status(Tone::Error, msg);
}

/// Print a yellow status line to stderr
pub fn print_warning(msg: &str) {
    print_status(Tone::Warning, msg);
}

/// Print a cyan status line to stdout
pub fn print_info(msg: &str) {
    print_status(Tone::Info, msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_process_table() {
        let handle = ProcessHandle {
            pid: 4242,
            socket_path: PathBuf::from("/tmp/openmsx-default/socket.4242"),
            socket_present: false,
            alive: true,
        };
        let table = format_process(&handle);
        assert!(table.contains("4242"));
        assert!(table.contains("running"));
        assert!(table.contains("missing"));
        assert!(table.contains("socket.4242"));
    }

    #[test]
    fn test_format_names() {
        let names = vec!["C-BIOS_MSX1".to_string(), "C-BIOS_MSX2".to_string()];
        assert_eq!(format_names(&names), "C-BIOS_MSX1\nC-BIOS_MSX2");
    }

    #[test]
    fn test_status_line_carries_mark_and_message() {
        let mut out = Vec::new();
        write_status(&mut out, Tone::Warning, "No openMSX port known yet").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("⚠ "));
        assert!(text.ends_with("No openMSX port known yet\n"));
    }

    #[test]
    fn test_failures_go_to_stderr() {
        assert!(Tone::Error.to_stderr());
        assert!(Tone::Warning.to_stderr());
        assert!(!Tone::Success.to_stderr());
        assert!(!Tone::Info.to_stderr());
    }
}
