//! Socket command implementation

use anyhow::Result;

use om_core::config::ConsoleConfig;
use om_core::socket::ProcessHandle;

use crate::output::format_process;

/// Show whether the socket file and process for `pid` exist
pub fn socket_command(config: &ConsoleConfig, pid: u32) -> Result<()> {
    let handle = ProcessHandle::inspect_in(&config.rendezvous_dir(), pid);
    println!("{}", format_process(&handle));
    Ok(())
}
