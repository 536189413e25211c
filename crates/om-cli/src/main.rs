//! omsx CLI
//!
//! Talks to a running openMSX over its local command port:
//! - Discover the port the emulator advertises
//! - Send one command, or run an interactive console
//! - Watch whether the emulator is reachable
//! - Launch the emulator with a machine, extensions and media

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omsx::commands::{self, LaunchOptions};
use om_core::config::{self, ConfigFile};

#[derive(Parser)]
#[command(name = "omsx")]
#[command(author, version, about = "Command console for the openMSX emulator")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory where openMSX advertises its command port
    #[arg(long, global = true, env = "OMSX_RENDEZVOUS_DIR")]
    rendezvous_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the command port openMSX is listening on
    Discover,

    /// Send one command and print the response
    Send {
        /// Command words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,

        /// Port to use instead of discovering one
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep retrying discovery until openMSX appears
        #[arg(short, long)]
        wait: bool,
    },

    /// Interactive console: each input line is sent as a command
    Console {
        /// Port to use instead of discovering one
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Report whether openMSX is reachable, once per interval
    Watch {
        /// Check once and exit
        #[arg(long)]
        once: bool,

        /// Print each state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect the socket file and process for a launched openMSX
    Socket {
        /// Process ID of the emulator
        pid: u32,
    },

    /// Start openMSX
    Launch(LaunchArgs),

    /// List machines shipped with openMSX
    Machines {
        /// openMSX installation directory (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// List extensions shipped with openMSX
    Extensions {
        /// openMSX installation directory (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct LaunchArgs {
    /// openMSX installation directory (overrides config)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Machine to emulate
    #[arg(short, long)]
    machine: Option<String>,

    /// Extension to insert (repeatable)
    #[arg(short = 'e', long = "ext")]
    extensions: Vec<String>,

    /// Disk image for drive A
    #[arg(long)]
    diska: Option<String>,

    /// Disk image for drive B
    #[arg(long)]
    diskb: Option<String>,

    /// Cartridge image for slot A
    #[arg(long)]
    carta: Option<String>,

    /// Cartridge image for slot B
    #[arg(long)]
    cartb: Option<String>,

    /// Print the command line without starting anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config: ConfigFile = config::load_or_default(cli.config.as_deref())
        .with_context(|| match &cli.config {
            Some(path) => format!("Failed to load config from {:?}", path),
            None => "Failed to load default config".to_string(),
        })?;

    if let Some(dir) = cli.rendezvous_dir {
        config.console.rendezvous_dir = Some(dir);
    }

    match cli.command {
        Commands::Discover => {
            commands::discover_command(&config.console)?;
        }
        Commands::Send {
            command,
            port,
            wait,
        } => {
            commands::send_command(&config.console, &command.join(" "), port, wait).await?;
        }
        Commands::Console { port } => {
            commands::console_command(&config, port).await?;
        }
        Commands::Watch { once, json } => {
            commands::watch_command(&config, once, json).await?;
        }
        Commands::Socket { pid } => {
            commands::socket_command(&config.console, pid)?;
        }
        Commands::Launch(args) => {
            let options = LaunchOptions {
                openmsx_dir: args.dir,
                machine: args.machine,
                extensions: args.extensions,
                disk_a: args.diska,
                disk_b: args.diskb,
                cart_a: args.carta,
                cart_b: args.cartb,
                dry_run: args.dry_run,
            };
            commands::launch_command(&config.launcher, options).await?;
        }
        Commands::Machines { dir } => {
            commands::machines_command(&config.launcher, dir.as_deref())?;
        }
        Commands::Extensions { dir } => {
            commands::extensions_command(&config.launcher, dir.as_deref())?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(cli.config.as_deref(), &config)?;
            }
            ConfigAction::Path => {
                let path = cli.config.unwrap_or_else(config::default_config_path);
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}
