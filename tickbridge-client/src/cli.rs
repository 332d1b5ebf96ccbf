//! CLI argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Send commands to a running tickbridge bridge
#[derive(Parser, Debug)]
#[command(name = "tickbridge")]
#[command(about = "Send commands to a running tickbridge bridge")]
#[command(version)]
pub struct Cli {
    /// Bridge host
    #[arg(long, env = "TICKBRIDGE_HOST", default_value = "localhost")]
    pub host: String,

    /// Bridge port (read from the project's port file when omitted)
    #[arg(long, env = "TICKBRIDGE_PORT")]
    pub port: Option<u16>,

    /// Project directory holding the port file
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the bridge is alive
    Ping,

    /// Run a named command
    Send {
        /// Command type, e.g. get_bridge_info
        #[arg(value_name = "TYPE")]
        name: String,

        /// Parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
    },

    /// Send one frame verbatim and print the response envelope
    Raw {
        text: String,
    },

    /// Print the port the bridge published
    Port,
}
