pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragchat-gateway")]
#[command(author, version, about = "RAG chat gateway - relay chat and downloads to the agent backend")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/ragchat/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Sign in with a device code
    Login,

    /// Forget the stored session
    Logout,

    /// Chat with the agent through the gateway
    Chat {
        /// Gateway URL (defaults to the configured server address)
        #[arg(short, long)]
        gateway: Option<String>,

        /// Category to search in
        #[arg(long)]
        category: Option<String>,

        /// Send a single message and exit; interactive when omitted
        message: Option<String>,
    },

    /// Download a source document through the gateway
    Download {
        /// Document path, e.g. container/manuals/guide.pdf
        path: String,

        /// Output file (defaults to the document's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gateway URL (defaults to the configured server address)
        #[arg(short, long)]
        gateway: Option<String>,
    },

    /// Show the resolved category configuration
    Categories,

    /// Show gateway status
    Status,
}
