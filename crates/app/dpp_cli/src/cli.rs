//! Command-line surface of the `dpp` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dpp_client::http::DEFAULT_BACKEND_URL;

#[derive(Debug, Parser)]
#[command(name = "dpp", version, about = "Digital Product Passport toolkit")]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, default_value = DEFAULT_BACKEND_URL)]
    pub api_url: String,

    /// State directory for sessions, snapshots and connector meta.
    /// Defaults to the platform data directory.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Request a magic login link by email
    Login {
        email: String,
    },
    /// Exchange a magic-link token for a session
    Verify {
        token: String,
    },
    /// Activate an account with an email-verification token
    VerifyEmail {
        token: String,
    },
    /// Create an account; a verification email follows
    Register {
        email: String,
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the authenticated user
    Whoami,
    /// Show a passport, falling back to the last-known snapshot
    View {
        id: String,
        /// Treat the platform as offline (shows the degraded banner on live data)
        #[arg(long)]
        offline: bool,
    },
    /// Create a passport, or replace one when --id is given
    Save {
        /// Existing passport to replace; omit to create
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        qr_code: Option<String>,
        /// Sustainability field, repeatable
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Sync a product record into the passport backend
    Sync {
        product_id: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        weight: Option<String>,
        #[arg(long)]
        length: Option<String>,
        #[arg(long)]
        width: Option<String>,
        #[arg(long)]
        height: Option<String>,
        /// Custom product attribute, repeatable
        #[arg(long = "attr", value_name = "LABEL=VALUE")]
        attrs: Vec<String>,
        /// Product meta entry written before the sync, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
        /// Site host baked into generated QR codes
        #[arg(long, default_value = "localhost")]
        site_host: String,
        /// Persist a connector API base URL (including /api) before syncing
        #[arg(long)]
        connector_api_url: Option<String>,
        /// Persist a connector API key before syncing
        #[arg(long)]
        connector_api_key: Option<String>,
    },
    /// Probe backend connectivity
    Health,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
