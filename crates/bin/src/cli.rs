//! CLI argument definitions for the Gymdex binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Gymdex demo account manager
#[derive(Parser, Debug)]
#[command(name = "gymdex")]
#[command(about = "Gymdex: account management for the gym-directory demo")]
#[command(version)]
pub struct Cli {
    /// Path to the local SQLite database file
    #[arg(long, default_value = "gymdex.db", env = "GYMDEX_DB")]
    pub db: PathBuf,

    /// Path to the client cache file
    #[arg(long, default_value = "gymdex-cache.json", env = "GYMDEX_CACHE")]
    pub cache: PathBuf,

    /// Base URL of the remote document API. Together with --remote-bin and
    /// --remote-key this switches on the remote-preferring hybrid store.
    #[arg(long, env = "GYMDEX_REMOTE_BASE")]
    pub remote_base: Option<String>,

    /// Bin id of the shared user document
    #[arg(long, env = "GYMDEX_REMOTE_BIN")]
    pub remote_bin: Option<String>,

    /// Master key for the remote document API
    #[arg(long, env = "GYMDEX_REMOTE_KEY")]
    pub remote_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a new account
    Register(RegisterArgs),
    /// Authenticate and open a session
    Login(LoginArgs),
    /// Invalidate the cached session
    Logout,
    /// List active accounts
    List,
    /// Push locally registered accounts to the remote document
    Sync,
    /// Remove expired sessions from the local database
    Sweep,
}

/// Arguments for the register command
#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Member's full name
    #[arg(long)]
    pub name: String,

    /// Email address, used as the account key
    #[arg(long)]
    pub email: String,

    /// Password, at least 6 characters
    #[arg(long)]
    pub password: String,
}

/// Arguments for the login command
#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Email address
    #[arg(long)]
    pub email: String,

    /// Password
    #[arg(long)]
    pub password: String,
}
