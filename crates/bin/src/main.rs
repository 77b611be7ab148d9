//! Gymdex command-line client.
//!
//! Thin glue over the library: builds the store stack from the CLI flags,
//! runs one account or sync operation, and prints the result. Business
//! rejections (bad credentials, duplicate email, lockout) print their reason
//! and exit nonzero.

use std::sync::Arc;

use clap::Parser;
use gymdex::store::{HybridStore, LocalStore, RecordStore, RemoteConfig, RemoteStore};
use gymdex::sync::SyncCoordinator;
use gymdex::{AccountService, ClientCache, SessionManager, SystemClock};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("gymdex=warn".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> gymdex::Result<()> {
    let clock = Arc::new(SystemClock);
    let cache = Arc::new(ClientCache::load_from_file(&cli.cache).await);

    let local = Arc::new(LocalStore::open(&cli.db).await?);

    let remote: Option<Arc<RemoteStore>> = match (&cli.remote_base, &cli.remote_bin, &cli.remote_key)
    {
        (Some(api_base), Some(bin_id), Some(api_key)) => Some(Arc::new(RemoteStore::new(
            RemoteConfig {
                api_base: api_base.clone(),
                bin_id: bin_id.clone(),
                api_key: api_key.clone(),
            },
            clock.clone(),
        )?)),
        (None, None, None) => None,
        _ => {
            eprintln!("Remote access needs --remote-base, --remote-bin, and --remote-key together");
            std::process::exit(2);
        }
    };

    let records: Arc<dyn RecordStore> = match &remote {
        Some(remote) => Arc::new(HybridStore::new(remote.clone(), local.clone())),
        None => local.clone(),
    };

    let service = AccountService::new(records.clone(), clock.clone())
        .with_activity_log(local.clone())
        .with_cache(cache.clone())
        .with_device_info(format!("gymdex-cli/{}", env!("CARGO_PKG_VERSION")));
    let sessions = SessionManager::new(local.clone(), records.clone(), clock.clone())
        .with_cache(cache.clone());

    match cli.command {
        Commands::Register(args) => {
            let registered = service
                .register(&args.name, &args.email, &args.password)
                .await?;
            println!("Registered {} ({})", registered.record.email, registered.record.id);
            if registered.degraded {
                println!("Note: the remote store was unreachable; the account is local-only until the next sync");
            }
        }
        Commands::Login(args) => {
            let authenticated = service.authenticate(&args.email, &args.password).await?;
            let session = sessions.create(&authenticated.record).await?;
            println!("Welcome back, {}", authenticated.record.full_name);
            println!("Session {} valid until {}", session.session_id, session.expires_at);
            if authenticated.degraded {
                println!("Note: logged in against the local copy; the remote store was unreachable");
            }
        }
        Commands::Logout => match cache.session() {
            Some(session_id) => {
                if sessions.invalidate(&session_id).await? {
                    println!("Logged out");
                } else {
                    println!("Session was already gone");
                }
            }
            None => println!("No active session"),
        },
        Commands::List => {
            let users = service.list_users().await?;
            if users.is_empty() {
                println!("No accounts");
            }
            for user in users {
                println!(
                    "{:<30} {:<10} registered {}  last login {}",
                    format!("{} <{}>", user.full_name, user.email),
                    user.membership_type,
                    user.registration_date.format("%Y-%m-%d"),
                    user.last_login
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "never".into()),
                );
            }
        }
        Commands::Sync => {
            let Some(remote) = &remote else {
                eprintln!("Sync needs --remote-base, --remote-bin, and --remote-key");
                std::process::exit(2);
            };

            let coordinator = SyncCoordinator::new(clock.clone());
            let report = coordinator
                .reconcile(local.as_ref(), remote.as_ref())
                .await?;
            println!(
                "Pushed {} account(s); remote now holds {}",
                report.pushed, report.remote_total
            );
            for email in &report.pushed_emails {
                println!("  {email}");
            }
        }
        Commands::Sweep => {
            let removed = sessions.sweep_expired().await?;
            println!("Removed {removed} expired session(s)");
        }
    }

    Ok(())
}
