pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};

use dpp_client::session::{SessionStore, default_state_dir};
use dpp_client::ApiClient;

mod cli;
mod commands;
mod logging;

fn main() {
    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    logging::init();

    let args = Cli::parse();
    let state_dir = args.state_dir.clone().unwrap_or_else(default_state_dir);
    let ctx = commands::Context {
        client: ApiClient::new(args.api_url.as_str())?,
        store: SessionStore::new(&state_dir),
        state_dir,
    };

    match args.command {
        Commands::Login { email } => commands::login(&ctx, &email).await,
        Commands::Verify { token } => commands::verify(&ctx, &token).await,
        Commands::VerifyEmail { token } => commands::verify_email(&ctx, &token).await,
        Commands::Register {
            email,
            username,
            password,
        } => commands::register(&ctx, &email, &username, &password).await,
        Commands::Logout => commands::logout(&ctx),
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::View { id, offline } => commands::view(&ctx, &id, offline).await,
        Commands::Save {
            id,
            name,
            qr_code,
            fields,
        } => {
            commands::save(
                &ctx,
                id.as_deref(),
                name.as_deref(),
                qr_code.as_deref(),
                &fields,
            )
            .await
        }
        Commands::Sync {
            product_id,
            name,
            weight,
            length,
            width,
            height,
            attrs,
            meta,
            site_host,
            connector_api_url,
            connector_api_key,
        } => {
            commands::sync(
                &ctx,
                commands::SyncArgs {
                    product_id,
                    name,
                    weight,
                    length,
                    width,
                    height,
                    attrs,
                    meta,
                    site_host,
                    connector_api_url,
                    connector_api_key,
                },
            )
            .await
        }
        Commands::Health => commands::health(&ctx).await,
    }
}
