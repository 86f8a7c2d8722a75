//! Command implementations.
//!
//! Thin orchestration over the library crates: each command wires the
//! shared client and stores together, runs one flow and prints the result.

use std::path::PathBuf;

use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::warn;

use dpp_client::auth::{
    self, DASHBOARD_REDIRECT_DELAY, RegistrationRequest, SAVE_REDIRECT_DELAY, VerifyState,
};
use dpp_client::cache::SnapshotCache;
use dpp_client::guard::{AccessState, check_access};
use dpp_client::viewer::{Connectivity, DataSource, PassportView, PassportViewer};
use dpp_client::{ApiClient, SessionStore};
use dpp_connector::meta::{OPTION_API_KEY, OPTION_API_URL};
use dpp_connector::sync::{Dimensions, Product};
use dpp_connector::{ConnectorApi, MetaStore, ProductSync};
use dpp_core::fields::{FieldEntry, collect_fields, expand_fields, format_field_value};
use dpp_core::passport::{Passport, PassportInput};

use crate::error::{Error, Result};

/// Shared command context: one client, one session store, one state dir.
pub struct Context {
    pub client: ApiClient,
    pub store: SessionStore,
    pub state_dir: PathBuf,
}

impl Context {
    /// Attach the stored access token to the client, if a session exists.
    fn restore_session(&self) {
        if let Some(tokens) = self.store.load() {
            self.client.set_bearer_token(Some(tokens.access_token));
        }
    }
}

/// Split a repeatable `KEY=VALUE` argument.
fn parse_pair(raw: &str, flag: &str) -> Result<(String, String)> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| Error::InvalidArgument(format!("invalid --{flag} '{raw}': expected KEY=VALUE")))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub async fn login(ctx: &Context, email: &str) -> Result<()> {
    auth::request_magic_link(&ctx.client, email).await?;
    println!("Magic link sent to {email}. Check your inbox and run `dpp verify <token>`.");
    Ok(())
}

pub async fn verify(ctx: &Context, token: &str) -> Result<()> {
    match auth::run_magic_login(&ctx.client, &ctx.store, token).await {
        VerifyState::Success => {
            println!("Login successful! Redirecting to your dashboard...");
            tokio::time::sleep(DASHBOARD_REDIRECT_DELAY).await;
            render_dashboard(&ctx.client).await;
            Ok(())
        }
        VerifyState::Error { message } => Err(Error::Auth(message)),
        // run_magic_login only returns terminal states
        VerifyState::Verifying => Err(Error::Auth("verification did not complete".to_string())),
    }
}

pub async fn verify_email(ctx: &Context, token: &str) -> Result<()> {
    match auth::run_email_verification(&ctx.client, token).await {
        VerifyState::Success => {
            println!("Email verified! You can now log in with `dpp login <email>`.");
            Ok(())
        }
        VerifyState::Error { message } => Err(Error::Auth(message)),
        VerifyState::Verifying => Err(Error::Auth("verification did not complete".to_string())),
    }
}

pub async fn register(ctx: &Context, email: &str, username: &str, password: &str) -> Result<()> {
    let request = RegistrationRequest {
        email: email.to_string(),
        username: username.to_string(),
        password: password.to_string(),
        password2: password.to_string(),
    };
    auth::register(&ctx.client, &request).await?;
    println!("Account created. Check {email} for a verification link.");
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    auth::logout(&ctx.client, &ctx.store)?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    match check_access(&ctx.client, &ctx.store).await {
        AccessState::Authenticated(user) => {
            match user.username {
                Some(username) => println!("{} <{}>", username, user.email),
                None => println!("{}", user.email),
            }
            Ok(())
        }
        AccessState::Unauthenticated => Err(Error::Unauthenticated),
    }
}

// ---------------------------------------------------------------------------
// Passports
// ---------------------------------------------------------------------------

pub async fn view(ctx: &Context, id: &str, offline: bool) -> Result<()> {
    ctx.restore_session();
    let cache = SnapshotCache::new(&ctx.state_dir);
    let viewer = PassportViewer::new(&ctx.client, &cache);
    let connectivity = if offline {
        Connectivity::Offline
    } else {
        Connectivity::Online
    };

    let view = viewer.load(id, connectivity).await?;
    render_passport(&view);
    Ok(())
}

pub async fn save(
    ctx: &Context,
    id: Option<&str>,
    name: Option<&str>,
    qr_code: Option<&str>,
    raw_fields: &[String],
) -> Result<()> {
    ctx.restore_session();

    let mut entries: Vec<FieldEntry> = Vec::new();
    let existing = match id {
        Some(id) => {
            // Editing replaces the whole document, so start from the
            // current one and let the new fields win.
            let passport = ctx.client.get_passport(id).await?;
            entries.extend(expand_fields(&passport.sustainability_data));
            Some(passport)
        }
        None => None,
    };
    for raw in raw_fields {
        let (key, value) = parse_pair(raw, "field")?;
        entries.push(FieldEntry::new(key, value));
    }

    let name = name
        .map(str::to_string)
        .or_else(|| existing.as_ref().map(|p| p.name.clone()))
        .ok_or_else(|| Error::InvalidArgument("--name is required when creating".to_string()))?;
    let qr_code = qr_code
        .map(str::to_string)
        .or_else(|| existing.as_ref().map(|p| p.qr_code.clone()))
        .ok_or_else(|| Error::InvalidArgument("--qr-code is required when creating".to_string()))?;

    let input = PassportInput {
        name,
        qr_code,
        sustainability_data: collect_fields(&entries),
    };

    let saved = match id {
        Some(id) => ctx.client.update_passport(id, &input).await?,
        None => ctx.client.create_passport(&input).await?,
    };
    println!(
        "Passport '{}' saved. Redirecting to your dashboard...",
        saved.name
    );
    tokio::time::sleep(SAVE_REDIRECT_DELAY).await;
    render_dashboard(&ctx.client).await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SyncArgs {
    pub product_id: u64,
    pub name: String,
    pub weight: Option<String>,
    pub length: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub attrs: Vec<String>,
    pub meta: Vec<String>,
    pub site_host: String,
    pub connector_api_url: Option<String>,
    pub connector_api_key: Option<String>,
}

pub async fn sync(ctx: &Context, args: SyncArgs) -> Result<()> {
    let store = MetaStore::open(ctx.state_dir.join("connector.json"))?;
    if let Some(url) = &args.connector_api_url {
        store.set_option(OPTION_API_URL, url.as_str())?;
    }
    if let Some(key) = &args.connector_api_key {
        store.set_option(OPTION_API_KEY, key.as_str())?;
    }
    for raw in &args.meta {
        let (key, value) = parse_pair(raw, "meta")?;
        store.set_product_meta(args.product_id, &key, value)?;
    }

    let mut attributes = Vec::with_capacity(args.attrs.len());
    for raw in &args.attrs {
        attributes.push(parse_pair(raw, "attr")?);
    }
    let product = Product {
        id: args.product_id,
        name: args.name.clone(),
        weight: args.weight.clone(),
        dimensions: Dimensions {
            length: args.length.clone(),
            width: args.width.clone(),
            height: args.height.clone(),
        },
        attributes,
    };

    let api = ConnectorApi::from_store(&store)?;
    let syncer = ProductSync::new(&api, &store, args.site_host.as_str());
    if syncer.sync_product(&product).await {
        println!("Product {} synced.", args.product_id);
        Ok(())
    } else {
        Err(Error::SyncFailed(args.product_id))
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health(ctx: &Context) -> Result<()> {
    let report = ctx.client.test_backend_connection().await;
    if report.success {
        match report.status {
            Some(status) => println!("Backend reachable at {} (HTTP {status})", report.url),
            None => println!("Backend reachable at {}", report.url),
        }
        if let Some(detail) = report.detail {
            println!("{detail}");
        }
        Ok(())
    } else if report.is_network_error {
        Err(Error::Connection(format!(
            "no response from {}: {}",
            report.url,
            report.detail.unwrap_or_else(|| "network error".to_string())
        )))
    } else {
        Err(Error::Connection(format!(
            "{} answered HTTP {}",
            report.url,
            report.status.unwrap_or(0)
        )))
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_passport(view: &PassportView) {
    if view.offline {
        println!("Offline mode: showing cached data. Information may be outdated.");
        println!();
    }

    println!("{}", view.passport.name);
    println!("QR code: {}", view.passport.qr_code);
    println!("Created: {}", view.passport.created_at);
    println!("Updated: {}", view.passport.updated_at);
    if view.source == DataSource::Cached {
        println!("Source:  cached snapshot");
    }
    println!();

    if !view.passport.has_sustainability_data() {
        println!("No sustainability data available.");
        return;
    }
    println!("{}", sustainability_table(&view.passport));
}

fn sustainability_table(passport: &Passport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, value) in &passport.sustainability_data {
        builder.push_record([key.clone(), format_field_value(value)]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

/// Print the passport list. Best effort: the session is already
/// established, so a listing failure only costs the overview.
async fn render_dashboard(client: &ApiClient) {
    match client.list_passports().await {
        Ok(passports) if passports.is_empty() => {
            println!("No passports yet. Create one with `dpp save --name ... --qr-code ...`.");
        }
        Ok(passports) => {
            let mut builder = Builder::default();
            builder.push_record(["Name", "QR code", "Fields", "Updated"]);
            for p in &passports {
                builder.push_record([
                    p.name.clone(),
                    p.qr_code.clone(),
                    p.sustainability_data.len().to_string(),
                    p.updated_at.to_string(),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::modern_rounded());
            println!("{table}");
        }
        Err(e) => {
            warn!(error = %e, "failed to load the dashboard listing");
            println!("Dashboard unavailable; run `dpp view <id>` for a single passport.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_on_the_first_equals() {
        assert_eq!(
            parse_pair("materials=steel, plastic", "field").unwrap(),
            ("materials".to_string(), "steel, plastic".to_string())
        );
        assert_eq!(
            parse_pair("note=a=b", "field").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("no-equals", "field").is_err());
    }

    #[test]
    fn table_lists_every_field() {
        let passport: Passport = serde_json::from_str(
            r#"{
                "id": "abc",
                "name": "Shoe",
                "qr_code": "Q1",
                "sustainability_data": {
                    "carbon_footprint": 12.5,
                    "materials": ["steel", "plastic"]
                },
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z"
            }"#,
        )
        .unwrap();
        let table = sustainability_table(&passport);
        assert!(table.contains("carbon_footprint"));
        assert!(table.contains("12.5"));
        assert!(table.contains("steel, plastic"));
    }
}
