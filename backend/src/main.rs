//! Backend entry-point: settings, store bootstrap, migrations, server.

mod server;

use std::env;
use std::io;

use actix_web::web;
use ortho_config::OrthoConfig as _;
use postgresql_embedded::{PostgreSQL, Settings};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use backend::inbound::http::health::HealthState;
use backend::outbound::generation::GenerationConfig;
use backend::outbound::persistence::{run_pending_migrations, DbPool, PoolConfig};
use server::{AppSettings, ServerDeps};

const DEV_DATABASE_NAME: &str = "detect_auto";

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(err) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %err, "tracing init failed");
    }

    let settings =
        AppSettings::load().map_err(|err| io::Error::other(format!("settings: {err}")))?;

    // Keep the embedded cluster handle alive for the process lifetime; it
    // stops the server on drop.
    let (database_url, _embedded) = resolve_database(&settings).await?;

    let migration_url = database_url.clone();
    tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .map_err(|err| io::Error::other(format!("migration task: {err}")))?
        .map_err(|err| io::Error::other(format!("migrations: {err}")))?;

    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|err| io::Error::other(format!("pool: {err}")))?;

    let bind_addr = settings
        .bind_addr()
        .parse()
        .map_err(|err| io::Error::other(format!("bind address: {err}")))?;

    let deps = ServerDeps {
        pool,
        token_secret: resolve_token_secret(&settings)?,
        token_expiry_minutes: settings.token_expiry_minutes(),
        generation: generation_config(&settings),
        bind_addr,
    };

    let health_state = web::Data::new(HealthState::new());
    let server = server::create_server(health_state.clone(), deps)?;
    health_state.mark_ready();
    info!(addr = %bind_addr, "server listening");
    server.await
}

/// Use the configured connection string, or boot a file-backed embedded
/// cluster for development when none is set.
async fn resolve_database(settings: &AppSettings) -> io::Result<(String, Option<PostgreSQL>)> {
    if let Some(url) = settings.database_url() {
        return Ok((url.to_owned(), None));
    }

    let data_dir = settings.data_dir();
    info!(data_dir = %data_dir.display(), "no database URL configured; starting embedded PostgreSQL");

    let pg_settings = Settings {
        data_dir,
        temporary: false,
        ..Settings::default()
    };
    let mut postgres = PostgreSQL::new(pg_settings);
    postgres
        .setup()
        .await
        .map_err(|err| io::Error::other(format!("embedded postgres setup: {err}")))?;
    postgres
        .start()
        .await
        .map_err(|err| io::Error::other(format!("embedded postgres start: {err}")))?;

    let exists = postgres
        .database_exists(DEV_DATABASE_NAME)
        .await
        .map_err(|err| io::Error::other(format!("embedded postgres query: {err}")))?;
    if !exists {
        postgres
            .create_database(DEV_DATABASE_NAME)
            .await
            .map_err(|err| io::Error::other(format!("embedded postgres create: {err}")))?;
    }

    let url = postgres.settings().url(DEV_DATABASE_NAME);
    Ok((url, Some(postgres)))
}

/// Require a signing secret outside development; generate an ephemeral one
/// (with a warning) for debug builds so tokens do not survive restarts.
fn resolve_token_secret(settings: &AppSettings) -> io::Result<String> {
    if let Some(secret) = settings.token_secret() {
        return Ok(secret.to_owned());
    }

    let allow_dev = env::var("DETECT_ALLOW_EPHEMERAL_SECRET").ok().as_deref() == Some("1");
    if cfg!(debug_assertions) || allow_dev {
        warn!("using ephemeral token secret (dev only); tokens will not survive restarts");
        Ok(uuid::Uuid::new_v4().to_string())
    } else {
        Err(io::Error::other(
            "DETECT_TOKEN_SECRET must be set outside development",
        ))
    }
}

fn generation_config(settings: &AppSettings) -> GenerationConfig {
    let api_key = match settings.generation_api_key() {
        Some(key) => key.to_owned(),
        None => {
            warn!("no generation API key configured; upstream calls will fail in-band");
            String::new()
        }
    };
    GenerationConfig {
        base_url: settings.generation_base_url().to_owned(),
        api_key,
        model: settings.generation_model().to_owned(),
    }
}
