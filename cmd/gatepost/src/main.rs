//! # gatepost
//!
//! Assembles the application from the adapters selected at compile time and
//! serves the JSON API.

#[cfg(not(all(feature = "web-axum", feature = "auth-jwt")))]
compile_error!("the gatepost binary needs the `web-axum` and `auth-jwt` features");

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api_adapters::{build_router, AppState};
use auth_adapters::{ensure_admin, AdminSeed, JwtTokenService, PasswordIdentityProvider};
use configs::{LogSettings, Settings};
use domains::{AgeGroup, CommentRepo, PostRepo, UserRepo};
use services::{CommentService, ContentService};
use storage_adapters::MemoryStore;

#[cfg(feature = "db-sqlite")]
use storage_adapters::SqliteStore;

/// One store seen through each repository port.
struct Repos {
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
    users: Arc<dyn UserRepo>,
}

impl Repos {
    fn over<S>(store: S) -> Self
    where
        S: PostRepo + CommentRepo + UserRepo + 'static,
    {
        let store = Arc::new(store);
        Self {
            posts: store.clone(),
            comments: store.clone(),
            users: store,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    info!("Starting gatepost v{}", env!("CARGO_PKG_VERSION"));

    // 1. Storage
    let repos = open_store(&settings).await?;

    // 2. Initial administrator
    match &settings.admin.password {
        Some(password) => {
            let age_group: AgeGroup = settings
                .admin
                .age_group
                .parse()
                .context("admin.age_group")?;
            ensure_admin(
                repos.users.as_ref(),
                AdminSeed {
                    username: settings.admin.username.clone(),
                    email: settings.admin.email.clone(),
                    password: password.expose_secret().to_string(),
                    age_group,
                },
            )
            .await?;
        }
        None => warn!("admin.password unset; skipping admin bootstrap"),
    }

    // 3. Services and identity
    let jwt = &settings.jwt;
    let state = AppState {
        content: Arc::new(ContentService::new(
            repos.posts.clone(),
            repos.comments.clone(),
            repos.users.clone(),
        )),
        comments: Arc::new(CommentService::new(
            repos.posts.clone(),
            repos.comments.clone(),
            repos.users.clone(),
        )),
        identity: Arc::new(PasswordIdentityProvider::new(repos.users.clone())),
        tokens: Arc::new(JwtTokenService::new(
            jwt.secret.expose_secret().as_bytes(),
            &jwt.issuer,
            &jwt.audience,
            jwt.ttl_minutes,
        )),
    };

    // 4. Serve
    let addr = settings.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn open_store(settings: &Settings) -> anyhow::Result<Repos> {
    let database = &settings.database;
    if database.is_memory() {
        info!("using in-memory store; data is lost on exit");
        return Ok(Repos::over(MemoryStore::new()));
    }

    #[cfg(feature = "db-sqlite")]
    {
        let store = SqliteStore::connect(&database.url, database.max_connections)
            .await
            .with_context(|| format!("opening database {}", database.url))?;
        Ok(Repos::over(store))
    }

    #[cfg(not(feature = "db-sqlite"))]
    anyhow::bail!(
        "database.url is {:?} but this build has no database adapter; use \"memory\"",
        database.url
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
