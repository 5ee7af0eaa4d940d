//! Campus-Board server binary: loads settings, connects Postgres, runs
//! migrations, assembles the adapters into the services, and serves the
//! HTTP API.

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use api_adapters::AppState;
use auth_adapters::{JwtCredentialService, LogNotifier, OtpStore};
use configs::Settings;
use domains::{
    BlobStore, CommentRepo, CredentialService, LikeRepo, NoticeRepo, NotificationRepo, Notifier,
    ReplyRepo, ShareRepo, UserRepo,
};
use services::{
    AccountService, CommentService, EngagementService, NoticeService, NotificationEmitter,
    NotificationService,
};
use storage_adapters::{LocalBlobStore, PgStore};

#[cfg(not(all(feature = "db-postgres", feature = "auth-jwt", feature = "media-local")))]
compile_error!("campus-board requires the db-postgres, auth-jwt, and media-local features");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load().context("loading settings")?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(settings.database.url.expose_secret())
        .await
        .context("connecting to postgres")?;
    let store = Arc::new(PgStore::new(pool));
    store.run_migrations().await.context("running migrations")?;

    let users: Arc<dyn UserRepo> = store.clone();
    let notices: Arc<dyn NoticeRepo> = store.clone();
    let comments: Arc<dyn CommentRepo> = store.clone();
    let replies: Arc<dyn ReplyRepo> = store.clone();
    let likes: Arc<dyn LikeRepo> = store.clone();
    let shares: Arc<dyn ShareRepo> = store.clone();
    let notifications: Arc<dyn NotificationRepo> = store;

    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
        &settings.media.root,
        &settings.media.url_prefix,
    ));
    let credentials: Arc<dyn CredentialService> = Arc::new(JwtCredentialService::new(
        settings.auth.jwt_secret.expose_secret(),
        settings.auth.token_ttl_minutes,
    ));
    let mailer: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let emitter = NotificationEmitter::new(notifications.clone());

    let state = AppState {
        notices: Arc::new(NoticeService::new(
            notices.clone(),
            users.clone(),
            comments.clone(),
            replies.clone(),
            likes.clone(),
            shares.clone(),
            notifications.clone(),
            blobs.clone(),
        )),
        accounts: Arc::new(AccountService::new(users.clone(), notices.clone())),
        comments: Arc::new(CommentService::new(
            comments.clone(),
            replies,
            notices.clone(),
            users.clone(),
            emitter.clone(),
        )),
        engagement: Arc::new(EngagementService::new(
            likes.clone(),
            shares.clone(),
            notices.clone(),
            users.clone(),
            emitter,
        )),
        notifications: Arc::new(NotificationService::new(
            notifications,
            users.clone(),
            notices,
            comments,
            likes,
            shares,
        )),
        users,
        credentials,
        blobs,
        otp: Arc::new(OtpStore::default()),
        mailer,
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "campus-board listening");
    axum::serve(listener, api_adapters::router(state)).await?;
    Ok(())
}
