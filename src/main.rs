use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use drinks_api::{api, AuthConfig, Authorizer, InMemoryDrinkStore, RemoteJwkSet, TokenVerifier};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Drinks menu API.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "DRINKS_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Domain of the token issuing authority, e.g. `tenant.eu.auth0.com`.
    #[arg(long, env = "AUTH0_DOMAIN")]
    auth_domain: String,

    /// Audience tokens must be issued for.
    #[arg(long, env = "API_AUDIENCE")]
    audience: String,

    /// Give up on fetching the signing keys after this many seconds.
    #[arg(long, env = "JWKS_TIMEOUT_SECS", default_value_t = 5)]
    jwks_timeout_secs: u64,

    /// Keep fetched signing keys for this many seconds. Keys are fetched per request when unset.
    #[arg(long, env = "JWKS_CACHE_TTL_SECS")]
    jwks_cache_ttl_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drinks_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = AuthConfig::for_domain(&args.auth_domain, &args.audience)
        .with_context(|| format!("invalid auth domain {:?}", args.auth_domain))?;
    let jwks_url = config.jwks_url()?;

    let mut remote_jwk_set = RemoteJwkSet::builder(jwks_url.clone())
        .with_timeout(Duration::from_secs(args.jwks_timeout_secs));
    if let Some(ttl) = args.jwks_cache_ttl_secs {
        remote_jwk_set = remote_jwk_set.with_cache(Duration::from_secs(ttl));
    }
    let authorizer = Authorizer::new(TokenVerifier::new(remote_jwk_set.build(), &config));

    let app = api::router(Arc::new(InMemoryDrinkStore::new()), &authorizer);

    tracing::info!(
        issuer = %config.issuer,
        audience = %config.audience,
        %jwks_url,
        "verifying tokens"
    );
    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("listening on {}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
