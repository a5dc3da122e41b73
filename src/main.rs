use clap::Parser;
use sitepulse::cache::FreshnessCache;
use sitepulse::config::AppConfig;
use sitepulse::geo::GeoClient;
use sitepulse::github::client::GithubClient;
use sitepulse::github::handler::GithubState;
use sitepulse::storage;
use sitepulse::visitors::VisitorState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser)]
#[command(name = "sitepulse", about = "Personal-site backend")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitepulse=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        db = %config.database.path.display(),
        github_user = %config.github.username,
        github_auth = config.github.token.is_some(),
        "starting sitepulse"
    );

    // Setup SQLite pool
    let pool = storage::sqlite::create_pool(&config.database)?;
    storage::sqlite::init_pool(&pool).await?;
    tracing::info!("database initialized");

    let visitor_state = Arc::new(VisitorState {
        pool,
        geo: GeoClient::new(&config.geo)?,
    });

    let github_client = GithubClient::new(&config.github)?;
    tracing::info!(user = github_client.username(), "github client ready");
    let github_state = Arc::new(GithubState {
        client: github_client,
        cache: Arc::new(FreshnessCache::new(Duration::from_secs(
            config.github.cache_ttl_secs,
        ))),
        recent_repos_limit: config.github.recent_repos_limit,
    });

    if !config.static_files.index_path().exists() {
        tracing::warn!(
            path = %config.static_files.index_path().display(),
            "front-end entry document not found"
        );
    }

    let app = sitepulse::app::router(visitor_state, github_state, &config.static_files);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    tracing::info!("shutting down...");
}
