use anyhow::anyhow;
use axum::serve;
use futures::TryFutureExt;
use log::{error, info, warn};
use pws_history::{
    app, build_app_state, get_config_info, get_log_level, setup_logger, Database, WuClient,
};
use pws_history_core::path_exists;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cli, config_notes) = get_config_info();
    let log_level = get_log_level(&cli);

    setup_logger()
        .level(log_level)
        .level_for("pws_history", log_level)
        .level_for("http_response", log_level)
        .level_for("http_request", log_level)
        .level_for("sqlx", log::LevelFilter::Warn)
        .apply()?;

    for (level, message) in config_notes {
        log::log!(level, "{}", message);
    }

    let db_path = cli.db_path();
    let static_dir = cli.static_dir();
    let wu_config = cli.wu_config();
    let host = cli.host();
    let port = cli.port();

    if wu_config.api_key.is_none() {
        warn!("WU_API_KEY is not set, history requests will fail until it is configured");
    }
    if !path_exists(&format!("{}/index.html", static_dir)) {
        warn!("no index.html in {}, the UI fallback will answer 404", static_dir);
    }

    // schema must be in place before the listener accepts anything
    let database = Arc::new(Database::new(&db_path).await.map_err(|e| {
        error!("error initializing database: {}", e);
        anyhow!("error initializing database: {}", e)
    })?);

    let socket_addr = SocketAddr::from_str(&format!("{}:{}", host, port))
        .map_err(|e| anyhow!("invalid address: {}", e))?;

    let listener = TcpListener::bind(socket_addr)
        .map_err(|e| anyhow!("error binding to socket: {}", e))
        .await?;

    info!("PWS History starting...");
    info!("  Listen: http://{}", socket_addr);
    info!("  Docs:   http://{}/docs", socket_addr);
    info!("  Database: {}", db_path);
    info!("  Static: {}", static_dir);
    info!("  WU API: {}", wu_config.base_url);
    match cli.max_concurrent_days {
        Some(cap) => info!("  Range concurrency: {} days", cap),
        None => info!("  Range concurrency: unbounded"),
    }

    let app_state = build_app_state(
        static_dir,
        Arc::new(WuClient::new(&wu_config)),
        database.clone(),
        cli.max_concurrent_days,
    );

    serve(
        listener,
        app(app_state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    database.checkpoint().await;
    info!("PWS History stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
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
                error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
