use floor_server::utils::logger::init_logger_with_file;
use floor_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    let log_dir = config.log_to_file.then(|| config.log_dir());
    init_logger_with_file(&config.log_level, config.log_json, log_dir.as_deref())?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        port = config.http_port,
        backend = ?config.store_backend,
        tz = %config.business_tz,
        "Floor server starting"
    );

    let state = ServerState::initialize(&config).await?;

    if let Err(e) = Server::with_state(config, state).run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
