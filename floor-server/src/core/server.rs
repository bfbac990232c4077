//! HTTP server startup and graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::build_app;
use crate::core::{Config, ServerState};

pub struct Server {
    config: Config,
    state: ServerState,
    shutdown: CancellationToken,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the server when cancelled, in addition to Ctrl+C
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until Ctrl+C or the shutdown token fires.
    ///
    /// In-flight requests get `shutdown_timeout_ms` to finish; open WebSocket
    /// connections are dropped after that.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Floor server listening");

        let app = build_app(self.state.clone());
        let token = self.shutdown.clone();
        tokio::spawn(watch_ctrl_c(token.clone()));

        let grace = Duration::from_millis(self.config.shutdown_timeout_ms);
        let signal = token.clone();
        let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
            signal.cancelled().await;
        });
        let mut serve = tokio::spawn(async move { serve.await });

        tokio::select! {
            result = &mut serve => {
                return match result {
                    Ok(result) => result,
                    Err(e) => Err(std::io::Error::other(e)),
                };
            }
            _ = token.cancelled() => {}
        }
        tracing::info!(grace_ms = grace.as_millis() as u64, "Shutting down...");
        match tokio::time::timeout(grace, serve).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
            Err(_) => tracing::warn!("Graceful shutdown timed out, dropping connections"),
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn watch_ctrl_c(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}
