use anyhow::{Context, Result};
use std::io;
use std::net::SocketAddr;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api;
use crate::state::AppState;

/// Bind the probe listener and serve it until `shutdown` is cancelled.
pub async fn spawn_probe_server(
    addr: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Error binding probe server to {}", addr))?;
    info!("[Probe] Listening on http://{}", addr);

    let app = api::router(state);
    tokio::spawn(async move {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await;
        if let Err(e) = served {
            tracing::error!("[Probe] Server error: {}", e);
        }
    });
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
///
/// Returns once the token is cancelled from either side. Failing to install a
/// handler is reported instead of waiting forever.
pub async fn cancel_on_signal(shutdown: CancellationToken) -> io::Result<()> {
    let mut terminate = TerminateSignal::install()?;

    let received = tokio::select! {
        () = shutdown.cancelled() => return Ok(()),
        result = signal::ctrl_c() => {
            result?;
            "SIGINT"
        },
        () = terminate.recv() => "SIGTERM",
    };

    info!("[Main] Received {}, shutting down", received);
    shutdown.cancel();
    Ok(())
}

struct TerminateSignal {
    #[cfg(unix)]
    inner: signal::unix::Signal,
}

impl TerminateSignal {
    #[cfg(unix)]
    fn install() -> io::Result<Self> {
        let inner = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        Ok(Self { inner })
    }

    #[cfg(not(unix))]
    fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(&mut self) {
        if self.inner.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}
