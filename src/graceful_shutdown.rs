use tokio::signal;

/// Resolves once the process receives Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to listen for SIGTERM");

        tokio::select! {
            _ = signal::ctrl_c() => tracing::warn!("Ctrl+C received, initiating shutdown..."),
            _ = sigterm.recv() => tracing::warn!("SIGTERM received, initiating shutdown..."),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        tracing::warn!("Ctrl+C received, initiating shutdown...");
    }
}
