use tokio::signal;
use tracing::{error, info};

/// Resolves on the first termination signal: Ctrl-C everywhere, plus
/// SIGTERM, SIGQUIT and SIGHUP on unix.
pub async fn signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
            signal(SignalKind::hangup()),
        ) {
            (Ok(mut term), Ok(mut quit), Ok(mut hangup)) => {
                tokio::select! {
                    _ = term.recv() => {}
                    _ = quit.recv() => {}
                    _ = hangup.recv() => {}
                }
            }
            _ => {
                error!("Failed to install unix signal handlers");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received termination signal"),
    }
}
