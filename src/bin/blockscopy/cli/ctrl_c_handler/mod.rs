use tokio::task::JoinHandle;
use tokio::{select, signal};
use tracing::{debug, error, warn};

use blockscopy::types::token::CopyCancellationToken;

/// Cancels the token on ctrl-c, or on SIGTERM on unix.
pub fn spawn_ctrl_c_handler(cancellation_token: CopyCancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        select! {
            _ = cancellation_token.cancelled() => {
                debug!("cancellation_token canceled.")
            }
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        warn!("ctrl-c received, shutting down.");
                        cancellation_token.cancel();
                    }
                    Err(e) => {
                        error!("failed to listen for ctrl-c signal: {e}");
                    }
                }
            }
            result = terminate() => {
                match result {
                    Ok(()) => {
                        warn!("SIGTERM received, shutting down.");
                        cancellation_token.cancel();
                    }
                    Err(e) => {
                        error!("failed to listen for SIGTERM signal: {e}");
                    }
                }
            }
        }
    })
}

#[cfg(target_family = "unix")]
async fn terminate() -> std::io::Result<()> {
    signal::unix::signal(signal::unix::SignalKind::terminate())?
        .recv()
        .await;

    Ok(())
}

#[cfg(not(target_family = "unix"))]
async fn terminate() -> std::io::Result<()> {
    std::future::pending().await
}
