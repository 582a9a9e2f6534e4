//! Process stop signals shared by the API server and the email worker.

use tracing::{Span, warn};

/// Resolve on the first SIGINT or SIGTERM.
///
/// When the SIGTERM handler cannot be installed only SIGINT is awaited; a
/// failing SIGINT handler resolves immediately so the caller still shuts down.
#[cfg(unix)]
pub async fn wait_for_signal(span: &Span) {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(error) => {
            span.in_scope(|| warn!(%error, "SIGTERM handler unavailable, waiting for SIGINT only"));
            if let Err(error) = tokio::signal::ctrl_c().await {
                span.in_scope(|| warn!(%error, "SIGINT handler failed"));
            }
        }
    }
}

/// Resolve on the first Ctrl-C.
#[cfg(not(unix))]
pub async fn wait_for_signal(span: &Span) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        span.in_scope(|| warn!(%error, "SIGINT handler failed"));
    }
}
