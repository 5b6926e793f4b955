use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::render::DisplayEvent;

/// Install a listener that turns terminal signals into run events.
///
/// SIGWINCH becomes a [`DisplayEvent::Redraw`] on `display`; SIGINT and
/// SIGTERM cancel the returned token. Nothing is touched from signal
/// context; the renderer and the runner consume these as ordinary messages.
/// The display sender is held weakly so the listener never keeps the
/// renderer alive past the end of a run.
pub fn install_signal_listener(
    display: Option<mpsc::WeakUnboundedSender<DisplayEvent>>,
) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let (mut sigint, mut sigterm, mut sigwinch) = match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
            signal(SignalKind::window_change()),
        ) {
            (Ok(int), Ok(term), Ok(winch)) => (int, term, winch),
            (int, term, winch) => {
                let error = [int.err(), term.err(), winch.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::error!(error = %error, "Failed to install signal handlers");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, aborting run");
                    break;
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, aborting run");
                    break;
                }
                _ = sigwinch.recv() => {
                    if let Some(tx) = display.as_ref().and_then(|weak| weak.upgrade()) {
                        let _ = tx.send(DisplayEvent::Redraw);
                    }
                }
            }
        }

        token_clone.cancel();
    });

    token
}
