//! Cancellation driven by OS signals.

use std::io;

use futures_util::future::select_all;
use tokio::signal::unix::signal;
use tokio_util::sync::CancellationToken;

pub use tokio::signal::unix::SignalKind;

/// Return a token that is cancelled on the first receipt of any of `signals`.
///
/// With no signals the token is returned unchanged. Otherwise the result is
/// a child of `token`, so cancelling `token` cancels it too, and a single
/// background task waits for either event and then exits.
///
/// Must be called from within a tokio runtime.
pub fn cancel_on_signal(
    token: &CancellationToken,
    signals: &[SignalKind],
) -> io::Result<CancellationToken> {
    if signals.is_empty() {
        return Ok(token.clone());
    }

    let mut streams = signals
        .iter()
        .map(|kind| signal(*kind))
        .collect::<io::Result<Vec<_>>>()?;

    let kinds = signals.to_vec();
    let child = token.child_token();
    let cancel = child.clone();
    tokio::spawn(async move {
        let waits = streams.iter_mut().map(|stream| Box::pin(stream.recv()));
        tokio::select! {
            (_, index, _) = select_all(waits) => {
                tracing::debug!(signal = ?kinds[index], "signal received, cancelling");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    });

    tracing::trace!(count = signals.len(), "listening for signals");
    Ok(child)
}
