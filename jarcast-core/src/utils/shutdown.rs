use tokio::sync::watch;

/// Resolve once `true` is published on `shutdown_rx` or its sender is gone.
///
/// Cancel-safe, so it can sit in a `tokio::select!` arm next to the work it
/// interrupts.
pub async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}
