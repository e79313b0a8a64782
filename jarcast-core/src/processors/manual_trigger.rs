//! ManualTrigger processor.
//!
//! Receives manual test donations (console, HTTP) and shows them right away,
//! bypassing the notification queue.

use super::notification_sequencer::NotificationPresenter;
use crate::events::ManualTriggerReceiver;
use crate::utils::shutdown::wait_for_shutdown;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct ManualTriggerRunner {
    presenter: Arc<NotificationPresenter>,
    trigger_rx: ManualTriggerReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl ManualTriggerRunner {
    pub fn new(
        presenter: Arc<NotificationPresenter>,
        trigger_rx: ManualTriggerReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            presenter,
            trigger_rx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        info!("ManualTrigger started");

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                    info!("ManualTrigger received shutdown signal");
                    break;
                }

                trigger = self.trigger_rx.recv() => {
                    let Some(trigger) = trigger else {
                        info!("Manual trigger channel closed");
                        break;
                    };
                    let donation = trigger.into_donation();
                    info!(%donation, "Manual trigger");
                    if let Err(e) = self.presenter.show_immediately(&donation) {
                        warn!(error = %e, "Manual trigger not shown");
                    }
                }
            }
        }

        info!("ManualTrigger shutdown complete");
    }
}
