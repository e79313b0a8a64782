//! DonationPoller processor.
//!
//! The DonationPoller is responsible for:
//! - Loading a baseline of recent ledger transactions on start, so that
//!   nothing that already happened is replayed as new
//! - Polling the ledger on a fixed interval for incoming transactions
//! - Suppressing every transaction id it has seen before, for the whole
//!   process lifetime
//! - Turning each new transaction into a `Donation`, queueing it for
//!   display and handing it to every registered hook
//!
//! A failed fetch is logged and counts as "no new donations"; the next tick
//! is the retry.

use crate::config::PollerConfig;
use crate::entities::{Donation, Transaction};
use crate::events::NotificationQueue;
use crate::hooks::DonationHook;
use crate::ledger::TransactionSource;
use crate::utils::shutdown::wait_for_shutdown;
use compact_str::CompactString;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Errors returned by poller operations that need the poller stopped.
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("operation requires the poller to be stopped")]
    Running,

    #[error("poller state was lost when its poll task failed")]
    StateLost,
}

/// State owned by whichever task is currently driving the poller.
struct PollerCore {
    source: Arc<dyn TransactionSource>,
    queue: NotificationQueue,
    config: PollerConfig,
    seen_ids: HashSet<CompactString>,
    seen_count: Arc<AtomicUsize>,
    last_poll_time: Option<OffsetDateTime>,
    hooks: Vec<DonationHook>,
    hook_rx: mpsc::UnboundedReceiver<DonationHook>,
}

impl PollerCore {
    /// Mark everything from the lookback window as seen without emitting.
    async fn initial_load(&mut self) {
        let now = OffsetDateTime::now_utc();
        let from = self.lookback_start(now);

        match self
            .source
            .fetch_incoming(&self.config.account, from, now)
            .await
        {
            Ok(transactions) => {
                let count = transactions.len();
                self.seen_ids.extend(
                    transactions
                        .into_iter()
                        .map(|tx| tx.id)
                        .filter(|id| !id.is_empty()),
                );
                self.publish_seen_count();
                info!(count, "Initial load: marked transactions as seen");
            }
            Err(e) => {
                error!(error = %e, "Initial load failed, continuing without baseline");
            }
        }
    }

    async fn poll_once(&mut self) -> Vec<Donation> {
        self.register_pending_hooks();

        // Taken before the fetch so the next window starts where this one
        // was cut, not where processing happened to finish.
        let now = OffsetDateTime::now_utc();
        let previous = self.last_poll_time;
        let from = previous.unwrap_or_else(|| self.lookback_start(now));
        self.last_poll_time = Some(now);

        let transactions = match self
            .source
            .fetch_incoming(&self.config.account, from, now)
            .await
        {
            Ok(transactions) => transactions,
            Err(e) => {
                // Keep the old window start so the gap is covered next tick.
                self.last_poll_time = previous;
                error!(error = %e, "Poll failed");
                return Vec::new();
            }
        };

        let mut new_donations = Vec::new();
        for tx in transactions {
            let Some(donation) = self.accept(tx) else {
                continue;
            };
            info!(%donation, "New donation");
            self.dispatch(&donation);
            new_donations.push(donation);
        }
        self.publish_seen_count();

        if !new_donations.is_empty() {
            info!(count = new_donations.len(), "Found new donations");
        }
        new_donations
    }

    /// Dedup gate. Returns the donation for a transaction not seen before.
    fn accept(&mut self, tx: Transaction) -> Option<Donation> {
        if tx.id.is_empty() {
            warn!(amount = tx.amount, "Skipping transaction without id");
            return None;
        }
        if !tx.is_incoming() {
            debug!(id = %tx.id, amount = tx.amount, "Skipping non-incoming transaction");
            return None;
        }
        if self.seen_ids.contains(&tx.id) {
            return None;
        }

        let donation = Donation::from_transaction(&tx);
        self.seen_ids.insert(tx.id);
        Some(donation)
    }

    /// Queue for display, then run every hook in registration order.
    fn dispatch(&self, donation: &Donation) {
        self.queue.enqueue(donation.clone());

        for hook in &self.hooks {
            match std::panic::catch_unwind(AssertUnwindSafe(|| hook.call(donation))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(hook = %hook.name(), error = %e, "Donation hook failed"),
                Err(_) => error!(hook = %hook.name(), "Donation hook panicked"),
            }
        }
    }

    /// Start of the lookback window ending at `now`, clamped to the epoch.
    fn lookback_start(&self, now: OffsetDateTime) -> OffsetDateTime {
        now.checked_sub(self.config.lookback)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
            .max(OffsetDateTime::UNIX_EPOCH)
    }

    fn register_pending_hooks(&mut self) {
        while let Ok(hook) = self.hook_rx.try_recv() {
            debug!(hook = %hook.name(), "Registered donation hook");
            self.hooks.push(hook);
        }
    }

    fn publish_seen_count(&self) {
        self.seen_count.store(self.seen_ids.len(), Ordering::Relaxed);
    }

    async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> Self {
        let interval = self.config.poll_interval;
        info!(
            account = %self.config.account,
            interval_secs = interval.as_secs(),
            "DonationPoller loop started"
        );

        tokio::select! {
            biased;

            _ = wait_for_shutdown(&mut shutdown_rx) => {
                info!("DonationPoller stopped during initial load");
                return self;
            }

            _ = self.initial_load() => {}
        }

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => break,

                _ = self.poll_once() => {}
            }

            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => break,

                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("DonationPoller loop shutdown complete");
        self
    }
}

struct RunningPoller {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<PollerCore>,
}

/// Polls the ledger and surfaces each incoming transaction exactly once.
///
/// Seen ids live in memory only; a restart falls back on the lookback
/// baseline.
pub struct DonationPoller {
    core: Option<PollerCore>,
    running: Option<RunningPoller>,
    hook_tx: mpsc::UnboundedSender<DonationHook>,
    seen_count: Arc<AtomicUsize>,
}

impl DonationPoller {
    pub fn new(
        source: Arc<dyn TransactionSource>,
        queue: NotificationQueue,
        config: PollerConfig,
    ) -> Self {
        let (hook_tx, hook_rx) = mpsc::unbounded_channel();
        let seen_count = Arc::new(AtomicUsize::new(0));
        Self {
            core: Some(PollerCore {
                source,
                queue,
                config,
                seen_ids: HashSet::new(),
                seen_count: seen_count.clone(),
                last_poll_time: None,
                hooks: Vec::new(),
                hook_rx,
            }),
            running: None,
            hook_tx,
            seen_count,
        }
    }

    /// Register a hook for every future new donation.
    ///
    /// Safe to call while the poll loop runs; the hook takes effect from the
    /// next poll cycle.
    pub fn on_new_donation(&self, hook: DonationHook) {
        if let Err(e) = self.hook_tx.send(hook) {
            warn!(hook = %e.0.name(), "Poller state lost, hook not registered");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Number of transaction ids marked as seen.
    pub fn seen_count(&self) -> usize {
        self.seen_count.load(Ordering::Relaxed)
    }

    /// Spawn the poll loop. No-op if already running.
    ///
    /// The task first loads the lookback baseline, then polls. `stop()` can
    /// interrupt either phase.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        let Some(core) = self.core.take() else {
            error!("DonationPoller state lost, cannot start");
            return;
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(core.run(shutdown_rx));
        self.running = Some(RunningPoller {
            shutdown_tx,
            handle,
        });
        info!("DonationPoller started");
    }

    /// Stop the poll loop and wait for it to exit. No-op if stopped.
    ///
    /// Interrupts a pending fetch or sleep.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown_tx.send(true);
        match running.handle.await {
            Ok(core) => self.core = Some(core),
            Err(e) => error!(error = %e, "DonationPoller task failed"),
        }
        info!("DonationPoller stopped");
    }

    /// Run a single poll cycle by hand and return the new donations.
    pub async fn poll_once(&mut self) -> Result<Vec<Donation>, PollerError> {
        Ok(self.stopped_core()?.poll_once().await)
    }

    /// Forget every seen id.
    pub fn clear_seen(&mut self) -> Result<(), PollerError> {
        let core = self.stopped_core()?;
        core.seen_ids.clear();
        core.publish_seen_count();
        Ok(())
    }

    fn stopped_core(&mut self) -> Result<&mut PollerCore, PollerError> {
        if self.running.is_some() {
            return Err(PollerError::Running);
        }
        self.core.as_mut().ok_or(PollerError::StateLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NotificationQueueReceiver, notification_queue};
    use crate::hooks::HookError;
    use crate::ledger::LedgerError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays a fixed ledger; can be told to fail.
    #[derive(Default)]
    struct FakeLedger {
        transactions: Mutex<Vec<Transaction>>,
        failing: Mutex<bool>,
        windows: Mutex<Vec<(OffsetDateTime, OffsetDateTime)>>,
    }

    impl FakeLedger {
        fn with(transactions: Vec<Transaction>) -> Arc<Self> {
            let ledger = Self::default();
            *ledger.transactions.lock().unwrap() = transactions;
            Arc::new(ledger)
        }

        fn push(&self, tx: Transaction) {
            self.transactions.lock().unwrap().push(tx);
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    #[async_trait]
    impl TransactionSource for FakeLedger {
        async fn fetch_incoming(
            &self,
            _account: &str,
            from: OffsetDateTime,
            to: OffsetDateTime,
        ) -> Result<Vec<Transaction>, LedgerError> {
            self.windows.lock().unwrap().push((from, to));
            if *self.failing.lock().unwrap() {
                return Err(LedgerError::Api {
                    status: 503,
                    body: "unavailable".to_owned(),
                });
            }
            Ok(self.transactions.lock().unwrap().clone())
        }
    }

    fn tx(id: &str, amount: i64) -> Transaction {
        Transaction {
            id: id.into(),
            time: OffsetDateTime::now_utc(),
            amount,
            description: "Від: Tester".to_owned(),
            comment: Some(format!("comment {id}")),
            donor_name: Some("Tester".to_owned()),
        }
    }

    fn poller_for(ledger: Arc<FakeLedger>) -> (DonationPoller, NotificationQueueReceiver) {
        let (queue, receiver) = notification_queue();
        let mut config = PollerConfig::new("jar-1");
        config.poll_interval = Duration::from_secs(60);
        (DonationPoller::new(ledger, queue, config), receiver)
    }

    fn drain(receiver: &mut NotificationQueueReceiver) -> Vec<Donation> {
        std::iter::from_fn(|| receiver.try_recv()).collect()
    }

    #[tokio::test]
    async fn test_same_transactions_are_new_only_once() {
        let ledger = FakeLedger::with(vec![tx("a", 100), tx("b", 200), tx("c", 300)]);
        let (mut poller, mut receiver) = poller_for(ledger);

        let first = poller.poll_once().await.unwrap();
        assert_eq!(
            first.iter().map(|d| d.amount).collect::<Vec<_>>(),
            vec![100, 200, 300]
        );
        assert_eq!(first[0].comment.as_deref(), Some("comment a"));

        let second = poller.poll_once().await.unwrap();
        assert!(second.is_empty());
        assert_eq!(poller.seen_count(), 3);

        let queued: Vec<i64> = drain(&mut receiver).iter().map(|d| d.amount).collect();
        assert_eq!(queued, vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn test_non_incoming_and_idless_transactions_are_skipped() {
        let ledger = FakeLedger::with(vec![tx("", 500), tx("out", -500), tx("zero", 0), tx("ok", 1)]);
        let (mut poller, _receiver) = poller_for(ledger);

        let donations = poller.poll_once().await.unwrap();
        assert_eq!(donations.len(), 1);
        assert_eq!(donations[0].amount, 1);
        assert_eq!(poller.seen_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_is_never_replayed() {
        let ledger = FakeLedger::with(vec![tx("old-1", 100), tx("old-2", 200)]);
        let (mut poller, mut receiver) = poller_for(ledger.clone());

        poller.start();
        assert!(poller.is_running());

        // Baseline load and the first live cycle both see the same window.
        tokio::time::sleep(Duration::from_secs(1)).await;
        poller.stop().await;
        assert_eq!(poller.seen_count(), 2);
        assert!(drain(&mut receiver).is_empty());

        ledger.push(tx("fresh", 300));
        let donations = poller.poll_once().await.unwrap();
        assert_eq!(donations.len(), 1);
        assert_eq!(donations[0].amount, 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_picks_up_new_transactions_on_next_tick() {
        let ledger = FakeLedger::with(Vec::new());
        let (mut poller, mut receiver) = poller_for(ledger.clone());

        poller.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        ledger.push(tx("late", 4200));
        tokio::time::sleep(Duration::from_secs(61)).await;
        poller.stop().await;

        let queued: Vec<i64> = drain(&mut receiver).iter().map(|d| d.amount).collect();
        assert_eq!(queued, vec![4200]);
    }

    #[tokio::test]
    async fn test_failed_poll_marks_nothing_and_keeps_window() {
        let ledger = FakeLedger::with(vec![tx("a", 100)]);
        let (mut poller, _receiver) = poller_for(ledger.clone());

        ledger.set_failing(true);
        assert!(poller.poll_once().await.unwrap().is_empty());
        assert_eq!(poller.seen_count(), 0);

        ledger.set_failing(false);
        assert_eq!(poller.poll_once().await.unwrap().len(), 1);

        // Both cycles started from the lookback window.
        let windows = ledger.windows.lock().unwrap().clone();
        assert_eq!(windows.len(), 2);
        assert!(windows[1].0 <= windows[0].1 - time::Duration::minutes(59));

        // A successful cycle moves the window start forward.
        assert!(poller.poll_once().await.unwrap().is_empty());
        let windows = ledger.windows.lock().unwrap().clone();
        assert_eq!(windows[2].0, windows[1].1);
    }

    #[tokio::test]
    async fn test_failing_hook_does_not_block_others() {
        let ledger = FakeLedger::with(vec![tx("first", 100), tx("second", 200)]);
        let (mut poller, mut receiver) = poller_for(ledger);

        let seen_by_second = Arc::new(Mutex::new(Vec::new()));
        poller.on_new_donation(DonationHook::new("flaky", |d: &Donation| {
            if d.amount == 100 {
                Err(HookError::Failed("boom".to_owned()))
            } else {
                Ok(())
            }
        }));
        poller.on_new_donation(DonationHook::new("panicky", |d: &Donation| {
            if d.amount == 200 {
                panic!("hook exploded");
            }
            Ok(())
        }));
        let sink = seen_by_second.clone();
        poller.on_new_donation(DonationHook::new("recorder", move |d: &Donation| {
            sink.lock().unwrap().push(d.amount);
            Ok(())
        }));

        let donations = poller.poll_once().await.unwrap();
        assert_eq!(donations.len(), 2);
        assert_eq!(*seen_by_second.lock().unwrap(), vec![100, 200]);

        let queued: Vec<i64> = drain(&mut receiver).iter().map(|d| d.amount).collect();
        assert_eq!(queued, vec![100, 200]);
    }

    #[tokio::test]
    async fn test_clear_seen_resets_dedup() {
        let ledger = FakeLedger::with(vec![tx("a", 100)]);
        let (mut poller, _receiver) = poller_for(ledger);

        assert_eq!(poller.poll_once().await.unwrap().len(), 1);
        poller.clear_seen().unwrap();
        assert_eq!(poller.seen_count(), 0);
        assert_eq!(poller.poll_once().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_operations_refused_while_running() {
        let (mut poller, _receiver) = poller_for(FakeLedger::with(Vec::new()));
        poller.start();
        poller.start();

        assert!(matches!(poller.poll_once().await, Err(PollerError::Running)));
        assert!(matches!(poller.clear_seen(), Err(PollerError::Running)));

        poller.stop().await;
        poller.stop().await;
        assert!(!poller.is_running());
        assert!(poller.poll_once().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_hung_fetch() {
        struct HungLedger;

        #[async_trait]
        impl TransactionSource for HungLedger {
            async fn fetch_incoming(
                &self,
                _account: &str,
                _from: OffsetDateTime,
                _to: OffsetDateTime,
            ) -> Result<Vec<Transaction>, LedgerError> {
                std::future::pending().await
            }
        }

        let (queue, _receiver) = notification_queue();
        let mut poller =
            DonationPoller::new(Arc::new(HungLedger), queue, PollerConfig::new("jar-1"));

        // The baseline fetch never returns; start must not wait for it.
        poller.start();
        assert!(poller.is_running());
        tokio::time::sleep(Duration::from_secs(5)).await;

        poller.stop().await;
        assert!(!poller.is_running());
        assert_eq!(poller.seen_count(), 0);
        assert!(poller.clear_seen().is_ok());
    }

    #[tokio::test]
    async fn test_oversized_lookback_is_clamped() {
        let ledger = FakeLedger::with(vec![tx("a", 100)]);
        let (queue, _receiver) = notification_queue();
        let mut config = PollerConfig::new("jar-1");
        config.lookback = time::Duration::seconds(i64::MAX);
        let mut poller = DonationPoller::new(ledger.clone(), queue, config);

        assert_eq!(poller.poll_once().await.unwrap().len(), 1);
        assert!(poller.poll_once().await.unwrap().is_empty());

        let windows = ledger.windows.lock().unwrap().clone();
        assert_eq!(windows[0].0, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(windows[1].0, windows[0].1);
    }
}
