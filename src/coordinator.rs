//! Periodic refresh driver and the published snapshot it maintains.

use crate::core::currency::CurrencySelection;
use crate::core::error::RefreshError;
use crate::core::snapshot::Snapshot;
use crate::fetcher::SnapshotSource;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// What readers see: the last good snapshot plus the outcome of the latest
/// cycle. A failed cycle leaves `snapshot` untouched and flips
/// `last_update_success`.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub snapshot: Option<Arc<Snapshot>>,
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_attempt: Option<DateTime<Utc>>,
}

/// Cheap, cloneable read handle on the published state.
#[derive(Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<CoordinatorState>,
}

impl SnapshotReader {
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().snapshot.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.rx.borrow().clone()
    }

    /// Waits until the next cycle finishes. Errors once the coordinator is gone.
    pub async fn changed(&mut self) -> Result<CoordinatorState, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

pub struct Coordinator {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    selection: watch::Sender<CurrencySelection>,
    state: watch::Sender<CoordinatorState>,
    cycle: Mutex<()>,
}

impl Coordinator {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        selection: CurrencySelection,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            interval,
            selection: watch::Sender::new(selection),
            state: watch::Sender::new(CoordinatorState::default()),
            cycle: Mutex::new(()),
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.state.subscribe(),
        }
    }

    pub fn selection(&self) -> CurrencySelection {
        self.selection.borrow().clone()
    }

    /// Replaces the currency selection; takes effect on the next cycle.
    pub fn set_selection(&self, selection: CurrencySelection) {
        let previous = self.selection.send_replace(selection.clone());
        if previous != selection {
            info!(currencies = ?selection, "Currency selection changed");
        }
    }

    /// Runs one refresh cycle and publishes the result.
    ///
    /// Cycles are serialized. The fetch runs in its own task so a panic inside
    /// it is reported as a failed cycle instead of unwinding into the caller.
    pub async fn refresh_once(&self) -> Result<Arc<Snapshot>, RefreshError> {
        let _cycle = self.cycle.lock().await;
        let selection = self.selection();
        let source = Arc::clone(&self.source);

        let outcome = tokio::spawn(async move { source.refresh(&selection).await })
            .await
            .unwrap_or_else(|join_error| Err(RefreshError::Aborted(join_error.to_string())));
        let attempted_at = Utc::now();

        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.state.send_replace(CoordinatorState {
                    snapshot: Some(Arc::clone(&snapshot)),
                    last_update_success: true,
                    last_error: None,
                    last_attempt: Some(attempted_at),
                });
                debug!("Published new snapshot");
                Ok(snapshot)
            }
            Err(e) => {
                error!(error = %e, "Refresh cycle failed; keeping previous snapshot");
                self.state.send_modify(|state| {
                    state.last_update_success = false;
                    state.last_error = Some(e.to_string());
                    state.last_attempt = Some(attempted_at);
                });
                Err(e)
            }
        }
    }

    /// Refreshes immediately and then every interval until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(interval_secs = self.interval.as_secs(), "Coordinator started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Coordinator stopping");
                    break;
                }
                _ = ticker.tick() => {
                    // Failures are already recorded in the published state.
                    let _ = self.refresh_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::error::ExchangeError;
    use crate::core::snapshot::{Balance, RateQuote};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds, then fails, then panics, then succeeds again.
    struct ScriptedSource {
        calls: AtomicUsize,
        seen: std::sync::Mutex<Vec<CurrencySelection>>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    fn snapshot_with_total(rate: f64) -> Snapshot {
        let mut balances = BTreeMap::new();
        balances.insert(
            "btc".to_string(),
            Balance {
                total_amount: 1.into(),
                ..Balance::default()
            },
        );
        let mut rates = BTreeMap::new();
        rates.insert("btc".to_string(), Some(RateQuote::Direct(rate)));
        Snapshot::new(balances, rates)
    }

    #[async_trait]
    impl SnapshotSource for ScriptedSource {
        async fn refresh(&self, currencies: &CurrencySelection) -> Result<Snapshot, RefreshError> {
            self.seen.lock().unwrap().push(currencies.clone());
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(snapshot_with_total(100.0)),
                1 => Err(RefreshError::FetchFailed(ExchangeError::from_status(
                    "account",
                    StatusCode::UNAUTHORIZED,
                ))),
                2 => panic!("unexpected payload"),
                _ => Ok(snapshot_with_total(200.0)),
            }
        }
    }

    fn coordinator(source: Arc<ScriptedSource>) -> Coordinator {
        Coordinator::new(
            source,
            CurrencySelection::from(vec![Currency::Btc]),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_failed_cycles_keep_previous_snapshot() {
        let source = Arc::new(ScriptedSource::new());
        let coordinator = coordinator(Arc::clone(&source));
        let reader = coordinator.reader();
        assert!(reader.snapshot().is_none());

        let first = coordinator.refresh_once().await.unwrap();
        assert_eq!(first.total_balance_eur(), 100.0);
        assert!(reader.state().last_update_success);

        let failed = coordinator.refresh_once().await;
        assert!(matches!(failed, Err(RefreshError::FetchFailed(_))));
        let state = reader.state();
        assert!(!state.last_update_success);
        assert!(state.last_error.unwrap().contains("401"));
        assert!(Arc::ptr_eq(&reader.snapshot().unwrap(), &first));

        let panicked = coordinator.refresh_once().await;
        assert!(matches!(panicked, Err(RefreshError::Aborted(_))));
        assert!(Arc::ptr_eq(&reader.snapshot().unwrap(), &first));

        let recovered = coordinator.refresh_once().await.unwrap();
        assert_eq!(recovered.total_balance_eur(), 200.0);
        let state = reader.state();
        assert!(state.last_update_success);
        assert!(state.last_error.is_none());
        assert_eq!(
            reader.snapshot().unwrap().total_balance_eur(),
            200.0
        );
    }

    #[tokio::test]
    async fn test_selection_change_applies_to_next_cycle() {
        let source = Arc::new(ScriptedSource::new());
        let coordinator = coordinator(Arc::clone(&source));

        coordinator.refresh_once().await.unwrap();
        coordinator.set_selection(CurrencySelection::from(vec![Currency::Eth, Currency::Sol]));
        let _ = coordinator.refresh_once().await;

        let seen = source.seen.lock().unwrap().clone();
        assert_eq!(seen[0], CurrencySelection::from(vec![Currency::Btc]));
        assert_eq!(
            seen[1],
            CurrencySelection::from(vec![Currency::Eth, Currency::Sol])
        );
        assert_eq!(coordinator.selection().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_refreshes_on_each_tick_until_shutdown() {
        let source = Arc::new(ScriptedSource::new());
        let coordinator = Arc::new(coordinator(Arc::clone(&source)));
        let mut reader = coordinator.reader();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let runner = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .run(async {
                        let _ = stop_rx.await;
                    })
                    .await
            })
        };

        // First tick fires immediately.
        let state = reader.changed().await.unwrap();
        assert!(state.last_update_success);

        // Second tick, one interval later, fails.
        let state = reader.changed().await.unwrap();
        assert!(!state.last_update_success);
        assert!(state.snapshot.is_some());

        stop_tx.send(()).unwrap();
        runner.await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
