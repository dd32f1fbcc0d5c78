//! Background deadline sweeper and its shutdown signal.
//!
//! The engine already applies expired deadlines whenever a case is touched; the
//! sweeper makes sure sessions nobody touches still advance on time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use whistle_types::Clock;

use crate::orchestrator::VerificationEngine;

/// Broadcasts a shutdown signal to background tasks.
///
/// Tasks call [`subscribe`](Self::subscribe) and `select!` on the receiver alongside
/// their main loop. Dropping the controller also stops them.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a task that calls [`VerificationEngine::sweep_expired`] every `every`,
/// reading the time from `clock`, until `shutdown` fires.
pub fn spawn_deadline_sweeper(
    engine: Arc<VerificationEngine>,
    clock: Arc<dyn Clock>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(every_ms = every.as_millis() as u64, "deadline sweeper started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("deadline sweeper shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let now = clock.now();
                    let transitions = engine.sweep_expired(now);
                    if transitions > 0 {
                        tracing::info!(transitions, now = %now, "deadline sweep");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseSubmission;
    use crate::registry::{InspectorProfile, InspectorRegistry};
    use crate::session::SessionPhase;
    use whistle_nullables::{NullClock, NullEscrow, NullRandom};
    use whistle_types::{
        Amount, Category, EngineParams, InspectorAddress, Timestamp, WalletRef,
    };

    #[tokio::test]
    async fn programmatic_shutdown_notifies_subscribers() {
        let controller = ShutdownController::new();
        let mut rx1 = controller.subscribe();
        let mut rx2 = controller.subscribe();
        controller.shutdown();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn sweeper_advances_untouched_sessions_and_stops() {
        let registry = Arc::new(InspectorRegistry::default());
        for name in ["a", "b", "c"] {
            registry
                .register(
                    InspectorAddress::new(format!("insp-{name}")),
                    InspectorProfile::new(name, [Category::Food]),
                    Timestamp::EPOCH,
                )
                .unwrap();
        }
        let engine = Arc::new(
            VerificationEngine::new(
                EngineParams::default(),
                registry,
                Arc::new(NullRandom::seeded([1u8; 32])),
                Arc::new(NullEscrow::new()),
            )
            .unwrap(),
        );
        let id = engine
            .create_case(
                CaseSubmission {
                    category: Category::Food,
                    organization: "Acme Foods".into(),
                    stake: Amount::new(25),
                    submitter: WalletRef::new("wallet-1"),
                },
                Timestamp::EPOCH,
            )
            .unwrap();
        engine.begin_verification(&id, Timestamp::EPOCH).unwrap();

        let clock = Arc::new(NullClock::new(10_000_000));
        let controller = ShutdownController::new();
        let handle = spawn_deadline_sweeper(
            Arc::clone(&engine),
            clock,
            Duration::from_millis(5),
            controller.subscribe(),
        );

        let mut finalized = false;
        for _ in 0..400 {
            if engine.stats()["sessions_finalized"] == 1 {
                finalized = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        controller.shutdown();
        handle.await.unwrap();

        assert!(finalized);
        let session = engine.session(&id, Timestamp::EPOCH).unwrap();
        assert_eq!(session.phase, SessionPhase::Finalized);
    }
}
