//! Tokio glue for running a controller against wall-clock time.
//!
//! The controller itself is host-driven; [`SharedController::spawn_clock`]
//! feeds it elapsed tokio time, and [`SharedController::run_request`] ties a
//! collaborator's request future to the request lifecycle.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::controller::FormProgressController;
use crate::state::{FormProgressSnapshot, RequestOutcome};

/// A controller shared between the clock task and UI handlers.
#[derive(Debug, Clone)]
pub struct SharedController {
    inner: Arc<Mutex<FormProgressController>>,
}

impl SharedController {
    pub fn new(controller: FormProgressController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Lock the controller for a batch of calls.
    pub fn lock(&self) -> MutexGuard<'_, FormProgressController> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> FormProgressSnapshot {
        self.lock().snapshot()
    }

    /// Advance the controller every `tick` until the handle is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_clock(&self, tick: Duration) -> ClockHandle {
        let shared = self.clone();
        let tick = tick.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();

            loop {
                interval.tick().await;
                let now = Instant::now();
                let elapsed = now.saturating_duration_since(last);
                last = now;
                if !elapsed.is_zero() {
                    shared.lock().advance_time(elapsed);
                }
            }
        });

        ClockHandle { task }
    }

    /// Start the request, await `request`, then settle it with its outcome.
    ///
    /// Returns `None` without polling `request` when the controller refuses
    /// to start (wrong step or a request already active), and `None` when the
    /// request was cancelled or reset away before `request` resolved. Only
    /// the request started here is ever settled.
    pub async fn run_request<F>(&self, request: F) -> Option<RequestOutcome>
    where
        F: Future<Output = RequestOutcome>,
    {
        let id = {
            let mut form = self.lock();
            if !form.start_request() {
                return None;
            }
            form.active_request_id()?
        };

        let outcome = request.await;
        let settled = self.lock().settle_request(id, outcome);
        debug!(request = id, %outcome, settled, "request finished");
        settled.then_some(outcome)
    }
}

/// Owns the clock task; dropping it stops the clock.
#[derive(Debug)]
pub struct ClockHandle {
    task: JoinHandle<()>,
}

impl ClockHandle {
    /// Stop the clock now.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;
    use crate::state::RequestStatus;

    fn shared() -> SharedController {
        let controller = FormProgressController::new(&FormConfig::default()).unwrap();
        SharedController::new(controller)
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_drives_simulator() {
        let form = shared();
        form.lock().go_to_step("preferences").unwrap();
        assert!(form.lock().start_request());

        let _clock = form.spawn_clock(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(550)).await;
        assert_eq!(form.snapshot().progress, 10);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(form.snapshot().progress, 15);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(form.snapshot().progress, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_clock_freezes_progress() {
        let form = shared();
        form.lock().go_to_step("preferences").unwrap();
        form.lock().start_request();

        let clock = form.spawn_clock(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(550)).await;
        clock.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(form.snapshot().progress, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_request_completes() {
        let form = shared();
        form.lock().go_to_step("preferences").unwrap();
        let _clock = form.spawn_clock(Duration::from_millis(100));

        let outcome = form
            .run_request(async {
                tokio::time::sleep(Duration::from_millis(2_550)).await;
                RequestOutcome::Completed
            })
            .await;

        assert_eq!(outcome, Some(RequestOutcome::Completed));
        let snapshot = form.snapshot();
        assert_eq!(snapshot.status, RequestStatus::Completed);
        assert_eq!(snapshot.current_step.as_str(), "results");
        assert_eq!(snapshot.progress, 100);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(form.snapshot().progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_request_cancelled() {
        let form = shared();
        form.lock().go_to_step("preferences").unwrap();
        let _clock = form.spawn_clock(Duration::from_millis(100));

        let outcome = form
            .run_request(async {
                tokio::time::sleep(Duration::from_millis(1_550)).await;
                RequestOutcome::Cancelled
            })
            .await;

        assert_eq!(outcome, Some(RequestOutcome::Cancelled));
        let snapshot = form.snapshot();
        assert_eq!(snapshot.current_step.as_str(), "preferences");
        assert_eq!(snapshot.progress, 0);
        assert!(!snapshot.is_request_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_outcome_does_not_settle_newer_request() {
        let form = shared();
        form.lock().go_to_step("preferences").unwrap();
        let _clock = form.spawn_clock(Duration::from_millis(100));

        let first = {
            let form = form.clone();
            tokio::spawn(async move {
                form.run_request(async {
                    tokio::time::sleep(Duration::from_millis(1_000)).await;
                    RequestOutcome::Completed
                })
                .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        {
            let mut controller = form.lock();
            assert!(controller.cancel_request());
            assert!(controller.start_request());
        }

        assert_eq!(first.await.unwrap(), None);
        let snapshot = form.snapshot();
        assert_eq!(snapshot.current_step.as_str(), "preferences");
        assert_eq!(snapshot.status, RequestStatus::Active);
        assert!(snapshot.is_request_active);
    }

    #[tokio::test]
    async fn test_run_request_refused_away_from_initiating_step() {
        let form = shared();
        let mut polled = false;

        let outcome = form
            .run_request(async {
                polled = true;
                RequestOutcome::Completed
            })
            .await;

        assert_eq!(outcome, None);
        assert!(!polled);
        assert_eq!(form.snapshot().status, RequestStatus::Idle);
    }
}
