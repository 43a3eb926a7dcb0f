//! Form progress controller.
//!
//! Owns the step cursor, the single in-flight request and its simulated
//! progress. Every mutation goes through the methods here; calls that break
//! the request protocol (completing an idle request, starting away from the
//! initiating step) are logged and ignored.
//!
//! The controller has no view of the real request. Whoever performs it must
//! settle it through [`RequestSettlement::on_request_settled`]; a request that
//! is never settled stays active.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::completion;
use crate::config::{ConfigError, FormConfig};
use crate::simulator::ProgressSimulator;
use crate::state::{FormProgressSnapshot, RequestOutcome, RequestStatus};
use crate::steps::{FormError, Position, StepId, StepSequence};

/// Events emitted as the form session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// The cursor moved.
    StepChanged {
        from: StepId,
        to: StepId,
        form_completion_percentage: u8,
    },
    /// A request became active.
    RequestStarted { step: StepId },
    /// Request progress changed.
    ProgressUpdated { progress: u8, overall_progress: u8 },
    /// The request completed and the cursor moved to the completed step.
    RequestCompleted,
    /// The request was cancelled.
    RequestCancelled { step: StepId },
    /// The form was reset to its first step.
    FormReset,
}

/// Contract for the layer that performs the real request.
pub trait RequestSettlement {
    /// Report how the in-flight request ended.
    fn on_request_settled(&mut self, outcome: RequestOutcome);
}

/// Step navigation plus single-request lifecycle for one form session.
#[derive(Debug)]
pub struct FormProgressController {
    sequence: StepSequence,
    position: Position,
    status: RequestStatus,
    simulator: ProgressSimulator,
    session_id: String,
    request_seq: u64,
    active_request: Option<u64>,
    request_started_at: Option<DateTime<Utc>>,
    request_settled_at: Option<DateTime<Utc>>,
    event_tx: Option<mpsc::UnboundedSender<FormEvent>>,
}

impl FormProgressController {
    /// Create a controller, failing fast on an invalid configuration.
    pub fn new(config: &FormConfig) -> Result<Self, ConfigError> {
        let sequence = StepSequence::from_config(config)?;
        let position = sequence.first();
        Ok(Self {
            sequence,
            position,
            status: RequestStatus::Idle,
            simulator: ProgressSimulator::new(config.simulated_progress),
            session_id: new_session_id(),
            request_seq: 0,
            active_request: None,
            request_started_at: None,
            request_settled_at: None,
            event_tx: None,
        })
    }

    /// Send [`FormEvent`]s to `event_tx`.
    ///
    /// Sends ignore a dropped receiver.
    #[must_use]
    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<FormEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    // ---- read side ----

    pub fn current_step(&self) -> &StepId {
        self.sequence.id_at(self.position)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn steps(&self) -> &[StepId] {
        self.sequence.steps()
    }

    pub fn is_first_step(&self) -> bool {
        self.position == self.sequence.first()
    }

    pub fn is_last_step(&self) -> bool {
        self.position == Position::Step(self.sequence.last_index())
    }

    pub fn is_request_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.simulator.progress()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Identifier of the in-flight request, unique within this controller.
    pub fn active_request_id(&self) -> Option<u64> {
        self.active_request
    }

    pub fn form_completion_percentage(&self) -> u8 {
        completion::form_completion_percentage(self.position, self.sequence.len())
    }

    pub fn overall_progress(&self) -> u8 {
        completion::overall_progress(self.form_completion_percentage(), self.progress())
    }

    pub fn snapshot(&self) -> FormProgressSnapshot {
        FormProgressSnapshot {
            session_id: self.session_id.clone(),
            current_step: self.current_step().clone(),
            status: self.status,
            is_request_active: self.is_request_active(),
            progress: self.progress(),
            form_completion_percentage: self.form_completion_percentage(),
            overall_progress: self.overall_progress(),
            request_started_at: self.request_started_at,
            request_settled_at: self.request_settled_at,
        }
    }

    // ---- navigation ----

    /// Move to the following step. Ignored at the last declared step.
    pub fn go_to_next_step(&mut self) {
        match self.sequence.next(self.position) {
            Some(next) => self.move_to(next),
            None => debug!(step = %self.current_step(), "no step after current; use go_to_results"),
        }
    }

    /// Move to the preceding step. Ignored at the first step.
    pub fn go_to_previous_step(&mut self) {
        match self.sequence.previous(self.position) {
            Some(previous) => self.move_to(previous),
            None => debug!(step = %self.current_step(), "already at first step"),
        }
    }

    /// Jump to any declared step, or to the completed step.
    pub fn go_to_step(&mut self, id: &str) -> Result<(), FormError> {
        let target = self
            .sequence
            .position_of(id)
            .ok_or_else(|| FormError::UnknownStep(id.to_string()))?;

        if target == Position::Completed && self.is_request_active() {
            warn!(step = id, "ignoring jump to completed step while a request is active");
            return Ok(());
        }

        self.move_to(target);
        Ok(())
    }

    /// Show results without going through the request flow.
    pub fn go_to_results(&mut self) {
        if self.is_request_active() {
            warn!("ignoring go_to_results while a request is active");
            return;
        }
        self.move_to(Position::Completed);
    }

    // ---- request lifecycle ----

    /// Start the request. Only takes effect at the initiating step with no
    /// request in flight; returns whether it started.
    pub fn start_request(&mut self) -> bool {
        if self.is_request_active() {
            warn!("ignoring start_request: a request is already active");
            return false;
        }
        if self.position != self.sequence.request_initiated() {
            warn!(
                step = %self.current_step(),
                expected = %self.sequence.id_at(self.sequence.request_initiated()),
                "ignoring start_request away from the initiating step"
            );
            return false;
        }

        let before = self.progress();
        self.request_seq += 1;
        self.active_request = Some(self.request_seq);
        self.status = RequestStatus::Active;
        self.simulator.arm();
        self.request_started_at = Some(Utc::now());
        self.request_settled_at = None;

        info!(
            step = %self.current_step(),
            session = %self.session_id,
            request = self.request_seq,
            "request started"
        );
        self.emit(FormEvent::RequestStarted {
            step: self.current_step().clone(),
        });
        if self.progress() != before {
            self.emit_progress();
        }
        true
    }

    /// Finish the active request and move to the completed step.
    pub fn complete_request(&mut self) -> bool {
        if !self.is_request_active() {
            warn!(status = %self.status, "ignoring complete_request with no active request");
            return false;
        }

        self.simulator.complete();
        self.active_request = None;
        self.status = RequestStatus::Completed;
        self.request_settled_at = Some(Utc::now());
        info!(session = %self.session_id, "request completed");

        self.emit(FormEvent::RequestCompleted);
        self.emit_progress();
        self.move_to(Position::Completed);
        true
    }

    /// Abandon the active request. The cursor stays where it is.
    pub fn cancel_request(&mut self) -> bool {
        if !self.is_request_active() {
            warn!(status = %self.status, "ignoring cancel_request with no active request");
            return false;
        }

        self.simulator.cancel();
        self.active_request = None;
        self.status = RequestStatus::Cancelled;
        self.request_settled_at = Some(Utc::now());
        info!(step = %self.current_step(), session = %self.session_id, "request cancelled");

        self.emit(FormEvent::RequestCancelled {
            step: self.current_step().clone(),
        });
        self.emit_progress();
        true
    }

    /// Settle request `id` only if it is still the one in flight.
    ///
    /// Outcomes for a request that was already cancelled, completed or reset
    /// away are ignored, so a late response never settles a newer request.
    pub fn settle_request(&mut self, id: u64, outcome: RequestOutcome) -> bool {
        if self.active_request != Some(id) {
            debug!(
                request = id,
                active = ?self.active_request,
                %outcome,
                "ignoring outcome for a request that is no longer in flight"
            );
            return false;
        }
        match outcome {
            RequestOutcome::Completed => self.complete_request(),
            RequestOutcome::Cancelled => self.cancel_request(),
        }
    }

    /// Override progress from an external source, e.g. real upload progress.
    ///
    /// Values above 100 are clamped. The active flag and timers are untouched.
    pub fn update_progress(&mut self, value: u8) {
        let before = self.progress();
        self.simulator.set(value);
        if self.progress() != before {
            self.emit_progress();
        }
    }

    /// Return to the first step with no request and zero progress.
    pub fn reset_form(&mut self) {
        let before = self.progress();
        self.simulator.reset();
        self.active_request = None;
        self.position = self.sequence.first();
        self.status = RequestStatus::Idle;
        self.request_started_at = None;
        self.request_settled_at = None;
        self.session_id = new_session_id();

        debug!(session = %self.session_id, "form reset");
        if self.progress() != before {
            self.emit_progress();
        }
        self.emit(FormEvent::FormReset);
    }

    /// Feed elapsed host time to the progress simulator.
    pub fn advance_time(&mut self, elapsed: Duration) {
        if self.simulator.advance(elapsed) {
            self.emit_progress();
        }
    }

    fn move_to(&mut self, target: Position) {
        if target == self.position {
            return;
        }
        let from = self.current_step().clone();
        self.position = target;
        let to = self.current_step().clone();

        debug!(%from, %to, "step changed");
        self.emit(FormEvent::StepChanged {
            from,
            to,
            form_completion_percentage: self.form_completion_percentage(),
        });
    }

    fn emit_progress(&self) {
        self.emit(FormEvent::ProgressUpdated {
            progress: self.progress(),
            overall_progress: self.overall_progress(),
        });
    }

    fn emit(&self, event: FormEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

impl RequestSettlement for FormProgressController {
    fn on_request_settled(&mut self, outcome: RequestOutcome) {
        match outcome {
            RequestOutcome::Completed => {
                self.complete_request();
            }
            RequestOutcome::Cancelled => {
                self.cancel_request();
            }
        }
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
