//! FlowRunner: loads a session, advances the conversation by exactly one turn
//! and persists the updated session back to storage.
//!
//! Every turn is registered in an in-flight table with its own
//! [`CancelToken`]. A second turn for the same session is rejected while one
//! is running, and `reset`/`delete` cancel the running turn. A cancelled turn
//! never writes its reply into the session.

use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    error::{FlowError, Result},
    graph::{DialogueGraph, TurnResult},
    handoff::HandoffPayload,
    state::ChatState,
    storage::{Session, SessionStorage},
    wizard::{IntakeState, WizardAction},
};

/// One-shot cancellation signal shared between a turn and whoever may abort it
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // the sender lives as long as self, so this only returns on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }
}

/// Marks a session as busy for as long as it is alive
pub struct TurnGuard {
    in_flight: Arc<DashMap<String, CancelToken>>,
    session_id: String,
    token: CancelToken,
}

impl TurnGuard {
    /// Simulated latency that ends early when the turn is cancelled
    pub async fn pause(&self, delay: Duration) -> Result<()> {
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.token.cancelled() => {}
            }
        }
        self.ensure_live()
    }

    pub fn ensure_live(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(FlowError::TurnCancelled(self.session_id.clone()));
        }
        Ok(())
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        // a reset may already have replaced our entry
        self.in_flight
            .remove_if(&self.session_id, |_, token| token.same_as(&self.token));
    }
}

/// High-level helper that orchestrates the _load → advance → save_ pattern
#[derive(Clone)]
pub struct FlowRunner {
    graph: Arc<DialogueGraph>,
    storage: Arc<dyn SessionStorage>,
    typing_delay: Duration,
    in_flight: Arc<DashMap<String, CancelToken>>,
}

impl FlowRunner {
    pub fn new(graph: Arc<DialogueGraph>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            graph,
            storage,
            typing_delay: Duration::ZERO,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Delay before the assistant's reply is stored
    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }

    /// Claim the session for one turn
    pub fn begin_turn(&self, session_id: &str) -> Result<TurnGuard> {
        match self.in_flight.entry(session_id.to_string()) {
            Entry::Occupied(_) => Err(FlowError::TurnInProgress(session_id.to_string())),
            Entry::Vacant(slot) => {
                let token = CancelToken::new();
                slot.insert(token.clone());
                Ok(TurnGuard {
                    in_flight: self.in_flight.clone(),
                    session_id: session_id.to_string(),
                    token,
                })
            }
        }
    }

    pub fn is_busy(&self, session_id: &str) -> bool {
        self.in_flight.contains_key(session_id)
    }

    /// Cancel the running turn, if any. Returns whether one was running.
    pub fn cancel_turn(&self, session_id: &str) -> bool {
        match self.in_flight.remove(session_id) {
            Some((_, token)) => {
                token.cancel();
                info!(session_id = %session_id, "Cancelled in-flight turn");
                true
            }
            None => false,
        }
    }

    /// New session with the greeting already posted
    pub async fn start(&self) -> Result<Session> {
        let now = Utc::now();
        let session = Session::new(self.graph.start(now)?, now);
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, graph_id = %self.graph.id, "Session started");
        Ok(session)
    }

    pub async fn load(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))
    }

    /// Run exactly one conversation turn and persist the result.
    ///
    /// A turn that ends with the caller choosing to continue to the intake
    /// wizard also stashes the hand-off payload.
    pub async fn send(&self, session_id: &str, input: &str) -> Result<TurnResult> {
        let guard = self.begin_turn(session_id)?;

        let session = self.load(session_id).await?;
        let turn = self.graph.advance(&session.chat, input, Utc::now())?;

        guard.pause(self.typing_delay).await?;

        // patch the latest copy so only the conversation fields are replaced
        let mut session = self.load(session_id).await?;
        session.chat = turn.state.clone();
        if session.chat.continue_to_intake {
            session.handoff = Some(HandoffPayload::from(&session.chat));
        }
        guard.ensure_live()?;
        self.storage.save(session).await?;

        debug!(
            session_id = %session_id,
            step = %turn.state.current_step,
            status = ?turn.status,
            "Turn completed"
        );
        Ok(turn)
    }

    /// Cancel any running turn and restart the conversation from the greeting
    pub async fn reset(&self, session_id: &str) -> Result<ChatState> {
        self.cancel_turn(session_id);
        let _guard = self.begin_turn(session_id)?;

        let mut session = self.load(session_id).await?;
        session.chat = self.graph.start(Utc::now())?;
        session.handoff = None;
        let chat = session.chat.clone();
        self.storage.save(session).await?;

        info!(session_id = %session_id, "Conversation reset");
        Ok(chat)
    }

    /// Drop the session entirely, cancelling any running turn
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        self.cancel_turn(session_id);
        self.load(session_id).await?;
        self.storage.delete(session_id).await?;
        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// Stash the collected fields for the wizard and return the wizard URL
    pub async fn stash_handoff(&self, session_id: &str) -> Result<String> {
        let _guard = self.begin_turn(session_id)?;
        let mut session = self.load(session_id).await?;
        if !session.chat.is_complete {
            return Err(FlowError::InvalidTransition(
                "conversation is not finished".to_string(),
            ));
        }
        session.handoff = Some(HandoffPayload::from(&session.chat));
        self.storage.save(session).await?;
        Ok(HandoffPayload::wizard_url(session_id))
    }

    /// Start the intake wizard, on an existing session or a fresh one.
    ///
    /// With `from_voice` the stashed hand-off payload is consumed; a second
    /// start finds nothing to pre-fill. Rejected while a turn is running on
    /// the same session.
    pub async fn start_intake(
        &self,
        session_id: Option<&str>,
        from_voice: bool,
    ) -> Result<Session> {
        let (mut session, _guard) = match session_id {
            Some(id) => {
                let guard = self.begin_turn(id)?;
                (self.load(id).await?, Some(guard))
            }
            None => {
                let now = Utc::now();
                (Session::new(self.graph.start(now)?, now), None)
            }
        };

        let handoff = if from_voice { session.handoff.take() } else { None };
        session.intake = Some(match &handoff {
            Some(payload) => IntakeState::from_handoff(payload),
            None => IntakeState::new(),
        });
        self.storage.save(session.clone()).await?;

        info!(
            session_id = %session.id,
            voice_data_loaded = handoff.is_some(),
            "Intake wizard started"
        );
        Ok(session)
    }

    pub async fn intake(&self, session_id: &str) -> Result<IntakeState> {
        self.load(session_id).await?.intake.ok_or_else(|| {
            FlowError::InvalidTransition("intake wizard has not been started".to_string())
        })
    }

    /// Apply one wizard action and persist the new wizard state
    pub async fn apply_intake(
        &self,
        session_id: &str,
        action: WizardAction,
    ) -> Result<IntakeState> {
        let mut session = self.load(session_id).await?;
        let current = session.intake.as_ref().ok_or_else(|| {
            FlowError::InvalidTransition("intake wizard has not been started".to_string())
        })?;
        let next = current.apply(action)?;
        if next.step != current.step {
            debug!(
                session_id = %session_id,
                from = %current.step,
                to = %next.step,
                "Wizard step changed"
            );
        }
        session.intake = Some(next.clone());
        self.storage.save(session).await?;
        Ok(next)
    }
}
