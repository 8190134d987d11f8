use thiserror::Error;

use crate::{step::StepId, wizard::WizardStep};

/// Errors raised by the dialogue engine, the wizard and session handling
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Step not registered: {0}")]
    StepNotFound(StepId),

    #[error("No outgoing edge from step: {0}")]
    NoTransition(StepId),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("A turn is already in progress for session: {0}")]
    TurnInProgress(String),

    #[error("Turn cancelled for session: {0}")]
    TurnCancelled(String),

    #[error("Step {step} is not complete: {reason}")]
    WizardGate { step: WizardStep, reason: String },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
