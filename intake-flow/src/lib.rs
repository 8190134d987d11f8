pub mod classify;
pub mod error;
pub mod extract;
pub mod flow;
pub mod graph;
pub mod handoff;
pub mod runner;
pub mod state;
pub mod step;
pub mod steps;
pub mod storage;
pub mod wizard;

// Re-export commonly used types
pub use error::{FlowError, Result};
pub use flow::{INTAKE_FLOW_ID, build_intake_flow};
pub use graph::{DialogueGraph, GraphBuilder, TurnResult, TurnStatus};
pub use handoff::HandoffPayload;
pub use runner::{CancelToken, FlowRunner, TurnGuard};
pub use state::{ChatMessage, ChatState, CollectedData, Intent, Language, MessageRole};
pub use step::{Step, StepId};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use wizard::{
    EligibilitySummary, IntakeData, IntakeState, REQUIRED_CONSENTS, ReviewBanner, UploadedFile,
    WizardAction, WizardStep,
};
