use serde::{Deserialize, Serialize};

use intake_flow::{
    ChatMessage, ChatState, IntakeState, ReviewBanner, StepId, TurnStatus, WizardStep,
};

use crate::mocks::WrittenResource;

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub session_id: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatStartResponse {
    pub session_id: String,
    pub message: Option<ChatMessage>,
    pub state: ChatState,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub session_id: String,
    pub response: ChatMessage,
    pub status: TurnStatus,
    pub current_step: StepId,
    pub is_complete: bool,
    pub continue_to_intake: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HandoffResponse {
    pub session_id: String,
    pub wizard_url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IntakeStartRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub from_voice: bool,
}

/// Wizard state plus what the page needs to render the current step
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub session_id: String,
    pub step: WizardStep,
    pub position: usize,
    pub can_advance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_banner: Option<ReviewBanner>,
    pub state: IntakeState,
}

impl IntakeResponse {
    pub fn new(session_id: impl Into<String>, state: IntakeState) -> Self {
        Self {
            session_id: session_id.into(),
            step: state.step,
            position: state.step.position(),
            can_advance: state.can_advance(),
            blocked_reason: state.blocked_reason(),
            review_banner: state.review_banner(),
            state,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub session_id: String,
    pub submitted: bool,
    pub written_resources: Vec<WrittenResource>,
    pub timestamp: String,
}
