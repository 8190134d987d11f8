use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn,
    response::Json,
    routing::{delete, get, post},
};
use intake_flow::{
    FlowError, FlowRunner, InMemorySessionStorage, IntakeState, SessionStorage, WizardAction,
    WizardStep, build_intake_flow,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    config::{Delays, ServiceConfig},
    fixtures::{FixtureError, Fixtures},
    landing,
    mocks::{self, DemoClearinghouse, EhrWriter, EligibilityChecker, WriteBackRequest},
    models::{
        ChatStartResponse, HandoffResponse, IntakeResponse, IntakeStartRequest,
        SendMessageRequest, SendMessageResponse, SubmitResponse,
    },
    telemetry::correlation_id_middleware,
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn conflict_error(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
}

fn internal_error(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

/// Map engine errors to responses. User input is never echoed back.
fn flow_error(error: FlowError) -> ApiError {
    match error {
        FlowError::SessionNotFound(id) => not_found_error("Session not found", &id),
        FlowError::EmptyInput => bad_request_error("Message content is required"),
        FlowError::TurnInProgress(_) => {
            conflict_error("Another request for this session is still in progress")
        }
        FlowError::TurnCancelled(_) => conflict_error("The request was cancelled"),
        FlowError::WizardGate { step, reason } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Step is not complete",
                "step": step,
                "reason": reason
            })),
        ),
        FlowError::InvalidTransition(_) => {
            conflict_error("Action not allowed in the current state")
        }
        other => {
            error!(error = %other, "Flow engine failure");
            internal_error("Internal server error")
        }
    }
}

fn validate_session_id(session_id: &str) -> Result<(), ApiError> {
    if Uuid::parse_str(session_id).is_err() {
        return Err(bad_request_error("Invalid session ID format"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub runner: FlowRunner,
    pub fixtures: Arc<Fixtures>,
    pub eligibility: Arc<dyn EligibilityChecker>,
    pub ehr: Arc<dyn EhrWriter>,
    pub delays: Delays,
}

impl AppState {
    pub fn new(config: &ServiceConfig, fixtures: Fixtures) -> Self {
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let runner = FlowRunner::new(Arc::new(build_intake_flow()), storage)
            .with_typing_delay(config.delays.typing);
        let (eligibility, ehr) = mocks::shared(DemoClearinghouse::new(
            fixtures.eligibility.clone(),
            config.delays.eligibility,
            config.delays.ehr,
        ));

        Self {
            runner,
            fixtures: Arc::new(fixtures),
            eligibility,
            ehr,
            delays: config.delays,
        }
    }
}

pub fn create_app(config: &ServiceConfig) -> Result<Router, FixtureError> {
    let fixtures = Fixtures::load(config.fixtures_path.as_deref())?;
    Ok(build_router(AppState::new(config, fixtures)))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::root))
        .route("/health", get(health_check))
        .route("/api/contact", post(landing::contact))
        .route("/api/demo/fixtures", get(demo_fixtures))
        .route("/api/mocks/eligibility", post(mocks::eligibility))
        .route("/api/mocks/ehr-writeback", post(mocks::ehr_writeback))
        .route("/chat/start", post(start_chat))
        .route("/chat", post(send_message))
        .route("/chat/{session_id}", get(get_chat))
        .route("/chat/{session_id}/reset", post(reset_chat))
        .route("/chat/{session_id}/handoff", post(handoff))
        .route("/intake/start", post(start_intake))
        .route("/intake/{session_id}", get(get_intake))
        .route("/intake/{session_id}/actions", post(apply_action))
        .route("/intake/{session_id}/advance", post(advance_intake))
        .route("/intake/{session_id}/back", post(back_intake))
        .route("/intake/{session_id}/submit", post(submit_intake))
        .route("/session/{session_id}", delete(delete_session))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(from_fn(correlation_id_middleware)),
        )
        .with_state(app_state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn demo_fixtures(State(state): State<AppState>) -> Json<Value> {
    let fixtures = &state.fixtures;
    Json(json!({
        "consentTypes": fixtures.consent_types,
        "patient": fixtures.patient,
        "coverage": fixtures.coverage,
        "pharmacy": fixtures.pharmacy,
        "anomalyRules": fixtures.anomaly_rules,
    }))
}

async fn start_chat(State(state): State<AppState>) -> ApiResult<ChatStartResponse> {
    let session = state.runner.start().await.map_err(flow_error)?;
    Ok(Json(ChatStartResponse {
        session_id: session.id.clone(),
        message: session.chat.last_message().cloned(),
        state: session.chat,
    }))
}

async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<SendMessageResponse> {
    validate_session_id(&request.session_id)?;
    info!(
        session_id = %request.session_id,
        content_length = request.content.len(),
        "Processing chat message"
    );

    let turn = state
        .runner
        .send(&request.session_id, &request.content)
        .await
        .map_err(flow_error)?;

    let wizard_url = turn
        .state
        .continue_to_intake
        .then(|| intake_flow::HandoffPayload::wizard_url(&request.session_id));

    Ok(Json(SendMessageResponse {
        session_id: request.session_id,
        response: turn.response,
        status: turn.status,
        current_step: turn.state.current_step,
        is_complete: turn.state.is_complete,
        continue_to_intake: turn.state.continue_to_intake,
        wizard_url,
    }))
}

async fn get_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<intake_flow::ChatState> {
    validate_session_id(&session_id)?;
    let session = state.runner.load(&session_id).await.map_err(flow_error)?;
    Ok(Json(session.chat))
}

async fn reset_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ChatStartResponse> {
    validate_session_id(&session_id)?;
    let chat = state.runner.reset(&session_id).await.map_err(flow_error)?;
    Ok(Json(ChatStartResponse {
        session_id,
        message: chat.last_message().cloned(),
        state: chat,
    }))
}

async fn handoff(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<HandoffResponse> {
    validate_session_id(&session_id)?;
    let wizard_url = state
        .runner
        .stash_handoff(&session_id)
        .await
        .map_err(flow_error)?;
    Ok(Json(HandoffResponse {
        session_id,
        wizard_url,
    }))
}

async fn start_intake(
    State(state): State<AppState>,
    Json(request): Json<IntakeStartRequest>,
) -> ApiResult<IntakeResponse> {
    if let Some(id) = &request.session_id {
        validate_session_id(id)?;
    }

    let session = state
        .runner
        .start_intake(request.session_id.as_deref(), request.from_voice)
        .await
        .map_err(flow_error)?;
    let intake = session
        .intake
        .ok_or_else(|| internal_error("Failed to start intake"))?;
    Ok(Json(IntakeResponse::new(session.id, intake)))
}

async fn get_intake(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<IntakeResponse> {
    validate_session_id(&session_id)?;
    let intake = state.runner.intake(&session_id).await.map_err(flow_error)?;
    Ok(Json(IntakeResponse::new(session_id, intake)))
}

async fn apply_action(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(action): Json<WizardAction>,
) -> ApiResult<IntakeResponse> {
    validate_session_id(&session_id)?;

    // navigation and submission carry side effects and have their own routes
    if matches!(
        action,
        WizardAction::Advance
            | WizardAction::Back
            | WizardAction::MarkSubmitted
            | WizardAction::RecordEligibility { .. }
    ) {
        return Err(bad_request_error("Unsupported action"));
    }

    let _guard = state.runner.begin_turn(&session_id).map_err(flow_error)?;
    let intake = state
        .runner
        .apply_intake(&session_id, action)
        .await
        .map_err(flow_error)?;
    Ok(Json(IntakeResponse::new(session_id, intake)))
}

fn gate_error(intake: &IntakeState) -> ApiError {
    flow_error(FlowError::WizardGate {
        step: intake.step,
        reason: intake
            .blocked_reason()
            .unwrap_or("step is not complete")
            .to_string(),
    })
}

/// Run the current step's side effect, then move to the next step
async fn advance_intake(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<IntakeResponse> {
    validate_session_id(&session_id)?;

    let guard = state.runner.begin_turn(&session_id).map_err(flow_error)?;
    let intake = state.runner.intake(&session_id).await.map_err(flow_error)?;

    match intake.step {
        WizardStep::Verify => {
            if !intake.can_advance() {
                return Err(gate_error(&intake));
            }
            // simulated OTP check
            guard.pause(state.delays.otp).await.map_err(flow_error)?;
        }
        WizardStep::Coverage => {
            if !intake.ready_for_eligibility() {
                return Err(gate_error(&intake));
            }
            // simulated OCR of the card images, then the coverage lookup
            guard.pause(state.delays.ocr).await.map_err(flow_error)?;
            let request = mocks::demo_eligibility_request(
                &session_id,
                &state.fixtures.patient,
                &state.fixtures.coverage,
            );
            let response = state.eligibility.check(&request).await.map_err(|e| {
                error!(session_id = %session_id, error = %e, "Eligibility check failed");
                internal_error("Eligibility check failed")
            })?;
            guard.ensure_live().map_err(flow_error)?;
            state
                .runner
                .apply_intake(
                    &session_id,
                    WizardAction::RecordEligibility {
                        summary: response.summary(),
                    },
                )
                .await
                .map_err(flow_error)?;
        }
        WizardStep::Review => {
            return Err(conflict_error("Use submit to finish the intake"));
        }
        WizardStep::Consent | WizardStep::History => {}
    }

    let next = state
        .runner
        .apply_intake(&session_id, WizardAction::Advance)
        .await
        .map_err(flow_error)?;
    Ok(Json(IntakeResponse::new(session_id, next)))
}

async fn back_intake(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<IntakeResponse> {
    validate_session_id(&session_id)?;
    let _guard = state.runner.begin_turn(&session_id).map_err(flow_error)?;
    let intake = state
        .runner
        .apply_intake(&session_id, WizardAction::Back)
        .await
        .map_err(flow_error)?;
    Ok(Json(IntakeResponse::new(session_id, intake)))
}

async fn submit_intake(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SubmitResponse> {
    validate_session_id(&session_id)?;

    let guard = state.runner.begin_turn(&session_id).map_err(flow_error)?;
    let intake = state.runner.intake(&session_id).await.map_err(flow_error)?;
    // fail before contacting the EHR when submission is not allowed
    intake
        .apply(WizardAction::MarkSubmitted)
        .map_err(flow_error)?;

    let to_value = |value: serde_json::Result<Value>| {
        value.map_err(|e| {
            error!(error = %e, "Failed to build write-back payload");
            internal_error("Failed to build write-back payload")
        })
    };
    let request = WriteBackRequest {
        session_id: session_id.clone(),
        patient: to_value(serde_json::to_value(&state.fixtures.patient))?,
        coverage: Some(to_value(serde_json::to_value(&state.fixtures.coverage))?),
        consents: Some(to_value(serde_json::to_value(&intake.data.consents))?),
        answers: Some(to_value(serde_json::to_value(&intake.data.answers))?),
    };

    let written = state.ehr.write_back(&request).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "EHR write-back failed");
        internal_error("EHR write-back failed")
    })?;
    guard.pause(state.delays.submit).await.map_err(flow_error)?;

    let intake = state
        .runner
        .apply_intake(&session_id, WizardAction::MarkSubmitted)
        .await
        .map_err(flow_error)?;

    info!(
        session_id = %session_id,
        resources = written.written_resources.len(),
        "Intake submitted"
    );

    Ok(Json(SubmitResponse {
        session_id,
        submitted: intake.submitted,
        written_resources: written.written_resources,
        timestamp: written.timestamp,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    validate_session_id(&session_id)?;
    state.runner.delete(&session_id).await.map_err(flow_error)?;
    Ok(Json(json!({
        "session_id": session_id,
        "deleted": true
    })))
}
