//! Simulated eligibility (X12 270/271) and EHR write-back (FHIR) integrations.
//!
//! Nothing here talks to a real system. Each call waits a fixed delay, answers
//! from the demo fixtures and writes two `[DEMO]` log lines.

use async_trait::async_trait;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::{
    fixtures::{DemoCoverage, DemoPatient, EligibilityTemplate},
    service::AppState,
    telemetry::DEMO_MARKER,
};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing required fields")]
    MissingFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    pub session_id: String,
    pub payer_id: String,
    pub member_id: String,
    pub dob: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raw271 {
    pub trading_partner_service_id: String,
    pub subscriber_id: String,
    pub group_number: String,
    pub plan_coverage_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    pub ok: bool,
    pub status: String,
    pub copay: String,
    pub deductible: String,
    pub deductible_met: String,
    pub oop_max: String,
    pub oop_met: String,
    pub notes: String,
    pub effective_date: String,
    pub termination_date: Option<String>,
    pub plan_type: String,
    pub raw271: Raw271,
}

impl EligibilityResponse {
    pub fn summary(&self) -> intake_flow::EligibilitySummary {
        intake_flow::EligibilitySummary {
            status: self.status.clone(),
            copay: Some(self.copay.clone()),
            deductible: Some(self.deductible.clone()),
            plan_type: Some(self.plan_type.clone()),
            notes: Some(self.notes.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteBackRequest {
    pub session_id: String,
    pub patient: Value,
    #[serde(default)]
    pub coverage: Option<Value>,
    #[serde(default)]
    pub consents: Option<Value>,
    #[serde(default)]
    pub answers: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenResource {
    pub resource_type: String,
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteBackResponse {
    pub ok: bool,
    pub written_resources: Vec<WrittenResource>,
    pub timestamp: String,
}

/// Coverage lookup against a payer
#[async_trait]
pub trait EligibilityChecker: Send + Sync {
    async fn check(
        &self,
        request: &EligibilityRequest,
    ) -> Result<EligibilityResponse, GatewayError>;
}

/// Write of the finished intake into the practice's EHR
#[async_trait]
pub trait EhrWriter: Send + Sync {
    async fn write_back(
        &self,
        request: &WriteBackRequest,
    ) -> Result<WriteBackResponse, GatewayError>;
}

/// Canned clearinghouse and EHR used by the demo
pub struct DemoClearinghouse {
    template: EligibilityTemplate,
    eligibility_delay: Duration,
    ehr_delay: Duration,
}

impl DemoClearinghouse {
    pub fn new(
        template: EligibilityTemplate,
        eligibility_delay: Duration,
        ehr_delay: Duration,
    ) -> Self {
        Self {
            template,
            eligibility_delay,
            ehr_delay,
        }
    }
}

fn count_keys(value: Option<&Value>) -> usize {
    value
        .and_then(Value::as_object)
        .map(|object| object.len())
        .unwrap_or(0)
}

#[async_trait]
impl EligibilityChecker for DemoClearinghouse {
    async fn check(
        &self,
        request: &EligibilityRequest,
    ) -> Result<EligibilityResponse, GatewayError> {
        if [&request.session_id, &request.payer_id, &request.member_id, &request.dob]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(GatewayError::MissingFields);
        }

        tokio::time::sleep(self.eligibility_delay).await;

        let template = &self.template;
        let response = EligibilityResponse {
            ok: true,
            status: template.status.clone(),
            copay: template.copay.clone(),
            deductible: template.deductible.clone(),
            deductible_met: template.deductible_met.clone(),
            oop_max: template.oop_max.clone(),
            oop_met: template.oop_met.clone(),
            notes: template.notes.clone(),
            effective_date: template.effective_date.clone(),
            termination_date: template.termination_date.clone(),
            plan_type: template.plan_type.clone(),
            raw271: Raw271 {
                trading_partner_service_id: template.raw271.trading_partner_service_id.clone(),
                subscriber_id: request.member_id.clone(),
                group_number: template.raw271.group_number.clone(),
                plan_coverage_description: template.raw271.plan_coverage_description.clone(),
            },
        };

        // the date of birth is never logged
        info!(
            marker = DEMO_MARKER,
            session_id = %request.session_id,
            payer_id = %request.payer_id,
            member_id = %request.member_id,
            result = %response.status,
            "[DEMO] Eligibility check"
        );
        info!(
            marker = DEMO_MARKER,
            action = "ELIGIBILITY_CHECK",
            actor = "system",
            entity = "intake_session",
            entity_id = %request.session_id,
            success = true,
            "[DEMO] Audit event"
        );

        Ok(response)
    }
}

#[async_trait]
impl EhrWriter for DemoClearinghouse {
    async fn write_back(
        &self,
        request: &WriteBackRequest,
    ) -> Result<WriteBackResponse, GatewayError> {
        if request.session_id.is_empty() || !is_present(&request.patient) {
            return Err(GatewayError::MissingFields);
        }

        tokio::time::sleep(self.ehr_delay).await;

        let session_id = &request.session_id;
        let resource = |resource_type: &str, suffix: &str| WrittenResource {
            resource_type: resource_type.to_string(),
            id: format!("{resource_type}/{session_id}-{suffix}"),
            status: "created".to_string(),
            content_url: None,
        };

        let response = WriteBackResponse {
            ok: true,
            written_resources: vec![
                resource("Patient", "patient"),
                resource("Coverage", "coverage"),
                WrittenResource {
                    content_url: Some(format!(
                        "https://demo.intakepal.ai/documents/{session_id}-consents.pdf"
                    )),
                    ..resource("DocumentReference", "consents")
                },
                resource("QuestionnaireResponse", "intake"),
            ],
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        info!(
            marker = DEMO_MARKER,
            session_id = %session_id,
            resources = response.written_resources.len(),
            consents = count_keys(request.consents.as_ref()),
            answers = count_keys(request.answers.as_ref()),
            "[DEMO] EHR write-back"
        );
        info!(
            marker = DEMO_MARKER,
            action = "EHR_WRITEBACK",
            actor = "system",
            entity = "intake_session",
            entity_id = %session_id,
            timestamp = %response.timestamp,
            success = true,
            "[DEMO] Audit event"
        );

        Ok(response)
    }
}

/// Presence as a browser form would judge it: null, false, "" and 0 are absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn has_fields(body: &Value, fields: &[&str]) -> bool {
    fields
        .iter()
        .all(|field| body.get(*field).is_some_and(is_present))
}

fn text(body: &Value, field: &str) -> String {
    match body.get(field) {
        Some(Value::String(text)) => text.clone(),
        Some(other) if is_present(other) => other.to_string(),
        _ => String::new(),
    }
}

type MockResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

fn missing_fields() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "ok": false, "error": "Missing required fields" })),
    )
}

fn internal_server_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": "Internal server error" })),
    )
}

fn gateway_failure(error: GatewayError) -> (StatusCode, Json<Value>) {
    match error {
        GatewayError::MissingFields => missing_fields(),
    }
}

pub async fn eligibility(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> MockResult<EligibilityResponse> {
    let Json(body) = body.map_err(|rejection| {
        error!(marker = DEMO_MARKER, reason = %rejection.body_text(), "[DEMO] Eligibility error");
        internal_server_error()
    })?;

    if !has_fields(&body, &["sessionId", "payerId", "memberId", "dob"]) {
        return Err(missing_fields());
    }

    let request = EligibilityRequest {
        session_id: text(&body, "sessionId"),
        payer_id: text(&body, "payerId"),
        member_id: text(&body, "memberId"),
        dob: text(&body, "dob"),
        service_type: body
            .get("serviceType")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    state
        .eligibility
        .check(&request)
        .await
        .map(Json)
        .map_err(|e| {
            error!(marker = DEMO_MARKER, error = %e, "[DEMO] Eligibility error");
            gateway_failure(e)
        })
}

pub async fn ehr_writeback(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> MockResult<WriteBackResponse> {
    let Json(body) = body.map_err(|rejection| {
        error!(
            marker = DEMO_MARKER,
            reason = %rejection.body_text(),
            "[DEMO] EHR write-back error"
        );
        internal_server_error()
    })?;

    if !has_fields(&body, &["sessionId", "patient"]) {
        return Err(missing_fields());
    }

    let optional = |field: &str| body.get(field).filter(|value| !value.is_null()).cloned();
    let request = WriteBackRequest {
        session_id: text(&body, "sessionId"),
        patient: body.get("patient").cloned().unwrap_or(Value::Null),
        coverage: optional("coverage"),
        consents: optional("consents"),
        answers: optional("answers"),
    };

    state
        .ehr
        .write_back(&request)
        .await
        .map(Json)
        .map_err(|e| {
            error!(marker = DEMO_MARKER, error = %e, "[DEMO] EHR write-back error");
            gateway_failure(e)
        })
}

/// Gateway request for the wizard's coverage step, filled from the demo records
pub fn demo_eligibility_request(
    session_id: &str,
    patient: &DemoPatient,
    coverage: &DemoCoverage,
) -> EligibilityRequest {
    EligibilityRequest {
        session_id: session_id.to_string(),
        payer_id: coverage.payer_id.clone(),
        member_id: coverage.member_id.clone(),
        dob: patient.dob.clone(),
        service_type: None,
    }
}

pub fn shared(
    clearinghouse: DemoClearinghouse,
) -> (Arc<dyn EligibilityChecker>, Arc<dyn EhrWriter>) {
    let clearinghouse = Arc::new(clearinghouse);
    let eligibility: Arc<dyn EligibilityChecker> = clearinghouse.clone();
    let ehr: Arc<dyn EhrWriter> = clearinghouse;
    (eligibility, ehr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;

    fn clearinghouse() -> DemoClearinghouse {
        DemoClearinghouse::new(
            Fixtures::bundled().unwrap().eligibility,
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    #[test]
    fn presence_follows_form_rules() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!(false)));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!(0)));
        assert!(is_present(&json!("x")));
        assert!(is_present(&json!(42)));
        assert!(is_present(&json!({})));

        let body = json!({ "sessionId": "s", "payerId": "p", "memberId": "", "dob": "d" });
        assert!(!has_fields(&body, &["sessionId", "payerId", "memberId", "dob"]));
        assert!(has_fields(&body, &["sessionId", "payerId"]));
    }

    #[tokio::test]
    async fn eligibility_echoes_member_id() {
        let request = EligibilityRequest {
            session_id: "demo-session".to_string(),
            payer_id: "BCBS-FL".to_string(),
            member_id: "XYZ987".to_string(),
            dob: "1985-06-15".to_string(),
            service_type: Some("30".to_string()),
        };
        let response = clearinghouse().check(&request).await.unwrap();
        assert!(response.ok);
        assert_eq!(response.status, "active");
        assert_eq!(response.raw271.subscriber_id, "XYZ987");
        assert!(response.summary().is_active());
    }

    #[tokio::test]
    async fn eligibility_rejects_blank_fields() {
        let request = EligibilityRequest {
            session_id: "demo-session".to_string(),
            payer_id: String::new(),
            member_id: "XYZ987".to_string(),
            dob: "1985-06-15".to_string(),
            service_type: None,
        };
        assert!(matches!(
            clearinghouse().check(&request).await,
            Err(GatewayError::MissingFields)
        ));
    }

    #[tokio::test]
    async fn write_back_names_resources_after_session() {
        let request = WriteBackRequest {
            session_id: "abc".to_string(),
            patient: json!({ "firstName": "Jane" }),
            coverage: None,
            consents: Some(json!({ "HIPAA_NPP": true })),
            answers: None,
        };
        let response = clearinghouse().write_back(&request).await.unwrap();

        let ids: Vec<_> = response
            .written_resources
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(
            ids,
            [
                "Patient/abc-patient",
                "Coverage/abc-coverage",
                "DocumentReference/abc-consents",
                "QuestionnaireResponse/abc-intake",
            ]
        );
        assert!(
            response.written_resources[2]
                .content_url
                .as_deref()
                .is_some_and(|url| url.ends_with("abc-consents.pdf"))
        );
        assert!(chrono::DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
    }
}
