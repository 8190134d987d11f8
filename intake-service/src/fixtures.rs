//! Static demo records, loaded once at startup and never mutated.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use intake_flow::REQUIRED_CONSENTS;

const BUNDLED: &str = include_str!("../fixtures/demo.yaml");

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixtures from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid fixtures: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Fixtures must define exactly the consent types {expected:?}")]
    ConsentTypes { expected: Vec<&'static str> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoPatient {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub phone: String,
    pub email: String,
    pub lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoCoverage {
    pub payer_name: String,
    pub payer_id: String,
    pub plan_id: String,
    pub member_id: String,
    pub group_id: String,
    pub status: String,
    pub copay: String,
    pub deductible: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoPharmacy {
    pub ncpdp_id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Canned clearinghouse answer; the subscriber id is echoed from the request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityTemplate {
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
    pub raw271: Raw271Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raw271Template {
    pub trading_partner_service_id: String,
    pub group_number: String,
    pub plan_coverage_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentType {
    pub id: String,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub severity: Severity,
    pub description: String,
    pub recommended_action: String,
    pub block_submission: bool,
    #[serde(default)]
    pub staff_alert: bool,
    #[serde(default)]
    pub nurse_alert: bool,
    #[serde(default)]
    pub auto_reminder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyNotes {
    pub design: String,
    pub ml: String,
    pub audit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRuleSet {
    pub rules: Vec<AnomalyRule>,
    pub notes: AnomalyNotes,
}

impl AnomalyRuleSet {
    pub fn rule(&self, rule_type: &str) -> Option<&AnomalyRule> {
        self.rules.iter().find(|rule| rule.rule_type == rule_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixtures {
    pub patient: DemoPatient,
    pub coverage: DemoCoverage,
    pub pharmacy: DemoPharmacy,
    pub eligibility: EligibilityTemplate,
    pub consent_types: Vec<ConsentType>,
    pub anomaly_rules: AnomalyRuleSet,
}

impl Fixtures {
    /// Fixtures compiled into the binary
    pub fn bundled() -> Result<Self, FixtureError> {
        Self::parse(BUNDLED)
    }

    /// Fixtures from `path` when given, the bundled ones otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, FixtureError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                info!(path = %path.display(), "Loading fixtures from file");
                Self::parse(&raw)
            }
            None => Self::bundled(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FixtureError> {
        let fixtures: Fixtures = serde_yaml::from_str(raw)?;

        let mut ids: Vec<&str> = fixtures.consent_types.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        let mut expected = REQUIRED_CONSENTS.to_vec();
        expected.sort_unstable();
        if ids != expected {
            return Err(FixtureError::ConsentTypes {
                expected: REQUIRED_CONSENTS.to_vec(),
            });
        }

        Ok(fixtures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> Fixtures {
        Fixtures::bundled().unwrap()
    }

    #[test]
    fn bundled_fixtures_parse() {
        let fixtures = fixtures();
        assert_eq!(fixtures.patient.dob, "1985-06-15");
        assert_eq!(fixtures.coverage.member_id, "ABC123456789");
        assert_eq!(fixtures.eligibility.raw271.trading_partner_service_id, "BCBS-FL");
        assert!(fixtures.eligibility.termination_date.is_none());
        assert!(fixtures.pharmacy.name.contains("(DEMO)"));
    }

    #[test]
    fn consent_copy() {
        let fixtures = fixtures();
        assert_eq!(fixtures.consent_types.len(), 4);
        let by_id = |id: &str| {
            fixtures
                .consent_types
                .iter()
                .find(|c| c.id == id)
                .unwrap()
                .clone()
        };
        assert!(by_id("HIPAA_NPP").label.contains("HIPAA"));
        assert!(by_id("HIPAA_NPP").description.contains("health information"));
        assert!(by_id("CONSENT_TREAT").label.contains("consent to treatment"));
        assert!(by_id("FIN_RESP").description.contains("charges"));
        assert!(by_id("TCPA").description.contains("text messages"));
        assert!(by_id("TCPA").description.to_lowercase().contains("stop"));
    }

    #[test]
    fn anomalies_never_block_and_high_severity_alerts_staff() {
        let rules = fixtures().anomaly_rules;
        for rule in &rules.rules {
            assert!(!rule.block_submission, "{} blocks submission", rule.rule_type);
            if matches!(rule.severity, Severity::High | Severity::Critical) {
                assert!(rule.staff_alert, "{} does not alert staff", rule.rule_type);
            }
            if let Some(message) = &rule.patient_message {
                for word in ["ERROR", "FAILED", "INVALID"] {
                    assert!(!message.contains(word));
                }
            }
        }
        assert!(rules.notes.design.contains("NEVER block"));
        assert!(rules.notes.design.contains("route to staff"));
        assert!(rules.notes.ml.contains("Phase 2") && rules.notes.ml.contains("ML"));
        assert!(rules.notes.audit.contains("logged") && rules.notes.audit.contains("timestamp"));
    }

    #[test]
    fn specific_anomaly_rules() {
        let rules = fixtures().anomaly_rules;

        let inactive = rules.rule("INSURANCE_INACTIVE").unwrap();
        assert_eq!(inactive.severity, Severity::High);
        assert_eq!(rules.rule("INSURANCE_MISMATCH").unwrap().severity, Severity::Medium);
        assert!(rules.rule("MISSING_REFERRAL").unwrap().recommended_action.contains("referral"));
        assert!(rules.rule("MISSING_AUTH").unwrap().recommended_action.contains("authorization"));
        assert!(rules.rule("DUPLICATE_PATIENT").unwrap().description.contains("phone + DOB"));
        let conflict = rules.rule("MED_ALLERGY_CONFLICT").unwrap();
        assert!(conflict.recommended_action.contains("clinician"));

        let red_flag = rules.rule("RED_FLAG_CLINICAL").unwrap();
        assert_eq!(red_flag.severity, Severity::Critical);
        assert!(red_flag.nurse_alert);
        assert!(red_flag.recommended_action.to_uppercase().contains("IMMEDIATE"));
        let message = red_flag.patient_message.as_deref().unwrap();
        assert!(message.contains("nurse will call"));
        assert!(!message.contains("emergency"));

        let incomplete = rules.rule("INCOMPLETE_INTAKE").unwrap();
        assert_eq!(incomplete.severity, Severity::Low);
        assert!(incomplete.auto_reminder);
        assert!(incomplete.recommended_action.contains("reminder"));
    }

    #[test]
    fn missing_consent_type_is_rejected() {
        let trimmed = BUNDLED.replace("  - id: TCPA\n", "  - id: MARKETING\n");
        assert!(matches!(
            Fixtures::parse(&trimmed),
            Err(FixtureError::ConsentTypes { .. })
        ));
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = Fixtures::load(Some(Path::new("/nonexistent/demo.yaml"))).unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }
}
