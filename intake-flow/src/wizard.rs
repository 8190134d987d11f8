//! Five-step intake wizard.
//!
//! The wizard is a reducer: [`IntakeState::apply`] takes the current state and
//! one [`WizardAction`] and returns the next state, leaving the input alone.
//! Side effects that belong to a step (the OTP wait, the eligibility lookup,
//! the EHR write-back) are performed by the caller, which then records their
//! outcome through an action.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{
    error::{FlowError, Result},
    handoff::HandoffPayload,
    state::Language,
};

/// Consents that must all be checked before leaving the consent step
pub const REQUIRED_CONSENTS: [&str; 4] = ["HIPAA_NPP", "CONSENT_TREAT", "FIN_RESP", "TCPA"];

/// Question ids used in `answers`
pub const ANSWER_NAME: &str = "name";
pub const ANSWER_DOB: &str = "dob";
pub const ANSWER_REASON: &str = "reason";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Verify,
    Consent,
    Coverage,
    History,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Verify,
        WizardStep::Consent,
        WizardStep::Coverage,
        WizardStep::History,
        WizardStep::Review,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Verify => "verify",
            WizardStep::Consent => "consent",
            WizardStep::Coverage => "coverage",
            WizardStep::History => "history",
            WizardStep::Review => "review",
        }
    }

    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Verify => Some(WizardStep::Consent),
            WizardStep::Consent => Some(WizardStep::Coverage),
            WizardStep::Coverage => Some(WizardStep::History),
            WizardStep::History => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    pub fn prev(self) -> Option<WizardStep> {
        match self {
            WizardStep::Verify => None,
            WizardStep::Consent => Some(WizardStep::Verify),
            WizardStep::Coverage => Some(WizardStep::Consent),
            WizardStep::History => Some(WizardStep::Coverage),
            WizardStep::Review => Some(WizardStep::History),
        }
    }

    /// 1-based position shown in the progress indicator
    pub fn position(self) -> usize {
        Self::ALL.iter().position(|step| *step == self).unwrap_or(0) + 1
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of an uploaded insurance-card image. The bytes are never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

/// Everything the patient has typed or attached so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeData {
    pub phone: String,
    pub otp: String,
    pub consents: BTreeMap<String, bool>,
    pub insurance_front: Option<UploadedFile>,
    pub insurance_back: Option<UploadedFile>,
    pub answers: BTreeMap<String, String>,
    pub language: Language,
}

impl IntakeData {
    pub fn answer(&self, id: &str) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    pub fn all_consents_given(&self) -> bool {
        REQUIRED_CONSENTS
            .iter()
            .all(|id| self.consents.get(*id).copied().unwrap_or(false))
    }
}

/// The parts of an eligibility response the review step shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilitySummary {
    pub status: String,
    pub copay: Option<String>,
    pub deductible: Option<String>,
    pub plan_type: Option<String>,
    pub notes: Option<String>,
}

impl EligibilitySummary {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Localized banner shown above the review card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBanner {
    pub active: bool,
    pub title: String,
    pub description: String,
}

/// One user action on the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardAction {
    SetPhone { phone: String },
    SetOtp { otp: String },
    SetConsent { id: String, checked: bool },
    AttachFront { file: UploadedFile },
    AttachBack { file: UploadedFile },
    SetAnswer { id: String, value: String },
    ToggleLanguage,
    RecordEligibility { summary: EligibilitySummary },
    Advance,
    Back,
    MarkSubmitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeState {
    pub step: WizardStep,
    pub data: IntakeData,
    pub eligibility: Option<EligibilitySummary>,
    pub voice_data_loaded: bool,
    pub submitted: bool,
}

impl Default for IntakeState {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeState {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Verify,
            data: IntakeData::default(),
            eligibility: None,
            voice_data_loaded: false,
            submitted: false,
        }
    }

    /// Wizard pre-filled from a finished voice conversation.
    ///
    /// A caller who already gave consent by voice lands on the consent step.
    pub fn from_handoff(payload: &HandoffPayload) -> Self {
        let mut data = IntakeData {
            language: payload.language,
            ..Default::default()
        };
        if let Some(phone) = &payload.phone {
            data.phone = phone.clone();
        }

        let full_name = [payload.first_name.as_deref(), payload.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !full_name.is_empty() {
            data.answers.insert(ANSWER_NAME.to_string(), full_name);
        }
        if let Some(dob) = &payload.date_of_birth {
            data.answers.insert(ANSWER_DOB.to_string(), dob.clone());
        }

        let step = if payload.consent_given {
            WizardStep::Consent
        } else {
            WizardStep::Verify
        };

        Self {
            step,
            data,
            eligibility: None,
            voice_data_loaded: true,
            submitted: false,
        }
    }

    /// Why the current step cannot be left yet, if anything.
    ///
    /// On review every earlier gate except verify is checked again, since a
    /// caller handed off from the voice assistant starts past verify.
    pub fn blocked_reason(&self) -> Option<&'static str> {
        match self.step {
            WizardStep::Review if self.submitted => Some("intake already submitted"),
            WizardStep::Review => {
                [WizardStep::Consent, WizardStep::Coverage, WizardStep::History]
                    .into_iter()
                    .find_map(|step| self.step_blocker(step))
            }
            step => self.step_blocker(step),
        }
    }

    fn step_blocker(&self, step: WizardStep) -> Option<&'static str> {
        let data = &self.data;
        match step {
            WizardStep::Verify if data.phone.trim().is_empty() => Some("phone number is required"),
            WizardStep::Verify if data.otp.trim().is_empty() => {
                Some("verification code is required")
            }
            WizardStep::Consent if !data.all_consents_given() => {
                Some("all consents must be accepted")
            }
            WizardStep::Coverage
                if data.insurance_front.is_none() || data.insurance_back.is_none() =>
            {
                Some("both sides of the insurance card are required")
            }
            WizardStep::Coverage if self.eligibility.is_none() => {
                Some("coverage has not been checked")
            }
            WizardStep::History
                if data.answer(ANSWER_REASON).is_none_or(|reason| reason.trim().is_empty()) =>
            {
                Some("reason for visit is required")
            }
            _ => None,
        }
    }

    pub fn can_advance(&self) -> bool {
        self.blocked_reason().is_none()
    }

    /// Coverage cards are attached, only the eligibility lookup is missing
    pub fn ready_for_eligibility(&self) -> bool {
        self.step == WizardStep::Coverage
            && self.data.insurance_front.is_some()
            && self.data.insurance_back.is_some()
    }

    fn gate(&self) -> Result<()> {
        match self.blocked_reason() {
            Some(reason) => Err(FlowError::WizardGate {
                step: self.step,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Apply one action and return the resulting state
    pub fn apply(&self, action: WizardAction) -> Result<IntakeState> {
        let mut next = self.clone();
        match action {
            WizardAction::SetPhone { phone } => next.data.phone = phone,
            WizardAction::SetOtp { otp } => next.data.otp = otp,
            WizardAction::SetConsent { id, checked } => {
                if self.step != WizardStep::Consent {
                    return Err(FlowError::InvalidTransition(format!(
                        "consents can only be changed on the consent step, not {}",
                        self.step
                    )));
                }
                if !REQUIRED_CONSENTS.contains(&id.as_str()) {
                    return Err(FlowError::InvalidTransition(format!(
                        "unknown consent id: {id}"
                    )));
                }
                next.data.consents.insert(id, checked);
            }
            // a new image invalidates the coverage check made on the old one
            WizardAction::AttachFront { file } => {
                next.data.insurance_front = Some(file);
                next.eligibility = None;
            }
            WizardAction::AttachBack { file } => {
                next.data.insurance_back = Some(file);
                next.eligibility = None;
            }
            WizardAction::SetAnswer { id, value } => {
                next.data.answers.insert(id, value);
            }
            WizardAction::ToggleLanguage => next.data.language = next.data.language.toggled(),
            WizardAction::RecordEligibility { summary } => {
                if !self.ready_for_eligibility() {
                    return Err(FlowError::InvalidTransition(
                        "eligibility can only be recorded once both card images are attached"
                            .to_string(),
                    ));
                }
                next.eligibility = Some(summary);
            }
            WizardAction::Advance => {
                self.gate()?;
                next.step = self.step.next().ok_or_else(|| {
                    FlowError::InvalidTransition("review is the last step".to_string())
                })?;
            }
            WizardAction::Back => {
                next.step = self.step.prev().ok_or_else(|| {
                    FlowError::InvalidTransition("verify is the first step".to_string())
                })?;
            }
            WizardAction::MarkSubmitted => {
                if self.step != WizardStep::Review {
                    return Err(FlowError::InvalidTransition(format!(
                        "cannot submit from step {}",
                        self.step
                    )));
                }
                self.gate()?;
                next.submitted = true;
            }
        }
        Ok(next)
    }

    pub fn review_banner(&self) -> Option<ReviewBanner> {
        let eligibility = self.eligibility.as_ref()?;
        let spanish = self.data.language.is_spanish();

        let banner = if eligibility.is_active() {
            let copay = eligibility.copay.as_deref().unwrap_or("0.00");
            let deductible = eligibility.deductible.as_deref().unwrap_or("0.00");
            if spanish {
                ReviewBanner {
                    active: true,
                    title: "Cobertura Activa".to_string(),
                    description: format!(
                        "Copago estimado: ${copay}. Deducible restante: ${deductible}."
                    ),
                }
            } else {
                ReviewBanner {
                    active: true,
                    title: "Coverage Active".to_string(),
                    description: format!(
                        "Estimated copay: ${copay}. Remaining deductible: ${deductible}."
                    ),
                }
            }
        } else if spanish {
            ReviewBanner {
                active: false,
                title: "Problema de Cobertura".to_string(),
                description: "Confirmaremos los detalles con su proveedor antes de su visita."
                    .to_string(),
            }
        } else {
            ReviewBanner {
                active: false,
                title: "Coverage Issue".to_string(),
                description: "We'll confirm details with your provider before your visit."
                    .to_string(),
            }
        };
        Some(banner)
    }
}
