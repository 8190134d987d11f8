use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::{ChatState, CollectedData};

/// Identifier of every node in the scripted conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Greeting,
    EmergencyCheck,
    IntentClassification,
    IdentityName,
    IdentityDob,
    LanguagePreference,
    ConsentIntro,
    ConsentConfirmation,
    MagicLinkOffer,
    ContactCollection,
    AppointmentScheduling,
    BillingRouting,
    PharmacyInfo,
    EndDemo,
    ErrorRecovery,
}

impl StepId {
    pub const ALL: [StepId; 15] = [
        StepId::Greeting,
        StepId::EmergencyCheck,
        StepId::IntentClassification,
        StepId::IdentityName,
        StepId::IdentityDob,
        StepId::LanguagePreference,
        StepId::ConsentIntro,
        StepId::ConsentConfirmation,
        StepId::MagicLinkOffer,
        StepId::ContactCollection,
        StepId::AppointmentScheduling,
        StepId::BillingRouting,
        StepId::PharmacyInfo,
        StepId::EndDemo,
        StepId::ErrorRecovery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Greeting => "greeting",
            StepId::EmergencyCheck => "emergency_check",
            StepId::IntentClassification => "intent_classification",
            StepId::IdentityName => "identity_name",
            StepId::IdentityDob => "identity_dob",
            StepId::LanguagePreference => "language_preference",
            StepId::ConsentIntro => "consent_intro",
            StepId::ConsentConfirmation => "consent_confirmation",
            StepId::MagicLinkOffer => "magic_link_offer",
            StepId::ContactCollection => "contact_collection",
            StepId::AppointmentScheduling => "appointment_scheduling",
            StepId::BillingRouting => "billing_routing",
            StepId::PharmacyInfo => "pharmacy_info",
            StepId::EndDemo => "end_demo",
            StepId::ErrorRecovery => "error_recovery",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node of the conversation.
///
/// Steps are pure: they read the state they are given and never hold any of
/// their own. Where a step goes next is decided by the edges of the
/// [`DialogueGraph`](crate::graph::DialogueGraph), not by the step itself.
pub trait Step: Send + Sync {
    /// Identifier this step is registered under
    fn id(&self) -> StepId;

    /// Text shown to the user when the conversation arrives at this step
    fn prompt(&self, state: &ChatState) -> String;

    /// Fields to merge into the collected data after the user answers
    fn extract(&self, _input: &str, _state: &ChatState) -> CollectedData {
        CollectedData::default()
    }

    /// Whether the answer is acceptable; a rejected answer keeps the user on this step
    fn validate(&self, _input: &str) -> bool {
        true
    }

    /// Re-prompt shown when `validate` rejects the answer
    fn error_message(&self) -> Option<&'static str> {
        None
    }
}
