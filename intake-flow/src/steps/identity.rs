use crate::{
    extract::{extract_dob, extract_language, extract_name},
    state::{ChatState, CollectedData},
    step::{Step, StepId},
};

pub struct IdentityNameStep;

impl Step for IdentityNameStep {
    fn id(&self) -> StepId {
        StepId::IdentityName
    }

    fn prompt(&self, _state: &ChatState) -> String {
        "Perfect! Let's get started. What's your **first and last name**?".to_string()
    }

    fn extract(&self, input: &str, _state: &ChatState) -> CollectedData {
        let name = extract_name(input);
        CollectedData {
            first_name: name.first_name,
            last_name: name.last_name,
            ..Default::default()
        }
    }
}

/// The only step that validates its answer: no date, no progress
pub struct IdentityDobStep;

impl Step for IdentityDobStep {
    fn id(&self) -> StepId {
        StepId::IdentityDob
    }

    fn prompt(&self, state: &ChatState) -> String {
        let name = state.collected.first_name.as_deref().unwrap_or("there");
        format!("Thanks, {name}! And what's your **date of birth**? (MM/DD/YYYY)")
    }

    fn extract(&self, input: &str, _state: &ChatState) -> CollectedData {
        CollectedData {
            date_of_birth: extract_dob(input),
            ..Default::default()
        }
    }

    fn validate(&self, input: &str) -> bool {
        extract_dob(input).is_some()
    }

    fn error_message(&self) -> Option<&'static str> {
        Some(
            "I didn't catch that date. Please enter your date of birth in MM/DD/YYYY format (for example, 06/15/1985).",
        )
    }
}

pub struct LanguagePreferenceStep;

impl Step for LanguagePreferenceStep {
    fn id(&self) -> StepId {
        StepId::LanguagePreference
    }

    fn prompt(&self, _state: &ChatState) -> String {
        "Would you like to continue in **English** or **Spanish**?

(Just say \"English\" or \"Español\")"
            .to_string()
    }

    fn extract(&self, input: &str, _state: &ChatState) -> CollectedData {
        CollectedData {
            language: Some(extract_language(input)),
            ..Default::default()
        }
    }
}
