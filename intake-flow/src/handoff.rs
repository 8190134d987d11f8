use serde::{Deserialize, Serialize};

use crate::state::{ChatState, CollectedData, Language};

/// Fields carried from the voice conversation into the intake wizard.
///
/// Stored on the session only and taken exactly once by the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub language: Language,
    pub consent_given: bool,
}

impl From<&CollectedData> for HandoffPayload {
    fn from(collected: &CollectedData) -> Self {
        Self {
            first_name: collected.first_name.clone(),
            last_name: collected.last_name.clone(),
            date_of_birth: collected.date_of_birth.clone(),
            phone: collected.phone.clone(),
            language: collected.language_or_default(),
            consent_given: collected.consent_given.unwrap_or(false),
        }
    }
}

impl From<&ChatState> for HandoffPayload {
    fn from(state: &ChatState) -> Self {
        Self::from(&state.collected)
    }
}

impl HandoffPayload {
    /// Route the wizard is opened on. Carries the session id only, never PHI.
    pub fn wizard_url(session_id: &str) -> String {
        format!("/new-patient?from=voice&session={session_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_from_collected_data() {
        let collected = CollectedData {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            date_of_birth: Some("06/15/1985".to_string()),
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };
        let payload = HandoffPayload::from(&collected);

        assert_eq!(payload.first_name.as_deref(), Some("Jane"));
        assert_eq!(payload.phone, None);
        assert_eq!(payload.language, Language::En);
        assert!(!payload.consent_given);
    }

    #[test]
    fn wizard_url_has_no_phi() {
        let url = HandoffPayload::wizard_url("8b0c3c1e");
        assert_eq!(url, "/new-patient?from=voice&session=8b0c3c1e");
    }
}
