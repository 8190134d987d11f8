use std::sync::Arc;

use crate::{
    classify::{classify_intent, detect_emergency},
    graph::{DialogueGraph, GraphBuilder},
    state::Intent,
    step::StepId,
    steps::*,
};

pub const INTAKE_FLOW_ID: &str = "intake_voice_demo";

fn intent_is(intent: Intent) -> impl Fn(&str, &crate::state::ChatState) -> bool {
    move |_, state| state.user_intent == Some(intent)
}

/// The voice-assistant conversation used by the demo
pub fn build_intake_flow() -> DialogueGraph {
    use StepId::*;

    GraphBuilder::new(INTAKE_FLOW_ID)
        .add_step(Arc::new(GreetingStep))
        .add_step(Arc::new(EmergencyCheckStep))
        .add_step(Arc::new(IntentClassificationStep))
        .add_step(Arc::new(IdentityNameStep))
        .add_step(Arc::new(IdentityDobStep))
        .add_step(Arc::new(LanguagePreferenceStep))
        .add_step(Arc::new(ConsentIntroStep))
        .add_step(Arc::new(ConsentConfirmationStep))
        .add_step(Arc::new(MagicLinkOfferStep))
        .add_step(Arc::new(ContactCollectionStep))
        .add_step(Arc::new(AppointmentSchedulingStep))
        .add_step(Arc::new(BillingRoutingStep))
        .add_step(Arc::new(PharmacyInfoStep))
        .add_step(Arc::new(EndDemoStep))
        .add_step(Arc::new(ErrorRecoveryStep))
        // greeting
        .add_conditional_edge(Greeting, EmergencyCheck, |input, _| detect_emergency(input))
        .add_edge(Greeting, IntentClassification)
        .add_edge(EmergencyCheck, IntentClassification)
        // intent routing, then one more attempt at reading the raw answer
        .add_conditional_edge(IntentClassification, IdentityName, intent_is(Intent::NewPatient))
        .add_conditional_edge(
            IntentClassification,
            AppointmentScheduling,
            intent_is(Intent::Appointment),
        )
        .add_conditional_edge(IntentClassification, BillingRouting, intent_is(Intent::Billing))
        .add_conditional_edge(IntentClassification, PharmacyInfo, intent_is(Intent::Pharmacy))
        .add_conditional_edge(IntentClassification, IdentityName, |input, _| {
            classify_intent(input) == Intent::NewPatient
        })
        .add_edge(IntentClassification, ErrorRecovery)
        // identity and consent
        .add_edge(IdentityName, IdentityDob)
        .add_edge(IdentityDob, LanguagePreference)
        .add_edge(LanguagePreference, ConsentIntro)
        .add_conditional_edge(ConsentIntro, ConsentIntro, |_, state| {
            state.collected.consent_given.is_none()
        })
        .add_edge(ConsentIntro, ConsentConfirmation)
        .add_conditional_edge(ConsentConfirmation, AppointmentScheduling, |_, state| {
            state.collected.consent_given == Some(false)
        })
        .add_edge(ConsentConfirmation, MagicLinkOffer)
        // magic link
        .add_conditional_edge(MagicLinkOffer, EndDemo, |input, _| {
            let lower = input.to_lowercase();
            lower.contains("continue") || lower.contains("voice")
        })
        .add_edge(MagicLinkOffer, ContactCollection)
        .add_edge(ContactCollection, EndDemo)
        // side branches all wind up at the end of the demo
        .add_edge(AppointmentScheduling, EndDemo)
        .add_edge(BillingRouting, EndDemo)
        .add_edge(PharmacyInfo, EndDemo)
        .add_edge(ErrorRecovery, IntentClassification)
        .add_edge(EndDemo, EndDemo)
        .set_start_step(Greeting)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::TurnStatus,
        state::{ChatState, CollectedData, Language, MessageRole},
    };
    use chrono::Utc;

    fn run(inputs: &[&str]) -> ChatState {
        let graph = build_intake_flow();
        let now = Utc::now();
        let mut state = graph.start(now).unwrap();
        for input in inputs {
            state = graph.advance(&state, input, now).unwrap().state;
        }
        state
    }

    fn sample_states() -> Vec<ChatState> {
        let mut states = vec![ChatState::new()];
        for intent in [
            Intent::NewPatient,
            Intent::Appointment,
            Intent::Billing,
            Intent::Pharmacy,
            Intent::Emergency,
            Intent::Unknown,
        ] {
            states.push(ChatState {
                user_intent: Some(intent),
                ..ChatState::new()
            });
        }
        for (language, consent) in [
            (Language::Es, Some(false)),
            (Language::Es, Some(true)),
            (Language::En, Some(false)),
        ] {
            states.push(ChatState {
                collected: CollectedData {
                    first_name: Some("Ana".to_string()),
                    date_of_birth: Some("01/02/1990".to_string()),
                    language: Some(language),
                    email: Some("ana@example.com".to_string()),
                    consent_given: consent,
                    ..Default::default()
                },
                ..ChatState::new()
            });
        }
        states
    }

    #[test]
    fn every_step_prompt_is_non_empty() {
        let graph = build_intake_flow();
        for state in sample_states() {
            for step in StepId::ALL {
                let prompt = graph.prompt(step, &state).unwrap();
                assert!(!prompt.trim().is_empty(), "empty prompt for {step}");
            }
        }
    }

    #[test]
    fn every_step_has_a_way_out() {
        let graph = build_intake_flow();
        let state = ChatState::new();
        for step in StepId::ALL {
            assert!(graph.next_step(step, "hmm", &state).is_ok(), "dead end at {step}");
        }
    }

    #[test]
    fn new_patient_walkthrough_collects_fields() {
        let state = run(&[
            "new patient intake",
            "ok",
            "Jane Doe",
            "06/15/1985",
            "English",
            "I agree",
            "ok",
            "555-012-3456",
            "sure",
        ]);

        assert_eq!(state.current_step, StepId::EndDemo);
        assert_eq!(state.collected.first_name.as_deref(), Some("Jane"));
        assert_eq!(state.collected.last_name.as_deref(), Some("Doe"));
        assert_eq!(state.collected.date_of_birth.as_deref(), Some("06/15/1985"));
        assert_eq!(state.collected.language, Some(Language::En));
        assert_eq!(state.collected.consent_given, Some(true));
        assert!(state.collected.consent_timestamp.is_some());
        assert_eq!(state.collected.phone.as_deref(), Some("555-012-3456"));
        assert!(!state.has_emergency);
    }

    #[test]
    fn greeting_routes_by_intent() {
        let graph = build_intake_flow();
        let now = Utc::now();
        let start = graph.start(now).unwrap();

        let turn = graph.advance(&start, "I'd like to see doctor", now).unwrap();
        assert_eq!(turn.state.current_step, StepId::IntentClassification);
        assert_eq!(turn.state.user_intent, Some(Intent::Appointment));

        let turn = graph.advance(&turn.state, "yes please", now).unwrap();
        // "yes please" classifies as unknown, which keeps the stored intent
        assert_eq!(turn.state.current_step, StepId::AppointmentScheduling);
    }

    #[test]
    fn unknown_input_goes_to_recovery_and_back() {
        let state = run(&["hello", "still nothing"]);
        assert_eq!(state.current_step, StepId::ErrorRecovery);

        let state = run(&["hello", "still nothing", "whatever"]);
        assert_eq!(state.current_step, StepId::IntentClassification);
    }

    #[test]
    fn emergency_redirects_from_any_step() {
        let graph = build_intake_flow();
        let now = Utc::now();
        let state = run(&["new patient", "ok", "Jane Doe"]);
        assert_eq!(state.current_step, StepId::IdentityDob);

        let turn = graph.advance(&state, "I have chest pain", now).unwrap();
        assert_eq!(turn.status, TurnStatus::EmergencyRedirect);
        assert_eq!(turn.state.current_step, StepId::EmergencyCheck);
        assert!(turn.state.has_emergency);
        assert!(turn.response.content.contains("9-1-1"));

        let turn = graph.advance(&turn.state, "I'm fine now", now).unwrap();
        assert_eq!(turn.state.current_step, StepId::IntentClassification);
    }

    #[test]
    fn bad_date_reprompts_without_advancing() {
        let graph = build_intake_flow();
        let now = Utc::now();
        let state = run(&["new patient", "ok", "Jane Doe"]);

        let turn = graph.advance(&state, "sometime in June", now).unwrap();
        assert_eq!(turn.status, TurnStatus::Reprompted);
        assert_eq!(turn.state.current_step, StepId::IdentityDob);
        assert_eq!(turn.response.role, MessageRole::System);
        assert!(turn.response.content.contains("MM/DD/YYYY"));
        assert_eq!(turn.state.collected.date_of_birth, None);

        // no retry limit
        let turn = graph.advance(&turn.state, "still not sure", now).unwrap();
        assert_eq!(turn.status, TurnStatus::Reprompted);
        let turn = graph.advance(&turn.state, "06/15/1985", now).unwrap();
        assert_eq!(turn.state.current_step, StepId::LanguagePreference);
    }

    #[test]
    fn refused_consent_offers_appointment() {
        let state = run(&[
            "new patient",
            "ok",
            "Jane Doe",
            "06/15/1985",
            "English",
            "no",
            "ok",
        ]);
        assert_eq!(state.collected.consent_given, Some(false));
        assert_eq!(state.current_step, StepId::AppointmentScheduling);
    }

    #[test]
    fn unclear_consent_leaves_data_untouched() {
        let state = run(&[
            "new patient",
            "ok",
            "Jane Doe",
            "06/15/1985",
            "English",
            "hmm",
        ]);
        assert_eq!(state.current_step, StepId::ConsentIntro);
        assert_eq!(state.collected.consent_given, None);
        assert_eq!(state.collected.consent_timestamp, None);
    }

    #[test]
    fn spanish_prompts_after_language_choice() {
        let state = run(&["new patient", "ok", "Ana Lopez", "01/02/1990", "Español"]);
        assert_eq!(state.current_step, StepId::ConsentIntro);
        let last = state.last_message().unwrap();
        assert!(last.content.contains("aviso de privacidad"));
    }

    #[test]
    fn end_demo_continue_marks_handoff() {
        let state = run(&["pharmacy", "ok", "sure", "continue to intake"]);
        assert_eq!(state.current_step, StepId::EndDemo);
        assert!(state.is_complete);
        assert!(state.continue_to_intake);

        let state = run(&["billing", "ok", "sure", "end demo"]);
        assert!(state.is_complete);
        assert!(!state.continue_to_intake);
    }

    #[test]
    fn magic_link_voice_option_skips_contact() {
        let state = run(&[
            "new patient",
            "ok",
            "Jane Doe",
            "06/15/1985",
            "English",
            "yes",
            "ok",
            "continue by voice",
        ]);
        assert_eq!(state.current_step, StepId::EndDemo);
        assert!(!state.is_complete);
    }
}
