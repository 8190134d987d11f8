//! Keyword classifiers used by the scripted conversation.
//!
//! Every check lower-cases the input and looks for plain substrings. This is a
//! naive stand-in for a real language-understanding service and it will
//! match inside longer words ("renew" contains "new").

use crate::state::Intent;

pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency",
    "911",
    "ambulance",
    "chest pain",
    "bleeding",
    "severe",
    "trouble breathing",
    "cant breathe",
    "heart attack",
    "stroke",
    "unconscious",
];

pub const NEW_PATIENT_KEYWORDS: &[&str] = &[
    "new patient",
    "intake",
    "first visit",
    "new",
    "register",
    "sign up",
];
pub const APPOINTMENT_KEYWORDS: &[&str] =
    &["appointment", "schedule", "book", "visit", "see doctor"];
pub const BILLING_KEYWORDS: &[&str] =
    &["billing", "bill", "payment", "insurance", "cost", "charge"];
pub const PHARMACY_KEYWORDS: &[&str] = &["pharmacy", "prescription", "medication", "drug"];

pub const CONSENT_YES: &[&str] = &[
    "yes", "i agree", "agree", "i do", "okay", "ok", "accept", "acepto", "sí",
];
pub const CONSENT_NO: &[&str] = &["disagree", "i do not", "don't", "reject", "no acepto"];

/// Precedence used by [`classify_intent`]; the first list that matches wins.
const INTENT_PRECEDENCE: &[(Intent, &[&str])] = &[
    (Intent::Emergency, EMERGENCY_KEYWORDS),
    (Intent::NewPatient, NEW_PATIENT_KEYWORDS),
    (Intent::Appointment, APPOINTMENT_KEYWORDS),
    (Intent::Billing, BILLING_KEYWORDS),
    (Intent::Pharmacy, PHARMACY_KEYWORDS),
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn detect_emergency(input: &str) -> bool {
    contains_any(&input.to_lowercase(), EMERGENCY_KEYWORDS)
}

pub fn classify_intent(input: &str) -> Intent {
    let lower = input.to_lowercase();
    INTENT_PRECEDENCE
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

/// `Some(true)` for agreement, `Some(false)` for refusal, `None` when unclear.
///
/// Refusal phrases are checked before agreement so that "I do not agree" is a
/// refusal. A bare "no" only counts as a whole word ("now" is not a refusal).
pub fn check_consent(input: &str) -> Option<bool> {
    let lower = input.to_lowercase();
    if contains_any(&lower, CONSENT_NO) {
        Some(false)
    } else if contains_any(&lower, CONSENT_YES) {
        Some(true)
    } else if lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "no")
    {
        Some(false)
    } else {
        None
    }
}
