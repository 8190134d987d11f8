//! Heuristic field extraction from free-text answers.

use regex::Regex;
use std::sync::LazyLock;

use crate::state::Language;

static DOB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}").expect("Invalid regex"));

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3}[-.\s]?\d{3}[-.\s]?\d{4}").expect("Invalid regex"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("Invalid regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedName {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContact {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// First word is the first name, everything after it the last name
pub fn extract_name(input: &str) -> ExtractedName {
    let mut words = input.split_whitespace();
    let first_name = words.next().map(str::to_string);
    let rest: Vec<&str> = words.collect();
    let last_name = (!rest.is_empty()).then(|| rest.join(" "));
    ExtractedName {
        first_name,
        last_name,
    }
}

/// Loose `MM/DD/YYYY`-like match; no calendar validation
pub fn extract_dob(input: &str) -> Option<String> {
    DOB_PATTERN.find(input).map(|m| m.as_str().to_string())
}

pub fn extract_contact(input: &str) -> ExtractedContact {
    ExtractedContact {
        phone: PHONE_PATTERN.find(input).map(|m| m.as_str().to_string()),
        email: EMAIL_PATTERN.find(input).map(|m| m.as_str().to_string()),
    }
}

pub fn extract_language(input: &str) -> Language {
    let lower = input.to_lowercase();
    if lower.contains("spanish") || lower.contains("español") {
        Language::Es
    } else {
        Language::En
    }
}

/// True when the text contains something shaped like a date of birth or a
/// phone number. Used to keep such values out of unmarked log lines.
pub fn looks_like_phi(text: &str) -> bool {
    DOB_PATTERN.is_match(text) || PHONE_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_splits_on_whitespace() {
        let name = extract_name("  Jane   van der Berg ");
        assert_eq!(name.first_name.as_deref(), Some("Jane"));
        assert_eq!(name.last_name.as_deref(), Some("van der Berg"));

        let single = extract_name("Cher");
        assert_eq!(single.first_name.as_deref(), Some("Cher"));
        assert_eq!(single.last_name, None);

        assert_eq!(extract_name("   "), ExtractedName::default());
    }

    #[test]
    fn dob_accepts_loose_formats() {
        assert_eq!(extract_dob("born 06/15/1985"), Some("06/15/1985".to_string()));
        assert_eq!(extract_dob("6-5-85"), Some("6-5-85".to_string()));
        assert_eq!(extract_dob("June fifteenth"), None);
    }

    #[test]
    fn contact_finds_phone_and_email() {
        let contact = extract_contact("call 555-123-4567 or jane.demo@example.com");
        assert_eq!(contact.phone.as_deref(), Some("555-123-4567"));
        assert_eq!(contact.email.as_deref(), Some("jane.demo@example.com"));

        let none = extract_contact("no thanks");
        assert_eq!(none, ExtractedContact::default());
    }

    #[test]
    fn language_defaults_to_english() {
        assert_eq!(extract_language("Español por favor"), Language::Es);
        assert_eq!(extract_language("Spanish"), Language::Es);
        assert_eq!(extract_language("whatever"), Language::En);
    }

    #[test]
    fn phi_shapes() {
        assert!(looks_like_phi("dob=06/15/1985"));
        assert!(looks_like_phi("phone 555.012.3456"));
        assert!(!looks_like_phi("session demo-session"));
    }
}
