use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::step::StepId;

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Assistant,
    User,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// What the caller is trying to do, as classified from free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NewPatient,
    Appointment,
    Billing,
    Pharmacy,
    Emergency,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Es,
            Language::Es => Language::En,
        }
    }

    pub fn is_spanish(self) -> bool {
        matches!(self, Language::Es)
    }
}

/// Fields gathered over the course of a conversation.
///
/// Also used as a partial update: `merge` only overwrites fields that are set
/// on the incoming value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_given: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_timestamp: Option<DateTime<Utc>>,
}

impl CollectedData {
    pub fn merge(mut self, update: CollectedData) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if update.$field.is_some() { self.$field = update.$field; })*
            };
        }
        take!(
            first_name,
            last_name,
            date_of_birth,
            language,
            phone,
            email,
            consent_given,
            consent_timestamp
        );
        self
    }

    pub fn language_or_default(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        *self == CollectedData::default()
    }
}

/// Complete conversation state.
///
/// Treated as an immutable value: the engine takes a reference and hands back
/// a new state for every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatState {
    pub current_step: StepId,
    pub messages: Vec<ChatMessage>,
    pub user_intent: Option<Intent>,
    pub collected: CollectedData,
    pub has_emergency: bool,
    pub is_complete: bool,
    pub continue_to_intake: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            current_step: StepId::Greeting,
            messages: Vec::new(),
            user_intent: None,
            collected: CollectedData::default(),
            has_emergency: false,
            is_complete: false,
            continue_to_intake: false,
        }
    }

    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_existing_fields() {
        let base = CollectedData {
            first_name: Some("Jane".to_string()),
            ..Default::default()
        };
        let merged = base.merge(CollectedData {
            date_of_birth: Some("06/15/1985".to_string()),
            ..Default::default()
        });

        assert_eq!(merged.first_name.as_deref(), Some("Jane"));
        assert_eq!(merged.date_of_birth.as_deref(), Some("06/15/1985"));
    }

    #[test]
    fn default_state_starts_at_greeting() {
        let state = ChatState::default();
        assert_eq!(state.current_step, StepId::Greeting);
        assert!(state.messages.is_empty());
        assert!(!state.has_emergency && !state.is_complete);
    }

    #[test]
    fn language_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Es).unwrap(), "\"es\"");
        assert_eq!(Language::En.toggled(), Language::Es);
    }
}
