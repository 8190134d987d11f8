use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    classify::{classify_intent, detect_emergency},
    error::{FlowError, Result},
    state::{ChatMessage, ChatState, Intent, MessageRole},
    step::{Step, StepId},
};

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&str, &ChatState) -> bool + Send + Sync>;

/// Edge between steps in the graph
#[derive(Clone)]
pub struct Edge {
    pub from: StepId,
    pub to: StepId,
    pub condition: Option<EdgeCondition>,
}

/// The scripted conversation: registered steps plus the edges between them
pub struct DialogueGraph {
    pub id: String,
    steps: HashMap<StepId, Arc<dyn Step>>,
    edges: Vec<Edge>,
    start_step: StepId,
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Moved on to the next step and is waiting for the next answer
    Advanced,
    /// The answer was rejected; the same step is waiting again
    Reprompted,
    /// An emergency keyword forced the emergency notice
    EmergencyRedirect,
    /// The caller chose to leave the demo or continue to the intake wizard
    Completed,
}

/// Result of feeding one user message to the graph
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub state: ChatState,
    pub response: ChatMessage,
    pub status: TurnStatus,
}

impl DialogueGraph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: HashMap::new(),
            edges: Vec::new(),
            start_step: StepId::Greeting,
        }
    }

    pub fn start_step(&self) -> StepId {
        self.start_step
    }

    fn step(&self, step_id: StepId) -> Result<&Arc<dyn Step>> {
        self.steps
            .get(&step_id)
            .ok_or(FlowError::StepNotFound(step_id))
    }

    /// Prompt text of a step for the given state
    pub fn prompt(&self, step_id: StepId, state: &ChatState) -> Result<String> {
        Ok(self.step(step_id)?.prompt(state))
    }

    /// Conditional edges are tried in the order they were added; the
    /// unconditional edge is the fallback.
    pub fn next_step(&self, from: StepId, input: &str, state: &ChatState) -> Result<StepId> {
        let outgoing = || self.edges.iter().filter(move |edge| edge.from == from);

        let conditional = outgoing().find(|edge| {
            edge.condition
                .as_ref()
                .is_some_and(|condition| condition(input, state))
        });
        if let Some(edge) = conditional {
            return Ok(edge.to);
        }

        outgoing()
            .find(|edge| edge.condition.is_none())
            .map(|edge| edge.to)
            .ok_or(FlowError::NoTransition(from))
    }

    /// Fresh conversation with the opening prompt already posted
    pub fn start(&self, now: DateTime<Utc>) -> Result<ChatState> {
        let state = ChatState {
            current_step: self.start_step,
            ..ChatState::new()
        };
        let greeting = self.prompt(self.start_step, &state)?;
        Ok(state.with_message(ChatMessage::new(MessageRole::Assistant, greeting, now)))
    }

    /// Process one user message and return the resulting state.
    ///
    /// The input state is never modified.
    pub fn advance(
        &self,
        state: &ChatState,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<TurnResult> {
        if input.trim().is_empty() {
            return Err(FlowError::EmptyInput);
        }

        let current = state.current_step;
        let mut next_state = state
            .clone()
            .with_message(ChatMessage::new(MessageRole::User, input, now));

        // Checked on every turn, whatever step we are on
        if detect_emergency(input) {
            debug!(graph_id = %self.id, from = %current, "Emergency keyword detected");
            next_state.has_emergency = true;
            next_state.current_step = StepId::EmergencyCheck;
            let notice = self.prompt(StepId::EmergencyCheck, &next_state)?;
            return Ok(self.reply(next_state, notice, now, TurnStatus::EmergencyRedirect));
        }

        // A follow-up like "ok" must not erase an intent we already know
        match (current, classify_intent(input)) {
            (StepId::Greeting, intent) => next_state.user_intent = Some(intent),
            (StepId::IntentClassification, Intent::Unknown)
                if next_state.user_intent.is_some() => {}
            (StepId::IntentClassification, intent) => next_state.user_intent = Some(intent),
            _ => {}
        }

        let step = self.step(current)?;

        if !step.validate(input) {
            if let Some(error_message) = step.error_message() {
                debug!(graph_id = %self.id, step = %current, "Answer rejected, re-prompting");
                let response = ChatMessage::new(MessageRole::System, error_message, now);
                let next_state = next_state.with_message(response.clone());
                return Ok(TurnResult {
                    state: next_state,
                    response,
                    status: TurnStatus::Reprompted,
                });
            }
        }

        let mut extracted = step.extract(input, &next_state);
        if extracted.consent_given.is_some() {
            extracted.consent_timestamp = Some(now);
        }
        next_state.collected = next_state.collected.merge(extracted);

        let next = self.next_step(current, input, &next_state)?;

        if current == StepId::EndDemo {
            let lower = input.to_lowercase();
            if lower.contains("continue") || lower.contains("intake") {
                next_state.continue_to_intake = true;
                next_state.is_complete = true;
            } else if lower.contains("end") || lower.contains("explore") {
                next_state.is_complete = true;
            }
        }

        debug!(graph_id = %self.id, from = %current, to = %next, "Dialogue transition");

        next_state.current_step = next;
        let prompt = self.prompt(next, &next_state)?;
        let status = if next_state.is_complete {
            TurnStatus::Completed
        } else {
            TurnStatus::Advanced
        };
        Ok(self.reply(next_state, prompt, now, status))
    }

    fn reply(
        &self,
        state: ChatState,
        text: String,
        now: DateTime<Utc>,
        status: TurnStatus,
    ) -> TurnResult {
        let response = ChatMessage::new(MessageRole::Assistant, text, now);
        TurnResult {
            state: state.with_message(response.clone()),
            response,
            status,
        }
    }
}

/// Builder for creating dialogue graphs
pub struct GraphBuilder {
    graph: DialogueGraph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: DialogueGraph::new(id),
        }
    }

    /// Add a step; the first step added becomes the start step
    pub fn add_step(mut self, step: Arc<dyn Step>) -> Self {
        if self.graph.steps.is_empty() {
            self.graph.start_step = step.id();
        }
        self.graph.steps.insert(step.id(), step);
        self
    }

    pub fn add_edge(mut self, from: StepId, to: StepId) -> Self {
        self.graph.edges.push(Edge {
            from,
            to,
            condition: None,
        });
        self
    }

    pub fn add_conditional_edge<F>(mut self, from: StepId, to: StepId, condition: F) -> Self
    where
        F: Fn(&str, &ChatState) -> bool + Send + Sync + 'static,
    {
        self.graph.edges.push(Edge {
            from,
            to,
            condition: Some(Arc::new(condition)),
        });
        self
    }

    pub fn set_start_step(mut self, step_id: StepId) -> Self {
        if self.graph.steps.contains_key(&step_id) {
            self.graph.start_step = step_id;
        }
        self
    }

    pub fn build(self) -> DialogueGraph {
        self.graph
    }
}
