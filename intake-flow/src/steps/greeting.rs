use crate::{
    state::ChatState,
    step::{Step, StepId},
};

const GREETING: &str = "Hi, I'm **Allie**, your IntakePal. I can help with new patient intake, questions about services, or getting you ready for your visit.

**If this is a medical emergency, please hang up and dial 9-1-1 immediately.**

How can I help you today?";

const EMERGENCY_NOTICE: &str = "It sounds like you may need immediate care. **If this is a medical emergency, please hang up and dial 9-1-1 or go to the nearest emergency room.**

Would you like me to connect you with our nurse line, or shall I help with something else?";

/// Opening message; routes straight to the emergency notice when needed
pub struct GreetingStep;

impl Step for GreetingStep {
    fn id(&self) -> StepId {
        StepId::Greeting
    }

    fn prompt(&self, _state: &ChatState) -> String {
        GREETING.to_string()
    }
}

pub struct EmergencyCheckStep;

impl Step for EmergencyCheckStep {
    fn id(&self) -> StepId {
        StepId::EmergencyCheck
    }

    fn prompt(&self, _state: &ChatState) -> String {
        EMERGENCY_NOTICE.to_string()
    }
}
