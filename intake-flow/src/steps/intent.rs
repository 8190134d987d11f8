use crate::{
    state::{ChatState, Intent},
    step::{Step, StepId},
};

const MENU: &str = "I didn't quite catch that. Are you looking to:
• Complete **new patient intake**
• Schedule an **appointment**
• Ask about **billing**
• Get **pharmacy** information

Just let me know what works for you!";

const RECOVERY: &str = "Hmm, I didn't catch that. Could you repeat it?

Or you can say:
• \"New patient\" for intake
• \"Appointment\" to schedule
• \"Billing\" for payment questions";

/// Acknowledges the classified intent, or lists the options when there is none
pub struct IntentClassificationStep;

impl Step for IntentClassificationStep {
    fn id(&self) -> StepId {
        StepId::IntentClassification
    }

    fn prompt(&self, state: &ChatState) -> String {
        match state.user_intent {
            Some(Intent::NewPatient) => {
                "Great! I'll help you get everything ready for your first visit. Let's start with some basic information.".to_string()
            }
            Some(Intent::Appointment) => {
                "I can help you schedule an appointment. Let me get a few details first.".to_string()
            }
            Some(Intent::Billing) => "For billing questions, I can connect you with our team. They're available Monday through Friday, 9 AM to 5 PM.

Would you like to continue, or is there something else I can help with?"
                .to_string(),
            Some(Intent::Pharmacy) => "Our preferred pharmacy partners are Walgreens, CVS, and Publix. You can also choose your own pharmacy.

I'll ask about your pharmacy preference during intake. Anything else I can help with?"
                .to_string(),
            _ => MENU.to_string(),
        }
    }
}

pub struct ErrorRecoveryStep;

impl Step for ErrorRecoveryStep {
    fn id(&self) -> StepId {
        StepId::ErrorRecovery
    }

    fn prompt(&self, _state: &ChatState) -> String {
        RECOVERY.to_string()
    }
}
