use crate::{
    state::ChatState,
    step::{Step, StepId},
};

/// Terminal step; loops onto itself until the caller leaves or hands off
pub struct EndDemoStep;

impl Step for EndDemoStep {
    fn id(&self) -> StepId {
        StepId::EndDemo
    }

    fn prompt(&self, state: &ChatState) -> String {
        let name = state.collected.first_name.as_deref();
        let has_data = name.is_some() || state.collected.date_of_birth.is_some();

        if has_data {
            let greeting = name.map(|n| format!(", {n}")).unwrap_or_default();
            return format!(
                "Thanks{greeting}! In the real IntakePal system, you would either:

**📱 Receive a magic link** via SMS/email to complete intake on your phone, or
**🎤 Continue by voice** to finish everything now

**Would you like to:**
• **Continue to full intake demo** (I'll pre-fill your information)
• **End demo** and explore more"
            );
        }

        "Thanks for trying the voice demo!

**Would you like to:**
• **Continue to full intake demo**
• **End demo** and explore more"
            .to_string()
    }
}
