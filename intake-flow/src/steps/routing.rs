use crate::{
    state::ChatState,
    step::{Step, StepId},
};

pub struct AppointmentSchedulingStep;

impl Step for AppointmentSchedulingStep {
    fn id(&self) -> StepId {
        StepId::AppointmentScheduling
    }

    fn prompt(&self, _state: &ChatState) -> String {
        "I can check availability for you. What type of visit are you looking for?

• Annual physical
• New patient consultation
• Follow-up appointment

(In the real system, I'd show you available time slots from the EHR)"
            .to_string()
    }
}

pub struct BillingRoutingStep;

impl Step for BillingRoutingStep {
    fn id(&self) -> StepId {
        StepId::BillingRouting
    }

    fn prompt(&self, _state: &ChatState) -> String {
        "For billing questions, our team is available **Monday through Friday, 9 AM to 5 PM**.

In the live system, I would transfer you now or take a callback number.

**Would you like to continue to the intake demo instead?**"
            .to_string()
    }
}

pub struct PharmacyInfoStep;

impl Step for PharmacyInfoStep {
    fn id(&self) -> StepId {
        StepId::PharmacyInfo
    }

    fn prompt(&self, _state: &ChatState) -> String {
        "Our preferred pharmacy partners are:
• **Walgreens Pharmacy**
• **CVS Pharmacy**
• **Publix Pharmacy**

You can also choose your own pharmacy. I'll ask about your preference during the full intake.

**Would you like to continue to the intake demo?**"
            .to_string()
    }
}
