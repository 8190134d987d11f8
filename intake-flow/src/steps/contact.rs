use crate::{
    extract::extract_contact,
    state::{ChatState, CollectedData},
    step::{Step, StepId},
};

pub struct MagicLinkOfferStep;

impl Step for MagicLinkOfferStep {
    fn id(&self) -> StepId {
        StepId::MagicLinkOffer
    }

    fn prompt(&self, state: &ChatState) -> String {
        if state.collected.language_or_default().is_spanish() {
            return "¿Cuál es el mejor número de teléfono o correo electrónico para usted?

(O diga \"continuar por voz\" si prefiere completar todo ahora)"
                .to_string();
        }

        "What's the best **phone number** or **email** for you?

(Or say **\"continue by voice\"** if you'd prefer to complete everything now)"
            .to_string()
    }

    // The answer to this prompt is the contact itself, so it is captured here
    // in time for the confirmation that follows.
    fn extract(&self, input: &str, _state: &ChatState) -> CollectedData {
        let contact = extract_contact(input);
        CollectedData {
            phone: contact.phone,
            email: contact.email,
            ..Default::default()
        }
    }
}

/// Confirms where the (simulated) magic link went
pub struct ContactCollectionStep;

impl Step for ContactCollectionStep {
    fn id(&self) -> StepId {
        StepId::ContactCollection
    }

    fn prompt(&self, state: &ChatState) -> String {
        let contact = state
            .collected
            .phone
            .as_deref()
            .or(state.collected.email.as_deref())
            .unwrap_or("your contact on file");

        if state.collected.language_or_default().is_spanish() {
            return format!(
                "¡Listo! Revise sus mensajes en el próximo minuto. Hemos enviado un enlace seguro a {contact}.

En la vida real, completaría el resto en su teléfono. ¿Le gustaría continuar con la demo de admisión ahora?"
            );
        }

        format!(
            "Done! Check your messages in the next minute. We've sent a secure link to {contact}.

In the real app, you'd complete the rest on your phone. **Would you like to continue to the intake demo now?**"
        )
    }

    fn extract(&self, input: &str, _state: &ChatState) -> CollectedData {
        let contact = extract_contact(input);
        CollectedData {
            phone: contact.phone,
            email: contact.email,
            ..Default::default()
        }
    }
}
