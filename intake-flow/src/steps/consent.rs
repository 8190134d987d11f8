use crate::{
    classify::check_consent,
    state::{ChatState, CollectedData},
    step::{Step, StepId},
};

/// Reads the privacy notice and records the answer.
///
/// The engine stamps `consent_timestamp` whenever this step yields a decision.
/// An unclear answer leaves the collected data untouched and the graph sends
/// the caller back to this step.
pub struct ConsentIntroStep;

impl Step for ConsentIntroStep {
    fn id(&self) -> StepId {
        StepId::ConsentIntro
    }

    fn prompt(&self, state: &ChatState) -> String {
        if state.collected.language_or_default().is_spanish() {
            return "Leeré un breve aviso de privacidad. Este aviso explica cómo protegemos su información de salud bajo HIPAA.

¿Reconoce este aviso y acepta continuar? Diga \"Acepto\" o \"No acepto\"."
                .to_string();
        }

        "I'll read a brief privacy notice. This notice explains how we protect your health information under HIPAA.

**Notice of Privacy Practices**: We collect and use your health information to provide care, process billing, and improve our services. Your information is protected under federal law. You have the right to access and request changes to your health information.

Do you acknowledge this notice and agree to continue? Say **\"I agree\"** or **\"I do not agree\"**."
            .to_string()
    }

    fn extract(&self, input: &str, _state: &ChatState) -> CollectedData {
        CollectedData {
            consent_given: check_consent(input),
            ..Default::default()
        }
    }
}

pub struct ConsentConfirmationStep;

impl Step for ConsentConfirmationStep {
    fn id(&self) -> StepId {
        StepId::ConsentConfirmation
    }

    fn prompt(&self, state: &ChatState) -> String {
        let spanish = state.collected.language_or_default().is_spanish();

        if state.collected.consent_given == Some(false) {
            if spanish {
                return "No hay problema. No podemos continuar sin consentimiento, pero puede completar la admisión en persona.

¿Le gustaría programar una cita?"
                    .to_string();
            }
            return "No problem. We can't continue without consent, but you're welcome to complete intake in person.

Would you like to schedule an appointment instead?"
                .to_string();
        }

        if spanish {
            "¡Perfecto! Enviaré un enlace seguro a su teléfono o correo electrónico para que pueda cargar su tarjeta de seguro y completar el resto a su conveniencia.".to_string()
        } else {
            "Perfect! I'll send a secure link to your phone or email so you can upload your insurance card and complete the rest at your convenience.".to_string()
        }
    }
}
