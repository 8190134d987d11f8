// Scripted intake conversation steps
pub mod consent;
pub mod contact;
pub mod end_demo;
pub mod greeting;
pub mod identity;
pub mod intent;
pub mod routing;

pub use consent::{ConsentConfirmationStep, ConsentIntroStep};
pub use contact::{ContactCollectionStep, MagicLinkOfferStep};
pub use end_demo::EndDemoStep;
pub use greeting::{EmergencyCheckStep, GreetingStep};
pub use identity::{IdentityDobStep, IdentityNameStep, LanguagePreferenceStep};
pub use intent::{ErrorRecoveryStep, IntentClassificationStep};
pub use routing::{AppointmentSchedulingStep, BillingRoutingStep, PharmacyInfoStep};
