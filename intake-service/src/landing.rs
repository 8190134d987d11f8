use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    pub name: &'static str,
    pub domain: &'static str,
    pub agent: &'static str,
    pub tagline: &'static str,
    pub elevator: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hero {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub highlights: [&'static str; 4],
    pub cta_primary: Link,
    pub cta_secondary: Link,
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub heading: &'static str,
    pub subheading: &'static str,
    pub items: [Card; 4],
}

#[derive(Debug, Clone, Serialize)]
pub struct LandingContent {
    pub brand: Brand,
    pub hero: Hero,
    pub features: Section,
    pub trust_badges: Section,
    pub demo_links: [Link; 2],
}

pub fn landing_content() -> LandingContent {
    LandingContent {
        brand: Brand {
            name: "IntakePal",
            domain: "IntakePal.ai",
            agent: "Allie",
            tagline: "The friendliest first step in care.",
            elevator: "IntakePal is the friendly, AI-native front door for healthcare practices.",
        },
        hero: Hero {
            title: "Meet Allie, your IntakePal.",
            subtitle: "The friendliest first step in care.",
            highlights: [
                "Pre-visit intake via voice, text, or web (no clipboards)",
                "Real-time eligibility + ID/insurance OCR",
                "EHR write-back (demographics, consents, histories)",
                "Spanish + accessibility built-in",
            ],
            cta_primary: Link {
                label: "Start Florida pilot",
                href: "#contact",
            },
            cta_secondary: Link {
                label: "See 3-min demo",
                href: "/new-patient",
            },
        },
        features: Section {
            heading: "Everything you need for seamless intake",
            subheading: "Capture once. Pre-fill everywhere.",
            items: [
                Card {
                    title: "No More Clipboards",
                    description: "Patients complete intake via voice, text, or web before arrival. Everything's ready when they walk in.",
                },
                Card {
                    title: "Real-Time Eligibility",
                    description: "AI OCR extracts insurance details and verifies coverage instantly. No surprises at checkout.",
                },
                Card {
                    title: "EHR Write-Back",
                    description: "Demographics, consents, and history flow directly into your EHR. Zero re-keying required.",
                },
                Card {
                    title: "Spanish + Accessibility",
                    description: "WCAG 2.2 AA compliant with full Spanish support. Everyone gets a friendly experience.",
                },
            ],
        },
        trust_badges: Section {
            heading: "Trusted by healthcare providers",
            subheading: "Security and accessibility are part of the product.",
            items: [
                Card {
                    title: "HIPAA Compliant",
                    description: "BAA-backed security",
                },
                Card {
                    title: "End-to-End Encryption",
                    description: "PHI stays protected",
                },
                Card {
                    title: "WCAG 2.2 AA",
                    description: "Fully accessible",
                },
                Card {
                    title: "Audit Trail",
                    description: "Complete transparency",
                },
            ],
        },
        demo_links: [
            Link {
                label: "Try the voice assistant",
                href: "/chat/start",
            },
            Link {
                label: "Try the intake wizard",
                href: "/intake/start",
            },
        ],
    }
}

pub async fn root() -> Json<LandingContent> {
    Json(landing_content())
}

/// Pilot-access request from the landing page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub practice_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub specialty: String,
}

impl ContactRequest {
    fn is_complete(&self) -> bool {
        [&self.practice_name, &self.contact_email, &self.specialty]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

pub async fn contact(
    body: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Json(request) = body.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Invalid request body" })),
        )
    })?;

    if !request.is_complete() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "Missing required fields" })),
        ));
    }

    // not stored, and kept out of the logs
    info!("Pilot access requested");

    Ok(Json(json!({
        "ok": true,
        "message": "Thanks! We'll be in touch within 2 business days."
    })))
}
