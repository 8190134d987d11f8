pub mod config;
pub mod fixtures;
pub mod landing;
pub mod mocks;
pub mod models;
pub mod service;
pub mod telemetry;

pub use config::{Delays, LogFormat, ServiceConfig};
pub use fixtures::{FixtureError, Fixtures};
pub use service::{AppState, build_router, create_app};
pub use telemetry::{DEMO_MARKER, init_tracing};
