//! API Module
//!
//! - service.rs: scorer selection and prediction entry point
//! - engine_status.rs: status snapshot returned by `ScoringService::status`

pub mod engine_status;
pub mod service;

pub use engine_status::{EngineStatus, InferenceStatus, ModelStatus};
pub use service::ScoringService;
