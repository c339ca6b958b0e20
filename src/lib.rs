//! OÁSÎS burnout risk core
//!
//! Synthetic work-pattern sequences, a stacked-LSTM sequence classifier and
//! a deterministic formula scorer behind one `ScoringService`.

pub mod api;
pub mod constants;
pub mod error;
pub mod logic;

pub use api::service::ScoringService;
pub use error::{PredictorError, PredictorResult};
pub use logic::config::PredictorConfig;
