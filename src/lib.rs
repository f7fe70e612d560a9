//! Fishing Zone Predictor
//!
//! Predicts a Halifax fishing zone from water temperature, salinity and
//! season (optionally refined by a GPS fix) and recommends the species to
//! target there.
//!
//! - `season`: season labels + trained season encoder
//! - `classifier`: zone classifier seam + decision-tree ensemble
//! - `zones` / `species`: static zone registry and species rule table
//! - `engine`: the decision pipeline tying them together
//! - `request` / `history` / `config`: boundary glue
//! - `api_server` (feature `api`): Axum HTTP server

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod model;
pub mod reading;
pub mod request;
pub mod season;
pub mod species;
pub mod zones;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use classifier::{Features, ForestClassifier, ZoneClassifier};
pub use engine::DecisionEngine;
pub use error::{PredictError, PredictResult};
pub use model::ModelArtifacts;
pub use reading::{PredictionResult, Reading, DEFAULT_SALINITY_PSU};
pub use season::{Season, SeasonEncoder};
pub use zones::{GeoPoint, ZoneInfo, HALIFAX_BOUNDS, ZONES};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
