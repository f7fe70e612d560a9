//! Decision Engine - turns a reading into a zone and species recommendation
//!
//! Pipeline per reading:
//! 1. Encode the season with the trained encoder
//! 2. Classify `[temperature, salinity, season_code]` into `predicted_zone`
//! 3. Resolve `gps_zone`: nearest registered centroid when coordinates are
//!    inside `HALIFAX_BOUNDS`, otherwise the classifier's zone
//! 4. Look up the (gps_zone, season) species rule and validate the reading
//!    against its windows
//! 5. Attach `gps_zone`'s registry metadata
//!
//! The engine holds no mutable state; one instance is shared by all requests.

use crate::classifier::{Features, ForestClassifier, ZoneClassifier};
use crate::error::{PredictError, PredictResult};
use crate::model::ModelArtifacts;
use crate::reading::{GpsResolution, PredictionResult, Reading};
use crate::season::SeasonEncoder;
use crate::species;
use crate::zones::{self, GeoPoint, ZoneInfo, HALIFAX_BOUNDS};
use rayon::prelude::*;
use std::sync::Arc;

pub struct DecisionEngine {
    encoder: SeasonEncoder,
    classifier: Arc<dyn ZoneClassifier>,
}

impl DecisionEngine {
    /// Labels the classifier can emit but the registry lacks are logged here;
    /// deciding such a label fails with `UnknownZone`.
    pub fn new(encoder: SeasonEncoder, classifier: Arc<dyn ZoneClassifier>) -> Self {
        let engine = Self { encoder, classifier };
        for label in engine.unregistered_labels() {
            tracing::warn!("Classifier label '{}' is not a registered zone", label);
        }
        engine
    }

    /// Classifier labels that have no registry entry
    pub fn unregistered_labels(&self) -> Vec<&str> {
        self.classifier
            .classes()
            .iter()
            .map(String::as_str)
            .filter(|label| zones::find_zone(label).is_none())
            .collect()
    }

    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        let classifier: Arc<ForestClassifier> = Arc::new(artifacts.classifier);
        Self::new(artifacts.encoder, classifier)
    }

    pub fn encoder(&self) -> &SeasonEncoder {
        &self.encoder
    }

    /// Decide a single reading
    pub fn decide(&self, reading: &Reading) -> PredictResult<PredictionResult> {
        self.decide_with_resolution(reading).map(|(result, _)| result)
    }

    /// Decide a single reading, also reporting how `gps_zone` was chosen
    pub fn decide_with_resolution(
        &self,
        reading: &Reading,
    ) -> PredictResult<(PredictionResult, GpsResolution)> {
        let season_code = self.encoder.encode(reading.season)?;

        if !reading.temperature.is_finite() || !reading.salinity.is_finite() {
            return Err(PredictError::Compute(format!(
                "non-finite reading (temperature {}, salinity {})",
                reading.temperature, reading.salinity
            )));
        }

        let features = Features::new(reading.temperature, reading.salinity, season_code);
        let predicted_zone = self.classifier.predict(&features)?;

        let (gps_zone, location, resolution) = resolve_zone(&predicted_zone, reading.gps)?;

        let fish_recommendations = species::recommend(
            gps_zone.zone,
            reading.season,
            reading.temperature,
            reading.salinity,
        );

        tracing::debug!(
            "Decided {} (gps {}, {}) for {:.1}C / {:.2} PSU / {}",
            predicted_zone,
            gps_zone.zone,
            resolution.as_str(),
            reading.temperature,
            reading.salinity,
            reading.season
        );

        let result = PredictionResult {
            predicted_zone,
            gps_zone: gps_zone.zone.to_string(),
            fish_recommendations,
            lat: location.lat,
            lon: location.lon,
            radius_km: gps_zone.radius_km,
            area_name: gps_zone.area_name.to_string(),
        };

        Ok((result, resolution))
    }

    /// Decide many readings in parallel (Rayon). Output order matches input.
    pub fn decide_batch(&self, readings: &[Reading]) -> Vec<PredictResult<PredictionResult>> {
        readings.par_iter().map(|reading| self.decide(reading)).collect()
    }
}

/// Choose the zone used for recommendations and the coordinates reported.
///
/// In-bounds GPS reports the caller's own coordinates; otherwise the
/// predicted zone's centroid is reported.
fn resolve_zone(
    predicted_zone: &str,
    gps: Option<GeoPoint>,
) -> PredictResult<(&'static ZoneInfo, GeoPoint, GpsResolution)> {
    match gps {
        Some(point) if HALIFAX_BOUNDS.contains(&point) => {
            Ok((zones::nearest_zone(&point), point, GpsResolution::Override))
        }
        Some(point) => {
            tracing::warn!(
                "GPS ({}, {}) outside Halifax bounds, keeping {}",
                point.lat, point.lon, predicted_zone
            );
            let zone = registered(predicted_zone)?;
            Ok((zone, zone.centroid(), GpsResolution::OutOfBounds))
        }
        None => {
            let zone = registered(predicted_zone)?;
            Ok((zone, zone.centroid(), GpsResolution::Absent))
        }
    }
}

fn registered(zone: &str) -> PredictResult<&'static ZoneInfo> {
    zones::find_zone(zone).ok_or_else(|| PredictError::UnknownZone(zone.to_string()))
}
