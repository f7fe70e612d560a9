//! Reading and PredictionResult
//!
//! `Reading` is the engine's per-request input; `PredictionResult` is the
//! response body, serialized with the field names clients already consume.

use crate::season::Season;
use crate::zones::GeoPoint;
use serde::{Deserialize, Serialize};

/// Salinity assumed when a request omits it (PSU)
pub const DEFAULT_SALINITY_PSU: f64 = 32.5;

/// Environmental reading for one prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub salinity: f64,
    pub season: Season,
    /// Both coordinates or neither
    pub gps: Option<GeoPoint>,
}

impl Reading {
    pub fn new(temperature: f64, salinity: Option<f64>, season: Season) -> Self {
        Self {
            temperature,
            salinity: salinity.unwrap_or(DEFAULT_SALINITY_PSU),
            season,
            gps: None,
        }
    }

    pub fn with_gps(mut self, latitude: f64, longitude: f64) -> Self {
        self.gps = Some(GeoPoint::new(latitude, longitude));
        self
    }
}

/// How the zone used for recommendations was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsResolution {
    /// Coordinates inside the bounds picked the nearest registered zone
    Override,
    /// Coordinates supplied but outside the bounds; classifier zone kept
    OutOfBounds,
    /// No coordinates supplied
    Absent,
}

impl GpsResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpsResolution::Override => "override",
            GpsResolution::OutOfBounds => "out_of_bounds",
            GpsResolution::Absent => "absent",
        }
    }
}

/// Zone prediction with species recommendations and zone metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Raw classifier output
    pub predicted_zone: String,
    /// Zone actually used for species and metadata lookup
    pub gps_zone: String,
    pub fish_recommendations: Vec<String>,
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub area_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salinity_defaults() {
        let reading = Reading::new(12.0, None, Season::Spring);
        assert_eq!(reading.salinity, DEFAULT_SALINITY_PSU);
        assert!(reading.gps.is_none());

        let reading = Reading::new(12.0, Some(31.0), Season::Spring).with_gps(44.6, -63.6);
        assert_eq!(reading.salinity, 31.0);
        assert_eq!(reading.gps, Some(GeoPoint::new(44.6, -63.6)));
    }

    #[test]
    fn test_result_field_names() {
        let result = PredictionResult {
            predicted_zone: "Zone A".to_string(),
            gps_zone: "Zone B".to_string(),
            fish_recommendations: vec!["Cod".to_string()],
            lat: 44.6,
            lon: -63.6,
            radius_km: 7.0,
            area_name: "Near Point Pleasant".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["area_name", "fish_recommendations", "gps_zone", "lat", "lon", "predicted_zone", "radius_km"]
        );
    }
}
