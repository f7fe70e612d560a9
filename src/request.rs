//! Inference request payload and boundary checks
//!
//! Parses the JSON body clients send, enforces the content negotiation rules
//! of the model endpoint and applies the gateway's out-of-bounds GPS policy.

use crate::error::{PredictError, PredictResult};
use crate::reading::Reading;
use crate::season::Season;
use crate::zones::{GeoPoint, HALIFAX_BOUNDS};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Inference request body
///
/// `salinity_psu` defaults to 32.5. `latitude`/`longitude` may be omitted or
/// `null`; a GPS override needs both of them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub temperature_degree_c: f64,
    #[serde(default)]
    pub salinity_psu: Option<f64>,
    pub season: Season,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl PredictionRequest {
    /// Parse a raw JSON body, mapping every parse failure to a validation error
    pub fn from_json(body: &[u8]) -> PredictResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| PredictError::Validation(format!("error parsing input: {}", e)))
    }

    pub fn into_reading(self) -> PredictResult<Reading> {
        let reading = Reading::new(self.temperature_degree_c, self.salinity_psu, self.season);

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Ok(reading.with_gps(lat, lon)),
            (None, None) => Ok(reading),
            (lat, lon) => {
                tracing::debug!(
                    "Ignoring incomplete GPS pair (latitude {:?}, longitude {:?})",
                    lat,
                    lon
                );
                Ok(reading)
            }
        }
    }
}

/// Treatment of supplied coordinates that fall outside `HALIFAX_BOUNDS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpsPolicy {
    /// Pass the reading on; the engine keeps the classifier's zone
    #[default]
    Fallback,
    /// Refuse the request with a validation error
    Reject,
}

impl FromStr for GpsPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(GpsPolicy::Fallback),
            "reject" => Ok(GpsPolicy::Reject),
            other => anyhow::bail!("unknown GPS policy '{}' (expected fallback or reject)", other),
        }
    }
}

impl GpsPolicy {
    pub fn apply(&self, reading: &Reading) -> PredictResult<()> {
        match (self, reading.gps) {
            (GpsPolicy::Reject, Some(point)) if !HALIFAX_BOUNDS.contains(&point) => {
                Err(out_of_bounds(&point))
            }
            _ => Ok(()),
        }
    }
}

fn out_of_bounds(point: &GeoPoint) -> PredictError {
    PredictError::Validation(format!(
        "Coordinates outside Halifax bounds ({}, {})",
        point.lat, point.lon
    ))
}

/// Media type without parameters, lowercased
fn essence(value: &str) -> String {
    value.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// Request bodies must be JSON
pub fn check_content_type(content_type: Option<&str>) -> PredictResult<()> {
    match content_type {
        Some(ct) if essence(ct) == JSON_CONTENT_TYPE => Ok(()),
        Some(ct) => Err(PredictError::UnsupportedMediaType(ct.to_string())),
        None => Err(PredictError::UnsupportedMediaType("missing content type".to_string())),
    }
}

/// Responses are JSON only; absent or wildcard accept is fine
pub fn check_accept(accept: Option<&str>) -> PredictResult<()> {
    let Some(accept) = accept else {
        return Ok(());
    };

    let acceptable = accept
        .split(',')
        .map(essence)
        .any(|media| media == JSON_CONTENT_TYPE || media == "*/*" || media == "application/*");

    if acceptable {
        Ok(())
    } else {
        Err(PredictError::NotAcceptable(accept.to_string()))
    }
}
