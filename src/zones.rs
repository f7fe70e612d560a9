//! Zone Registry
//!
//! Halifax fishing zones with their centroids, radii and display names,
//! plus the GPS bounding box used to decide whether a coordinate pair may
//! override the classifier's zone.
//!
//! `ZONES` is an ordered list, not a map: its order is the enumeration order
//! used to break distance ties in [`nearest_zone`].

use serde::{Deserialize, Serialize};

/// Registered fishing zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneInfo {
    pub zone: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub area_name: &'static str,
}

impl ZoneInfo {
    pub fn centroid(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

pub static ZONES: &[ZoneInfo] = &[
    ZoneInfo { zone: "Zone A", lat: 44.69, lon: -63.60, radius_km: 5.0, area_name: "Near Bedford Basin" },
    ZoneInfo { zone: "Zone B", lat: 44.66, lon: -63.56, radius_km: 7.0, area_name: "Near Point Pleasant" },
    ZoneInfo { zone: "Zone C", lat: 44.63, lon: -63.53, radius_km: 10.0, area_name: "Near McNabs Island" },
];

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Planar distance in degree space (not geodesic)
    pub fn degree_distance(&self, other: &GeoPoint) -> f64 {
        libm::hypot(self.lat - other.lat, self.lon - other.lon)
    }
}

/// Inclusive lat/lon rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

/// Area in which a supplied GPS fix is trusted over the classifier
pub const HALIFAX_BOUNDS: BoundingBox = BoundingBox {
    min_lat: 44.5,
    max_lat: 44.8,
    min_lon: -63.7,
    max_lon: -63.4,
};

/// Look up a zone by its label
pub fn find_zone(zone: &str) -> Option<&'static ZoneInfo> {
    ZONES.iter().find(|z| z.zone == zone)
}

/// Zone whose centroid is closest to `point`
pub fn nearest_zone(point: &GeoPoint) -> &'static ZoneInfo {
    // ZONES is a non-empty static table
    nearest_in(ZONES, point).unwrap_or(&ZONES[0])
}

/// Closest zone in `zones`, `None` for an empty slice.
///
/// A later zone replaces the best only when strictly closer, so the earlier
/// zone wins exact ties.
pub fn nearest_in<'a>(zones: &'a [ZoneInfo], point: &GeoPoint) -> Option<&'a ZoneInfo> {
    let mut best: Option<(&ZoneInfo, f64)> = None;

    for zone in zones {
        let distance = point.degree_distance(&zone.centroid());
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((zone, distance)),
        }
    }

    best.map(|(zone, _)| zone)
}
