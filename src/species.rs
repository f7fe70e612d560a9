//! Species Rule Table
//!
//! Per (zone, season) validity windows and the species recommended when a
//! reading falls inside both of them. Embedded as an ordered list so lookup
//! order is stable and visible.
//!
//! Combinations with no rule (every Fall and Winter entry, or any zone the
//! registry does not list) fall back to a permissive window and an
//! `"Unknown"` placeholder instead of failing.

use crate::season::Season;
use serde::Serialize;

/// Placeholder species list when no rule matches
pub const UNKNOWN_SPECIES: &str = "Unknown";

/// Species list when the reading falls outside the rule's windows
pub const NO_SPECIES: &str = "None";

/// Window used for temperature and salinity when no rule matches
pub const DEFAULT_RANGE: ValueRange = ValueRange::new(0.0, 100.0);

/// Inclusive numeric window `[lo, hi]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub lo: f64,
    pub hi: f64,
}

/// Where a value sits relative to a [`ValueRange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFit {
    Below,
    Within,
    Above,
}

impl ValueRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn compare(&self, value: f64) -> RangeFit {
        if value < self.lo {
            RangeFit::Below
        } else if value > self.hi {
            RangeFit::Above
        } else {
            RangeFit::Within
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.compare(value) == RangeFit::Within
    }
}

/// Validity window and species for one (zone, season)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeciesRule {
    pub zone: &'static str,
    pub season: Season,
    pub temp_range: ValueRange,
    pub salinity_range: ValueRange,
    pub species: &'static [&'static str],
}

const SPRING_TEMP: ValueRange = ValueRange::new(4.0, 15.0);
const SPRING_SALINITY: ValueRange = ValueRange::new(30.0, 33.0);
const SUMMER_TEMP: ValueRange = ValueRange::new(15.0, 25.0);
const SUMMER_SALINITY: ValueRange = ValueRange::new(31.0, 34.0);

pub static SPECIES_RULES: &[SpeciesRule] = &[
    SpeciesRule { zone: "Zone A", season: Season::Spring, temp_range: SPRING_TEMP, salinity_range: SPRING_SALINITY, species: &["Cod", "Flounder", "Herring"] },
    SpeciesRule { zone: "Zone A", season: Season::Summer, temp_range: SUMMER_TEMP, salinity_range: SUMMER_SALINITY, species: &["Mackerel", "Pollock", "Haddock"] },
    SpeciesRule { zone: "Zone B", season: Season::Spring, temp_range: SPRING_TEMP, salinity_range: SPRING_SALINITY, species: &["Cod", "Herring", "Hake"] },
    SpeciesRule { zone: "Zone B", season: Season::Summer, temp_range: SUMMER_TEMP, salinity_range: SUMMER_SALINITY, species: &["Mackerel", "Haddock", "Bluefish"] },
    SpeciesRule { zone: "Zone C", season: Season::Spring, temp_range: SPRING_TEMP, salinity_range: SPRING_SALINITY, species: &["Flounder", "Herring", "Pollock"] },
    SpeciesRule { zone: "Zone C", season: Season::Summer, temp_range: SUMMER_TEMP, salinity_range: SUMMER_SALINITY, species: &["Mackerel", "Haddock", "Tuna"] },
];

pub fn find_rule(zone: &str, season: Season) -> Option<&'static SpeciesRule> {
    SPECIES_RULES
        .iter()
        .find(|rule| rule.zone == zone && rule.season == season)
}

/// Species recommended for a reading in `zone` during `season`.
///
/// Returns `["None"]` unless temperature and salinity both sit inside the
/// rule's windows (inclusive). With no rule, the windows are [`DEFAULT_RANGE`]
/// and the list is `["Unknown"]`.
pub fn recommend(zone: &str, season: Season, temperature: f64, salinity: f64) -> Vec<String> {
    let (temp_range, salinity_range, species): (ValueRange, ValueRange, &[&str]) =
        match find_rule(zone, season) {
            Some(rule) => (rule.temp_range, rule.salinity_range, rule.species),
            None => {
                tracing::warn!("No species rule for {} / {}, using defaults", zone, season);
                (DEFAULT_RANGE, DEFAULT_RANGE, &[UNKNOWN_SPECIES][..])
            }
        };

    let temp_fit = temp_range.compare(temperature);
    let salinity_fit = salinity_range.compare(salinity);

    if temp_fit == RangeFit::Within && salinity_fit == RangeFit::Within {
        species.iter().map(|s| s.to_string()).collect()
    } else {
        tracing::debug!(
            "Reading outside {} / {} window (temperature {:?}, salinity {:?})",
            zone, season, temp_fit, salinity_fit
        );
        vec![NO_SPECIES.to_string()]
    }
}
