//! Season labels and the trained season encoder
//!
//! The encoder is a closed vocabulary fixed at training time: a season's code
//! is its index in the sorted `classes` list stored in `season_encoder.json`.
//! A season the model never saw has no code and cannot be encoded.

use crate::error::{PredictError, PredictResult};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// The four accepted season literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    pub fn all() -> &'static [Season] {
        &[Season::Spring, Season::Summer, Season::Fall, Season::Winter]
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk form of the encoder artifact
#[derive(Debug, Deserialize, Serialize)]
struct EncoderArtifact {
    classes: Vec<String>,
}

/// Label encoder mapping season labels to integer codes
#[derive(Debug, Clone)]
pub struct SeasonEncoder {
    classes: Vec<String>,
    codes: FxHashMap<String, u32>,
}

impl SeasonEncoder {
    /// Build an encoder from the labels seen during training.
    ///
    /// Labels are sorted and de-duplicated so codes follow lexical order.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();

        let codes = classes
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx as u32))
            .collect();

        Self { classes, codes }
    }

    /// Load encoder from JSON artifact
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read season encoder: {:?}", path))?;

        let artifact: EncoderArtifact = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse season encoder JSON")?;

        if artifact.classes.is_empty() {
            anyhow::bail!("Season encoder {:?} has an empty vocabulary", path);
        }

        let encoder = Self::fit(artifact.classes);
        tracing::info!("Loaded season encoder ({} classes)", encoder.classes.len());
        Ok(encoder)
    }

    pub fn encode(&self, season: Season) -> PredictResult<u32> {
        self.codes
            .get(season.as_str())
            .copied()
            .ok_or_else(|| PredictError::Encoding {
                season: season.to_string(),
                reason: format!(
                    "label not in training vocabulary [{}]",
                    self.classes.join(", ")
                ),
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_vocabulary() {
        let encoder = SeasonEncoder::fit(["Winter", "Spring", "Summer", "Fall", "Spring"]);
        assert_eq!(encoder.classes(), &["Fall", "Spring", "Summer", "Winter"]);
        assert_eq!(encoder.encode(Season::Fall).unwrap(), 0);
        assert_eq!(encoder.encode(Season::Spring).unwrap(), 1);
        assert_eq!(encoder.encode(Season::Summer).unwrap(), 2);
        assert_eq!(encoder.encode(Season::Winter).unwrap(), 3);
    }

    #[test]
    fn test_unseen_season_is_encoding_error() {
        let encoder = SeasonEncoder::fit(["Spring", "Summer"]);
        let err = encoder.encode(Season::Winter).unwrap_err();
        assert_eq!(err.kind(), "encoding");
    }

    #[test]
    fn test_serde_uses_literals() {
        let json = serde_json::to_string(&Season::Summer).unwrap();
        assert_eq!(json, "\"Summer\"");
        assert!(serde_json::from_str::<Season>("\"Monsoon\"").is_err());
    }
}
