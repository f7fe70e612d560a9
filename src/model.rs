//! Model artifacts
//!
//! The encoder and classifier are loaded once, eagerly, from a model
//! directory and never reloaded. File names are the only contract.

use crate::classifier::ForestClassifier;
use crate::season::SeasonEncoder;
use anyhow::{Context, Result};
use std::path::Path;

pub const ENCODER_FILE: &str = "season_encoder.json";
pub const CLASSIFIER_FILE: &str = "zone_classifier.json";

pub struct ModelArtifacts {
    pub encoder: SeasonEncoder,
    pub classifier: ForestClassifier,
}

impl ModelArtifacts {
    pub fn load(model_dir: &Path) -> Result<Self> {
        tracing::info!("Loading model artifacts from {:?}", model_dir);

        let encoder = SeasonEncoder::load(&model_dir.join(ENCODER_FILE))
            .with_context(|| "Failed to load season encoder")?;
        let classifier = ForestClassifier::load(&model_dir.join(CLASSIFIER_FILE))
            .with_context(|| "Failed to load zone classifier")?;

        Ok(Self { encoder, classifier })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Features, ZoneClassifier};
    use crate::season::Season;

    fn shipped_models() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("models")
    }

    #[test]
    fn test_loads_shipped_artifacts() {
        let artifacts = ModelArtifacts::load(&shipped_models()).unwrap();
        assert_eq!(artifacts.encoder.classes().len(), 4);
        assert_eq!(artifacts.classifier.classes(), &["Zone A", "Zone B", "Zone C"]);

        let code = artifacts.encoder.encode(Season::Spring).unwrap();
        let zone = artifacts.classifier.predict(&Features::new(12.0, 32.5, code)).unwrap();
        assert!(zone.starts_with("Zone "));
    }

    #[test]
    fn test_missing_directory_names_the_file() {
        let err = ModelArtifacts::load(Path::new("/nonexistent/models")).err().unwrap();
        assert!(format!("{:#}", err).contains(ENCODER_FILE));
    }
}
