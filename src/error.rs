//! Prediction error taxonomy
//!
//! Every failure the decision pipeline can report, kept distinct so the
//! boundary can map each one to its own status code instead of a blanket 500.

/// Errors surfaced by request validation and the decision engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    /// Malformed or missing request fields
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("unsupported accept type: {0}")]
    NotAcceptable(String),

    /// Season label not present in the encoder's training vocabulary
    #[error("error encoding season '{season}': {reason}")]
    Encoding { season: String, reason: String },

    /// Classifier emitted a zone label the registry does not know
    #[error("zone '{0}' is not present in the zone registry")]
    UnknownZone(String),

    /// Any other failure during feature construction or prediction
    #[error("error in prediction: {0}")]
    Compute(String),
}

impl PredictError {
    /// Stable tag used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Validation(_) => "validation",
            PredictError::UnsupportedMediaType(_) => "unsupported_media_type",
            PredictError::NotAcceptable(_) => "not_acceptable",
            PredictError::Encoding { .. } => "encoding",
            PredictError::UnknownZone(_) => "unknown_zone",
            PredictError::Compute(_) => "compute",
        }
    }
}

pub type PredictResult<T> = std::result::Result<T, PredictError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = PredictError::UnknownZone("Zone Q".to_string());
        assert_eq!(err.to_string(), "zone 'Zone Q' is not present in the zone registry");

        let err = PredictError::Encoding {
            season: "Winter".to_string(),
            reason: "unseen label".to_string(),
        };
        assert!(err.to_string().contains("Winter"));
    }

    #[test]
    fn test_kind_tags_are_distinct() {
        let errors = [
            PredictError::Validation(String::new()),
            PredictError::UnsupportedMediaType(String::new()),
            PredictError::NotAcceptable(String::new()),
            PredictError::Encoding { season: String::new(), reason: String::new() },
            PredictError::UnknownZone(String::new()),
            PredictError::Compute(String::new()),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }
}
