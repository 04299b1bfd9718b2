use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

use super::adduct::AdductIon;
use super::feature::FeatureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationConfidence {
    #[serde(rename = "confident")]
    Confident,
    #[serde(rename = "suggested")]
    Suggested,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub inchikey: String,
    #[serde(default)]
    pub adduct: Option<AdductIon>,
    pub confidence: AnnotationConfidence,
}

/// Length of the connectivity block of an InChIKey.
pub const SHORT_INCHIKEY_LEN: usize = 14;

/// Read-only view of compound identifications, keyed by feature id.
pub trait AnnotationEvaluator: Send + Sync {
    fn annotation(&self, feature_id: FeatureId) -> Option<&Annotation>;

    fn is_confidently_annotated(&self, feature_id: FeatureId) -> bool {
        matches!(
            self.annotation(feature_id),
            Some(Annotation {
                confidence: AnnotationConfidence::Confident,
                ..
            })
        )
    }

    fn is_annotated(&self, feature_id: FeatureId) -> bool {
        self.annotation(feature_id).is_some()
    }

    fn inchikey(&self, feature_id: FeatureId) -> Option<&str> {
        self.annotation(feature_id).map(|a| a.inchikey.as_str())
    }

    /// First block of the InChIKey; keys shorter than that never match.
    fn short_inchikey(&self, feature_id: FeatureId) -> Option<&str> {
        self.annotation(feature_id)
            .and_then(|a| a.inchikey.get(..SHORT_INCHIKEY_LEN))
    }
}

/// Serializes as a JSON object from feature id to [`Annotation`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationTable {
    entries: HashMap<FeatureId, Annotation>,
}

impl AnnotationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, feature_id: FeatureId, annotation: Annotation) {
        self.entries.insert(feature_id, annotation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(FeatureId, Annotation)> for AnnotationTable {
    fn from_iter<I: IntoIterator<Item = (FeatureId, Annotation)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl AnnotationEvaluator for AnnotationTable {
    fn annotation(&self, feature_id: FeatureId) -> Option<&Annotation> {
        self.entries.get(&feature_id)
    }
}
