//! Loyalty classifier.
//!
//! Scores every guest as loyal or not from four CRM features. The batch
//! gathers the feature matrix, standard-scales it on the batch itself,
//! and predicts one label per guest with the pre-trained estimator loaded
//! from a versioned JSON artifact.

pub mod artifact;
pub mod scaler;

pub use artifact::{Estimator, FEATURES, ModelArtifact};
pub use scaler::StandardScaler;

use crate::error::ModelError;
use crate::types::{Guest, GuestId};
use serde::Serialize;
use std::path::Path;

/// Feature row of a guest, in [`FEATURES`] order
#[must_use]
pub fn features(guest: &Guest) -> Vec<f64> {
    let metrics = &guest.metrics;
    vec![
        metrics.average_spend_per_stay.as_f64(),
        f64::from(metrics.annual_stay_frequency),
        f64::from(metrics.remaining_healthspan),
        metrics.clv.as_f64(),
    ]
}

/// A loaded, validated loyalty model
#[derive(Debug, Clone)]
pub struct LoyaltyClassifier {
    version: String,
    estimator: Estimator,
}

impl LoyaltyClassifier {
    /// Load and validate the artifact at `path`
    ///
    /// # Errors
    ///
    /// [`ModelError::Io`] when the file cannot be read, otherwise the
    /// errors of [`ModelArtifact::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let classifier = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), version = %classifier.version, "Loyalty model loaded");
        Ok(classifier)
    }

    /// Build from artifact JSON
    ///
    /// # Errors
    ///
    /// See [`ModelArtifact::from_json`].
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let artifact = ModelArtifact::from_json(json)?;
        Ok(Self {
            version: artifact.version,
            estimator: artifact.estimator,
        })
    }

    /// Artifact version
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Scale the batch and predict one label per guest, in input order
    ///
    /// # Errors
    ///
    /// [`ModelError::Scaling`] or [`ModelError::MalformedEstimator`]; the
    /// whole batch fails together.
    pub fn predict(&self, guests: &[&Guest]) -> Result<Vec<(GuestId, bool)>, ModelError> {
        let rows: Vec<Vec<f64>> = guests.iter().map(|guest| features(guest)).collect();
        let scaled = StandardScaler::fit_transform(&rows)?;
        guests
            .iter()
            .zip(&scaled)
            .map(|(guest, row)| Ok((guest.id, self.estimator.predict(row)?)))
            .collect()
    }
}

/// Result of one scoring run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoringOutcome {
    /// Guests in the batch
    pub guests: usize,
    /// Labels written back
    pub scored: usize,
    /// Labels predicted but not written back
    pub failed: usize,
    /// Reason the batch stopped before predicting, if it did
    pub aborted: Option<String>,
    /// Version of the artifact that produced the labels
    pub model_version: Option<String>,
}

impl ScoringOutcome {
    /// Outcome of a batch that stopped before predicting
    #[must_use]
    pub fn aborted(guests: usize, error: &ModelError) -> Self {
        Self {
            guests,
            aborted: Some(error.to_string()),
            ..Self::default()
        }
    }
}
