//! Versioned loyalty model artifact.
//!
//! ```json
//! {
//!   "format": "hotel-loyalty-model",
//!   "version": "1.0",
//!   "features": ["average_spend_per_stay", "annual_stay_frequency",
//!                "remaining_healthspan", "clv"],
//!   "estimator": { "type": "gradient_boosting", ... }
//! }
//! ```
//!
//! Unknown fields are ignored. Any `1.x` version loads; a newer major
//! version is rejected. Estimator types keep their legacy class names as
//! aliases (`GradientBoostingClassifier`, `LogisticRegression`).

use crate::error::ModelError;
use serde::Deserialize;

/// Value of the `format` tag
pub const FORMAT: &str = "hotel-loyalty-model";

/// Highest major version this build reads
pub const SUPPORTED_MAJOR: u64 = 1;

/// Feature order the scorer provides
pub const FEATURES: [&str; 4] = [
    "average_spend_per_stay",
    "annual_stay_frequency",
    "remaining_healthspan",
    "clv",
];

/// Decoded artifact, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    /// Must equal [`FORMAT`]
    pub format: String,
    /// `major.minor`
    pub version: String,
    /// Feature names in column order
    pub features: Vec<String>,
    /// Trained estimator
    pub estimator: Estimator,
}

fn default_threshold() -> f64 {
    0.5
}

/// Trained binary classifier
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    /// Additive tree ensemble on the log-odds scale
    #[serde(alias = "GradientBoostingClassifier")]
    GradientBoosting {
        /// Log-odds before any tree
        init_score: f64,
        /// Shrinkage applied to every tree output
        learning_rate: f64,
        /// Probability from which a guest is loyal
        #[serde(default = "default_threshold")]
        threshold: f64,
        /// Regression trees
        trees: Vec<Tree>,
    },
    /// Linear model on the log-odds scale
    #[serde(alias = "LogisticRegression")]
    Logistic {
        /// One weight per feature
        coefficients: Vec<f64>,
        /// Bias term
        intercept: f64,
        /// Probability from which a guest is loyal
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

/// Regression tree stored as a flat node list; node 0 is the root
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    /// Nodes referenced by index
    pub nodes: Vec<Node>,
}

/// Tree node
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Go left when `features[feature] <= threshold`
    Split {
        /// Feature column
        feature: usize,
        /// Split value on the scaled feature
        threshold: f64,
        /// Node index taken when the test holds
        left: usize,
        /// Node index taken otherwise
        right: usize,
    },
    /// Output of the tree
    Leaf {
        /// Contribution on the log-odds scale
        value: f64,
    },
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Tree {
    /// Output of the tree for one feature row
    ///
    /// # Errors
    ///
    /// [`ModelError::MalformedEstimator`] when the walk leaves the node list
    /// or does not reach a leaf.
    pub fn evaluate(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().ok_or_else(|| {
                        ModelError::MalformedEstimator(format!("feature index {feature} out of range"))
                    })?;
                    index = if value <= *threshold { *left } else { *right };
                },
                None => {
                    return Err(ModelError::MalformedEstimator(format!(
                        "node index {index} out of range"
                    )));
                },
            }
        }
        Err(ModelError::MalformedEstimator("tree contains a cycle".into()))
    }

    fn validate(&self, features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::MalformedEstimator("empty tree".into()));
        }
        for node in &self.nodes {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= features || *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(ModelError::MalformedEstimator(format!(
                        "split references feature {feature}, nodes {left}/{right}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Estimator {
    /// Probability that a scaled feature row is a loyal guest
    ///
    /// # Errors
    ///
    /// [`ModelError::MalformedEstimator`] when a tree walk fails.
    pub fn probability(&self, row: &[f64]) -> Result<f64, ModelError> {
        match self {
            Self::GradientBoosting {
                init_score,
                learning_rate,
                trees,
                ..
            } => {
                let mut raw = *init_score;
                for tree in trees {
                    raw += learning_rate * tree.evaluate(row)?;
                }
                Ok(sigmoid(raw))
            },
            Self::Logistic {
                coefficients,
                intercept,
                ..
            } => {
                let raw = coefficients
                    .iter()
                    .zip(row)
                    .fold(*intercept, |acc, (w, x)| acc + w * x);
                Ok(sigmoid(raw))
            },
        }
    }

    /// Binary loyalty label of a scaled feature row
    ///
    /// # Errors
    ///
    /// See [`Estimator::probability`].
    pub fn predict(&self, row: &[f64]) -> Result<bool, ModelError> {
        let threshold = match self {
            Self::GradientBoosting { threshold, .. } | Self::Logistic { threshold, .. } => {
                *threshold
            },
        };
        Ok(self.probability(row)? >= threshold)
    }

    fn validate(&self, features: usize) -> Result<(), ModelError> {
        match self {
            Self::GradientBoosting {
                init_score,
                learning_rate,
                threshold,
                trees,
            } => {
                check_threshold(*threshold)?;
                if !init_score.is_finite() || !learning_rate.is_finite() || *learning_rate <= 0.0 {
                    return Err(ModelError::MalformedEstimator(
                        "init_score and learning_rate must be finite, learning_rate positive"
                            .into(),
                    ));
                }
                if trees.is_empty() {
                    return Err(ModelError::MalformedEstimator("no trees".into()));
                }
                trees.iter().try_for_each(|tree| tree.validate(features))
            },
            Self::Logistic {
                coefficients,
                intercept,
                threshold,
            } => {
                check_threshold(*threshold)?;
                if coefficients.len() != features {
                    return Err(ModelError::MalformedEstimator(format!(
                        "{} coefficients for {features} features",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::MalformedEstimator(
                        "non-finite coefficient".into(),
                    ));
                }
                Ok(())
            },
        }
    }
}

fn check_threshold(threshold: f64) -> Result<(), ModelError> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(ModelError::MalformedEstimator(format!(
            "threshold {threshold} outside (0, 1)"
        )))
    }
}

fn major_version(version: &str) -> Result<u64, ModelError> {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .ok_or_else(|| ModelError::UnsupportedVersion(version.to_string()))
}

impl ModelArtifact {
    /// Decode and validate an artifact
    ///
    /// # Errors
    ///
    /// [`ModelError::Parse`] for invalid JSON, and the validation errors of
    /// [`ModelArtifact::validate`].
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check format tag, version, feature list and estimator parameters
    ///
    /// # Errors
    ///
    /// The first [`ModelError`] the artifact breaks.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format != FORMAT {
            return Err(ModelError::UnsupportedFormat(self.format.clone()));
        }
        if major_version(&self.version)? > SUPPORTED_MAJOR {
            return Err(ModelError::UnsupportedVersion(self.version.clone()));
        }
        if self.features.iter().map(String::as_str).ne(FEATURES) {
            return Err(ModelError::FeatureMismatch {
                expected: self.features.clone(),
                provided: FEATURES.iter().map(ToString::to_string).collect(),
            });
        }
        self.estimator.validate(FEATURES.len())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const LOGISTIC: &str = r#"{
        "format": "hotel-loyalty-model",
        "version": "1.3",
        "trained_on": "2024-11-02",
        "features": ["average_spend_per_stay", "annual_stay_frequency",
                     "remaining_healthspan", "clv"],
        "estimator": {
            "type": "LogisticRegression",
            "coefficients": [0.5, 1.5, 0.1, 2.0],
            "intercept": -0.5
        }
    }"#;

    const STUMP: &str = r#"{
        "format": "hotel-loyalty-model",
        "version": "1.0",
        "features": ["average_spend_per_stay", "annual_stay_frequency",
                     "remaining_healthspan", "clv"],
        "estimator": {
            "type": "gradient_boosting",
            "init_score": 0.0,
            "learning_rate": 1.0,
            "trees": [{"nodes": [
                {"feature": 3, "threshold": 0.0, "left": 1, "right": 2},
                {"value": -2.0},
                {"value": 2.0}
            ]}]
        }
    }"#;

    #[test]
    fn loads_legacy_alias_and_ignores_unknown_fields() {
        let artifact = ModelArtifact::from_json(LOGISTIC);
        assert!(matches!(
            artifact.map(|a| a.estimator),
            Ok(Estimator::Logistic { threshold, .. }) if (threshold - 0.5).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn tree_splits_on_scaled_feature() {
        let Ok(artifact) = ModelArtifact::from_json(STUMP) else {
            panic!("stump should load");
        };
        assert!(matches!(artifact.estimator.predict(&[0.0, 0.0, 0.0, 1.2]), Ok(true)));
        assert!(matches!(artifact.estimator.predict(&[9.0, 9.0, 9.0, -0.3]), Ok(false)));
    }

    #[test]
    fn newer_major_version_is_rejected() {
        let json = LOGISTIC.replace("\"1.3\"", "\"2.0\"");
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(ModelError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn wrong_format_and_features_are_rejected() {
        let json = LOGISTIC.replace("hotel-loyalty-model", "pickle");
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(ModelError::UnsupportedFormat(_))
        ));

        let json = LOGISTIC.replace("\"clv\"", "\"lifetime_value\"");
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(ModelError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn dangling_tree_reference_is_malformed() {
        let json = STUMP.replace("\"right\": 2", "\"right\": 7");
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(ModelError::MalformedEstimator(_))
        ));
    }

    #[test]
    fn cyclic_tree_is_caught_at_evaluation() {
        let tree = Tree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(matches!(
            tree.evaluate(&[1.0]),
            Err(ModelError::MalformedEstimator(_))
        ));
    }
}
