//! Column-wise standard scaling.

use crate::error::ModelError;

/// Per-column mean and population standard deviation, fitted on a batch
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl StandardScaler {
    /// Fit on `rows`, which must all have the same width
    ///
    /// # Errors
    ///
    /// [`ModelError::Scaling`] for an empty batch, ragged rows or
    /// non-finite values.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let Some(first) = rows.first() else {
            return Err(ModelError::Scaling("empty feature matrix".into()));
        };
        let width = first.len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(ModelError::Scaling("rows have different widths".into()));
        }
        if rows.iter().flatten().any(|value| !value.is_finite()) {
            return Err(ModelError::Scaling("non-finite feature value".into()));
        }

        let n = rows.len() as f64;
        let means: Vec<f64> = (0..width)
            .map(|col| rows.iter().map(|row| row[col]).sum::<f64>() / n)
            .collect();
        let std_devs = (0..width)
            .map(|col| {
                let variance = rows
                    .iter()
                    .map(|row| (row[col] - means[col]).powi(2))
                    .sum::<f64>()
                    / n;
                variance.sqrt()
            })
            .collect();

        Ok(Self { means, std_devs })
    }

    /// Standardize one row; zero-variance columns map to 0
    #[must_use]
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(value, (mean, std_dev))| {
                if *std_dev == 0.0 {
                    0.0
                } else {
                    (value - mean) / std_dev
                }
            })
            .collect()
    }

    /// Fit on `rows` and standardize them
    ///
    /// # Errors
    ///
    /// See [`StandardScaler::fit`].
    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        let scaler = Self::fit(rows)?;
        Ok(rows.iter().map(|row| scaler.transform(row)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_zero_mean_unit_variance() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let Ok(scaled) = StandardScaler::fit_transform(&rows) else {
            panic!("scaling should succeed");
        };
        assert_eq!(scaled, vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn rejects_empty_and_non_finite_input() {
        assert!(matches!(StandardScaler::fit(&[]), Err(ModelError::Scaling(_))));
        assert!(matches!(
            StandardScaler::fit(&[vec![f64::NAN]]),
            Err(ModelError::Scaling(_))
        ));
    }
}
