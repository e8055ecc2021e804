//! Reporting utilities: analytic vs simulated comparisons and formatted output.

pub mod format;

pub use format::*;

use serde::{Deserialize, Serialize};

use crate::domain::{AttenuationResult, CategoryScheme};
use crate::simulate::SimulationOutcome;

/// One line of a comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub quantity: String,
    pub analytic: f64,
    pub simulated: Option<f64>,
}

impl ComparisonRow {
    pub fn abs_diff(&self) -> Option<f64> {
        self.simulated.map(|s| (s - self.analytic).abs())
    }
}

/// Analytic result alongside a Monte Carlo check for the same scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub thresholds: Vec<f64>,
    pub labels: Vec<f64>,
    pub probabilities: Vec<f64>,
    pub analytic: AttenuationResult,
    pub simulated: SimulationOutcome,
}

impl Comparison {
    pub fn new(scheme: &CategoryScheme, analytic: AttenuationResult, simulated: SimulationOutcome) -> Self {
        Self {
            thresholds: scheme.thresholds().to_vec(),
            labels: scheme.labels().to_vec(),
            probabilities: scheme.probabilities().to_vec(),
            analytic,
            simulated,
        }
    }

    /// Rows in the order the tables print them.
    pub fn rows(&self) -> Vec<ComparisonRow> {
        vec![
            ComparisonRow {
                quantity: "latent correlation".to_string(),
                analytic: self.analytic.latent_correlation,
                simulated: Some(self.simulated.latent_correlation),
            },
            ComparisonRow {
                quantity: "attenuated correlation".to_string(),
                analytic: self.analytic.attenuated_correlation,
                simulated: Some(self.simulated.observed_correlation),
            },
            ComparisonRow {
                quantity: "attenuation factor".to_string(),
                analytic: self.analytic.attenuation_factor,
                simulated: self.simulated.attenuation_factor,
            },
        ]
    }

    /// Largest absolute analytic-vs-simulated gap across rows.
    pub fn max_abs_diff(&self) -> f64 {
        self.rows()
            .iter()
            .filter_map(ComparisonRow::abs_diff)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_max_diff() {
        let scheme = CategoryScheme::new(vec![0.0], vec![0.0, 1.0]).unwrap();
        let analytic = AttenuationResult {
            attenuation_factor: 0.8,
            attenuated_correlation: 0.4,
            latent_correlation: 0.5,
            observed_covariance: 0.2,
            label_variance: 0.25,
        };
        let simulated = SimulationOutcome {
            samples: 100,
            seed: 1,
            latent_correlation: 0.52,
            observed_correlation: 0.37,
            attenuation_factor: None,
            category_counts: vec![50, 50],
        };
        let cmp = Comparison::new(&scheme, analytic, simulated);
        let rows = cmp.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].abs_diff(), None);
        assert!((cmp.max_abs_diff() - 0.03).abs() < 1e-12);
    }
}
