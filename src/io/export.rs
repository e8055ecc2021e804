//! Export comparison rows to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::report::Comparison;

/// Write the analytic vs simulated rows to a CSV file.
pub fn write_comparison_csv(path: &Path, cmp: &Comparison) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "quantity,analytic,simulated,abs_diff,samples,seed")
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for row in cmp.rows() {
        writeln!(
            file,
            "{},{:.10},{},{},{},{}",
            row.quantity,
            row.analytic,
            row.simulated.map(|v| format!("{v:.10}")).unwrap_or_default(),
            row.abs_diff().map(|v| format!("{v:.10}")).unwrap_or_default(),
            cmp.simulated.samples,
            cmp.simulated.seed,
        )
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttenuationResult, CategoryScheme};
    use crate::simulate::SimulationOutcome;

    #[test]
    fn writes_header_and_one_line_per_row() {
        let scheme = CategoryScheme::new(vec![0.0], vec![0.0, 1.0]).unwrap();
        let cmp = Comparison::new(
            &scheme,
            AttenuationResult {
                attenuation_factor: 0.8,
                attenuated_correlation: 0.4,
                latent_correlation: 0.5,
                observed_covariance: 0.2,
                label_variance: 0.25,
            },
            SimulationOutcome {
                samples: 10,
                seed: 3,
                latent_correlation: 0.5,
                observed_correlation: 0.4,
                attenuation_factor: Some(0.8),
                category_counts: vec![5, 5],
            },
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmp.csv");
        write_comparison_csv(&path, &cmp).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("quantity,"));
        assert!(lines[3].starts_with("attenuation factor,0.8000000000,0.8000000000,0.0000000000,10,3"));
    }
}
