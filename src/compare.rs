//! Side-by-side one-way ANOVA over several designs.
//!
//! Each dataset is analyzed independently; a failure is recorded in its own
//! row and never affects the others. Rows come back in input order.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::anova::{analyze_one_way_with, AnovaConfig};
use crate::data::Dataset;
use crate::design::DesignId;
use crate::error::Result;

/// Test statistics of one successful comparison row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComparisonStats {
    /// One-way F-statistic.
    pub f_statistic: f64,
    /// One-way p-value.
    pub p_value: f64,
    /// Whether `p_value < alpha`.
    pub significant: bool,
}

/// One design's row in the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    /// Design label.
    pub label: String,
    /// Number of observations.
    pub n_total: usize,
    /// Mean of all observations, `None` for an empty dataset.
    pub grand_mean: Option<f64>,
    /// Test statistics, or why the analysis failed.
    pub outcome: Result<ComparisonStats>,
}

impl ComparisonRow {
    /// Analyze one dataset.
    #[must_use]
    pub fn analyze(label: impl Into<String>, dataset: &Dataset, config: &AnovaConfig) -> Self {
        let label = label.into();
        let outcome = analyze_one_way_with(dataset, config).map(|r| ComparisonStats {
            f_statistic: r.f_statistic,
            p_value: r.p_value,
            significant: r.significant,
        });
        if let Err(e) = &outcome {
            warn!(design = %label, error = %e, "comparison row failed");
        }
        Self {
            label,
            n_total: dataset.len(),
            grand_mean: dataset.grand_mean(),
            outcome,
        }
    }

    /// Statistics, if the analysis succeeded.
    #[must_use]
    pub fn stats(&self) -> Option<&ComparisonStats> {
        self.outcome.as_ref().ok()
    }

    /// Whether the analysis succeeded and found a significant effect.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.stats().is_some_and(|s| s.significant)
    }
}

/// Run a one-way ANOVA on every dataset at the default threshold.
#[must_use]
pub fn compare_designs(datasets: &[(String, Dataset)]) -> Vec<ComparisonRow> {
    compare_designs_with(datasets, &AnovaConfig::default())
}

/// Run a one-way ANOVA on every dataset.
#[must_use]
pub fn compare_designs_with(
    datasets: &[(String, Dataset)],
    config: &AnovaConfig,
) -> Vec<ComparisonRow> {
    datasets
        .iter()
        .map(|(label, data)| ComparisonRow::analyze(label.as_str(), data, config))
        .collect()
}

/// Parallel [`compare_designs_with`]; rows stay in input order.
#[cfg(feature = "parallel")]
#[must_use]
pub fn par_compare_designs(
    datasets: &[(String, Dataset)],
    config: &AnovaConfig,
) -> Vec<ComparisonRow> {
    use rayon::prelude::*;

    datasets
        .par_iter()
        .map(|(label, data)| ComparisonRow::analyze(label.as_str(), data, config))
        .collect()
}

/// Generate every catalogue design and compare them.
///
/// A design that fails to generate shows up as a failed row.
#[must_use]
pub fn compare_catalogue() -> Vec<ComparisonRow> {
    let config = AnovaConfig::default();
    DesignId::ALL
        .into_iter()
        .map(|id| match id.generate() {
            Ok(data) => ComparisonRow::analyze(id.name(), &data, &config),
            Err(e) => {
                warn!(design = id.name(), error = %e, "design generation failed");
                ComparisonRow {
                    label: id.name().to_string(),
                    n_total: 0,
                    grand_mean: None,
                    outcome: Err(e),
                }
            }
        })
        .collect()
}
