//! ANOVA result and configuration types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::GroupSummary;
use crate::error::{Error, Result};

/// Source of variation in an ANOVA table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Source {
    /// Between treatments (one-way).
    Treatment,
    /// Primary factor A (two-way).
    FactorA,
    /// Secondary factor B (two-way).
    FactorB,
    /// A × B interaction (two-way).
    Interaction,
    /// Residual / within-group error.
    Error,
    /// Total variation.
    Total,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Treatment => "Between treatments",
            Self::FactorA => "Factor A",
            Self::FactorB => "Factor B",
            Self::Interaction => "A x B",
            Self::Error => "Error",
            Self::Total => "Total",
        };
        f.write_str(name)
    }
}

/// One row of an ANOVA table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaEntry {
    /// Source of variation.
    pub source: Source,
    /// Sum of squares.
    pub sum_of_squares: f64,
    /// Degrees of freedom.
    pub degrees_of_freedom: usize,
    /// Mean square (SS / df, 0 when df is 0).
    pub mean_square: f64,
    /// F-ratio against the error mean square; `None` for the error row.
    pub f_ratio: Option<f64>,
    /// Upper-tail p-value of the F-ratio; `None` for the error row.
    pub p_value: Option<f64>,
}

impl AnovaEntry {
    pub(crate) fn error(sum_of_squares: f64, degrees_of_freedom: usize) -> Self {
        Self {
            source: Source::Error,
            sum_of_squares,
            degrees_of_freedom,
            mean_square: mean_square(sum_of_squares, degrees_of_freedom),
            f_ratio: None,
            p_value: None,
        }
    }

    /// Whether this effect is significant at `alpha`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_some_and(|p| p < alpha)
    }
}

/// SS / df, or 0 when there are no degrees of freedom.
pub(crate) fn mean_square(ss: f64, df: usize) -> f64 {
    if df > 0 {
        ss / df as f64
    } else {
        0.0
    }
}

/// Result of a one-way (single classification) ANOVA.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OneWayResult {
    /// Total number of observations (N).
    pub n_total: usize,
    /// Mean of all observations.
    pub grand_mean: f64,
    /// Per-treatment descriptive statistics, in declared label order.
    pub groups: Vec<GroupSummary>,
    /// Between-treatments row (df = k - 1).
    pub treatment: AnovaEntry,
    /// Within-treatments error row (df = N - k).
    pub error: AnovaEntry,
    /// Total sum of squares.
    pub total_ss: f64,
    /// Total degrees of freedom (N - 1).
    pub total_df: usize,
    /// F-statistic (MS_between / MS_within).
    pub f_statistic: f64,
    /// P(F > f_statistic).
    pub p_value: f64,
    /// Significance threshold used for `significant`.
    pub alpha: f64,
    /// Whether `p_value < alpha`.
    pub significant: bool,
}

impl OneWayResult {
    /// Number of treatment groups (k).
    #[must_use]
    pub fn k(&self) -> usize {
        self.groups.len()
    }

    /// Mean square error, the input to Tukey HSD.
    #[must_use]
    pub fn mse(&self) -> f64 {
        self.error.mean_square
    }

    /// Error degrees of freedom, the input to Tukey HSD.
    #[must_use]
    pub fn df_error(&self) -> usize {
        self.error.degrees_of_freedom
    }

    /// Treatment with the highest mean response.
    #[must_use]
    pub fn best_group(&self) -> Option<&GroupSummary> {
        self.groups
            .iter()
            .max_by(|a, b| a.mean.total_cmp(&b.mean))
    }
}

/// A two-way cell (treatment × secondary level) and its observations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellSummary {
    /// Treatment label.
    pub primary: String,
    /// Secondary factor level.
    pub secondary: String,
    /// Number of observations in the cell.
    pub n: usize,
    /// Cell mean, `None` for an empty cell.
    pub mean: Option<f64>,
}

/// A factor-level combination with no observations.
///
/// Empty cells are not fatal: they contribute zero to the interaction sum of
/// squares.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EmptyCell {
    /// Treatment label.
    pub primary: String,
    /// Secondary factor level.
    pub secondary: String,
}

/// Result of a two-way ANOVA with interaction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwoWayResult {
    /// Total number of observations (N).
    pub n_total: usize,
    /// Mean of all observations.
    pub grand_mean: f64,
    /// Levels of the primary factor (treatments).
    pub primary_levels: Vec<String>,
    /// Levels of the secondary factor that hold at least one observation.
    pub secondary_levels: Vec<String>,
    /// Factor A row (df = a - 1).
    pub factor_a: AnovaEntry,
    /// Factor B row (df = b - 1).
    pub factor_b: AnovaEntry,
    /// Interaction row (df = (a - 1)(b - 1)).
    pub interaction: AnovaEntry,
    /// Error row (df = N - ab), SS derived as total minus effects.
    pub error: AnovaEntry,
    /// Total sum of squares.
    pub total_ss: f64,
    /// Total degrees of freedom (N - 1).
    pub total_df: usize,
    /// Sum of squared deviations from cell means, computed directly.
    ///
    /// Equals `error.sum_of_squares` up to rounding when every cell holds
    /// the same number of observations.
    pub within_cells_ss: f64,
    /// All a × b cells, row-major by treatment.
    pub cells: Vec<CellSummary>,
    /// Cells without observations.
    pub empty_cells: Vec<EmptyCell>,
    /// Significance threshold.
    pub alpha: f64,
}

impl TwoWayResult {
    /// The three effect rows (A, B, A × B).
    #[must_use]
    pub fn effects(&self) -> [&AnovaEntry; 3] {
        [&self.factor_a, &self.factor_b, &self.interaction]
    }

    /// Sources whose p-value is below `alpha`.
    #[must_use]
    pub fn significant_effects(&self) -> Vec<Source> {
        self.effects()
            .iter()
            .filter(|e| e.is_significant(self.alpha))
            .map(|e| e.source)
            .collect()
    }

    /// Whether every cell holds at least one observation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.empty_cells.is_empty()
    }
}

/// Configuration for ANOVA calculation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaConfig {
    /// Significance threshold for p-values (default: 0.05).
    pub alpha: f64,
}

impl Default for AnovaConfig {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

impl AnovaConfig {
    /// Check that `alpha` lies strictly between 0 and 1.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.alpha > 0.0 && self.alpha < 1.0 {
            Ok(())
        } else {
            Err(Error::invalid_params(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )))
        }
    }
}
