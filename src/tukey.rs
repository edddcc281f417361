//! Tukey honestly significant difference (HSD) post-hoc test.
//!
//! After a significant one-way ANOVA, Tukey HSD compares every pair of
//! treatment means against a common threshold derived from the studentized
//! range distribution. Unequal group sizes use the Tukey-Kramer harmonic mean
//! of the two group sizes.
//!
//! ## Example
//!
//! ```rust
//! use crd_anova::tukey::post_hoc;
//! use crd_anova::{analyze_one_way, Dataset};
//!
//! let data = Dataset::from_pairs([
//!     ("T1", 31.0), ("T1", 33.0), ("T1", 32.0),
//!     ("T2", 28.0), ("T2", 27.0), ("T2", 29.0),
//!     ("T3", 36.0), ("T3", 35.0), ("T3", 34.0),
//! ]);
//! let anova = analyze_one_way(&data).unwrap();
//!
//! let pairs = post_hoc(&data, &anova).unwrap().expect("treatments differ");
//! assert_eq!(pairs.len(), 3);
//! assert_eq!(pairs[0].first, "T3");
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anova::stats::studentized_range_quantile;
use crate::anova::OneWayResult;
use crate::data::{Dataset, GroupSummary};
use crate::error::{Error, Result};

/// One pairwise comparison of treatment means.
///
/// `first` always has the higher (or equal) mean.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairwiseComparison {
    /// Label of the treatment with the higher mean.
    pub first: String,
    /// Label of the other treatment.
    pub second: String,
    /// Mean of `first`.
    pub mean_first: f64,
    /// Mean of `second`.
    pub mean_second: f64,
    /// |mean_first - mean_second|.
    pub abs_mean_difference: f64,
    /// sqrt(MSE / n_h), n_h the harmonic mean of the two group sizes.
    pub standard_error: f64,
    /// Studentized range critical value for (k, df_error).
    pub q_critical: f64,
    /// q_critical × standard_error.
    pub hsd_threshold: f64,
    /// Whether `abs_mean_difference > hsd_threshold`.
    pub significant: bool,
}

impl PairwiseComparison {
    /// The pair as a display string, e.g. `"T3 vs T1"`.
    #[must_use]
    pub fn pair(&self) -> String {
        format!("{} vs {}", self.first, self.second)
    }

    /// Whether this comparison involves the given treatments, in any order.
    #[must_use]
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// Configuration for Tukey HSD.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TukeyConfig {
    /// Confidence level of the studentized range critical value (default: 0.95).
    pub confidence_level: f64,
}

impl Default for TukeyConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

/// Tukey HSD at 95% confidence.
///
/// # Errors
///
/// See [`tukey_hsd_with`].
pub fn tukey_hsd(dataset: &Dataset, mse: f64, df_error: usize) -> Result<Vec<PairwiseComparison>> {
    tukey_hsd_with(dataset, mse, df_error, &TukeyConfig::default())
}

/// Tukey HSD over all unordered pairs of treatments.
///
/// Treatments are ordered by descending mean (ties broken by label), and pairs
/// (i, j) with i < j are emitted in that order. The critical value is computed
/// once for k = number of treatments.
///
/// # Errors
/// * `InvalidPrecondition` if `mse` is not positive and finite or `df_error`
///   is zero
/// * `InvalidParams` if the confidence level is not in (0, 1)
/// * `InsufficientData` if there are fewer than 2 treatments or a treatment
///   has no observations
pub fn tukey_hsd_with(
    dataset: &Dataset,
    mse: f64,
    df_error: usize,
    config: &TukeyConfig,
) -> Result<Vec<PairwiseComparison>> {
    if !(mse.is_finite() && mse > 0.0) {
        return Err(Error::invalid_precondition(format!(
            "mean square error must be positive, got {mse}"
        )));
    }
    if df_error == 0 {
        return Err(Error::invalid_precondition(
            "error degrees of freedom must be positive",
        ));
    }
    if !(config.confidence_level > 0.0 && config.confidence_level < 1.0) {
        return Err(Error::invalid_params(format!(
            "confidence level must be in (0, 1), got {}",
            config.confidence_level
        )));
    }

    let grouping = dataset.grouping();
    grouping.ensure_analyzable()?;
    let mut groups = grouping.summaries()?;
    groups.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.label.cmp(&b.label)));

    let k = groups.len();
    let q_critical = studentized_range_quantile(config.confidence_level, k, df_error);
    if !q_critical.is_finite() {
        return Err(Error::invalid_params(format!(
            "no studentized range quantile for k = {k}, df = {df_error}"
        )));
    }

    let mut comparisons = Vec::with_capacity(k * (k - 1) / 2);
    for (i, first) in groups.iter().enumerate() {
        for second in &groups[i + 1..] {
            comparisons.push(compare_pair(first, second, mse, q_critical));
        }
    }

    debug!(
        k,
        df_error,
        q_critical,
        significant = comparisons.iter().filter(|c| c.significant).count(),
        "Tukey HSD"
    );

    Ok(comparisons)
}

/// Compare two treatments given the error mean square and critical value.
///
/// The result does not depend on argument order, except that `first` is
/// whichever group has the higher mean.
#[must_use]
pub fn compare_pair(
    a: &GroupSummary,
    b: &GroupSummary,
    mse: f64,
    q_critical: f64,
) -> PairwiseComparison {
    let (first, second) = if b.mean > a.mean { (b, a) } else { (a, b) };
    let n_harmonic = 2.0 / (1.0 / first.n as f64 + 1.0 / second.n as f64);
    let standard_error = (mse / n_harmonic).sqrt();
    let hsd_threshold = q_critical * standard_error;
    let abs_mean_difference = (first.mean - second.mean).abs();

    PairwiseComparison {
        first: first.label.clone(),
        second: second.label.clone(),
        mean_first: first.mean,
        mean_second: second.mean,
        abs_mean_difference,
        standard_error,
        q_critical,
        hsd_threshold,
        significant: abs_mean_difference > hsd_threshold,
    }
}

/// Run Tukey HSD only if the one-way ANOVA found a significant treatment
/// effect, using its error mean square and degrees of freedom.
///
/// Returns `Ok(None)` when the ANOVA is not significant.
///
/// # Errors
///
/// See [`tukey_hsd_with`].
pub fn post_hoc(
    dataset: &Dataset,
    one_way: &OneWayResult,
) -> Result<Option<Vec<PairwiseComparison>>> {
    if !one_way.significant {
        return Ok(None);
    }
    tukey_hsd(dataset, one_way.mse(), one_way.df_error()).map(Some)
}
