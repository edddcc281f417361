//! One-way ANOVA for a completely randomized design.
//!
//! Partitions total variation into between-treatment and within-treatment
//! components and tests the treatment effect with an F-ratio.

use tracing::debug;

use super::stats::f_distribution_p_value;
use super::types::{mean_square, AnovaConfig, AnovaEntry, OneWayResult, Source};
use crate::data::Dataset;
use crate::error::{Error, Result};

/// Sums of squares at or below this bound are rounding noise.
///
/// The bound scales with the number of observations and the magnitude of the
/// largest response, so constant data of any magnitude is recognized as
/// having zero variance.
pub(crate) fn negligible_ss(n: usize, max_abs: f64) -> f64 {
    let unit = 64.0 * f64::EPSILON * max_abs;
    n as f64 * unit * unit
}

/// Run a one-way ANOVA with the default configuration.
///
/// # Errors
///
/// See [`analyze_one_way_with`].
///
/// # Example
///
/// ```
/// use crd_anova::{analyze_one_way, Dataset};
///
/// let data = Dataset::from_pairs([
///     ("A", 5.0), ("A", 6.0), ("A", 7.0),
///     ("B", 9.0), ("B", 10.0), ("B", 11.0),
/// ]);
/// let result = analyze_one_way(&data).unwrap();
/// assert_eq!(result.treatment.degrees_of_freedom, 1);
/// assert_eq!(result.error.degrees_of_freedom, 4);
/// assert!(result.significant);
/// ```
pub fn analyze_one_way(dataset: &Dataset) -> Result<OneWayResult> {
    analyze_one_way_with(dataset, &AnovaConfig::default())
}

/// Run a one-way ANOVA.
///
/// # Algorithm
/// 1. SST = Σ(y - ȳ)²
/// 2. SSB = Σ nᵢ(ȳᵢ - ȳ)²
/// 3. SSW = Σᵢ Σⱼ (yᵢⱼ - ȳᵢ)², summed directly (SST - SSB is kept as a
///    cross-check)
/// 4. F = (SSB / (k - 1)) / (SSW / (N - k)), p = P(F > f)
///
/// When the within-treatment variation is zero, the result is F = 0 and
/// p = 1 if the treatment means are also equal; otherwise the F-ratio is
/// undefined and [`Error::DegenerateVariance`] is returned.
///
/// # Errors
/// * `InvalidParams` if `config.alpha` is not in (0, 1)
/// * `InsufficientData` if there are fewer than 2 treatments, a treatment
///   has no observations, or no treatment is replicated (N = k)
/// * `DegenerateVariance` as described above
pub fn analyze_one_way_with(dataset: &Dataset, config: &AnovaConfig) -> Result<OneWayResult> {
    config.validate()?;

    let grouping = dataset.grouping();
    grouping.ensure_analyzable()?;
    let groups = grouping.summaries()?;

    let k = groups.len();
    let n_total = grouping.total();
    if n_total <= k {
        return Err(Error::insufficient_data(format!(
            "no replication: {n_total} observations for {k} treatments"
        )));
    }

    let grand_mean = groups.iter().map(|g| g.sum).sum::<f64>() / n_total as f64;

    let total_ss: f64 = dataset.values().map(|y| (y - grand_mean).powi(2)).sum();

    let between_ss: f64 = groups
        .iter()
        .map(|g| g.n as f64 * (g.mean - grand_mean).powi(2))
        .sum();

    let within_ss: f64 = grouping
        .groups()
        .iter()
        .zip(&groups)
        .map(|(group, summary)| {
            group
                .values()
                .map(|y| (y - summary.mean).powi(2))
                .sum::<f64>()
        })
        .sum();

    let residual_ss = total_ss - between_ss;
    if (residual_ss - within_ss).abs() > 1e-6 * total_ss.max(f64::MIN_POSITIVE) {
        debug!(
            within_ss,
            residual_ss, "direct and subtraction-derived within-group SS disagree"
        );
    }

    let df_between = k - 1;
    let df_within = n_total - k;
    let total_df = n_total - 1;

    let ms_between = mean_square(between_ss, df_between);
    let ms_within = mean_square(within_ss, df_within);

    let max_abs = dataset.values().fold(0.0_f64, |m, y| m.max(y.abs()));
    let noise = negligible_ss(n_total, max_abs);

    let (f_statistic, p_value) = if within_ss <= noise {
        if between_ss <= noise {
            (0.0, 1.0)
        } else {
            return Err(Error::DegenerateVariance { ms_between });
        }
    } else {
        let f = ms_between / ms_within;
        (f, f_distribution_p_value(f, df_between, df_within))
    };

    debug!(
        n = n_total,
        k,
        f = f_statistic,
        p = p_value,
        "one-way ANOVA"
    );

    Ok(OneWayResult {
        n_total,
        grand_mean,
        groups,
        treatment: AnovaEntry {
            source: Source::Treatment,
            sum_of_squares: between_ss,
            degrees_of_freedom: df_between,
            mean_square: ms_between,
            f_ratio: Some(f_statistic),
            p_value: Some(p_value),
        },
        error: AnovaEntry::error(within_ss, df_within),
        total_ss,
        total_df,
        f_statistic,
        p_value,
        alpha: config.alpha,
        significant: p_value < config.alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;

    fn dataset(groups: &[(&str, Vec<f64>)]) -> Dataset {
        Dataset::from_pairs(
            groups
                .iter()
                .flat_map(|(label, values)| values.iter().map(move |&v| (*label, v))),
        )
    }

    #[test]
    fn test_one_way_textbook_example() {
        // Three groups, grand mean 6
        let data = dataset(&[
            ("A", vec![4.0, 5.0, 6.0]),
            ("B", vec![6.0, 7.0, 8.0]),
            ("C", vec![5.0, 6.0, 7.0]),
        ]);
        let result = analyze_one_way(&data).unwrap();

        assert_eq!(result.n_total, 9);
        assert_eq!(result.k(), 3);
        assert!((result.grand_mean - 6.0).abs() < 1e-12);
        // SSB = 3 * (1 + 1 + 0) = 6, SSW = 3 * 2 = 6
        assert!((result.treatment.sum_of_squares - 6.0).abs() < 1e-10);
        assert!((result.error.sum_of_squares - 6.0).abs() < 1e-10);
        assert!((result.total_ss - 12.0).abs() < 1e-10);
        // MSB = 3, MSW = 1, F = 3 on (2, 6): p ≈ 0.125
        assert!((result.f_statistic - 3.0).abs() < 1e-10);
        assert!((result.p_value - 0.125).abs() < 0.001);
        assert!(!result.significant);
    }

    #[test]
    fn test_decomposition_identity() {
        let data = dataset(&[
            ("T1", vec![31_250.4, 33_120.9, 29_870.2, 35_002.7]),
            ("T2", vec![27_800.1, 28_950.6, 26_410.3]),
            ("T3", vec![36_210.0, 34_870.8, 35_990.4, 37_050.2, 33_880.5]),
        ]);
        let result = analyze_one_way(&data).unwrap();

        let explained = result.treatment.sum_of_squares + result.error.sum_of_squares;
        assert!((result.total_ss - explained).abs() <= 1e-6 * result.total_ss);
        assert_eq!(
            result.total_df,
            result.treatment.degrees_of_freedom + result.error.degrees_of_freedom
        );
    }

    #[test]
    fn test_unbalanced_degrees_of_freedom() {
        let sizes = [("T1", 14), ("T2", 18), ("T3", 16), ("T4", 20)];
        let obs: Vec<Observation> = sizes
            .iter()
            .enumerate()
            .flat_map(|(g, &(label, n))| {
                (0..n).map(move |i| {
                    Observation::new(label, 100.0 * g as f64 + (i % 5) as f64)
                })
            })
            .collect();
        let data = Dataset::from_observations(obs);

        let result = analyze_one_way(&data).unwrap();
        assert_eq!(result.n_total, 68);
        assert_eq!(result.error.degrees_of_freedom, 64);
        assert_eq!(result.treatment.degrees_of_freedom, 3);
        assert_eq!(result.total_df, 67);
    }

    #[test]
    fn test_zero_variance_equal_means() {
        let data = dataset(&[("A", vec![5.0; 4]), ("B", vec![5.0; 4]), ("C", vec![5.0; 4])]);
        let result = analyze_one_way(&data).unwrap();

        assert_eq!(result.f_statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.significant);
        assert!(!result.f_statistic.is_nan());
    }

    #[test]
    fn test_zero_variance_equal_means_inexact_decimal() {
        // 0.1 is not representable; the group means carry rounding error
        let data = dataset(&[("A", vec![0.1; 7]), ("B", vec![0.1; 7])]);
        let result = analyze_one_way(&data).unwrap();
        assert_eq!(result.f_statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_zero_variance_distinct_means_is_degenerate() {
        let data = dataset(&[("A", vec![5.0; 3]), ("B", vec![8.0; 3])]);
        let err = analyze_one_way(&data).unwrap_err();
        match err {
            Error::DegenerateVariance { ms_between } => {
                // SSB = 6 * 1.5^2 = 13.5 on 1 df
                assert!((ms_between - 13.5).abs() < 1e-10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_data() {
        let single = dataset(&[("A", vec![1.0, 2.0, 3.0])]);
        assert!(matches!(
            analyze_one_way(&single),
            Err(Error::InsufficientData { .. })
        ));

        let empty_group = Dataset::new(
            vec!["A".to_string(), "B".to_string()],
            vec![Observation::new("A", 1.0), Observation::new("A", 2.0)],
        )
        .unwrap();
        assert!(matches!(
            analyze_one_way(&empty_group),
            Err(Error::InsufficientData { .. })
        ));

        let unreplicated = dataset(&[("A", vec![1.0]), ("B", vec![2.0])]);
        assert!(matches!(
            analyze_one_way(&unreplicated),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_significance_follows_alpha() {
        let data = dataset(&[
            ("A", vec![4.0, 5.0, 6.0]),
            ("B", vec![6.0, 7.0, 8.0]),
            ("C", vec![5.0, 6.0, 7.0]),
        ]);
        let strict = analyze_one_way(&data).unwrap();
        assert_eq!(strict.significant, strict.p_value < 0.05);

        let lenient = analyze_one_way_with(&data, &AnovaConfig { alpha: 0.2 }).unwrap();
        assert!(lenient.significant);
        assert!((lenient.alpha - 0.2).abs() < 1e-12);

        assert!(analyze_one_way_with(&data, &AnovaConfig { alpha: 1.5 }).is_err());
    }

    #[test]
    fn test_best_group_and_mse() {
        let data = dataset(&[("A", vec![1.0, 3.0]), ("B", vec![10.0, 12.0])]);
        let result = analyze_one_way(&data).unwrap();

        assert_eq!(result.best_group().unwrap().label, "B");
        // SSW = 2 + 2 = 4 on 2 df
        assert!((result.mse() - 2.0).abs() < 1e-12);
        assert_eq!(result.df_error(), 2);
    }

    #[test]
    fn test_negligible_ss_scales_with_magnitude() {
        assert!(negligible_ss(10, 1.0) < 1e-25);
        assert!(negligible_ss(10, 1e6) > negligible_ss(10, 1.0));
        assert!(negligible_ss(10, 1e6) < 1e-10);
    }
}
