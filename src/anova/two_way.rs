//! Two-way ANOVA with interaction.
//!
//! Crosses the treatment factor with a derived secondary factor and
//! decomposes total variation into both main effects, their interaction,
//! and error. Unequal and empty cells are tolerated.

use ndarray::Array2;
use tracing::{debug, warn};

use super::one_way::negligible_ss;
use super::stats::f_distribution_p_value;
use super::types::{
    mean_square, AnovaConfig, AnovaEntry, CellSummary, EmptyCell, Source, TwoWayResult,
};
use crate::data::{Dataset, PositionalTerciles, SecondaryFactor};
use crate::error::{Error, Result};

/// Run a two-way ANOVA, deriving the secondary factor from positional
/// terciles of each treatment group.
///
/// # Errors
///
/// See [`analyze_two_way_with`].
pub fn analyze_two_way(dataset: &Dataset) -> Result<TwoWayResult> {
    analyze_two_way_with(dataset, &PositionalTerciles::new(), &AnovaConfig::default())
}

/// Run a two-way ANOVA with a custom secondary factor.
///
/// # Algorithm
/// 1. Assign every observation to a cell (treatment a, secondary level b)
/// 2. SS_A = Σₐ nₐ(ȳₐ - ȳ)², SS_B = Σ_b n_b(ȳ_b - ȳ)²
/// 3. SS_AB = Σ n_ab(ȳ_ab - ȳₐ - ȳ_b + ȳ)² over non-empty cells
/// 4. SS_Error = SST - SS_A - SS_B - SS_AB
/// 5. df: a - 1, b - 1, (a - 1)(b - 1), N - ab, where b counts only the
///    secondary levels that hold at least one observation
///
/// Each effect is tested against MS_Error. When the effect or the error has
/// no degrees of freedom, or MS_Error is not positive, the effect gets the
/// sentinel F = 0, p = 1 instead of an error.
///
/// # Errors
/// * `InvalidParams` if `config.alpha` is invalid, the factor has no levels,
///   or its assignment does not match the group (wrong length or level
///   index out of range)
/// * `InsufficientData` if there are fewer than 2 treatments or a treatment
///   has no observations
pub fn analyze_two_way_with<F>(
    dataset: &Dataset,
    factor: &F,
    config: &AnovaConfig,
) -> Result<TwoWayResult>
where
    F: SecondaryFactor + ?Sized,
{
    config.validate()?;

    let grouping = dataset.grouping();
    grouping.ensure_analyzable()?;

    let declared_levels = factor.level_names();
    let b = declared_levels.len();
    if b == 0 {
        return Err(Error::invalid_params("secondary factor has no levels"));
    }
    let a = grouping.len();

    // Cell sums and counts (treatments × secondary levels)
    let mut cell_sums: Array2<f64> = Array2::zeros((a, b));
    let mut cell_counts: Array2<usize> = Array2::zeros((a, b));
    let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(a);

    for (ai, group) in grouping.groups().iter().enumerate() {
        let levels = factor.assign(&group.members);
        if levels.len() != group.len() {
            return Err(Error::invalid_params(format!(
                "secondary factor assigned {} levels to treatment {:?} with {} observations",
                levels.len(),
                group.label,
                group.len()
            )));
        }
        for (value, &bi) in group.values().zip(&levels) {
            if bi >= b {
                return Err(Error::invalid_params(format!(
                    "secondary level index {bi} out of range for {b} levels"
                )));
            }
            cell_sums[[ai, bi]] += value;
            cell_counts[[ai, bi]] += 1;
        }
        assignments.push(levels);
    }

    let n_total = grouping.total();
    let grand_mean = cell_sums.sum() / n_total as f64;
    let total_ss: f64 = dataset.values().map(|y| (y - grand_mean).powi(2)).sum();

    let row_means: Vec<f64> = (0..a)
        .map(|ai| cell_sums.row(ai).sum() / cell_counts.row(ai).sum() as f64)
        .collect();
    let col_counts: Vec<usize> = (0..b).map(|bi| cell_counts.column(bi).sum()).collect();
    let col_means: Vec<Option<f64>> = (0..b)
        .map(|bi| {
            (col_counts[bi] > 0).then(|| cell_sums.column(bi).sum() / col_counts[bi] as f64)
        })
        .collect();
    // Levels no observation falls into are not part of the design
    let observed: Vec<usize> = (0..b).filter(|&bi| col_counts[bi] > 0).collect();
    let secondary_levels: Vec<String> = observed
        .iter()
        .map(|&bi| declared_levels[bi].clone())
        .collect();

    let ss_a: f64 = (0..a)
        .map(|ai| cell_counts.row(ai).sum() as f64 * (row_means[ai] - grand_mean).powi(2))
        .sum();

    let ss_b: f64 = col_means
        .iter()
        .zip(&col_counts)
        .filter_map(|(mean, &n)| mean.map(|m| n as f64 * (m - grand_mean).powi(2)))
        .sum();

    let primary_levels: Vec<String> = grouping
        .groups()
        .iter()
        .map(|g| g.label.to_string())
        .collect();

    let mut ss_ab = 0.0;
    let mut cells = Vec::with_capacity(a * observed.len());
    let mut empty_cells = Vec::new();
    for ai in 0..a {
        for &bi in &observed {
            let n = cell_counts[[ai, bi]];
            let mean = if n > 0 {
                let cell_mean = cell_sums[[ai, bi]] / n as f64;
                // A non-empty cell implies a non-empty column
                let col_mean = col_means[bi].unwrap_or(grand_mean);
                ss_ab += n as f64 * (cell_mean - row_means[ai] - col_mean + grand_mean).powi(2);
                Some(cell_mean)
            } else {
                warn!(
                    primary = %primary_levels[ai],
                    secondary = %declared_levels[bi],
                    "empty two-way cell contributes nothing to interaction"
                );
                empty_cells.push(EmptyCell {
                    primary: primary_levels[ai].clone(),
                    secondary: declared_levels[bi].clone(),
                });
                None
            };
            cells.push(CellSummary {
                primary: primary_levels[ai].clone(),
                secondary: declared_levels[bi].clone(),
                n,
                mean,
            });
        }
    }

    let within_cells_ss: f64 = grouping
        .groups()
        .iter()
        .zip(&assignments)
        .enumerate()
        .map(|(ai, (group, levels))| {
            group
                .values()
                .zip(levels)
                .map(|(y, &bi)| {
                    let cell_mean = cell_sums[[ai, bi]] / cell_counts[[ai, bi]] as f64;
                    (y - cell_mean).powi(2)
                })
                .sum::<f64>()
        })
        .sum();

    let ss_error = total_ss - ss_a - ss_b - ss_ab;

    let df_a = a - 1;
    let b_observed = observed.len();
    let df_b = b_observed.saturating_sub(1);
    let df_ab = df_a * df_b;
    let df_error = n_total.saturating_sub(a * b_observed);
    let total_df = n_total - 1;

    let error = AnovaEntry::error(ss_error, df_error);
    let max_abs = dataset.values().fold(0.0_f64, |m, y| m.max(y.abs()));
    // SS_Error comes from subtraction, so rounding scales with SST
    let noise = negligible_ss(n_total, max_abs).max(1e-12 * total_ss);
    let error_testable = df_error > 0 && ss_error > noise && error.mean_square > 0.0;

    let effect = |source: Source, ss: f64, df: usize| {
        let ms = mean_square(ss, df);
        let f = if error_testable && df > 0 {
            ms / error.mean_square
        } else {
            0.0
        };
        let p = if f > 0.0 {
            f_distribution_p_value(f, df, df_error)
        } else {
            1.0
        };
        AnovaEntry {
            source,
            sum_of_squares: ss,
            degrees_of_freedom: df,
            mean_square: ms,
            f_ratio: Some(f),
            p_value: Some(p),
        }
    };

    let factor_a = effect(Source::FactorA, ss_a, df_a);
    let factor_b = effect(Source::FactorB, ss_b, df_b);
    let interaction = effect(Source::Interaction, ss_ab, df_ab);

    debug!(
        n = n_total,
        a,
        b = b_observed,
        empty_cells = empty_cells.len(),
        f_a = factor_a.f_ratio.unwrap_or(0.0),
        f_b = factor_b.f_ratio.unwrap_or(0.0),
        f_ab = interaction.f_ratio.unwrap_or(0.0),
        "two-way ANOVA"
    );

    Ok(TwoWayResult {
        n_total,
        grand_mean,
        primary_levels,
        secondary_levels,
        factor_a,
        factor_b,
        interaction,
        error,
        total_ss,
        total_df,
        within_cells_ss,
        cells,
        empty_cells,
        alpha: config.alpha,
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

    fn assert_identity(result: &TwoWayResult) {
        let explained = result.factor_a.sum_of_squares
            + result.factor_b.sum_of_squares
            + result.interaction.sum_of_squares
            + result.error.sum_of_squares;
        assert!((result.total_ss - explained).abs() <= 1e-6 * result.total_ss.max(1.0));
        assert_eq!(
            result.total_df,
            result.factor_a.degrees_of_freedom
                + result.factor_b.degrees_of_freedom
                + result.interaction.degrees_of_freedom
                + result.error.degrees_of_freedom
        );
    }

    /// Parity of the position within the group: two levels.
    struct Alternating;

    impl SecondaryFactor for Alternating {
        fn level_names(&self) -> Vec<String> {
            vec!["Even".to_string(), "Odd".to_string()]
        }

        fn assign(&self, members: &[&Observation]) -> Vec<usize> {
            (0..members.len()).map(|i| i % 2).collect()
        }
    }

    #[test]
    fn test_balanced_two_way() {
        // 2 treatments × 3 terciles × 2 replicates
        let data = dataset(&[
            ("T1", vec![10.0, 11.0, 20.0, 21.0, 30.0, 31.0]),
            ("T2", vec![14.0, 15.0, 24.0, 25.0, 34.0, 35.0]),
        ]);
        let result = analyze_two_way(&data).unwrap();

        assert_eq!(result.n_total, 12);
        assert_eq!(result.primary_levels, vec!["T1", "T2"]);
        assert_eq!(result.secondary_levels, vec!["High", "Medium", "Low"]);
        assert_eq!(result.factor_a.degrees_of_freedom, 1);
        assert_eq!(result.factor_b.degrees_of_freedom, 2);
        assert_eq!(result.interaction.degrees_of_freedom, 2);
        assert_eq!(result.error.degrees_of_freedom, 6);
        assert!(result.is_complete());
        assert_identity(&result);

        // Additive data: no interaction
        assert!(result.interaction.sum_of_squares.abs() < 1e-9);
        // SS_A = 12 * 2^2 = 48
        assert!((result.factor_a.sum_of_squares - 48.0).abs() < 1e-9);
        // SS_B = 4 * (10^2 + 0 + 10^2) = 800
        assert!((result.factor_b.sum_of_squares - 800.0).abs() < 1e-9);
        // Each cell deviates by ±0.5: SS_E = 12 * 0.25 = 3
        assert!((result.error.sum_of_squares - 3.0).abs() < 1e-9);
        assert!((result.within_cells_ss - result.error.sum_of_squares).abs() < 1e-9);

        assert!(result.factor_b.p_value.unwrap() < 0.001);
        let significant = result.significant_effects();
        assert!(significant.contains(&Source::FactorA));
        assert!(significant.contains(&Source::FactorB));
        assert!(!significant.contains(&Source::Interaction));
    }

    #[test]
    fn test_empty_cell_is_tolerated() {
        // T2 has only two members: both land in the middle tercile
        let data = dataset(&[
            ("T1", vec![10.0, 12.0, 20.0, 22.0, 30.0, 32.0]),
            ("T2", vec![18.0, 26.0]),
        ]);
        let result = analyze_two_way(&data).unwrap();

        assert_eq!(result.empty_cells.len(), 2);
        assert!(result
            .empty_cells
            .iter()
            .all(|c| c.primary == "T2" && c.secondary != "Medium"));
        assert!(result.interaction.sum_of_squares.is_finite());
        assert!(result.interaction.f_ratio.unwrap().is_finite());
        assert_eq!(result.cells.len(), 6);
        assert!(result.cells.iter().any(|c| c.n == 0 && c.mean.is_none()));
        assert_identity(&result);
    }

    #[test]
    fn test_unobserved_level_dropped() {
        // Two members per treatment: High and Low are empty in every group
        let data = dataset(&[("A", vec![1.0, 2.0]), ("B", vec![5.0, 7.0])]);
        let result = analyze_two_way(&data).unwrap();

        assert_eq!(result.secondary_levels, vec!["Medium"]);
        assert_eq!(result.factor_a.degrees_of_freedom, 1);
        assert_eq!(result.factor_b.degrees_of_freedom, 0);
        assert_eq!(result.interaction.degrees_of_freedom, 0);
        assert_eq!(result.error.degrees_of_freedom, result.n_total - 2);
        assert_eq!(result.cells.len(), 2);
        assert!(result.empty_cells.is_empty());
        assert!(result.is_complete());
        assert_identity(&result);

        // SS_A = 2 * 2.25^2 * 2 = 20.25, SS_E = 0.5 + 2 = 2.5, MS_E = 1.25
        assert!((result.factor_a.sum_of_squares - 20.25).abs() < 1e-9);
        assert!((result.error.sum_of_squares - 2.5).abs() < 1e-9);
        assert!((result.factor_a.f_ratio.unwrap() - 16.2).abs() < 1e-9);
        // F(1, 2) tail: 1 - t / sqrt(2 + t^2) with t^2 = 16.2
        assert!((result.factor_a.p_value.unwrap() - 0.056_54).abs() < 1e-3);
        for effect in [&result.factor_b, &result.interaction] {
            assert_eq!(effect.f_ratio, Some(0.0));
            assert_eq!(effect.p_value, Some(1.0));
        }
    }

    #[test]
    fn test_no_error_df_gives_sentinel() {
        // One observation per cell: N = ab, so no error degrees of freedom
        let data = dataset(&[("T1", vec![1.0, 2.0, 3.0]), ("T2", vec![2.0, 4.0, 9.0])]);
        let result = analyze_two_way(&data).unwrap();

        assert_eq!(result.error.degrees_of_freedom, 0);
        for effect in result.effects() {
            assert_eq!(effect.f_ratio, Some(0.0));
            assert_eq!(effect.p_value, Some(1.0));
        }
        assert!(result.significant_effects().is_empty());
    }

    #[test]
    fn test_zero_error_variance_gives_sentinel() {
        let data = dataset(&[
            ("T1", vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]),
            ("T2", vec![5.0, 5.0, 6.0, 6.0, 7.0, 7.0]),
        ]);
        let result = analyze_two_way(&data).unwrap();

        assert!(result.error.sum_of_squares.abs() < 1e-9);
        for effect in result.effects() {
            assert_eq!(effect.f_ratio, Some(0.0));
            assert_eq!(effect.p_value, Some(1.0));
            assert!(!effect.f_ratio.unwrap().is_nan());
        }
    }

    #[test]
    fn test_custom_secondary_factor() {
        let data = dataset(&[
            ("A", vec![1.0, 5.0, 2.0, 6.0]),
            ("B", vec![3.0, 7.0, 4.0, 8.0]),
            ("C", vec![2.0, 6.0, 3.0, 7.0]),
        ]);
        let result = analyze_two_way_with(&data, &Alternating, &AnovaConfig::default()).unwrap();

        assert_eq!(result.secondary_levels, vec!["Even", "Odd"]);
        assert_eq!(result.factor_b.degrees_of_freedom, 1);
        assert_eq!(result.error.degrees_of_freedom, 12 - 6);
        // Odd positions are 4 higher throughout
        assert!((result.factor_b.sum_of_squares - 48.0).abs() < 1e-9);
        assert_identity(&result);
    }

    #[test]
    fn test_bad_assignment_rejected() {
        struct TooShort;
        impl SecondaryFactor for TooShort {
            fn level_names(&self) -> Vec<String> {
                vec!["only".to_string()]
            }
            fn assign(&self, _members: &[&Observation]) -> Vec<usize> {
                vec![0]
            }
        }

        struct OutOfRange;
        impl SecondaryFactor for OutOfRange {
            fn level_names(&self) -> Vec<String> {
                vec!["only".to_string()]
            }
            fn assign(&self, members: &[&Observation]) -> Vec<usize> {
                vec![3; members.len()]
            }
        }

        let data = dataset(&[("A", vec![1.0, 2.0]), ("B", vec![3.0, 4.0])]);
        let config = AnovaConfig::default();
        assert!(matches!(
            analyze_two_way_with(&data, &TooShort, &config),
            Err(Error::InvalidParams { .. })
        ));
        assert!(matches!(
            analyze_two_way_with(&data, &OutOfRange, &config),
            Err(Error::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_insufficient_data() {
        let data = dataset(&[("A", vec![1.0, 2.0, 3.0])]);
        assert!(matches!(
            analyze_two_way(&data),
            Err(Error::InsufficientData { .. })
        ));
    }
}
