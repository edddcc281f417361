//! The six named field-trial designs.
//!
//! Each design compares four yield treatments (`T1`..`T4`, kg/ha) and is
//! generated from its own fixed seed, so every call reproduces the same
//! dataset. The catalogue covers {balanced, unbalanced} plain designs and the
//! four combinations of balanced or unbalanced batch and plot counts for
//! sub-sampled designs.
//!
//! | Id | Layout | N |
//! |---|---|---|
//! | 1 | 15 plots per treatment | 60 |
//! | 2 | 14 / 18 / 16 / 20 plots | 68 |
//! | 3 | 5 batches × 4 plots | 80 |
//! | 4 | 5 batches × 3 / 4 / 5 / 3 plots | 75 |
//! | 5 | 4 / 6 / 5 / 7 batches × 4 plots | 88 |
//! | 6 | 4 / 6 / 5 / 7 batches, plots vary per batch | 100 |

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{DesignBuilder, DesignSpec, NestingSpec, PlotCounts, Replication, Treatment};
use crate::data::Dataset;
use crate::error::{Error, Result};

const LABELS: [&str; 4] = ["T1", "T2", "T3", "T4"];

/// Identifier of a catalogue design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DesignId {
    /// Balanced, 15 plots per treatment.
    Balanced,
    /// Unbalanced plot counts.
    Unbalanced,
    /// Sub-sampled, balanced batches and plots.
    NestedBalanced,
    /// Sub-sampled, balanced batches, plot count varies by treatment.
    NestedUnbalancedPlots,
    /// Sub-sampled, batch count varies by treatment, balanced plots.
    NestedUnbalancedBatches,
    /// Sub-sampled, batch and plot counts both vary.
    NestedUnbalanced,
}

impl DesignId {
    /// All designs in catalogue order.
    pub const ALL: [Self; 6] = [
        Self::Balanced,
        Self::Unbalanced,
        Self::NestedBalanced,
        Self::NestedUnbalancedPlots,
        Self::NestedUnbalancedBatches,
        Self::NestedUnbalanced,
    ];

    /// 1-based position in the catalogue.
    #[must_use]
    pub fn number(self) -> usize {
        match self {
            Self::Balanced => 1,
            Self::Unbalanced => 2,
            Self::NestedBalanced => 3,
            Self::NestedUnbalancedPlots => 4,
            Self::NestedUnbalancedBatches => 5,
            Self::NestedUnbalanced => 6,
        }
    }

    /// Machine-readable identifier, accepted by [`FromStr`].
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Unbalanced => "unbalanced",
            Self::NestedBalanced => "nested-balanced",
            Self::NestedUnbalancedPlots => "nested-unbalanced-plots",
            Self::NestedUnbalancedBatches => "nested-unbalanced-batches",
            Self::NestedUnbalanced => "nested-unbalanced",
        }
    }

    /// Display name, e.g. `"Model 3: Bal-Bal (sub-sampled)"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Balanced => "Model 1: Balanced",
            Self::Unbalanced => "Model 2: Unbalanced",
            Self::NestedBalanced => "Model 3: Bal-Bal (sub-sampled)",
            Self::NestedUnbalancedPlots => "Model 4: Bal-Unbal (sub-sampled)",
            Self::NestedUnbalancedBatches => "Model 5: Unbal-Bal (sub-sampled)",
            Self::NestedUnbalanced => "Model 6: Unbal-Unbal (sub-sampled)",
        }
    }

    /// One-line description of the layout.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Balanced => "60 plots, 15 per treatment",
            Self::Unbalanced => "68 plots, unequal per treatment",
            Self::NestedBalanced => "20 batches, 4 plots per batch",
            Self::NestedUnbalancedPlots => "20 batches, plots per batch vary by treatment",
            Self::NestedUnbalancedBatches => "unequal batches, 4 plots per batch",
            Self::NestedUnbalanced => "unequal batches, plots vary per batch",
        }
    }

    /// Number of observations the design generates.
    #[must_use]
    pub fn expected_len(self) -> usize {
        match self {
            Self::Balanced => 60,
            Self::Unbalanced => 68,
            Self::NestedBalanced => 80,
            Self::NestedUnbalancedPlots => 75,
            Self::NestedUnbalancedBatches => 88,
            Self::NestedUnbalanced => 100,
        }
    }

    /// Whether plots are sub-sampled from batches.
    #[must_use]
    pub fn is_nested(self) -> bool {
        !matches!(self, Self::Balanced | Self::Unbalanced)
    }

    /// The design's full parameter set.
    ///
    /// # Errors
    ///
    /// The catalogue parameters are valid, so this only fails if
    /// [`DesignBuilder::build`] rejects them.
    pub fn spec(self) -> Result<DesignSpec> {
        match self {
            Self::Balanced => plain(
                100,
                [32_000.0, 28_000.0, 35_000.0, 30_000.0],
                [2_500.0, 2_800.0, 2_200.0, 2_600.0],
                Replication::Uniform(15),
            ),
            Self::Unbalanced => plain(
                200,
                [31_500.0, 29_000.0, 36_000.0, 31_000.0],
                [3_000.0, 2_900.0, 2_400.0, 2_700.0],
                Replication::PerTreatment(vec![14, 18, 16, 20]),
            ),
            Self::NestedBalanced => nested(
                300,
                [32_500.0, 28_500.0, 35_500.0, 30_500.0],
                [2_000.0, 2_200.0, 1_800.0, 2_100.0],
                NestingSpec {
                    batches: Replication::Uniform(5),
                    plots: PlotCounts::Uniform(4),
                    plot_std_dev: 1_200.0,
                },
            ),
            Self::NestedUnbalancedPlots => nested(
                400,
                [31_800.0, 29_500.0, 36_500.0, 31_500.0],
                [2_100.0, 2_300.0, 1_900.0, 2_200.0],
                NestingSpec {
                    batches: Replication::Uniform(5),
                    plots: PlotCounts::PerTreatment(vec![3, 4, 5, 3]),
                    plot_std_dev: 1_100.0,
                },
            ),
            Self::NestedUnbalancedBatches => nested(
                500,
                [32_200.0, 28_800.0, 35_800.0, 30_800.0],
                [2_050.0, 2_250.0, 1_850.0, 2_150.0],
                NestingSpec {
                    batches: Replication::PerTreatment(vec![4, 6, 5, 7]),
                    plots: PlotCounts::Uniform(4),
                    plot_std_dev: 1_150.0,
                },
            ),
            Self::NestedUnbalanced => nested(
                600,
                [31_000.0, 30_000.0, 37_000.0, 32_000.0],
                [2_300.0, 2_500.0, 2_000.0, 2_400.0],
                NestingSpec {
                    batches: Replication::PerTreatment(vec![4, 6, 5, 7]),
                    plots: PlotCounts::PerBatch(vec![
                        vec![3, 4, 5, 4],
                        vec![5, 4, 6, 4, 5, 4],
                        vec![4, 5, 3, 6, 4],
                        vec![6, 4, 5, 4, 6, 5, 4],
                    ]),
                    plot_std_dev: 1_300.0,
                },
            ),
        }
    }

    /// Generate the design's dataset.
    ///
    /// # Errors
    ///
    /// See [`DesignId::spec`].
    pub fn generate(self) -> Result<Dataset> {
        self.spec()?.generate()
    }
}

fn treatments(means: [f64; 4], std_devs: [f64; 4]) -> impl Iterator<Item = Treatment> {
    LABELS
        .into_iter()
        .zip(means)
        .zip(std_devs)
        .map(|((label, mean), sd)| Treatment::new(label, mean, sd))
}

fn plain(seed: u64, means: [f64; 4], std_devs: [f64; 4], counts: Replication) -> Result<DesignSpec> {
    DesignBuilder::new(seed)
        .treatments(treatments(means, std_devs))
        .replication(counts)
        .build()
}

fn nested(
    seed: u64,
    means: [f64; 4],
    std_devs: [f64; 4],
    nesting: NestingSpec,
) -> Result<DesignSpec> {
    DesignBuilder::new(seed)
        .treatments(treatments(means, std_devs))
        .nesting(nesting)
        .build()
}

impl fmt::Display for DesignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DesignId {
    type Err = Error;

    /// Accepts the slug (`"nested-balanced"`), `"model-N"`, `"modelN"` or
    /// the bare number `"N"`, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        let number = key
            .strip_prefix("model-")
            .or_else(|| key.strip_prefix("model"))
            .unwrap_or(&key);

        Self::ALL
            .into_iter()
            .find(|id| id.slug() == key || id.number().to_string() == number)
            .ok_or_else(|| Error::UnknownDesign(s.to_string()))
    }
}

/// Generate the dataset of a catalogue design.
///
/// # Errors
///
/// See [`DesignId::spec`].
///
/// # Example
///
/// ```
/// use crd_anova::design::{generate_dataset, DesignId};
///
/// let data = generate_dataset(DesignId::Unbalanced).unwrap();
/// assert_eq!(data.len(), 68);
/// ```
pub fn generate_dataset(id: DesignId) -> Result<Dataset> {
    id.generate()
}

/// All catalogue designs in order.
#[must_use]
pub fn list_designs() -> Vec<DesignId> {
    DesignId::ALL.to_vec()
}
