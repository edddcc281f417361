//! Synthetic completely randomized designs.
//!
//! A [`DesignSpec`] describes an experiment: one normal response
//! distribution per treatment, how many plots each treatment receives, and
//! optionally a two-level nesting where plots are sub-sampled from batches.
//! Generation is a pure function of the design: the same seed and parameters
//! always produce the same [`Dataset`].
//!
//! ## Example
//!
//! ```rust
//! use crd_anova::design::{DesignBuilder, NestingSpec, PlotCounts, Replication};
//!
//! // 3 treatments, 4 batches each, 2 plots per batch
//! let spec = DesignBuilder::new(42)
//!     .treatment("T1", 100.0, 5.0)
//!     .treatment("T2", 110.0, 5.0)
//!     .treatment("T3", 120.0, 5.0)
//!     .nesting(NestingSpec {
//!         batches: Replication::Uniform(4),
//!         plots: PlotCounts::Uniform(2),
//!         plot_std_dev: 1.0,
//!     })
//!     .build()
//!     .unwrap();
//!
//! let data = spec.generate().unwrap();
//! assert_eq!(data.len(), 24);
//! assert_eq!(data.observations()[0].batch(), Some("T1-L1"));
//! assert_eq!(data, spec.generate().unwrap());
//! ```
//!
//! ## Generation order
//!
//! Treatments are visited in declaration order. Plain designs draw each
//! plot from `Normal(mean, std_dev)`. Nested designs draw, per batch, a batch
//! mean from `Normal(mean, std_dev)` and then each of the batch's plots from
//! `Normal(batch_mean, plot_std_dev)`. All draws come from a single PCG
//! stream seeded with [`DesignSpec::seed`].

pub mod catalogue;

use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rand_pcg::Pcg32;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{Dataset, Observation};
use crate::error::{Error, Result};

pub use catalogue::{generate_dataset, list_designs, DesignId};

/// Plots per treatment when no replication is specified.
pub const DEFAULT_REPLICATION: usize = 15;

/// Decimal places kept in generated responses by default.
pub const DEFAULT_DECIMALS: u32 = 1;

const MAX_DECIMALS: u32 = 15;

/// A treatment and its response distribution.
///
/// In nested designs `std_dev` is the spread of batch means around `mean`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Treatment {
    /// Treatment label.
    pub label: String,
    /// Expected response.
    pub mean: f64,
    /// Standard deviation of plot responses (plain) or batch means (nested).
    pub std_dev: f64,
}

impl Treatment {
    /// Create a treatment.
    #[must_use]
    pub fn new(label: impl Into<String>, mean: f64, std_dev: f64) -> Self {
        Self {
            label: label.into(),
            mean,
            std_dev,
        }
    }
}

/// Number of units per treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Replication {
    /// Every treatment gets the same count (balanced).
    Uniform(usize),
    /// One count per treatment, in declaration order (unbalanced).
    PerTreatment(Vec<usize>),
}

impl Replication {
    fn resolve(&self, treatments: usize, what: &str) -> Result<Vec<usize>> {
        let counts = match self {
            Self::Uniform(n) => vec![*n; treatments],
            Self::PerTreatment(counts) => {
                if counts.len() != treatments {
                    return Err(Error::invalid_params(format!(
                        "{} {what} counts given for {treatments} treatments",
                        counts.len()
                    )));
                }
                counts.clone()
            }
        };
        if counts.contains(&0) {
            return Err(Error::invalid_params(format!(
                "every treatment needs at least one {what}"
            )));
        }
        Ok(counts)
    }
}

/// Number of plots sampled from each batch of a nested design.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlotCounts {
    /// Every batch of every treatment has the same number of plots.
    Uniform(usize),
    /// All batches of a treatment share one count, per treatment.
    PerTreatment(Vec<usize>),
    /// An explicit count for every batch of every treatment.
    PerBatch(Vec<Vec<usize>>),
}

impl PlotCounts {
    fn resolve(&self, batches: &[usize]) -> Result<Vec<Vec<usize>>> {
        let per_batch: Vec<Vec<usize>> = match self {
            Self::Uniform(n) => batches.iter().map(|&b| vec![*n; b]).collect(),
            Self::PerTreatment(counts) => {
                if counts.len() != batches.len() {
                    return Err(Error::invalid_params(format!(
                        "{} plot counts given for {} treatments",
                        counts.len(),
                        batches.len()
                    )));
                }
                batches
                    .iter()
                    .zip(counts)
                    .map(|(&b, &n)| vec![n; b])
                    .collect()
            }
            Self::PerBatch(counts) => {
                if counts.len() != batches.len() {
                    return Err(Error::invalid_params(format!(
                        "plot counts given for {} treatments, expected {}",
                        counts.len(),
                        batches.len()
                    )));
                }
                for (t, (row, &b)) in counts.iter().zip(batches).enumerate() {
                    if row.len() != b {
                        return Err(Error::invalid_params(format!(
                            "treatment {} has {b} batches but {} plot counts",
                            t + 1,
                            row.len()
                        )));
                    }
                }
                counts.clone()
            }
        };
        if per_batch.iter().flatten().any(|&n| n == 0) {
            return Err(Error::invalid_params("every batch needs at least one plot"));
        }
        Ok(per_batch)
    }
}

/// Two-level sub-sampling: plots within batches within treatments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NestingSpec {
    /// Batches per treatment.
    pub batches: Replication,
    /// Plots per batch.
    pub plots: PlotCounts,
    /// Standard deviation of plots around their batch mean.
    pub plot_std_dev: f64,
}

/// How plots are laid out within treatments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Layout {
    /// Independent plots per treatment.
    Plain(Replication),
    /// Plots sub-sampled from batches.
    Nested(NestingSpec),
}

/// A validated experimental design, ready to generate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDesignSpec"))]
pub struct DesignSpec {
    seed: u64,
    treatments: Vec<Treatment>,
    layout: Layout,
    decimals: Option<u32>,
    // Resolved plots per batch, one row per treatment (plain: one batch)
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    plan: Vec<Vec<usize>>,
}

/// Unvalidated wire form of a [`DesignSpec`]; the plan is re-resolved.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawDesignSpec {
    seed: u64,
    treatments: Vec<Treatment>,
    layout: Layout,
    decimals: Option<u32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDesignSpec> for DesignSpec {
    type Error = Error;

    fn try_from(raw: RawDesignSpec) -> Result<Self> {
        let builder = DesignBuilder::new(raw.seed)
            .treatments(raw.treatments)
            .decimals(raw.decimals);
        match raw.layout {
            Layout::Plain(replication) => builder.replication(replication),
            Layout::Nested(nesting) => builder.nesting(nesting),
        }
        .build()
    }
}

impl DesignSpec {
    /// Seed of the pseudo-random stream.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Treatments in declaration order.
    #[must_use]
    pub fn treatments(&self) -> &[Treatment] {
        &self.treatments
    }

    /// Plot layout.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Decimal places responses are rounded to, `None` for full precision.
    #[must_use]
    pub fn decimals(&self) -> Option<u32> {
        self.decimals
    }

    /// Whether plots are sub-sampled from batches.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(self.layout, Layout::Nested(_))
    }

    /// Number of plots per treatment.
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        self.plan.iter().map(|row| row.iter().sum()).collect()
    }

    /// Total number of observations the design generates.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.plan.iter().flatten().sum()
    }

    /// Generate the dataset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` if a normal distribution cannot be formed from
    /// the parameters.
    pub fn generate(&self) -> Result<Dataset> {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut observations = Vec::with_capacity(self.expected_len());

        for (treatment, batches) in self.treatments.iter().zip(&self.plan) {
            let top = normal(treatment.mean, treatment.std_dev)?;
            match &self.layout {
                Layout::Plain(_) => {
                    let plots: usize = batches.iter().sum();
                    for plot in 1..=plots {
                        let value = self.round(rng.sample(top));
                        observations.push(
                            Observation::new(treatment.label.clone(), value).with_plot(plot_id(plot)?),
                        );
                    }
                }
                Layout::Nested(nesting) => {
                    for (b, &plots) in batches.iter().enumerate() {
                        let batch_mean: f64 = rng.sample(top);
                        let unit = normal(batch_mean, nesting.plot_std_dev)?;
                        let batch = format!("{}-L{}", treatment.label, b + 1);
                        for plot in 1..=plots {
                            let value = self.round(rng.sample(unit));
                            observations.push(
                                Observation::new(treatment.label.clone(), value)
                                    .with_plot(plot_id(plot)?)
                                    .with_batch(batch.clone()),
                            );
                        }
                    }
                }
            }
        }

        debug!(
            seed = self.seed,
            n = observations.len(),
            nested = self.is_nested(),
            "generated design"
        );

        let labels = self.treatments.iter().map(|t| t.label.clone()).collect();
        Dataset::new(labels, observations)
    }

    fn round(&self, value: f64) -> f64 {
        match self.decimals {
            Some(d) => {
                // build() caps d at MAX_DECIMALS
                let exp = i32::try_from(d.min(MAX_DECIMALS)).unwrap_or_default();
                let scale = 10_f64.powi(exp);
                (value * scale).round() / scale
            }
            None => value,
        }
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|e| {
        Error::invalid_params(format!("normal({mean}, {std_dev}): {e}"))
    })
}

fn plot_id(plot: usize) -> Result<u32> {
    u32::try_from(plot).map_err(|_| Error::invalid_params(format!("plot number {plot} too large")))
}

/// Builder for [`DesignSpec`].
///
/// # Example
///
/// ```
/// use crd_anova::design::{DesignBuilder, Replication};
///
/// let spec = DesignBuilder::new(7)
///     .treatment("A", 10.0, 1.0)
///     .treatment("B", 12.0, 1.0)
///     .replication(Replication::PerTreatment(vec![3, 5]))
///     .build()
///     .unwrap();
///
/// assert_eq!(spec.expected_len(), 8);
/// assert_eq!(spec.counts(), vec![3, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct DesignBuilder {
    seed: u64,
    treatments: Vec<Treatment>,
    replication: Option<Replication>,
    nesting: Option<NestingSpec>,
    decimals: Option<u32>,
}

impl DesignBuilder {
    /// Start a design with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            treatments: Vec::new(),
            replication: None,
            nesting: None,
            decimals: Some(DEFAULT_DECIMALS),
        }
    }

    /// Add a treatment.
    #[must_use]
    pub fn treatment(mut self, label: impl Into<String>, mean: f64, std_dev: f64) -> Self {
        self.treatments.push(Treatment::new(label, mean, std_dev));
        self
    }

    /// Add several treatments.
    #[must_use]
    pub fn treatments(mut self, treatments: impl IntoIterator<Item = Treatment>) -> Self {
        self.treatments.extend(treatments);
        self
    }

    /// Set plots per treatment for a plain design.
    ///
    /// Defaults to [`DEFAULT_REPLICATION`] for every treatment.
    #[must_use]
    pub fn replication(mut self, replication: Replication) -> Self {
        self.replication = Some(replication);
        self
    }

    /// Make the design nested.
    #[must_use]
    pub fn nesting(mut self, nesting: NestingSpec) -> Self {
        self.nesting = Some(nesting);
        self
    }

    /// Round responses to `decimals` places, or keep full precision with
    /// `None`. Defaults to [`DEFAULT_DECIMALS`].
    #[must_use]
    pub fn decimals(mut self, decimals: Option<u32>) -> Self {
        self.decimals = decimals;
        self
    }

    /// Validate and build the design.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` if:
    /// - no treatments are declared, or labels repeat
    /// - a mean or standard deviation is not finite, or a deviation is negative
    /// - both replication and nesting are set
    /// - a count list does not match the treatments or batches, or a count is 0
    /// - more than 15 decimals are requested
    pub fn build(self) -> Result<DesignSpec> {
        if self.treatments.is_empty() {
            return Err(Error::invalid_params("at least one treatment is required"));
        }
        for (i, t) in self.treatments.iter().enumerate() {
            if self.treatments[..i].iter().any(|u| u.label == t.label) {
                return Err(Error::invalid_params(format!(
                    "duplicate treatment label {:?}",
                    t.label
                )));
            }
            check_distribution(&t.label, t.mean, t.std_dev)?;
        }
        if let Some(d) = self.decimals {
            if d > MAX_DECIMALS {
                return Err(Error::invalid_params(format!(
                    "at most {MAX_DECIMALS} decimals, got {d}"
                )));
            }
        }

        let k = self.treatments.len();
        let (layout, plan) = match (self.replication, self.nesting) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid_params(
                    "replication and nesting are mutually exclusive",
                ));
            }
            (None, Some(nesting)) => {
                check_distribution("plot", 0.0, nesting.plot_std_dev)?;
                let batches = nesting.batches.resolve(k, "batch")?;
                let plan = nesting.plots.resolve(&batches)?;
                (Layout::Nested(nesting), plan)
            }
            (replication, None) => {
                let replication =
                    replication.unwrap_or(Replication::Uniform(DEFAULT_REPLICATION));
                let plan = replication
                    .resolve(k, "plot")?
                    .into_iter()
                    .map(|n| vec![n])
                    .collect();
                (Layout::Plain(replication), plan)
            }
        };

        Ok(DesignSpec {
            seed: self.seed,
            treatments: self.treatments,
            layout,
            decimals: self.decimals,
            plan,
        })
    }
}

fn check_distribution(name: &str, mean: f64, std_dev: f64) -> Result<()> {
    if !mean.is_finite() {
        return Err(Error::invalid_params(format!(
            "{name}: mean must be finite, got {mean}"
        )));
    }
    if !(std_dev.is_finite() && std_dev >= 0.0) {
        return Err(Error::invalid_params(format!(
            "{name}: standard deviation must be finite and non-negative, got {std_dev}"
        )));
    }
    Ok(())
}

/// Generate a dataset in one call.
///
/// `counts` defaults to [`DEFAULT_REPLICATION`] plots per treatment and is
/// ignored when `nesting` is given. Responses are rounded to
/// [`DEFAULT_DECIMALS`] places.
///
/// # Errors
///
/// See [`DesignBuilder::build`].
pub fn generate(
    seed: u64,
    treatments: &[Treatment],
    counts: Option<Replication>,
    nesting: Option<NestingSpec>,
) -> Result<Dataset> {
    let mut builder = DesignBuilder::new(seed).treatments(treatments.iter().cloned());
    builder = match nesting {
        Some(nesting) => builder.nesting(nesting),
        None => match counts {
            Some(counts) => builder.replication(counts),
            None => builder,
        },
    };
    builder.build()?.generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_treatments() -> DesignBuilder {
        DesignBuilder::new(1)
            .treatment("A", 100.0, 10.0)
            .treatment("B", 200.0, 10.0)
    }

    #[test]
    fn test_default_replication() {
        let spec = two_treatments().build().unwrap();
        assert_eq!(spec.counts(), vec![DEFAULT_REPLICATION; 2]);
        let data = spec.generate().unwrap();
        assert_eq!(data.len(), 2 * DEFAULT_REPLICATION);
        assert_eq!(data.labels(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_determinism() {
        let spec = two_treatments()
            .replication(Replication::PerTreatment(vec![4, 6]))
            .build()
            .unwrap();
        assert_eq!(spec.generate().unwrap(), spec.generate().unwrap());

        let other = DesignBuilder::new(2)
            .treatment("A", 100.0, 10.0)
            .treatment("B", 200.0, 10.0)
            .replication(Replication::PerTreatment(vec![4, 6]))
            .build()
            .unwrap();
        assert_ne!(spec.generate().unwrap(), other.generate().unwrap());
    }

    #[test]
    fn test_plain_plot_numbers_and_order() {
        let data = two_treatments()
            .replication(Replication::Uniform(3))
            .build()
            .unwrap()
            .generate()
            .unwrap();

        let tags: Vec<(&str, u32)> = data.iter().map(|o| (o.group_id(), o.plot())).collect();
        assert_eq!(
            tags,
            vec![("A", 1), ("A", 2), ("A", 3), ("B", 1), ("B", 2), ("B", 3)]
        );
        assert!(data.iter().all(|o| o.batch().is_none()));
    }

    #[test]
    fn test_rounding() {
        let data = two_treatments().build().unwrap().generate().unwrap();
        for v in data.values() {
            assert!((v * 10.0 - (v * 10.0).round()).abs() < 1e-6);
        }

        let raw = two_treatments()
            .decimals(None)
            .build()
            .unwrap()
            .generate()
            .unwrap();
        assert!(raw
            .values()
            .any(|v| (v * 10.0 - (v * 10.0).round()).abs() > 1e-6));
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let data = two_treatments()
            .decimals(Some(2))
            .build()
            .unwrap()
            .generate()
            .unwrap();
        for v in data.values() {
            assert!((v * 100.0 - (v * 100.0).round()).abs() < 1e-6);
        }
        assert!(data
            .values()
            .any(|v| (v * 10.0 - (v * 10.0).round()).abs() > 1e-6));

        let whole = two_treatments()
            .decimals(Some(0))
            .build()
            .unwrap()
            .generate()
            .unwrap();
        assert!(whole.values().all(|v| v.fract() == 0.0));
    }

    #[test]
    fn test_nested_per_batch_layout() {
        let spec = two_treatments()
            .nesting(NestingSpec {
                batches: Replication::PerTreatment(vec![2, 3]),
                plots: PlotCounts::PerBatch(vec![vec![1, 2], vec![3, 1, 2]]),
                plot_std_dev: 1.0,
            })
            .build()
            .unwrap();
        assert!(spec.is_nested());
        assert_eq!(spec.counts(), vec![3, 6]);

        let data = spec.generate().unwrap();
        let tags: Vec<(&str, u32)> = data
            .iter()
            .map(|o| (o.batch().unwrap_or(""), o.plot()))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("A-L1", 1),
                ("A-L2", 1),
                ("A-L2", 2),
                ("B-L1", 1),
                ("B-L1", 2),
                ("B-L1", 3),
                ("B-L2", 1),
                ("B-L3", 1),
                ("B-L3", 2),
            ]
        );
    }

    #[test]
    fn test_zero_spread_is_exact() {
        let data = DesignBuilder::new(3)
            .treatment("A", 5.0, 0.0)
            .treatment("B", 7.5, 0.0)
            .replication(Replication::Uniform(4))
            .build()
            .unwrap()
            .generate()
            .unwrap();
        let grouping = data.grouping();
        assert!(grouping.groups()[0].values().all(|v| v == 5.0));
        assert!(grouping.groups()[1].values().all(|v| v == 7.5));
    }

    #[test]
    fn test_invalid_designs() {
        assert!(DesignBuilder::new(0).build().is_err());
        assert!(DesignBuilder::new(0)
            .treatment("A", 1.0, 1.0)
            .treatment("A", 2.0, 1.0)
            .build()
            .is_err());
        assert!(DesignBuilder::new(0)
            .treatment("A", 1.0, -1.0)
            .build()
            .is_err());
        assert!(DesignBuilder::new(0)
            .treatment("A", f64::NAN, 1.0)
            .build()
            .is_err());
        assert!(two_treatments()
            .replication(Replication::PerTreatment(vec![3]))
            .build()
            .is_err());
        assert!(two_treatments()
            .replication(Replication::Uniform(0))
            .build()
            .is_err());
        assert!(two_treatments()
            .replication(Replication::Uniform(3))
            .nesting(NestingSpec {
                batches: Replication::Uniform(2),
                plots: PlotCounts::Uniform(2),
                plot_std_dev: 1.0,
            })
            .build()
            .is_err());
        assert!(two_treatments()
            .nesting(NestingSpec {
                batches: Replication::Uniform(2),
                plots: PlotCounts::PerBatch(vec![vec![1, 1], vec![1]]),
                plot_std_dev: 1.0,
            })
            .build()
            .is_err());
        assert!(two_treatments().decimals(Some(20)).build().is_err());
    }

    #[test]
    fn test_generate_function_matches_builder() {
        let treatments = [Treatment::new("A", 1.0, 0.5), Treatment::new("B", 2.0, 0.5)];
        let direct = generate(9, &treatments, Some(Replication::Uniform(5)), None).unwrap();
        let built = DesignBuilder::new(9)
            .treatments(treatments.iter().cloned())
            .replication(Replication::Uniform(5))
            .build()
            .unwrap()
            .generate()
            .unwrap();
        assert_eq!(direct, built);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rebuilds_plan() {
        let spec = two_treatments()
            .replication(Replication::PerTreatment(vec![3, 5]))
            .build()
            .unwrap();
        let json = serde_json::to_string(&spec).unwrap();
        assert!(!json.contains("plan"));
        let back: DesignSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert_eq!(back.generate().unwrap(), spec.generate().unwrap());

        // A stray plan is ignored in favour of the layout
        let mut value = serde_json::to_value(&spec).unwrap();
        value["plan"] = serde_json::json!([[]]);
        let back: DesignSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back.counts(), vec![3, 5]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_invalid_design() {
        let spec = two_treatments().build().unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        let mut zero_plots = value.clone();
        zero_plots["layout"] = serde_json::json!({ "Plain": { "Uniform": 0 } });
        assert!(serde_json::from_value::<DesignSpec>(zero_plots).is_err());

        let mut short = value.clone();
        short["layout"] = serde_json::json!({ "Plain": { "PerTreatment": [4] } });
        assert!(serde_json::from_value::<DesignSpec>(short).is_err());

        let mut too_precise = value.clone();
        too_precise["decimals"] = serde_json::json!(40);
        assert!(serde_json::from_value::<DesignSpec>(too_precise).is_err());

        let mut negative_sd = value;
        negative_sd["treatments"][0]["std_dev"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<DesignSpec>(negative_sd).is_err());
    }
}
