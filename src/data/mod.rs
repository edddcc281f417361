//! Observation and dataset types.
//!
//! A [`Dataset`] is an ordered sequence of [`Observation`]s together with the
//! fixed set of treatment labels declared for the experiment. Engines borrow
//! datasets and never mutate them.
//!
//! ## Overview
//!
//! - [`Observation`]: one plot's response, tagged with its treatment
//! - [`Dataset`]: the full experiment, with declared treatment labels
//! - [`Grouping`]: observations partitioned by treatment
//! - [`SecondaryFactor`]: pluggable derivation of a second classification factor

mod grouping;
mod strata;

pub use grouping::{Group, GroupSummary, Grouping};
pub use strata::{tercile_sizes, PositionalTerciles, SecondaryFactor};

use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single experimental unit's response.
///
/// Nested designs additionally tag the observation with the batch it was
/// sampled from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    group_id: String,
    value: f64,
    plot: u32,
    batch: Option<String>,
}

impl Observation {
    /// Create an observation for a treatment.
    #[must_use]
    pub fn new(group_id: impl Into<String>, value: f64) -> Self {
        Self {
            group_id: group_id.into(),
            value,
            plot: 0,
            batch: None,
        }
    }

    /// Set the 1-based plot number within its treatment (or batch).
    #[must_use]
    pub fn with_plot(mut self, plot: u32) -> Self {
        self.plot = plot;
        self
    }

    /// Tag the observation with a batch identifier.
    #[must_use]
    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }

    /// Treatment label.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Response value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Plot number (0 when not set).
    #[must_use]
    pub fn plot(&self) -> u32 {
        self.plot
    }

    /// Batch identifier for nested designs.
    #[must_use]
    pub fn batch(&self) -> Option<&str> {
        self.batch.as_deref()
    }
}

/// An experiment's observations and its declared treatment labels.
///
/// Every observation's label belongs to the declared set. Groups may be
/// unbalanced, and a declared treatment may have no observations at all (the
/// analysis engines reject such datasets).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDataset"))]
pub struct Dataset {
    labels: Vec<String>,
    observations: Vec<Observation>,
}

/// Unvalidated wire form of a [`Dataset`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawDataset {
    labels: Vec<String>,
    observations: Vec<Observation>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDataset> for Dataset {
    type Error = Error;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Self::new(raw.labels, raw.observations)
    }
}

impl Dataset {
    /// Create a dataset over a declared set of treatment labels.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a label is declared twice
    /// - an observation's label is not declared
    pub fn new(labels: Vec<String>, observations: Vec<Observation>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(Error::invalid_params(format!(
                    "treatment label {label:?} declared more than once"
                )));
            }
        }

        if let Some(obs) = observations
            .iter()
            .find(|o| !seen.contains(o.group_id()))
        {
            return Err(Error::UnknownLabel {
                label: obs.group_id().to_string(),
            });
        }

        Ok(Self {
            labels,
            observations,
        })
    }

    /// Create a dataset whose labels are inferred from the observations,
    /// in order of first appearance.
    #[must_use]
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut labels: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for obs in &observations {
            if seen.insert(obs.group_id()) {
                labels.push(obs.group_id().to_string());
            }
        }
        Self {
            labels,
            observations,
        }
    }

    /// Create a dataset from `(label, value)` pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use crd_anova::Dataset;
    ///
    /// let data = Dataset::from_pairs([("A", 1.0), ("A", 2.0), ("B", 4.0)]);
    /// assert_eq!(data.len(), 3);
    /// assert_eq!(data.labels(), ["A", "B"]);
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::from_observations(
            pairs
                .into_iter()
                .map(|(label, value)| Observation::new(label, value))
                .collect(),
        )
    }

    /// Declared treatment labels, in declaration order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// All observations, in dataset order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations (N).
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the dataset has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Iterate over observations.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Iterate over response values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(Observation::value)
    }

    /// Mean of all responses, `None` for an empty dataset.
    #[must_use]
    pub fn grand_mean(&self) -> Option<f64> {
        if self.observations.is_empty() {
            return None;
        }
        Some(self.values().sum::<f64>() / self.observations.len() as f64)
    }

    /// Partition observations by treatment.
    #[must_use]
    pub fn grouping(&self) -> Grouping<'_> {
        Grouping::new(self)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:>6} {:<10} {:>14}", "Treatment", "Plot", "Batch", "Yield")?;
        for obs in &self.observations {
            writeln!(
                f,
                "{:<10} {:>6} {:<10} {:>14.1}",
                obs.group_id(),
                obs.plot(),
                obs.batch().unwrap_or("-"),
                obs.value()
            )?;
        }
        Ok(())
    }
}
