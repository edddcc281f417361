//! Partitioning a dataset by treatment.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Dataset, Observation};
use crate::error::{Error, Result};

/// The observations sharing one treatment label.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    /// Treatment label.
    pub label: &'a str,
    /// Members, in dataset order.
    pub members: Vec<&'a Observation>,
}

impl Group<'_> {
    /// Number of observations in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over the group's response values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.members.iter().map(|o| o.value())
    }
}

/// Descriptive statistics for one treatment group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupSummary {
    /// Treatment label.
    pub label: String,
    /// Number of observations.
    pub n: usize,
    /// Sum of responses.
    pub sum: f64,
    /// Mean response.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator, 0 for a single value).
    pub std_dev: f64,
    /// Smallest response.
    pub min: f64,
    /// Largest response.
    pub max: f64,
}

impl GroupSummary {
    /// Summarize a non-empty group.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` if the group has no observations.
    pub fn from_group(group: &Group<'_>) -> Result<Self> {
        if group.is_empty() {
            return Err(Error::insufficient_data(format!(
                "treatment {:?} has no observations",
                group.label
            )));
        }

        let n = group.len();
        let sum: f64 = group.values().sum();
        let mean = sum / n as f64;
        let std_dev = if n > 1 {
            let ss: f64 = group.values().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        let min = group.values().fold(f64::INFINITY, f64::min);
        let max = group.values().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            label: group.label.to_string(),
            n,
            sum,
            mean,
            std_dev,
            min,
            max,
        })
    }
}

/// A dataset partitioned by treatment label.
///
/// Groups follow the dataset's declared label order, so declared treatments
/// without observations appear as empty groups. The concatenation of all
/// groups' members is a permutation of the dataset.
#[derive(Debug, Clone)]
pub struct Grouping<'a> {
    groups: Vec<Group<'a>>,
}

impl<'a> Grouping<'a> {
    /// Partition a dataset by treatment.
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        let mut groups: Vec<Group<'a>> = dataset
            .labels()
            .iter()
            .map(|label| Group {
                label: label.as_str(),
                members: Vec::new(),
            })
            .collect();

        let index: HashMap<&str, usize> = dataset
            .labels()
            .iter()
            .enumerate()
            .map(|(i, label)| (label.as_str(), i))
            .collect();

        for obs in dataset {
            // Dataset construction guarantees every label is declared
            if let Some(&idx) = index.get(obs.group_id()) {
                groups[idx].members.push(obs);
            }
        }

        Self { groups }
    }

    /// All groups, in declared label order.
    #[must_use]
    pub fn groups(&self) -> &[Group<'a>] {
        &self.groups
    }

    /// Number of groups (k).
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of grouped observations (N).
    #[must_use]
    pub fn total(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Look up a group by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Group<'a>> {
        self.groups.iter().find(|g| g.label == label)
    }

    /// Check that there are at least two groups and none is empty.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` describing the first violation.
    pub fn ensure_analyzable(&self) -> Result<()> {
        if self.groups.len() < 2 {
            return Err(Error::insufficient_data(format!(
                "need at least 2 treatment groups, got {}",
                self.groups.len()
            )));
        }
        if let Some(empty) = self.groups.iter().find(|g| g.is_empty()) {
            return Err(Error::insufficient_data(format!(
                "treatment {:?} has no observations",
                empty.label
            )));
        }
        Ok(())
    }

    /// Descriptive statistics for every group.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` if any group is empty.
    pub fn summaries(&self) -> Result<Vec<GroupSummary>> {
        self.groups.iter().map(GroupSummary::from_group).collect()
    }
}
