//! Secondary classification factors for two-way analysis.
//!
//! A [`SecondaryFactor`] assigns each member of a treatment group to one of a
//! fixed, ordered set of levels. The two-way engine crosses these levels with
//! the treatments.

use super::Observation;

/// Derivation of a second classification factor.
///
/// Implementations are applied independently to each treatment group and
/// must return exactly one level index per member, each below
/// `level_names().len()`.
pub trait SecondaryFactor {
    /// Ordered level names, shared by all treatment groups.
    fn level_names(&self) -> Vec<String>;

    /// Level index of each member of one treatment group, in member order.
    fn assign(&self, members: &[&Observation]) -> Vec<usize>;
}

/// Stratum sizes `[first, middle, last]` for a group of `n` members.
///
/// The first and last strata hold `n / 3` members each; the middle stratum
/// absorbs the remainder.
///
/// # Examples
///
/// ```
/// use crd_anova::data::tercile_sizes;
///
/// assert_eq!(tercile_sizes(15), [5, 5, 5]);
/// assert_eq!(tercile_sizes(14), [4, 6, 4]);
/// assert_eq!(tercile_sizes(2), [0, 2, 0]);
/// ```
#[must_use]
pub fn tercile_sizes(n: usize) -> [usize; 3] {
    let outer = n / 3;
    [outer, n - 2 * outer, outer]
}

/// Splits each treatment group into three strata by position.
///
/// The first third of a group (in dataset order) is the first level, the last
/// third the last level, and everything else the middle level. Level names
/// default to `High`, `Medium`, `Low`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalTerciles {
    names: [String; 3],
}

impl PositionalTerciles {
    /// Terciles named `High`, `Medium`, `Low`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_names("High", "Medium", "Low")
    }

    /// Terciles with custom level names.
    #[must_use]
    pub fn with_names(
        first: impl Into<String>,
        middle: impl Into<String>,
        last: impl Into<String>,
    ) -> Self {
        Self {
            names: [first.into(), middle.into(), last.into()],
        }
    }
}

impl Default for PositionalTerciles {
    fn default() -> Self {
        Self::new()
    }
}

impl SecondaryFactor for PositionalTerciles {
    fn level_names(&self) -> Vec<String> {
        self.names.to_vec()
    }

    fn assign(&self, members: &[&Observation]) -> Vec<usize> {
        let [first, middle, last] = tercile_sizes(members.len());
        let mut levels = Vec::with_capacity(members.len());
        levels.extend(std::iter::repeat(0).take(first));
        levels.extend(std::iter::repeat(1).take(middle));
        levels.extend(std::iter::repeat(2).take(last));
        levels
    }
}
