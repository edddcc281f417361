//! Analysis of variance for completely randomized designs.
//!
//! ## Quick Start
//!
//! ```rust
//! use crd_anova::anova::{analyze_one_way, analyze_two_way};
//! use crd_anova::Dataset;
//!
//! let data = Dataset::from_pairs([
//!     ("T1", 31.0), ("T1", 33.0), ("T1", 32.0),
//!     ("T2", 28.0), ("T2", 27.0), ("T2", 29.0),
//!     ("T3", 36.0), ("T3", 35.0), ("T3", 34.0),
//! ]);
//!
//! let one_way = analyze_one_way(&data).unwrap();
//! assert!(one_way.significant);
//!
//! let two_way = analyze_two_way(&data).unwrap();
//! assert_eq!(two_way.secondary_levels, vec!["High", "Medium", "Low"]);
//! ```
//!
//! ## Analysis Types
//!
//! ### One-way
//!
//! Tests whether treatment means differ. Between-treatment variation is
//! compared to within-treatment variation with an F-ratio on (k - 1, N - k)
//! degrees of freedom.
//!
//! ### Two-way
//!
//! Crosses the treatments with a [`SecondaryFactor`](crate::data::SecondaryFactor)
//! (positional terciles by default) and tests both main effects and their
//! interaction against the residual. Cells may be unequal or empty.
//!
//! ## Zero variance
//!
//! If every treatment is constant, the one-way F-ratio is reported as 0 with
//! p = 1 when the treatment means agree, and as
//! [`Error::DegenerateVariance`](crate::Error::DegenerateVariance) when they
//! differ. The two-way engine never fails on this condition: effects get
//! F = 0, p = 1.

mod one_way;
pub mod stats;
mod two_way;
mod types;

pub use one_way::{analyze_one_way, analyze_one_way_with};
pub use two_way::{analyze_two_way, analyze_two_way_with};
pub use types::{
    AnovaConfig, AnovaEntry, CellSummary, EmptyCell, OneWayResult, Source, TwoWayResult,
};
