//! # crd-anova
//!
//! Analysis of variance for completely randomized designs (CRD), with Tukey
//! HSD post-hoc comparisons and a generator of synthetic field-trial data.
//!
//! ## Overview
//!
//! A completely randomized design assigns treatments to experimental units
//! (plots) at random. This library provides:
//! - One-way ANOVA with sum-of-squares decomposition, F-statistic and p-value
//! - Two-way ANOVA with interaction against a derived secondary factor
//! - Tukey HSD pairwise comparisons (Tukey-Kramer for unequal groups)
//! - Reproducible generation of plain and sub-sampled (nested) designs
//! - A catalogue of six named field-trial designs and a side-by-side comparison
//! - Tabular export of every result
//!
//! ## Quick Start
//!
//! ```rust
//! use crd_anova::design::DesignId;
//! use crd_anova::tukey::post_hoc;
//! use crd_anova::{analyze_one_way, analyze_two_way, generate_dataset};
//!
//! let data = generate_dataset(DesignId::Balanced).unwrap();
//! assert_eq!(data.len(), 60);
//!
//! let one_way = analyze_one_way(&data).unwrap();
//! assert_eq!(one_way.error.degrees_of_freedom, 56);
//! assert!(one_way.significant);
//!
//! let pairs = post_hoc(&data, &one_way).unwrap().unwrap();
//! assert_eq!(pairs.len(), 6);
//! assert!(pairs.iter().any(|p| p.significant));
//!
//! let two_way = analyze_two_way(&data).unwrap();
//! assert_eq!(two_way.error.degrees_of_freedom, 60 - 12);
//! ```
//!
//! Custom data is built from `(treatment, response)` pairs:
//!
//! ```rust
//! use crd_anova::{analyze_one_way, Dataset};
//!
//! let data = Dataset::from_pairs([
//!     ("A", 4.0), ("A", 5.0), ("A", 6.0),
//!     ("B", 6.0), ("B", 7.0), ("B", 8.0),
//! ]);
//! let result = analyze_one_way(&data).unwrap();
//! assert!((result.f_statistic - 6.0).abs() < 1e-10);
//! ```
//!
//! ## Notation
//!
//! - **k**: number of treatments, **N**: number of observations
//! - **SS**: sum of squares, **DF**: degrees of freedom, **MS**: SS / DF
//! - **F**: ratio of an effect's MS to the error MS
//!
//! ## Logging
//!
//! Engines emit `tracing` events (debug summaries, warnings for empty two-way
//! cells and failed comparison rows). No subscriber is installed.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of data, designs and results
//! - `parallel`: Enable parallel design comparison using rayon
//! - `python`: Enable Python bindings via PyO3

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod anova;
pub mod compare;
pub mod data;
pub mod design;
pub mod error;
#[cfg(feature = "python")]
pub mod python;
pub mod report;
pub mod tukey;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::anova::{
        analyze_one_way, analyze_one_way_with, analyze_two_way, analyze_two_way_with,
        AnovaConfig, AnovaEntry, CellSummary, EmptyCell, OneWayResult, Source, TwoWayResult,
    };
    pub use crate::compare::{
        compare_catalogue, compare_designs, compare_designs_with, ComparisonRow, ComparisonStats,
    };
    pub use crate::data::{
        Dataset, GroupSummary, Grouping, Observation, PositionalTerciles, SecondaryFactor,
    };
    pub use crate::design::{
        generate, generate_dataset, list_designs, DesignBuilder, DesignId, DesignSpec, Layout,
        NestingSpec, PlotCounts, Replication, Treatment,
    };
    pub use crate::error::{Error, Result};
    pub use crate::report::{Cell, Sheet, Workbook};
    pub use crate::tukey::{post_hoc, tukey_hsd, tukey_hsd_with, PairwiseComparison, TukeyConfig};

    #[cfg(feature = "parallel")]
    pub use crate::compare::par_compare_designs;
}

// Re-export commonly used items at crate root
pub use anova::{analyze_one_way, analyze_two_way};
pub use compare::compare_designs;
pub use data::{Dataset, Observation};
pub use design::generate_dataset;
pub use error::{Error, Result};
pub use tukey::tukey_hsd;

#[cfg(feature = "parallel")]
pub use compare::par_compare_designs;
