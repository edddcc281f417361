//! Tabular export of datasets and analysis results.
//!
//! Every result maps onto a [`Sheet`]: a header row of column labels and rows
//! of typed [`Cell`]s. A [`Workbook`] bundles the sheets of one analysis
//! (raw data, group summary, ANOVA tables, Tukey comparisons) for a
//! spreadsheet writer or CSV export.
//!
//! ## Example
//!
//! ```rust
//! use crd_anova::report::Workbook;
//! use crd_anova::{analyze_one_way, Dataset};
//!
//! let data = Dataset::from_pairs([("A", 1.0), ("A", 2.0), ("B", 5.0), ("B", 6.0)]);
//! let anova = analyze_one_way(&data).unwrap();
//!
//! let book = Workbook::from_analysis(&data, &anova, None, None);
//! let sheet = book.sheet("One-way ANOVA").unwrap();
//! assert_eq!(sheet.rows.len(), 3);
//! assert!(sheet.to_csv().starts_with("Source,SS,DF,MS,F,p-value\n"));
//! ```

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anova::{AnovaEntry, OneWayResult, Source, TwoWayResult};
use crate::compare::ComparisonRow;
use crate::data::{Dataset, GroupSummary};
use crate::tukey::PairwiseComparison;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cell {
    /// No value.
    Empty,
    /// Text.
    Text(String),
    /// Count or index.
    Integer(u64),
    /// Real number.
    Number(f64),
    /// Yes/no flag.
    Bool(bool),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Self::Integer(n as u64)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Self::Integer(u64::from(n))
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(x) => write!(f, "{x}"),
            Self::Bool(true) => f.write_str("yes"),
            Self::Bool(false) => f.write_str("no"),
        }
    }
}

/// A named table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sheet {
    /// Sheet name.
    pub name: String,
    /// Column labels.
    pub columns: Vec<String>,
    /// Rows, each with one cell per column.
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// An empty sheet with the given columns.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Index of a column by label.
    #[must_use]
    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Raw observations: plot, optional batch, treatment, response.
    #[must_use]
    pub fn raw_data(dataset: &Dataset) -> Self {
        let nested = dataset.iter().any(|o| o.batch().is_some());
        let columns: &[&str] = if nested {
            &["Plot", "Batch", "Treatment", "Response"]
        } else {
            &["Plot", "Treatment", "Response"]
        };
        let mut sheet = Self::new("Raw data", columns);
        for obs in dataset {
            let mut row = vec![Cell::from(obs.plot())];
            if nested {
                row.push(obs.batch().map(str::to_string).into());
            }
            row.push(obs.group_id().into());
            row.push(obs.value().into());
            sheet.push_row(row);
        }
        sheet
    }

    /// Descriptive statistics per treatment.
    #[must_use]
    pub fn group_summary(groups: &[GroupSummary]) -> Self {
        let mut sheet = Self::new(
            "Group summary",
            &["Treatment", "n", "Mean", "Sum", "Std dev", "Min", "Max"],
        );
        for g in groups {
            sheet.push_row(vec![
                g.label.as_str().into(),
                g.n.into(),
                g.mean.into(),
                g.sum.into(),
                g.std_dev.into(),
                g.min.into(),
                g.max.into(),
            ]);
        }
        sheet
    }

    /// One-way ANOVA table: treatment, error and total rows.
    #[must_use]
    pub fn one_way(result: &OneWayResult) -> Self {
        let mut sheet = Self::new("One-way ANOVA", &ANOVA_COLUMNS);
        sheet.push_row(anova_row(&result.treatment));
        sheet.push_row(anova_row(&result.error));
        sheet.push_row(total_row(result.total_ss, result.total_df));
        sheet
    }

    /// Two-way ANOVA table: A, B, A × B, error and total rows.
    #[must_use]
    pub fn two_way(result: &TwoWayResult) -> Self {
        let mut sheet = Self::new("Two-way ANOVA", &ANOVA_COLUMNS);
        for entry in result.effects() {
            sheet.push_row(anova_row(entry));
        }
        sheet.push_row(anova_row(&result.error));
        sheet.push_row(total_row(result.total_ss, result.total_df));
        sheet
    }

    /// Tukey HSD pairwise comparisons.
    #[must_use]
    pub fn tukey(comparisons: &[PairwiseComparison]) -> Self {
        let mut sheet = Self::new(
            "Tukey HSD",
            &[
                "Comparison",
                "Mean 1",
                "Mean 2",
                "Difference",
                "HSD",
                "Significant",
            ],
        );
        for c in comparisons {
            sheet.push_row(vec![
                c.pair().into(),
                c.mean_first.into(),
                c.mean_second.into(),
                c.abs_mean_difference.into(),
                c.hsd_threshold.into(),
                c.significant.into(),
            ]);
        }
        sheet
    }

    /// Comparison of several designs; failed rows carry the error message.
    #[must_use]
    pub fn comparison(rows: &[ComparisonRow]) -> Self {
        let mut sheet = Self::new(
            "Design comparison",
            &["Design", "n", "Grand mean", "F", "p-value", "Significant"],
        );
        for row in rows {
            let mut cells: Vec<Cell> = vec![
                row.label.as_str().into(),
                row.n_total.into(),
                row.grand_mean.into(),
            ];
            match &row.outcome {
                Ok(stats) => cells.extend([
                    Cell::from(stats.f_statistic),
                    Cell::from(stats.p_value),
                    Cell::from(stats.significant),
                ]),
                Err(e) => cells.extend([Cell::from(e.to_string()), Cell::Empty, Cell::Empty]),
            }
            sheet.push_row(cells);
        }
        sheet
    }

    /// Render as CSV with a header line.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_csv_line(&mut out, self.columns.iter().map(String::as_str));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            write_csv_line(&mut out, cells.iter().map(String::as_str));
        }
        out
    }
}

const ANOVA_COLUMNS: [&str; 6] = ["Source", "SS", "DF", "MS", "F", "p-value"];

fn anova_row(entry: &AnovaEntry) -> Vec<Cell> {
    vec![
        entry.source.to_string().into(),
        entry.sum_of_squares.into(),
        entry.degrees_of_freedom.into(),
        entry.mean_square.into(),
        entry.f_ratio.into(),
        entry.p_value.into(),
    ]
}

fn total_row(total_ss: f64, total_df: usize) -> Vec<Cell> {
    vec![
        Source::Total.to_string().into(),
        total_ss.into(),
        total_df.into(),
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
    ]
}

fn write_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains(&[',', '"', '\n', '\r'][..]) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

/// The sheets of one analysis.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Workbook {
    /// Sheets in export order.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Raw data, group summary and one-way ANOVA sheets, followed by the
    /// two-way ANOVA and Tukey sheets when given.
    #[must_use]
    pub fn from_analysis(
        dataset: &Dataset,
        one_way: &OneWayResult,
        two_way: Option<&TwoWayResult>,
        tukey: Option<&[PairwiseComparison]>,
    ) -> Self {
        let mut sheets = vec![
            Sheet::raw_data(dataset),
            Sheet::group_summary(&one_way.groups),
            Sheet::one_way(one_way),
        ];
        if let Some(result) = two_way {
            sheets.push(Sheet::two_way(result));
        }
        if let Some(comparisons) = tukey {
            sheets.push(Sheet::tukey(comparisons));
        }
        Self { sheets }
    }

    /// Look up a sheet by name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
