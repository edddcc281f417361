//! Python bindings for crd-anova.
//!
//! This module exposes the analysis engines and the design catalogue to a
//! Python presentation layer using PyO3. Enable the `python` feature to use
//! this.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::anova::{
    analyze_one_way_with, analyze_two_way, AnovaConfig, AnovaEntry, OneWayResult, Source,
};
use crate::compare::compare_catalogue as compare_all;
use crate::data::{Dataset, Observation};
use crate::design::DesignId;
use crate::error::Error;
use crate::tukey::{tukey_hsd_with, TukeyConfig};

fn to_py_err(e: Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// (source, SS, DF, MS, F, p) as a Python tuple.
type TableRow = (String, f64, usize, Option<f64>, Option<f64>, Option<f64>);

fn table_row(entry: &AnovaEntry) -> TableRow {
    (
        entry.source.to_string(),
        entry.sum_of_squares,
        entry.degrees_of_freedom,
        Some(entry.mean_square),
        entry.f_ratio,
        entry.p_value,
    )
}

// Total carries no mean square, F or p
fn total_row(total_ss: f64, total_df: usize) -> TableRow {
    (Source::Total.to_string(), total_ss, total_df, None, None, None)
}

/// Python wrapper for Dataset
#[pyclass(name = "Dataset")]
#[derive(Clone)]
pub struct PyDataset {
    inner: Dataset,
}

#[pymethods]
impl PyDataset {
    /// Build a dataset from parallel lists of treatment labels and responses.
    #[new]
    fn new(labels: Vec<String>, values: Vec<f64>) -> PyResult<Self> {
        if labels.len() != values.len() {
            return Err(PyValueError::new_err(format!(
                "{} labels for {} values",
                labels.len(),
                values.len()
            )));
        }
        let observations = labels
            .into_iter()
            .zip(values)
            .map(|(label, value)| Observation::new(label, value))
            .collect();
        Ok(Self {
            inner: Dataset::from_observations(observations),
        })
    }

    /// Number of observations.
    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Declared treatment labels.
    #[getter]
    fn labels(&self) -> Vec<String> {
        self.inner.labels().to_vec()
    }

    /// Rows as (plot, batch, treatment, response) tuples.
    fn rows(&self) -> Vec<(u32, Option<String>, String, f64)> {
        self.inner
            .iter()
            .map(|o| {
                (
                    o.plot(),
                    o.batch().map(str::to_string),
                    o.group_id().to_string(),
                    o.value(),
                )
            })
            .collect()
    }
}

/// Python wrapper for OneWayResult
#[pyclass(name = "OneWayResult")]
pub struct PyOneWayResult {
    inner: OneWayResult,
}

#[pymethods]
impl PyOneWayResult {
    /// F-statistic.
    #[getter]
    fn f_statistic(&self) -> f64 {
        self.inner.f_statistic
    }

    /// P-value.
    #[getter]
    fn p_value(&self) -> f64 {
        self.inner.p_value
    }

    /// Whether the treatment effect is significant.
    #[getter]
    fn significant(&self) -> bool {
        self.inner.significant
    }

    /// Mean square error.
    #[getter]
    fn mse(&self) -> f64 {
        self.inner.mse()
    }

    /// Error degrees of freedom.
    #[getter]
    fn df_error(&self) -> usize {
        self.inner.df_error()
    }

    /// Label of the treatment with the highest mean.
    fn best_group(&self) -> Option<String> {
        self.inner.best_group().map(|g| g.label.clone())
    }

    /// Per-treatment (label, n, mean, sum, std, min, max) tuples.
    fn groups(&self) -> Vec<(String, usize, f64, f64, f64, f64, f64)> {
        self.inner
            .groups
            .iter()
            .map(|g| (g.label.clone(), g.n, g.mean, g.sum, g.std_dev, g.min, g.max))
            .collect()
    }

    /// ANOVA table rows (source, SS, DF, MS, F, p).
    fn table(&self) -> Vec<TableRow> {
        vec![
            table_row(&self.inner.treatment),
            table_row(&self.inner.error),
            total_row(self.inner.total_ss, self.inner.total_df),
        ]
    }
}

/// Generate a catalogue design by identifier (e.g. "model-3").
#[pyfunction]
fn generate_dataset(design: &str) -> PyResult<PyDataset> {
    let id: DesignId = design.parse().map_err(to_py_err)?;
    let inner = id.generate().map_err(to_py_err)?;
    Ok(PyDataset { inner })
}

/// Run a one-way ANOVA.
#[pyfunction]
#[pyo3(signature = (data, alpha=0.05))]
fn analyze_one_way(data: &PyDataset, alpha: f64) -> PyResult<PyOneWayResult> {
    let inner = analyze_one_way_with(&data.inner, &AnovaConfig { alpha }).map_err(to_py_err)?;
    Ok(PyOneWayResult { inner })
}

/// Run a two-way ANOVA with positional terciles; returns the table rows.
#[pyfunction]
fn analyze_two_way_table(data: &PyDataset) -> PyResult<Vec<TableRow>> {
    let result = analyze_two_way(&data.inner).map_err(to_py_err)?;
    let mut rows: Vec<TableRow> = result.effects().into_iter().map(table_row).collect();
    rows.push(table_row(&result.error));
    rows.push(total_row(result.total_ss, result.total_df));
    Ok(rows)
}

/// Tukey HSD; returns (pair, difference, hsd, significant) tuples.
#[pyfunction]
#[pyo3(signature = (data, mse, df_error, confidence=0.95))]
fn tukey_hsd(
    data: &PyDataset,
    mse: f64,
    df_error: usize,
    confidence: f64,
) -> PyResult<Vec<(String, f64, f64, bool)>> {
    let config = TukeyConfig {
        confidence_level: confidence,
    };
    let pairs = tukey_hsd_with(&data.inner, mse, df_error, &config).map_err(to_py_err)?;
    Ok(pairs
        .iter()
        .map(|p| (p.pair(), p.abs_mean_difference, p.hsd_threshold, p.significant))
        .collect())
}

/// Compare all catalogue designs; failed rows have no F or p-value.
#[pyfunction]
fn compare_catalogue() -> Vec<(String, usize, Option<f64>, Option<f64>, Option<f64>, bool)> {
    compare_all()
        .into_iter()
        .map(|row| {
            let stats = row.stats().cloned();
            (
                row.label,
                row.n_total,
                row.grand_mean,
                stats.as_ref().map(|s| s.f_statistic),
                stats.as_ref().map(|s| s.p_value),
                stats.is_some_and(|s| s.significant),
            )
        })
        .collect()
}

/// The crd-anova Python module.
#[pymodule]
fn crd_anova(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyDataset>()?;
    m.add_class::<PyOneWayResult>()?;
    m.add_function(wrap_pyfunction!(generate_dataset, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_one_way, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_two_way_table, m)?)?;
    m.add_function(wrap_pyfunction!(tukey_hsd, m)?)?;
    m.add_function(wrap_pyfunction!(compare_catalogue, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_match_sheet_layout() {
        let data = Dataset::from_pairs([
            ("A", 1.0),
            ("A", 2.0),
            ("A", 3.0),
            ("B", 5.0),
            ("B", 6.0),
            ("B", 7.0),
        ]);
        let result = analyze_one_way_with(&data, &AnovaConfig::default()).unwrap();

        let error = table_row(&result.error);
        assert_eq!(error.2, 4);
        // SSW = 2 + 2, MSW = 1
        assert!((error.3.unwrap() - 1.0).abs() < 1e-12);

        let total = total_row(result.total_ss, result.total_df);
        assert_eq!(total.0, "Total");
        assert_eq!(total.2, 5);
        assert!((total.1 - 28.0).abs() < 1e-12);
        assert_eq!((total.3, total.4, total.5), (None, None, None));
    }
}
