//! Python module definition

use crate::config::Config;
use crate::core::statistics::{Histogram, RasterStatistics, StatisticsParams};
use crate::recipes::{Recipe, RecipeParams};
use numpy::PyReadonlyArray2;
use pyo3::prelude::*;

fn to_py_err(e: crate::types::GeeError) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e))
}

#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyStatistics>()?;
    m.add_function(wrap_pyfunction!(recipe_names, m)?)?;
    m.add_function(wrap_pyfunction!(recipe_plan, m)?)?;
    m.add_function(wrap_pyfunction!(compute_statistics, m)?)?;
    Ok(())
}

/// Names of the bundled recipes
#[pyfunction]
fn recipe_names() -> Vec<&'static str> {
    Recipe::ALL.iter().map(Recipe::name).collect()
}

/// JSON plan of a recipe with default parameters
#[pyfunction]
fn recipe_plan(name: &str) -> PyResult<String> {
    let recipe: Recipe = name
        .parse()
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e)))?;
    let config = Config::load(None).map_err(to_py_err)?;
    let script = recipe.build(&RecipeParams::default(), &config).map_err(to_py_err)?;
    let plan = script.plan().map_err(to_py_err)?;
    serde_json::to_string_pretty(&plan).map_err(|e| to_py_err(e.into()))
}

/// Statistics of a 2D array; `None` when every pixel is missing
#[pyfunction]
fn compute_statistics(array: PyReadonlyArray2<f64>, nodata: Option<f64>) -> Option<PyStatistics> {
    let band = array.as_array().to_owned();
    let statistics = RasterStatistics::compute(&band, nodata)?;
    let histogram = Histogram::compute(&band, nodata, StatisticsParams::default().histogram_bins)?;
    Some(PyStatistics { statistics, histogram })
}

/// Python wrapper for RasterStatistics
#[pyclass(name = "Statistics")]
struct PyStatistics {
    statistics: RasterStatistics,
    histogram: Histogram,
}

#[pymethods]
impl PyStatistics {
    #[getter]
    fn count(&self) -> usize {
        self.statistics.count
    }

    #[getter]
    fn missing(&self) -> usize {
        self.statistics.missing
    }

    #[getter]
    fn mean(&self) -> f64 {
        self.statistics.mean
    }

    #[getter]
    fn median(&self) -> f64 {
        self.statistics.median
    }

    #[getter]
    fn mode(&self) -> f64 {
        self.statistics.mode
    }

    #[getter]
    fn std_dev(&self) -> f64 {
        self.statistics.std_dev
    }

    #[getter]
    fn histogram(&self) -> (Vec<f64>, Vec<usize>) {
        (self.histogram.edges.clone(), self.histogram.counts.clone())
    }

    /// (label, value) rows in report order
    fn rows(&self) -> Vec<(&'static str, f64)> {
        self.statistics.rows()
    }

    fn __repr__(&self) -> String {
        format!(
            "Statistics(count={}, missing={}, mean={:.4}, std_dev={:.4})",
            self.statistics.count, self.statistics.missing, self.statistics.mean, self.statistics.std_dev
        )
    }
}
