//! Python bindings for the stereobm block matcher.
//!
//! This module exposes configuration, the one-shot matcher and the sentinel
//! value to Python via PyO3. Disparity maps are returned as `int16` arrays in
//! 1/16 pixel.

use numpy::{IntoPyArray, PyArray2, PyArrayMethods, PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use stereobm::{
    compute_disparity_with, ImageView, Passthrough, SobelClip, StereoConfig as RustStereoConfig,
    StereoError, DISPARITY_SCALE, FILTERED,
};

/// Convert a StereoError to a Python exception.
fn to_py_err(err: StereoError) -> PyErr {
    match err {
        StereoError::InvalidConfig { .. }
        | StereoError::SizeMismatch { .. }
        | StereoError::FrameSizeMismatch { .. } => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Matcher parameters.
#[pyclass]
#[derive(Clone)]
pub struct StereoConfig {
    inner: RustStereoConfig,
}

#[pymethods]
impl StereoConfig {
    /// Create a new StereoConfig.
    ///
    /// Args:
    ///     window_size: Odd SAD window side, at least 5 (default: 11)
    ///     num_disparities: Number of disparity candidates (default: 32)
    ///     lane_width: Candidates per sweep, divides num_disparities (default: 8)
    ///     pre_filter_cap: Prefilter clamp in 1..=63 (default: 31)
    ///     texture_threshold: Minimum window texture (default: 10)
    ///     uniqueness_ratio: Percent margin, 0 disables (default: 15)
    ///     parallel: Match rows in parallel (default: False)
    #[new]
    #[pyo3(signature = (
        window_size = 11,
        num_disparities = 32,
        lane_width = 8,
        pre_filter_cap = 31,
        texture_threshold = 10,
        uniqueness_ratio = 15,
        parallel = false
    ))]
    fn new(
        window_size: usize,
        num_disparities: usize,
        lane_width: usize,
        pre_filter_cap: u8,
        texture_threshold: i32,
        uniqueness_ratio: i32,
        parallel: bool,
    ) -> PyResult<Self> {
        let inner = RustStereoConfig {
            window_size,
            num_disparities,
            lane_width,
            pre_filter_cap,
            texture_threshold,
            uniqueness_ratio,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Validate the configuration.
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(to_py_err)
    }

    #[getter]
    fn window_size(&self) -> usize {
        self.inner.window_size
    }

    #[getter]
    fn num_disparities(&self) -> usize {
        self.inner.num_disparities
    }

    #[getter]
    fn lane_width(&self) -> usize {
        self.inner.lane_width
    }

    fn __repr__(&self) -> String {
        format!(
            "StereoConfig(window_size={}, num_disparities={}, lane_width={}, pre_filter_cap={}, texture_threshold={}, uniqueness_ratio={}, parallel={})",
            self.inner.window_size,
            self.inner.num_disparities,
            self.inner.lane_width,
            self.inner.pre_filter_cap,
            self.inner.texture_threshold,
            self.inner.uniqueness_ratio,
            self.inner.parallel
        )
    }
}

/// Compute the disparity map of a rectified grayscale pair.
///
/// Args:
///     left: 2D uint8 numpy array (height x width)
///     right: 2D uint8 numpy array with the same shape
///     config: StereoConfig (default: StereoConfig())
///     prefilter: "sobel" or "none" (default: "sobel")
///
/// Returns:
///     2D int16 array in 1/16 pixel; FILTERED marks rejected pixels
#[pyfunction]
#[pyo3(signature = (left, right, config = None, prefilter = "sobel"))]
fn compute_disparity<'py>(
    py: Python<'py>,
    left: PyReadonlyArray2<'py, u8>,
    right: PyReadonlyArray2<'py, u8>,
    config: Option<StereoConfig>,
    prefilter: &str,
) -> PyResult<Bound<'py, PyArray2<i16>>> {
    let cfg = config.map(|c| c.inner).unwrap_or_default();

    let l_shape = left.shape();
    let r_shape = right.shape();
    let l_view =
        ImageView::from_slice(left.as_slice()?, l_shape[1], l_shape[0]).map_err(to_py_err)?;
    let r_view =
        ImageView::from_slice(right.as_slice()?, r_shape[1], r_shape[0]).map_err(to_py_err)?;

    let map = match prefilter.to_lowercase().as_str() {
        "sobel" => {
            let filter = SobelClip::new(cfg.pre_filter_cap).map_err(to_py_err)?;
            compute_disparity_with(&filter, l_view, r_view, &cfg)
        }
        "none" => compute_disparity_with(&Passthrough, l_view, r_view, &cfg),
        _ => return Err(PyValueError::new_err("prefilter must be 'sobel' or 'none'")),
    }
    .map_err(to_py_err)?;

    let (width, height) = (map.width(), map.height());
    map.into_vec().into_pyarray(py).reshape([height, width])
}

/// Load a grayscale image from disk as a 2D uint8 array.
///
/// Args:
///     path: Path to grayscale or RGB image file
#[pyfunction]
fn load_gray<'py>(py: Python<'py>, path: &str) -> PyResult<Bound<'py, PyArray2<u8>>> {
    let owned = stereobm::image::io::load_gray_image(path).map_err(to_py_err)?;
    let (width, height) = (owned.width(), owned.height());
    owned.into_vec().into_pyarray(py).reshape([height, width])
}

/// Python module for stereo block matching.
#[pymodule]
fn _stereobm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<StereoConfig>()?;
    m.add_function(wrap_pyfunction!(compute_disparity, m)?)?;
    m.add_function(wrap_pyfunction!(load_gray, m)?)?;

    m.add("FILTERED", FILTERED)?;
    m.add("DISPARITY_SCALE", DISPARITY_SCALE)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
