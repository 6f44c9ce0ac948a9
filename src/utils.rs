//! Python conversion helpers for the `python-bindings` surface.
//!
//! Everything here is FFI glue: turning Python array-likes, dicts, and
//! callables into the validated Rust types of [`crate::psi`] and
//! [`crate::psychometric`].
#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArray1};

#[cfg(feature = "python-bindings")]
use crate::{
    psi::core::params::{Parameter, ParameterSpace},
    psychometric::{Theta, TryFromFn, try_from_fn},
};

/// Extract a contiguous 1-D `f64` array from a numpy array, a pandas-like
/// object with `to_numpy`, or any Python sequence of floats.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy an array-like into an owned `Vec<f64>`.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_vec<'py>(py: Python<'py>, raw_data: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr
        .as_slice()
        .map_err(|_| PyValueError::new_err("expected a contiguous 1-D float64 array"))?;
    Ok(slice.to_vec())
}

/// Build a [`ParameterSpace`] from a Python dict.
///
/// Each value is either an array-like of levels (flat prior) or a dict with
/// `levels`, optional `prior`, and optional `marginalise` (bool). Axis order
/// follows dict insertion order.
#[cfg(feature = "python-bindings")]
pub fn extract_parameter_space<'py>(
    py: Python<'py>, params: &Bound<'py, PyDict>,
) -> PyResult<ParameterSpace> {
    let mut parameters = Vec::with_capacity(params.len());
    for (key, value) in params.iter() {
        let name: String = key.extract()?;
        let parameter = match value.downcast::<PyDict>() {
            Ok(spec) => {
                let levels_any = spec.get_item("levels")?.ok_or_else(|| {
                    PyValueError::new_err(format!("parameter '{name}' is missing 'levels'"))
                })?;
                let levels = extract_f64_vec(py, &levels_any)?;
                let parameter = match spec.get_item("prior")? {
                    Some(prior) if !prior.is_none() => {
                        Parameter::new(name.as_str(), levels, extract_f64_vec(py, &prior)?)?
                    }
                    _ => Parameter::uniform(name.as_str(), levels)?,
                };
                let marginalise = match spec.get_item("marginalise")? {
                    Some(flag) => flag.extract::<bool>()?,
                    None => false,
                };
                if marginalise { parameter.marginalised() } else { parameter }
            }
            Err(_) => Parameter::uniform(name.as_str(), extract_f64_vec(py, &value)?)?,
        };
        parameters.push(parameter);
    }
    Ok(ParameterSpace::new(parameters)?)
}

/// Psychometric function backed by a Python callable `pf(x, **params)`.
///
/// A raised exception or a non-float return value evaluates to NaN, which
/// the likelihood table rejects; the first such `PyErr` is kept so the
/// caller can re-raise it with its original type and traceback.
#[cfg(feature = "python-bindings")]
pub type PyPsychometric = TryFromFn<Box<dyn Fn(f64, &Theta) -> PyResult<f64>>, PyErr>;

/// Wrap `func` as a [`PyPsychometric`].
#[cfg(feature = "python-bindings")]
pub fn py_psychometric(func: &Bound<'_, PyAny>) -> PyResult<PyPsychometric> {
    if !func.is_callable() {
        return Err(PyTypeError::new_err("pf must be callable"));
    }
    let func: Py<PyAny> = func.clone().unbind();
    let call: Box<dyn Fn(f64, &Theta) -> PyResult<f64>> = Box::new(move |x, theta| {
        Python::with_gil(|py| {
            let kwargs = PyDict::new(py);
            for (name, value) in theta.names().iter().zip(theta.values()) {
                kwargs.set_item(name, *value)?;
            }
            func.bind(py).call((x,), Some(&kwargs))?.extract::<f64>()
        })
    });
    Ok(try_from_fn(call))
}
