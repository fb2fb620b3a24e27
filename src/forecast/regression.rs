//! Ordinary least-squares polynomial fitting

use crate::{ForecastError, Result};
use nalgebra::{DMatrix, DVector};

const SVD_EPSILON: f64 = 1e-12;

/// Polynomial `c0 + c1·x + c2·x² + …` fitted by least squares
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Fit a polynomial of `degree` to the paired samples.
    ///
    /// Needs at least `degree + 1` samples.
    pub fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(ForecastError::model_fit(format!(
                "Mismatched sample lengths: {} x values, {} y values",
                xs.len(),
                ys.len()
            )));
        }
        let terms = degree + 1;
        if xs.len() < terms {
            return Err(ForecastError::insufficient_data("polynomial_regression", terms, xs.len()));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(ForecastError::model_fit("Non-finite sample in polynomial fit"));
        }

        let design = DMatrix::from_fn(xs.len(), terms, |row, col| xs[row].powi(col as i32));
        let target = DVector::from_column_slice(ys);

        let solution = design
            .svd(true, true)
            .solve(&target, SVD_EPSILON)
            .map_err(ForecastError::model_fit)?;

        let coefficients: Vec<f64> = solution.iter().copied().collect();
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::model_fit("Polynomial fit produced non-finite coefficients"));
        }

        Ok(Self { coefficients })
    }

    /// Evaluate at `x` (Horner's rule)
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }

    /// Coefficients, lowest order first
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }
}
