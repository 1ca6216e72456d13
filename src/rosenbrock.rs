//! N-dimensional Rosenbrock likelihood.

use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::points::LivePoints;
use crate::prior::UniformPrior;

/// Classic coupled Rosenbrock function,
/// `sum_i 100 (x_{i+1} - x_i^2)^2 + (1 - x_i)^2`.
pub fn rosenbrock(x: &[f64]) -> f64 {
    x.windows(2)
        .map(|w| {
            let a = w[1] - w[0] * w[0];
            let b = 1. - w[0];
            100. * a * a + b * b
        })
        .sum()
}

/// Sum of independent two-dimensional Rosenbrock functions over the pairs
/// `(x_{2i}, x_{2i+1})`.
pub fn uncoupled_rosenbrock(x: &[f64]) -> f64 {
    x.chunks_exact(2)
        .map(|pair| {
            let a = pair[0] * pair[0] - pair[1];
            let b = pair[0] - 1.;
            100. * a * a + b * b
        })
        .sum()
}

#[derive(Debug, Clone)]
pub struct RosenbrockSettings {
    pub dims: usize,
    pub bounds: [f64; 2],
    /// Use the uncoupled variant, which needs an even number of dimensions.
    pub uncoupled: bool,
}

impl Default for RosenbrockSettings {
    fn default() -> Self {
        Self {
            dims: 2,
            bounds: [-5., 5.],
            uncoupled: false,
        }
    }
}

/// Negated Rosenbrock function; the maximum of zero is at `x_i = 1`.
#[derive(Debug, Clone)]
pub struct Rosenbrock {
    prior: UniformPrior,
    func: fn(&[f64]) -> f64,
    uncoupled: bool,
}

impl Rosenbrock {
    pub fn new(settings: RosenbrockSettings) -> Result<Self> {
        let prior = UniformPrior::n_dimensional(settings.dims, &settings.bounds)?;
        let func: fn(&[f64]) -> f64 = if settings.uncoupled {
            if settings.dims % 2 != 0 {
                return Err(ModelError::InvalidArgument(format!(
                    "uncoupled Rosenbrock needs an even number of dimensions, got {}",
                    settings.dims
                )));
            }
            uncoupled_rosenbrock
        } else {
            rosenbrock
        };
        Ok(Self {
            prior,
            func,
            uncoupled: settings.uncoupled,
        })
    }

    pub fn is_uncoupled(&self) -> bool {
        self.uncoupled
    }
}

impl Model for Rosenbrock {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let columns = points.select(self.prior.names())?;
        let mut x = vec![0.; columns.len()];
        Ok((0..points.len())
            .map(|i| {
                x.iter_mut().zip(&columns).for_each(|(x, col)| *x = col[i]);
                -(self.func)(&x)
            })
            .collect())
    }
}
