//! Half-Gaussian likelihood on the positive orthant.

use std::f64::consts::PI;

use crate::error::{ModelError, Result};
use crate::gaussian::{gaussian_ln_evidence, EvidenceBounds};
use crate::math::add_half_square;
use crate::model::Model;
use crate::points::LivePoints;
use crate::prior::UniformPrior;

#[derive(Debug, Clone)]
pub struct HalfGaussianSettings {
    pub dims: usize,
    /// The lower bound must be zero.
    pub bounds: [f64; 2],
}

impl Default for HalfGaussianSettings {
    fn default() -> Self {
        Self {
            dims: 2,
            bounds: [0., 10.],
        }
    }
}

/// Product of independent unit half-normal densities.
#[derive(Debug, Clone)]
pub struct HalfGaussian {
    prior: UniformPrior,
    ln_evidence: f64,
}

impl HalfGaussian {
    pub fn new(settings: HalfGaussianSettings) -> Result<Self> {
        let prior = UniformPrior::n_dimensional(settings.dims, &settings.bounds)?;
        if !prior.lower_bounds().iter().all(|&l| l == 0.) {
            return Err(ModelError::InvalidBounds(
                "lower bounds must all be zero".into(),
            ));
        }
        let [lower, upper] = settings.bounds;
        let ln_evidence =
            gaussian_ln_evidence(&EvidenceBounds::Shared(lower, upper), Some(settings.dims))?;
        Ok(Self { prior, ln_evidence })
    }
}

impl Model for HalfGaussian {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        // ln(2) - ln(2 pi) / 2 per dimension
        let ln_norm = 2f64.ln() - 0.5 * (2. * PI).ln();
        let mut log_l = vec![self.dims() as f64 * ln_norm; points.len()];
        for name in self.prior.names() {
            let col = points.column(name)?;
            add_half_square(&mut log_l, col);
            log_l.iter_mut().zip(col).for_each(|(log_l, &x)| {
                if x < 0. {
                    *log_l = f64::NEG_INFINITY;
                }
            });
        }
        Ok(log_l)
    }

    fn ln_evidence(&self) -> Option<f64> {
        Some(self.ln_evidence)
    }
}
