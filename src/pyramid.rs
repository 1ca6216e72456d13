//! N-dimensional pyramid likelihood.

use crate::error::Result;
use crate::math::sub_abs;
use crate::model::Model;
use crate::points::LivePoints;
use crate::prior::UniformPrior;

#[derive(Debug, Clone)]
pub struct PyramidSettings {
    pub dims: usize,
    pub bounds: [f64; 2],
}

impl Default for PyramidSettings {
    fn default() -> Self {
        Self {
            dims: 2,
            bounds: [-10., 10.],
        }
    }
}

/// `log L = -sum |x_i|`, with a single maximum of zero at the origin.
#[derive(Debug, Clone)]
pub struct Pyramid {
    prior: UniformPrior,
    ln_evidence: f64,
}

/// `ln` of the integral of `exp(-|x|)` over `[lower, upper]`.
fn ln_tent_mass(lower: f64, upper: f64) -> f64 {
    let width = upper - lower;
    if lower >= 0. {
        -lower + (-(-width).exp_m1()).ln()
    } else if upper <= 0. {
        upper + (-(-width).exp_m1()).ln()
    } else {
        (-lower.exp_m1() - (-upper).exp_m1()).ln()
    }
}

impl Pyramid {
    pub fn new(settings: PyramidSettings) -> Result<Self> {
        let prior = UniformPrior::n_dimensional(settings.dims, &settings.bounds)?;
        let ln_mass: f64 = prior
            .iter_bounds()
            .map(|(_, [l, u])| ln_tent_mass(l, u))
            .sum();
        let ln_evidence = ln_mass - prior.ln_volume();
        Ok(Self { prior, ln_evidence })
    }
}

impl Model for Pyramid {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let mut log_l = vec![0.; points.len()];
        for name in self.prior.names() {
            sub_abs(&mut log_l, points.column(name)?);
        }
        Ok(log_l)
    }

    fn ln_evidence(&self) -> Option<f64> {
        Some(self.ln_evidence)
    }
}
