//! Bimodal likelihood from Brewer et al. (arXiv:0912.2380).

use crate::error::{ModelError, Result};
use crate::math::logaddexp;
use crate::model::Model;
use crate::mvn::{GaussianComponent, MultivariateNormal};
use crate::points::LivePoints;
use crate::prior::UniformPrior;

/// Defaults match the paper. Skilling's original "statistics problem" is
/// recovered by changing the widths and the weight.
#[derive(Debug, Clone)]
pub struct BrewerSettings {
    /// Mean of the wide peak.
    pub v_mean: f64,
    /// Mean of the narrow peak.
    pub u_mean: f64,
    pub v_width: f64,
    pub u_width: f64,
    /// Weight of the narrow peak relative to the wide one.
    pub weight: f64,
    pub dims: usize,
    pub bounds: [f64; 2],
}

impl Default for BrewerSettings {
    fn default() -> Self {
        Self {
            v_mean: 0.,
            u_mean: 0.031,
            v_width: 0.1,
            u_width: 0.01,
            weight: 100.,
            dims: 20,
            bounds: [-0.5, 0.5],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Brewer {
    prior: UniformPrior,
    v_dist: MultivariateNormal,
    u_dist: MultivariateNormal,
    ln_weight: f64,
    ln_evidence: Option<f64>,
}

impl Brewer {
    pub fn new(settings: BrewerSettings) -> Result<Self> {
        let prior = UniformPrior::n_dimensional(settings.dims, &settings.bounds)?;
        if !(settings.weight.is_finite() && settings.weight > 0.) {
            return Err(ModelError::InvalidArgument(format!(
                "weight must be positive, got {}",
                settings.weight
            )));
        }
        let peak = |mean: f64, width: f64| {
            MultivariateNormal::new(&GaussianComponent::isotropic(
                vec![mean; settings.dims],
                width * width,
            ))
        };
        let v_dist = peak(settings.v_mean, settings.v_width)?;
        let u_dist = peak(settings.u_mean, settings.u_width)?;

        let lower = prior.lower_bounds();
        let upper = prior.upper_bounds();
        let ln_evidence = match (v_dist.box_mass(lower, upper), u_dist.box_mass(lower, upper)) {
            (Some(v), Some(u)) => Some((v + settings.weight * u).ln() - prior.ln_volume()),
            _ => None,
        };

        Ok(Self {
            prior,
            v_dist,
            u_dist,
            ln_weight: settings.weight.ln(),
            ln_evidence,
        })
    }
}

impl Model for Brewer {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let columns = points.select(self.prior.names())?;
        let mut x = vec![0.; self.dims()];
        let mut scratch = vec![0.; self.dims()];
        Ok((0..points.len())
            .map(|i| {
                x.iter_mut().zip(&columns).for_each(|(x, col)| *x = col[i]);
                let wide = self.v_dist.logpdf(&x, &mut scratch);
                let narrow = self.u_dist.logpdf(&x, &mut scratch);
                logaddexp(wide, self.ln_weight + narrow)
            })
            .collect())
    }

    fn ln_evidence(&self) -> Option<f64> {
        self.ln_evidence
    }
}
