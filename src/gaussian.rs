//! N-dimensional Gaussian likelihood.

use faer::Mat;
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::mvn::{GaussianComponent, MultivariateNormal};
use crate::points::LivePoints;
use crate::prior::UniformPrior;

/// Prior bounds accepted by [`gaussian_ln_evidence`].
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceBounds {
    /// One `[lower, upper]` pair shared by every dimension.
    Shared(f64, f64),
    /// One `[lower, upper]` pair per dimension.
    PerDimension(Vec<[f64; 2]>),
}

/// Log-evidence of a unit Gaussian likelihood under a uniform prior.
///
/// The Gaussian is assumed to lie well inside the bounds, so the evidence
/// is the inverse prior volume. Shared bounds need `dims`; per-dimension
/// bounds check `dims` against the number of rows when it is given.
pub fn gaussian_ln_evidence(bounds: &EvidenceBounds, dims: Option<usize>) -> Result<f64> {
    match bounds {
        EvidenceBounds::Shared(lower, upper) => {
            let dims = dims.ok_or_else(|| {
                ModelError::InvalidArgument(
                    "dims must be specified if bounds are shared between dimensions".into(),
                )
            })?;
            Ok(-(dims as f64) * (upper - lower).ln())
        }
        EvidenceBounds::PerDimension(rows) => {
            if let Some(dims) = dims {
                if dims != rows.len() {
                    return Err(ModelError::DimensionMismatch {
                        expected: dims,
                        found: rows.len(),
                    });
                }
            }
            Ok(-rows.iter().map(|[l, u]| (u - l).ln()).sum::<f64>())
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaussianSettings {
    pub dims: usize,
    pub bounds: [f64; 2],
    /// Defaults to the origin.
    pub mean: Option<Vec<f64>>,
    /// Defaults to the identity.
    pub cov: Option<Mat<f64>>,
    /// Shift the log-likelihood so that the log-evidence is zero. Only
    /// honoured for the unit Gaussian.
    pub normalise: bool,
}

impl Default for GaussianSettings {
    fn default() -> Self {
        Self {
            dims: 2,
            bounds: [-10., 10.],
            mean: None,
            cov: None,
            normalise: false,
        }
    }
}

impl GaussianSettings {
    /// The same mean in every dimension.
    pub fn with_constant_mean(mut self, mean: f64) -> Self {
        self.mean = Some(vec![mean; self.dims]);
        self
    }
}

/// Multivariate normal likelihood with uniform priors.
#[derive(Debug, Clone)]
pub struct Gaussian {
    prior: UniformPrior,
    dist: MultivariateNormal,
    norm_const: f64,
    normalise: bool,
    ln_evidence: Option<f64>,
}

impl Gaussian {
    pub fn new(settings: GaussianSettings) -> Result<Self> {
        let prior = UniformPrior::n_dimensional(settings.dims, &settings.bounds)?;
        let dims = settings.dims;

        let is_unit = settings.mean.is_none() && settings.cov.is_none();
        let mean = settings.mean.unwrap_or_else(|| vec![0.; dims]);
        if mean.len() != dims {
            return Err(ModelError::DimensionMismatch {
                expected: dims,
                found: mean.len(),
            });
        }
        let component = match settings.cov {
            Some(cov) => GaussianComponent::new(mean, cov),
            None => GaussianComponent::isotropic(mean, 1.),
        };
        let dist = MultivariateNormal::new(&component)?;

        let mut normalise = settings.normalise;
        let mut norm_const = 0.;
        let ln_evidence = if is_unit {
            let [lower, upper] = settings.bounds;
            let ln_z = gaussian_ln_evidence(&EvidenceBounds::Shared(lower, upper), Some(dims))?;
            if normalise {
                norm_const = ln_z;
                Some(0.)
            } else {
                Some(ln_z)
            }
        } else {
            if normalise {
                warn!("cannot normalise a non-unit Gaussian, using the unnormalised likelihood");
                normalise = false;
            }
            None
        };

        Ok(Self {
            prior,
            dist,
            norm_const,
            normalise,
            ln_evidence,
        })
    }

    pub fn is_normalised(&self) -> bool {
        self.normalise
    }
}

impl Default for Gaussian {
    fn default() -> Self {
        Self::new(GaussianSettings::default()).expect("default settings are valid")
    }
}

impl Model for Gaussian {
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
                self.dist.logpdf(&x, &mut scratch) - self.norm_const
            })
            .collect())
    }

    fn ln_evidence(&self) -> Option<f64> {
        self.ln_evidence
    }
}
