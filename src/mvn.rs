use std::f64::consts::PI;

use faer::{Mat, Side};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{ModelError, Result};
use crate::math::vector_dot;

/// Mean and covariance of one Gaussian component.
#[derive(Debug, Clone)]
pub struct GaussianComponent {
    pub mean: Vec<f64>,
    pub cov: Mat<f64>,
}

impl GaussianComponent {
    pub fn new(mean: Vec<f64>, cov: Mat<f64>) -> Self {
        Self { mean, cov }
    }

    /// Covariance `variance * I`.
    pub fn isotropic(mean: Vec<f64>, variance: f64) -> Self {
        let dims = mean.len();
        let cov = Mat::from_fn(dims, dims, |i, j| if i == j { variance } else { 0. });
        Self { mean, cov }
    }

    pub fn dims(&self) -> usize {
        self.mean.len()
    }
}

/// Multivariate normal density with a precomputed Cholesky factor.
#[derive(Debug, Clone)]
pub(crate) struct MultivariateNormal {
    mean: Vec<f64>,
    chol: Mat<f64>,
    log_norm: f64,
    /// Marginal standard deviations when the covariance is diagonal.
    stds: Option<Vec<f64>>,
}

impl MultivariateNormal {
    pub(crate) fn new(component: &GaussianComponent) -> Result<Self> {
        let dims = component.dims();
        let cov = &component.cov;
        if cov.nrows() != dims || cov.ncols() != dims {
            return Err(ModelError::DimensionMismatch {
                expected: dims,
                found: cov.nrows().max(cov.ncols()),
            });
        }
        for i in 0..dims {
            for j in 0..i {
                let (a, b) = (cov[(i, j)], cov[(j, i)]);
                if (a - b).abs() > 1e-12 * a.abs().max(b.abs()).max(1.) {
                    return Err(ModelError::InvalidArgument(
                        "covariance matrix is not symmetric".into(),
                    ));
                }
            }
        }
        if !component.mean.iter().all(|m| m.is_finite()) {
            return Err(ModelError::InvalidArgument("mean is not finite".into()));
        }

        let llt = cov.llt(Side::Lower).map_err(|_| {
            ModelError::InvalidArgument("covariance matrix is not positive definite".into())
        })?;
        let chol = llt.L().to_owned();

        let log_det: f64 = (0..dims).map(|i| 2. * chol[(i, i)].ln()).sum();
        let log_norm = -0.5 * (dims as f64 * (2. * PI).ln() + log_det);

        let is_diagonal = (0..dims).all(|i| (0..dims).all(|j| i == j || cov[(i, j)] == 0.));
        let stds = is_diagonal.then(|| (0..dims).map(|i| cov[(i, i)].sqrt()).collect());

        Ok(Self {
            mean: component.mean.clone(),
            chol,
            log_norm,
            stds,
        })
    }

    pub(crate) fn dims(&self) -> usize {
        self.mean.len()
    }

    /// Log-density at `x`. `scratch` must have length `dims`.
    pub(crate) fn logpdf(&self, x: &[f64], scratch: &mut [f64]) -> f64 {
        let dims = self.dims();
        assert!(x.len() == dims);
        assert!(scratch.len() == dims);

        // Forward substitution: L z = x - mean
        for i in 0..dims {
            let mut val = x[i] - self.mean[i];
            for j in 0..i {
                val -= self.chol[(i, j)] * scratch[j];
            }
            scratch[i] = val / self.chol[(i, i)];
        }
        self.log_norm - 0.5 * vector_dot(scratch, scratch)
    }

    /// Probability mass inside the box `[lower, upper]`, if the covariance
    /// is diagonal.
    pub(crate) fn box_mass(&self, lower: &[f64], upper: &[f64]) -> Option<f64> {
        let stds = self.stds.as_ref()?;
        let std_normal = Normal::standard();
        let mass = self
            .mean
            .iter()
            .zip(stds)
            .zip(lower.iter().zip(upper))
            .map(|((&mu, &sigma), (&l, &u))| {
                let a = (l - mu) / sigma;
                let b = (u - mu) / sigma;
                // Use the lower tail on whichever side keeps precision.
                if a > 0. {
                    std_normal.cdf(-a) - std_normal.cdf(-b)
                } else {
                    std_normal.cdf(b) - std_normal.cdf(a)
                }
            })
            .product();
        Some(mass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn standard_normal_logpdf() {
        let dist = MultivariateNormal::new(&GaussianComponent::isotropic(vec![0.; 3], 1.)).unwrap();
        let mut scratch = vec![0.; 3];
        let expected = -1.5 * (2. * PI).ln() - 0.5 * 3.;
        assert_relative_eq!(
            dist.logpdf(&[1., -1., 1.], &mut scratch),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn correlated_logpdf() {
        // [[2, 1], [1, 2]] has determinant 3 and inverse [[2, -1], [-1, 2]] / 3
        let cov = Mat::from_fn(2, 2, |i, j| if i == j { 2. } else { 1. });
        let dist = MultivariateNormal::new(&GaussianComponent::new(vec![1., -1.], cov)).unwrap();
        let x = [2., 1.];
        let d = [1., 2.];
        let quad = (2. * d[0] * d[0] - 2. * d[0] * d[1] + 2. * d[1] * d[1]) / 3.;
        let expected = -(2. * PI).ln() - 0.5 * 3f64.ln() - 0.5 * quad;
        let mut scratch = vec![0.; 2];
        assert_relative_eq!(dist.logpdf(&x, &mut scratch), expected, epsilon = 1e-12);
        assert!(dist.box_mass(&[-1., -1.], &[1., 1.]).is_none());
    }

    #[test]
    fn rejects_indefinite_covariance() {
        let cov = Mat::from_fn(2, 2, |i, j| if i == j { 1. } else { 2. });
        let err = MultivariateNormal::new(&GaussianComponent::new(vec![0., 0.], cov)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_wrong_shape() {
        let cov = Mat::from_fn(3, 3, |i, j| if i == j { 1. } else { 0. });
        let err = MultivariateNormal::new(&GaussianComponent::new(vec![0., 0.], cov)).unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { .. }));
    }

    #[test]
    fn box_mass_of_wide_box() {
        let dist = MultivariateNormal::new(&GaussianComponent::isotropic(vec![0.; 2], 1.)).unwrap();
        let mass = dist.box_mass(&[-10., -10.], &[10., 10.]).unwrap();
        assert_relative_eq!(mass, 1., epsilon = 1e-12);
        let half = dist.box_mass(&[0., -10.], &[10., 10.]).unwrap();
        assert_relative_eq!(half, 0.5, epsilon = 1e-12);
    }
}
