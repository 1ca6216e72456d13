//! Gaussian mixture likelihoods.
//!
//! [`GaussianMixture`] combines any number of multivariate normal
//! components, [`SlabSpike`] is the two-component special case with a
//! sharp secondary peak, and [`GaussianMixtureWithData`] fits the
//! parameters of a one-dimensional two-component mixture to a synthetic
//! dataset.

use itertools::izip;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::math::{logaddexp, logsumexp, normal_logpdf};
use crate::model::Model;
use crate::mvn::{GaussianComponent, MultivariateNormal};
use crate::points::LivePoints;
use crate::prior::UniformPrior;

#[derive(Debug, Clone)]
pub struct GaussianMixtureSettings {
    pub n_gaussians: usize,
    pub dims: usize,
    pub bounds: [f64; 2],
    /// One entry per component. Drawn at random when absent.
    pub config: Option<Vec<GaussianComponent>>,
    /// Relative component weights. Components are summed unweighted when
    /// absent.
    pub weights: Option<Vec<f64>>,
    /// Seed for the random configuration.
    pub seed: u64,
}

impl Default for GaussianMixtureSettings {
    fn default() -> Self {
        Self {
            n_gaussians: 4,
            dims: 2,
            bounds: [-10., 10.],
            config: None,
            weights: None,
            seed: 1234,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaussianMixture {
    prior: UniformPrior,
    config: Vec<GaussianComponent>,
    components: Vec<MultivariateNormal>,
    log_weights: Option<Vec<f64>>,
    ln_evidence: Option<f64>,
}

impl GaussianMixture {
    pub fn new(settings: GaussianMixtureSettings) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        Self::with_rng(settings, &mut rng)
    }

    /// Like [`GaussianMixture::new`], but a missing configuration is drawn
    /// from `rng` instead of a generator seeded from the settings.
    pub fn with_rng<R: Rng + ?Sized>(settings: GaussianMixtureSettings, rng: &mut R) -> Result<Self> {
        let prior = UniformPrior::n_dimensional(settings.dims, &settings.bounds)?;
        let n = settings.n_gaussians;
        if n == 0 {
            return Err(ModelError::InvalidArgument(
                "a mixture needs at least one component".into(),
            ));
        }

        let config = match settings.config {
            Some(config) => config,
            None => {
                debug!(n_gaussians = n, dims = settings.dims, "drawing random mixture configuration");
                random_config(&prior, n, rng)
            }
        };
        if config.len() != n {
            return Err(ModelError::ConfigMismatch {
                expected: n,
                found: config.len(),
            });
        }
        for component in &config {
            if component.dims() != settings.dims {
                return Err(ModelError::DimensionMismatch {
                    expected: settings.dims,
                    found: component.dims(),
                });
            }
        }
        let components = config
            .iter()
            .map(MultivariateNormal::new)
            .collect::<Result<Vec<_>>>()?;

        let log_weights = match settings.weights {
            Some(weights) => {
                if weights.len() != n {
                    return Err(ModelError::ConfigMismatch {
                        expected: n,
                        found: weights.len(),
                    });
                }
                if !weights.iter().all(|w| w.is_finite() && *w >= 0.) {
                    return Err(ModelError::InvalidArgument(
                        "weights must be finite and non-negative".into(),
                    ));
                }
                Some(weights.iter().map(|w| w.ln()).collect::<Vec<_>>())
            }
            None => None,
        };

        let ln_evidence = mixture_ln_evidence(&prior, &components, log_weights.as_deref());

        Ok(Self {
            prior,
            config,
            components,
            log_weights,
            ln_evidence,
        })
    }

    pub fn config(&self) -> &[GaussianComponent] {
        &self.config
    }

    pub fn n_gaussians(&self) -> usize {
        self.components.len()
    }
}

/// Means uniform within the bounds, covariance a random multiple of the
/// identity.
fn random_config<R: Rng + ?Sized>(
    prior: &UniformPrior,
    n: usize,
    rng: &mut R,
) -> Vec<GaussianComponent> {
    (0..n)
        .map(|_| {
            let mean = prior
                .lower_bounds()
                .iter()
                .zip(prior.upper_bounds())
                .map(|(&l, &u)| rng.random_range(l..u))
                .collect();
            let variance = rng.random_range(0.5..2.0);
            GaussianComponent::isotropic(mean, variance)
        })
        .collect()
}

/// Exact evidence when every component has a diagonal covariance.
fn mixture_ln_evidence(
    prior: &UniformPrior,
    components: &[MultivariateNormal],
    log_weights: Option<&[f64]>,
) -> Option<f64> {
    let lower = prior.lower_bounds();
    let upper = prior.upper_bounds();
    let mut total = 0.;
    for (k, component) in components.iter().enumerate() {
        let mass = component.box_mass(lower, upper)?;
        let weight = log_weights.map_or(1., |w| w[k].exp());
        total += weight * mass;
    }
    Some(total.ln() - prior.ln_volume())
}

impl Model for GaussianMixture {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let columns = points.select(self.prior.names())?;
        let mut x = vec![0.; self.dims()];
        let mut scratch = vec![0.; self.dims()];
        let mut log_probs = vec![0.; self.components.len()];
        Ok((0..points.len())
            .map(|i| {
                x.iter_mut().zip(&columns).for_each(|(x, col)| *x = col[i]);
                log_probs
                    .iter_mut()
                    .zip(&self.components)
                    .for_each(|(lp, dist)| *lp = dist.logpdf(&x, &mut scratch));
                if let Some(log_weights) = &self.log_weights {
                    log_probs
                        .iter_mut()
                        .zip(log_weights)
                        .for_each(|(lp, lw)| *lp += lw);
                }
                logsumexp(&log_probs)
            })
            .collect())
    }

    fn ln_evidence(&self) -> Option<f64> {
        self.ln_evidence
    }
}

#[derive(Debug, Clone)]
pub struct SlabSpikeSettings {
    pub dims: usize,
    pub bounds: [f64; 2],
    /// Covariance of the spike relative to the slab.
    pub spike_scale: f64,
    /// Weights of the slab and the spike.
    pub weights: Option<[f64; 2]>,
}

impl Default for SlabSpikeSettings {
    fn default() -> Self {
        Self {
            dims: 3,
            bounds: [-10., 10.],
            spike_scale: 1e-3,
            weights: None,
        }
    }
}

/// Two zero-mean Gaussians: a unit "slab" and a narrow "spike".
#[derive(Debug, Clone)]
pub struct SlabSpike {
    mixture: GaussianMixture,
}

impl SlabSpike {
    pub fn new(settings: SlabSpikeSettings) -> Result<Self> {
        if !(settings.spike_scale.is_finite() && settings.spike_scale > 0.) {
            return Err(ModelError::InvalidArgument(format!(
                "spike scale must be positive, got {}",
                settings.spike_scale
            )));
        }
        let mean = vec![0.; settings.dims];
        let config = vec![
            GaussianComponent::isotropic(mean.clone(), 1.),
            GaussianComponent::isotropic(mean, settings.spike_scale),
        ];
        let mixture = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 2,
            dims: settings.dims,
            bounds: settings.bounds,
            config: Some(config),
            weights: settings.weights.map(Vec::from),
            ..Default::default()
        })?;
        Ok(Self { mixture })
    }

    pub fn mixture(&self) -> &GaussianMixture {
        &self.mixture
    }
}

impl Model for SlabSpike {
    fn prior(&self) -> &UniformPrior {
        self.mixture.prior()
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        self.mixture.log_likelihood(points)
    }

    fn ln_evidence(&self) -> Option<f64> {
        self.mixture.ln_evidence()
    }
}

/// Parameters of the one-dimensional mixture that generates the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureTruth {
    pub mu1: f64,
    pub sigma1: f64,
    pub mu2: f64,
    pub sigma2: f64,
    pub weight: f64,
}

impl Default for MixtureTruth {
    fn default() -> Self {
        Self {
            mu1: 0.5,
            sigma1: 0.5,
            mu2: -1.5,
            sigma2: 0.03,
            weight: 0.2,
        }
    }
}

impl MixtureTruth {
    /// Values in the parameter order of [`GaussianMixtureWithData`].
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.mu1, self.sigma1, self.mu2, self.sigma2, self.weight]
    }
}

#[derive(Debug, Clone)]
pub struct GaussianMixtureWithDataSettings {
    pub n_data: usize,
    pub truth: MixtureTruth,
    pub seed: u64,
}

impl Default for GaussianMixtureWithDataSettings {
    fn default() -> Self {
        Self {
            n_data: 1000,
            truth: MixtureTruth::default(),
            seed: 1234,
        }
    }
}

/// Two-component mixture whose means, widths and weight are the free
/// parameters, fit to data drawn once from [`MixtureTruth`].
#[derive(Debug, Clone)]
pub struct GaussianMixtureWithData {
    prior: UniformPrior,
    truth: MixtureTruth,
    data: Vec<f64>,
}

impl GaussianMixtureWithData {
    pub const NAMES: [&'static str; 5] = ["mu1", "sigma1", "mu2", "sigma2", "weight"];

    pub fn new(settings: GaussianMixtureWithDataSettings) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        Self::with_rng(settings, &mut rng)
    }

    pub fn with_rng<R: Rng + ?Sized>(
        settings: GaussianMixtureWithDataSettings,
        rng: &mut R,
    ) -> Result<Self> {
        let prior = UniformPrior::new(
            Self::NAMES.iter().map(|n| n.to_string()).collect(),
            vec![[-3., 3.], [0.01, 1.], [-3., 3.], [0.01, 1.], [0., 1.]],
        )?;
        let truth = settings.truth;
        if !(0. ..=1.).contains(&truth.weight) {
            return Err(ModelError::InvalidArgument(format!(
                "mixture weight must be in [0, 1], got {}",
                truth.weight
            )));
        }
        let invalid = |e: rand_distr::NormalError| ModelError::InvalidArgument(e.to_string());
        let first = Normal::new(truth.mu1, truth.sigma1).map_err(invalid)?;
        let second = Normal::new(truth.mu2, truth.sigma2).map_err(invalid)?;

        let n = settings.n_data;
        let n1 = (truth.weight * n as f64).floor() as usize;
        let mut data: Vec<f64> = first.sample_iter(&mut *rng).take(n1).collect();
        data.extend(second.sample_iter(&mut *rng).take(n - n1));
        debug!(n_data = n, n_first = n1, "generated mixture dataset");

        Ok(Self { prior, truth, data })
    }

    pub fn truth(&self) -> &MixtureTruth {
        &self.truth
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

impl Model for GaussianMixtureWithData {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let columns = points.select(&Self::NAMES)?;
        let [mu1, sigma1, mu2, sigma2, weight] = columns[..] else {
            unreachable!("five columns were selected");
        };
        Ok(izip!(mu1, sigma1, mu2, sigma2, weight)
            .map(|(&mu1, &sigma1, &mu2, &sigma2, &w)| {
                let ln_w1 = w.ln();
                let ln_w2 = (1. - w).ln();
                self.data
                    .iter()
                    .map(|&d| {
                        logaddexp(
                            ln_w1 + normal_logpdf(d, mu1, sigma1),
                            ln_w2 + normal_logpdf(d, mu2, sigma2),
                        )
                    })
                    .sum()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use faer::Mat;
    use std::f64::consts::PI;

    fn two_component_config(dims: usize) -> Vec<GaussianComponent> {
        vec![
            GaussianComponent::isotropic(vec![-1.; dims], 2.),
            GaussianComponent::isotropic(vec![1.; dims], 2.),
        ]
    }

    fn isotropic_logpdf(x: &[f64], mean: f64, variance: f64) -> f64 {
        x.iter()
            .map(|x| normal_logpdf(*x, mean, variance.sqrt()))
            .sum()
    }

    #[test]
    fn weighted_mixture() {
        let dims = 2;
        let weights = vec![0.1, 0.9];
        let model = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 2,
            dims,
            config: Some(two_component_config(dims)),
            weights: Some(weights.clone()),
            ..Default::default()
        })
        .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let points = model.prior().new_points(&mut rng, 10);
        let log_l = model.log_likelihood(&points).unwrap();
        assert_eq!(log_l.len(), 10);
        for (row, log_l) in points.to_rows(model.names()).unwrap().iter().zip(log_l) {
            let p0 = isotropic_logpdf(row, -1., 2.).exp();
            let p1 = isotropic_logpdf(row, 1., 2.).exp();
            let expected = (weights[0] * p0 + weights[1] * p1).ln();
            assert_relative_eq!(log_l, expected, max_relative = 1e-10);
        }
    }

    #[test]
    fn unweighted_mixture_sums_densities() {
        let model = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 2,
            config: Some(two_component_config(2)),
            ..Default::default()
        })
        .unwrap();
        let x = LivePoints::from_point(model.names(), &[0.5, -0.25]).unwrap();
        let row = [0.5, -0.25];
        let expected =
            (isotropic_logpdf(&row, -1., 2.).exp() + isotropic_logpdf(&row, 1., 2.).exp()).ln();
        assert_relative_eq!(model.log_likelihood(&x).unwrap()[0], expected, max_relative = 1e-12);
    }

    #[test]
    fn separated_components_do_not_underflow() {
        let model = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 2,
            dims: 1,
            bounds: [-1000., 1000.],
            config: Some(vec![
                GaussianComponent::isotropic(vec![-500.], 1e-2),
                GaussianComponent::isotropic(vec![500.], 1e-2),
            ]),
            ..Default::default()
        })
        .unwrap();
        let x = LivePoints::from_point(model.names(), &[0.]).unwrap();
        let log_l = model.log_likelihood(&x).unwrap()[0];
        assert!(log_l.is_finite());
        let expected = (2f64).ln() + normal_logpdf(0., 500., 0.1);
        assert_relative_eq!(log_l, expected, max_relative = 1e-12);
    }

    #[test]
    fn config_length_mismatch() {
        let err = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 3,
            config: Some(two_component_config(2)),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ModelError::ConfigMismatch {
                expected: 3,
                found: 2
            }
        ));
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_empty_mixture() {
        let err = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));

        let err = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 0,
            config: Some(vec![]),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
    }

    #[test]
    fn weights_length_mismatch() {
        let err = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 2,
            config: Some(two_component_config(2)),
            weights: Some(vec![1.]),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::ConfigMismatch { .. }));
    }

    #[test]
    fn random_config_is_reproducible() {
        let a = GaussianMixture::new(GaussianMixtureSettings::default()).unwrap();
        let b = GaussianMixture::new(GaussianMixtureSettings::default()).unwrap();
        let c = GaussianMixture::new(GaussianMixtureSettings {
            seed: 99,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(a.n_gaussians(), 4);
        for (a, b) in a.config().iter().zip(b.config()) {
            assert_eq!(a.mean, b.mean);
            assert_eq!(a.cov[(0, 0)], b.cov[(0, 0)]);
        }
        assert_ne!(a.config()[0].mean, c.config()[0].mean);
        for component in a.config() {
            assert!(component.mean.iter().all(|m| (-10. ..10.).contains(m)));
            assert_eq!(component.cov[(0, 1)], 0.);
        }
    }

    #[test]
    fn random_config_from_caller_rng() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = GaussianMixture::with_rng(GaussianMixtureSettings::default(), &mut rng).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let b = GaussianMixture::with_rng(GaussianMixtureSettings::default(), &mut rng).unwrap();
        assert_eq!(a.config()[3].mean, b.config()[3].mean);
    }

    #[test]
    fn diagonal_mixture_evidence() {
        let model = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 2,
            config: Some(two_component_config(2)),
            weights: Some(vec![0.25, 0.5]),
            ..Default::default()
        })
        .unwrap();
        // both components lie well inside [-10, 10]^2
        assert_relative_eq!(
            model.ln_evidence().unwrap(),
            0.75f64.ln() - 2. * 20f64.ln(),
            epsilon = 1e-9
        );

        let cov = Mat::from_fn(2, 2, |i, j| if i == j { 1. } else { 0.5 });
        let model = GaussianMixture::new(GaussianMixtureSettings {
            n_gaussians: 1,
            config: Some(vec![GaussianComponent::new(vec![0., 0.], cov)]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(model.ln_evidence(), None);
    }

    #[test]
    fn slab_spike_peaks_at_origin() {
        let model = SlabSpike::new(SlabSpikeSettings::default()).unwrap();
        assert_eq!(model.dims(), 3);
        let x = LivePoints::from_rows(model.names(), &[vec![0.; 3], vec![0.5; 3]]).unwrap();
        let log_l = model.log_likelihood(&x).unwrap();
        let slab = -1.5 * (2. * PI).ln();
        let spike = slab - 1.5 * 1e-3f64.ln();
        assert_relative_eq!(log_l[0], logaddexp(slab, spike), max_relative = 1e-12);
        assert!(log_l[0] > log_l[1]);
        assert_relative_eq!(
            model.ln_evidence().unwrap(),
            2f64.ln() - 3. * 20f64.ln(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn mixture_dataset() {
        let model = GaussianMixtureWithData::new(GaussianMixtureWithDataSettings::default()).unwrap();
        assert_eq!(model.data().len(), 1000);
        // the first 200 points come from the wide component
        let narrow = &model.data()[200..];
        assert!(narrow.iter().all(|d| (d + 1.5).abs() < 0.5));

        let again = GaussianMixtureWithData::new(GaussianMixtureWithDataSettings::default()).unwrap();
        assert_eq!(model.data(), again.data());
    }

    #[test]
    fn mixture_with_data_likelihood() {
        let model = GaussianMixtureWithData::new(GaussianMixtureWithDataSettings {
            n_data: 50,
            ..Default::default()
        })
        .unwrap();
        let truth = model.truth().to_vec();
        let off = vec![-0.5, 0.5, 1.5, 0.5, 0.8];
        let x = LivePoints::from_rows(&GaussianMixtureWithData::NAMES, &[truth.clone(), off])
            .unwrap();
        let log_l = model.log_likelihood(&x).unwrap();
        assert!(log_l[0] > log_l[1]);

        let t = model.truth();
        let expected: f64 = model
            .data()
            .iter()
            .map(|&d| {
                (t.weight * normal_logpdf(d, t.mu1, t.sigma1).exp()
                    + (1. - t.weight) * normal_logpdf(d, t.mu2, t.sigma2).exp())
                .ln()
            })
            .sum();
        assert_relative_eq!(log_l[0], expected, max_relative = 1e-9);
    }

    #[test]
    fn invalid_truth_weight() {
        let err = GaussianMixtureWithData::new(GaussianMixtureWithDataSettings {
            truth: MixtureTruth {
                weight: 1.5,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
    }
}
