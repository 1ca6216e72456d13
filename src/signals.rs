//! Parametric signals observed in white Gaussian noise.

use std::collections::HashMap;
use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::math::linspace;
use crate::model::Model;
use crate::points::LivePoints;
use crate::prior::UniformPrior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// `m * x + c`
    Linear,
    /// `amp * sin(2π f x + phase) + offset`
    Sinusoidal,
}

impl SignalKind {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            SignalKind::Linear => &["m", "c"],
            SignalKind::Sinusoidal => &["amp", "phase", "f", "offset"],
        }
    }

    pub fn default_bounds(&self) -> Vec<[f64; 2]> {
        match self {
            SignalKind::Linear => vec![[-1., 1.], [-1., 1.]],
            SignalKind::Sinusoidal => vec![[0., 1.], [0., 2. * PI], [0., 5.], [0., 5.]],
        }
    }

    /// Signal at `x` for parameters in the order of [`SignalKind::names`].
    #[inline]
    fn eval(&self, params: &[f64], x: f64) -> f64 {
        match *self {
            SignalKind::Linear => params[0] * x + params[1],
            SignalKind::Sinusoidal => {
                let [amp, phase, f, offset] = params[..] else {
                    unreachable!("sinusoid has four parameters");
                };
                amp * (2. * PI * f * x + phase).sin() + offset
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalSettings {
    /// Injected parameter values. Drawn uniformly from the prior when unset.
    pub truth: Option<HashMap<String, f64>>,
    /// Prior bounds by parameter name, replacing the defaults.
    pub bounds: HashMap<String, [f64; 2]>,
    /// Noise standard deviation.
    pub sigma: f64,
    pub n_points: usize,
    pub start: f64,
    pub end: f64,
    pub seed: u64,
    /// Add noise to the injected signal. Without it the data equal the
    /// signal at the truth.
    pub inject_noise: bool,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            truth: None,
            bounds: HashMap::new(),
            sigma: 1.,
            n_points: 100,
            start: 0.,
            end: 10.,
            seed: 1234,
            inject_noise: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalModel {
    kind: SignalKind,
    prior: UniformPrior,
    truth: Vec<f64>,
    sigma: f64,
    x: Vec<f64>,
    data: Vec<f64>,
}

impl SignalModel {
    pub fn new(kind: SignalKind, settings: SignalSettings) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        Self::with_rng(kind, settings, &mut rng)
    }

    pub fn with_rng<R: Rng + ?Sized>(
        kind: SignalKind,
        settings: SignalSettings,
        rng: &mut R,
    ) -> Result<Self> {
        let names = kind.names();
        let mut bounds = kind.default_bounds();
        for (name, b) in &settings.bounds {
            let idx = names.iter().position(|n| n == name).ok_or_else(|| {
                ModelError::InvalidArgument(format!("bounds given for unknown parameter `{name}`"))
            })?;
            bounds[idx] = *b;
        }
        let prior = UniformPrior::new(names.iter().map(|n| n.to_string()).collect(), bounds)?;

        if !(settings.sigma.is_finite() && settings.sigma > 0.) {
            return Err(ModelError::InvalidArgument(format!(
                "sigma must be positive, got {}",
                settings.sigma
            )));
        }

        let truth = match settings.truth {
            Some(truth) => {
                if truth.len() != names.len() || names.iter().any(|n| !truth.contains_key(*n)) {
                    return Err(ModelError::InvalidArgument(
                        "keys in truth do not match the parameter names".into(),
                    ));
                }
                names.iter().map(|n| truth[*n]).collect()
            }
            None => {
                let truth: Vec<f64> = prior
                    .iter_bounds()
                    .map(|(_, [l, u])| rng.random_range(l..u))
                    .collect();
                debug!(?truth, "drew signal truth from the prior");
                truth
            }
        };

        let x = linspace(settings.start, settings.end, settings.n_points);
        let mut data: Vec<f64> = x.iter().map(|&x| kind.eval(&truth, x)).collect();
        if settings.inject_noise {
            let noise = Normal::new(0., settings.sigma)
                .map_err(|e| ModelError::InvalidArgument(e.to_string()))?;
            data.iter_mut()
                .zip(noise.sample_iter(&mut *rng))
                .for_each(|(d, n)| *d += n);
        }

        Ok(Self {
            kind,
            prior,
            truth,
            sigma: settings.sigma,
            x,
            data,
        })
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Injected values in the order of the parameter names.
    pub fn truth(&self) -> &[f64] {
        &self.truth
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The signal evaluated on the sample grid.
    pub fn signal(&self, params: &[f64]) -> Result<Vec<f64>> {
        if params.len() != self.dims() {
            return Err(ModelError::DimensionMismatch {
                expected: self.dims(),
                found: params.len(),
            });
        }
        Ok(self.x.iter().map(|&x| self.kind.eval(params, x)).collect())
    }
}

impl Model for SignalModel {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let columns = points.select(self.prior.names())?;
        let ln_norm = (2. * PI * self.sigma * self.sigma).ln();
        let mut params = vec![0.; self.dims()];
        Ok((0..points.len())
            .map(|i| {
                params.iter_mut().zip(&columns).for_each(|(p, col)| *p = col[i]);
                self.x
                    .iter()
                    .zip(&self.data)
                    .map(|(&x, &d)| {
                        let r = (d - self.kind.eval(&params, x)) / self.sigma;
                        -0.5 * r * r - ln_norm
                    })
                    .sum()
            })
            .collect())
    }
}

/// `m * x + c` in Gaussian noise.
#[derive(Debug, Clone, Copy)]
pub struct LinearSignal;

impl LinearSignal {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(settings: SignalSettings) -> Result<SignalModel> {
        SignalModel::new(SignalKind::Linear, settings)
    }
}

/// `amp * sin(2π f x + phase) + offset` in Gaussian noise.
#[derive(Debug, Clone, Copy)]
pub struct SinusoidalSignal;

impl SinusoidalSignal {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(settings: SignalSettings) -> Result<SignalModel> {
        SignalModel::new(SignalKind::Sinusoidal, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn max_likelihood_without_noise() {
        for kind in [SignalKind::Linear, SignalKind::Sinusoidal] {
            for n_points in [10, 100] {
                for sigma in [1., 2.] {
                    let model = SignalModel::new(
                        kind,
                        SignalSettings {
                            n_points,
                            sigma,
                            inject_noise: false,
                            ..Default::default()
                        },
                    )
                    .unwrap();
                    let x = LivePoints::from_point(model.names(), model.truth()).unwrap();
                    let expected = n_points as f64 * -(2. * PI * sigma * sigma).ln();
                    assert_relative_eq!(
                        model.log_likelihood(&x).unwrap()[0],
                        expected,
                        epsilon = 1e-10
                    );
                }
            }
        }
    }

    #[test]
    fn explicit_truth() {
        let truth = HashMap::from([("m".to_string(), 0.5), ("c".to_string(), -0.25)]);
        let model = LinearSignal::new(SignalSettings {
            truth: Some(truth),
            n_points: 3,
            start: 0.,
            end: 2.,
            inject_noise: false,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(model.truth(), &[0.5, -0.25]);
        assert_eq!(model.data(), &[-0.25, 0.25, 0.75]);
    }

    #[test]
    fn truth_keys_must_match() {
        let truth = HashMap::from([("m".to_string(), 0.5), ("b".to_string(), 0.)]);
        let err = LinearSignal::new(SignalSettings {
            truth: Some(truth),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
    }

    #[test]
    fn random_truth_is_in_bounds() {
        let model = SinusoidalSignal::new(Default::default()).unwrap();
        assert_eq!(model.names(), &["amp", "phase", "f", "offset"]);
        let x = LivePoints::from_point(model.names(), model.truth()).unwrap();
        assert_eq!(model.in_bounds(&x).unwrap(), vec![true]);
        assert_eq!(model.data().len(), 100);

        let again = SinusoidalSignal::new(Default::default()).unwrap();
        assert_eq!(model.data(), again.data());
    }

    #[test]
    fn signal_length_checked() {
        let model = LinearSignal::new(Default::default()).unwrap();
        assert!(matches!(
            model.signal(&[1.]),
            Err(ModelError::DimensionMismatch { expected: 2, found: 1 })
        ));
    }
}
