//! Likelihoods built from independent one-dimensional distributions.
//!
//! Each parameter of a [`MixtureOfDistributions`] follows one of a few
//! base families and the log-likelihood is the sum of the per-parameter
//! log-densities. The per-parameter evaluations are independent, so they
//! are dispatched through a [`MapStrategy`] that may run them in
//! parallel.

use std::{collections::HashMap, fmt, str::FromStr};

use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use statrs::distribution::{Continuous, ContinuousCDF, Gamma, Normal, Uniform};

use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::points::LivePoints;
use crate::prior::UniformPrior;

/// Maps a per-parameter evaluation over parameter names.
///
/// Implementations must return one result per name, in the order of
/// `names`, and must have finished every evaluation when they return.
pub trait MapStrategy: Send + Sync {
    fn map<F>(&self, names: &[String], f: F) -> Vec<Result<Vec<f64>>>
    where
        F: Fn(&str) -> Result<Vec<f64>> + Send + Sync;
}

/// Evaluate on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl MapStrategy for Sequential {
    fn map<F>(&self, names: &[String], f: F) -> Vec<Result<Vec<f64>>>
    where
        F: Fn(&str) -> Result<Vec<f64>> + Send + Sync,
    {
        names.iter().map(|name| f(name.as_str())).collect()
    }
}

/// Evaluate on the global rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rayon;

impl MapStrategy for Rayon {
    fn map<F>(&self, names: &[String], f: F) -> Vec<Result<Vec<f64>>>
    where
        F: Fn(&str) -> Result<Vec<f64>> + Send + Sync,
    {
        names.par_iter().map(|name| f(name.as_str())).collect()
    }
}

/// Evaluate on a dedicated thread pool.
#[derive(Debug)]
pub struct ThreadPoolMap {
    pool: ThreadPool,
}

impl ThreadPoolMap {
    pub fn new(num_threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("mixture-map-{i}"))
            .build()
            .map_err(|e| ModelError::InvalidArgument(e.to_string()))?;
        Ok(Self { pool })
    }
}

impl MapStrategy for ThreadPoolMap {
    fn map<F>(&self, names: &[String], f: F) -> Vec<Result<Vec<f64>>>
    where
        F: Fn(&str) -> Result<Vec<f64>> + Send + Sync,
    {
        self.pool
            .install(|| names.par_iter().map(|name| f(name.as_str())).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Gaussian,
    Uniform,
    Gamma,
    HalfNorm,
}

impl Family {
    pub fn name(&self) -> &'static str {
        match self {
            Family::Gaussian => "gaussian",
            Family::Uniform => "uniform",
            Family::Gamma => "gamma",
            Family::HalfNorm => "halfnorm",
        }
    }

    /// Prior bounds used when none are given for a parameter.
    pub fn default_bounds(&self) -> [f64; 2] {
        match self {
            Family::Gaussian => [-10., 10.],
            Family::Uniform => [-5., 5.],
            Family::Gamma => [0., 10.],
            Family::HalfNorm => [0., 10.],
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gaussian" => Ok(Family::Gaussian),
            "uniform" => Ok(Family::Uniform),
            "gamma" => Ok(Family::Gamma),
            "halfnorm" => Ok(Family::HalfNorm),
            _ => Err(ModelError::UnknownDistribution(s.to_string())),
        }
    }
}

/// Overrides for the location, scale and (gamma only) shape of a family.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FamilyParams {
    pub loc: Option<f64>,
    pub scale: Option<f64>,
    pub shape: Option<f64>,
}

#[derive(Debug, Clone)]
enum Marginal {
    Gaussian(Normal),
    Uniform(Uniform),
    Gamma { dist: Gamma, loc: f64 },
    HalfNorm { dist: Normal, loc: f64 },
}

impl Marginal {
    fn new(family: Family, params: FamilyParams) -> Result<Self> {
        if params.shape.is_some() && family != Family::Gamma {
            return Err(ModelError::InvalidArgument(format!(
                "`shape` is not a parameter of the {family} distribution"
            )));
        }
        let invalid = |e: &dyn fmt::Display| {
            ModelError::InvalidArgument(format!("invalid {family} parameters: {e}"))
        };
        let marginal = match family {
            Family::Gaussian => Marginal::Gaussian(
                Normal::new(params.loc.unwrap_or(0.), params.scale.unwrap_or(1.))
                    .map_err(|e| invalid(&e))?,
            ),
            Family::Uniform => {
                let loc = params.loc.unwrap_or(-5.);
                let scale = params.scale.unwrap_or(10.);
                Marginal::Uniform(Uniform::new(loc, loc + scale).map_err(|e| invalid(&e))?)
            }
            Family::Gamma => Marginal::Gamma {
                dist: Gamma::new(params.shape.unwrap_or(1.99), 1. / params.scale.unwrap_or(1.))
                    .map_err(|e| invalid(&e))?,
                loc: params.loc.unwrap_or(0.),
            },
            Family::HalfNorm => {
                let loc = params.loc.unwrap_or(0.);
                Marginal::HalfNorm {
                    dist: Normal::new(loc, params.scale.unwrap_or(1.))
                        .map_err(|e| invalid(&e))?,
                    loc,
                }
            }
        };
        Ok(marginal)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        match self {
            Marginal::Gaussian(dist) => dist.ln_pdf(x),
            Marginal::Uniform(dist) => dist.ln_pdf(x),
            Marginal::Gamma { dist, loc } => {
                if x < *loc {
                    f64::NEG_INFINITY
                } else {
                    dist.ln_pdf(x - loc)
                }
            }
            Marginal::HalfNorm { dist, loc } => {
                if x < *loc {
                    f64::NEG_INFINITY
                } else {
                    2f64.ln() + dist.ln_pdf(x)
                }
            }
        }
    }

    /// Probability mass in `[lower, upper]`.
    fn mass(&self, lower: f64, upper: f64) -> f64 {
        match self {
            Marginal::Gaussian(dist) => interval_mass(dist, lower, upper),
            Marginal::Uniform(dist) => dist.cdf(upper) - dist.cdf(lower),
            Marginal::Gamma { dist, loc } => {
                interval_mass(dist, (lower - loc).max(0.), (upper - loc).max(0.))
            }
            Marginal::HalfNorm { dist, loc } => {
                2. * interval_mass(dist, lower.max(*loc), upper.max(*loc))
            }
        }
    }
}

/// `cdf(upper) - cdf(lower)`, taken from the survival function when
/// `lower` lies in the upper tail.
fn interval_mass<D: ContinuousCDF<f64, f64>>(dist: &D, lower: f64, upper: f64) -> f64 {
    let below = dist.cdf(lower);
    if below > 0.5 {
        dist.sf(lower) - dist.sf(upper)
    } else {
        dist.cdf(upper) - below
    }
}

#[derive(Debug, Clone)]
pub struct MixtureOfDistributionsSettings {
    /// Family names and how many parameters to draw from each.
    pub distributions: Vec<(String, usize)>,
    /// Prior bounds by parameter name, replacing the family default.
    pub bounds: HashMap<String, [f64; 2]>,
    /// Family parameters by family name.
    pub distribution_params: HashMap<String, FamilyParams>,
}

impl Default for MixtureOfDistributionsSettings {
    fn default() -> Self {
        Self {
            distributions: vec![
                ("gaussian".to_string(), 2),
                ("uniform".to_string(), 2),
                ("gamma".to_string(), 2),
            ],
            bounds: HashMap::new(),
            distribution_params: HashMap::new(),
        }
    }
}

impl MixtureOfDistributionsSettings {
    /// `count` parameters from each of the given families.
    pub fn with_families(families: &[&str], count: usize) -> Self {
        Self {
            distributions: families.iter().map(|f| (f.to_string(), count)).collect(),
            ..Default::default()
        }
    }
}

/// Independent parameters, each with a density from one [`Family`].
///
/// Parameters are named `<family>_<i>`. The log-likelihood is the plain
/// sum of the marginal log-densities.
#[derive(Debug)]
pub struct MixtureOfDistributions<S: MapStrategy = Sequential> {
    prior: UniformPrior,
    families: Vec<Family>,
    marginals: Vec<Marginal>,
    ln_evidence: f64,
    strategy: S,
}

impl MixtureOfDistributions<Sequential> {
    pub fn new(settings: MixtureOfDistributionsSettings) -> Result<Self> {
        let mut params = HashMap::new();
        for (name, p) in &settings.distribution_params {
            params.insert(name.parse::<Family>()?, *p);
        }

        let mut names = Vec::new();
        let mut bounds = Vec::new();
        let mut families = Vec::new();
        let mut marginals = Vec::new();
        for (family_name, count) in &settings.distributions {
            let family: Family = family_name.parse()?;
            let marginal = Marginal::new(family, params.get(&family).copied().unwrap_or_default())?;
            for i in 0..*count {
                let name = format!("{}_{i}", family.name());
                bounds.push(
                    settings
                        .bounds
                        .get(&name)
                        .copied()
                        .unwrap_or_else(|| family.default_bounds()),
                );
                names.push(name);
                families.push(family);
                marginals.push(marginal.clone());
            }
        }
        if let Some(unknown) = settings.bounds.keys().find(|k| !names.contains(*k)) {
            return Err(ModelError::InvalidArgument(format!(
                "bounds given for unknown parameter `{unknown}`"
            )));
        }
        let prior = UniformPrior::new(names, bounds)?;

        let ln_mass: f64 = prior
            .iter_bounds()
            .zip(&marginals)
            .map(|((_, [l, u]), marginal)| marginal.mass(l, u).ln())
            .sum();
        let ln_evidence = ln_mass - prior.ln_volume();

        Ok(Self {
            prior,
            families,
            marginals,
            ln_evidence,
            strategy: Sequential,
        })
    }
}

impl<S: MapStrategy> MixtureOfDistributions<S> {
    /// Use `strategy` for every later likelihood evaluation.
    pub fn with_strategy<T: MapStrategy>(self, strategy: T) -> MixtureOfDistributions<T> {
        MixtureOfDistributions {
            prior: self.prior,
            families: self.families,
            marginals: self.marginals,
            ln_evidence: self.ln_evidence,
            strategy,
        }
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Log-likelihood with the per-parameter terms evaluated by `strategy`.
    pub fn log_likelihood_with<T: MapStrategy>(
        &self,
        points: &LivePoints,
        strategy: &T,
    ) -> Result<Vec<f64>> {
        let names = self.prior.names();
        let terms = strategy.map(names, |name| {
            let idx = names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ModelError::MissingParameter(name.to_string()))?;
            let marginal = &self.marginals[idx];
            Ok(points
                .column(name)?
                .iter()
                .map(|&x| marginal.ln_pdf(x))
                .collect())
        });

        let mut log_l = vec![0.; points.len()];
        for term in terms {
            log_l.iter_mut().zip(term?).for_each(|(acc, v)| *acc += v);
        }
        Ok(log_l)
    }
}

impl<S: MapStrategy> Model for MixtureOfDistributions<S> {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        self.log_likelihood_with(points, &self.strategy)
    }

    fn ln_evidence(&self) -> Option<f64> {
        Some(self.ln_evidence)
    }
}
