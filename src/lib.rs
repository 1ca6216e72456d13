//! Likelihood models for testing and benchmarking nested samplers.
//!
//! Every model implements [`Model`]: a uniform prior over named
//! parameters, a log-likelihood evaluated on batches of [`LivePoints`],
//! and the analytic log-evidence where it is known.
//!
//! ```
//! use nested_models::{Gaussian, GaussianSettings, LivePoints, Model};
//!
//! let model = Gaussian::new(GaussianSettings {
//!     dims: 4,
//!     ..Default::default()
//! })
//! .unwrap();
//! let points = LivePoints::from_point(model.names(), &[0.; 4]).unwrap();
//! let log_l = model.log_likelihood(&points).unwrap();
//! assert!(log_l[0].is_finite());
//! assert!(model.ln_evidence().is_some());
//! ```

pub(crate) mod brewer;
pub(crate) mod eggbox;
pub(crate) mod error;
pub(crate) mod gaussian;
pub(crate) mod gaussian_mixture;
pub(crate) mod half_gaussian;
pub(crate) mod math;
pub(crate) mod mixture;
pub(crate) mod model;
pub(crate) mod mvn;
pub(crate) mod points;
pub(crate) mod prior;
pub(crate) mod pyramid;
pub(crate) mod rosenbrock;
pub(crate) mod signals;

pub use brewer::{Brewer, BrewerSettings};
pub use eggbox::{EggBox, EggBoxSettings};
pub use error::{ErrorKind, ModelError, Result};
pub use gaussian::{gaussian_ln_evidence, EvidenceBounds, Gaussian, GaussianSettings};
pub use gaussian_mixture::{
    GaussianMixture, GaussianMixtureSettings, GaussianMixtureWithData,
    GaussianMixtureWithDataSettings, MixtureTruth, SlabSpike, SlabSpikeSettings,
};
pub use half_gaussian::{HalfGaussian, HalfGaussianSettings};
pub use math::logsumexp;
pub use mixture::{
    Family, FamilyParams, MapStrategy, MixtureOfDistributions, MixtureOfDistributionsSettings,
    Rayon, Sequential, ThreadPoolMap,
};
pub use model::Model;
pub use mvn::GaussianComponent;
pub use points::LivePoints;
pub use prior::UniformPrior;
pub use pyramid::{Pyramid, PyramidSettings};
pub use rosenbrock::{rosenbrock, uncoupled_rosenbrock, Rosenbrock, RosenbrockSettings};
pub use signals::{LinearSignal, SignalKind, SignalModel, SignalSettings, SinusoidalSignal};
