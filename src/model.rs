//! Core abstraction for nested-sampling models.
//!
//! Provides the `Model` trait, the interface an external sampler calls
//! into: prior and likelihood evaluation on batches of live points, the
//! unit-hypercube mapping, and the analytic evidence where it is known.

use crate::error::Result;
use crate::points::LivePoints;
use crate::prior::UniformPrior;

/// A likelihood together with the uniform prior it is defined over.
///
/// Evaluation never fails for points outside the prior bounds: those get
/// a log-prior of `-inf`. Errors are reserved for batches that lack one
/// of the model's parameters.
///
/// The trait is object safe and thread-safe so that a sampler can hold a
/// `Box<dyn Model>` and evaluate batches from several threads.
pub trait Model: Send + Sync {
    /// The prior every prior-related method delegates to.
    fn prior(&self) -> &UniformPrior;

    /// Log-likelihood of every sample in the batch.
    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>>;

    /// Natural log-evidence, when it is known analytically.
    fn ln_evidence(&self) -> Option<f64> {
        None
    }

    fn names(&self) -> &[String] {
        self.prior().names()
    }

    fn dims(&self) -> usize {
        self.prior().dims()
    }

    fn in_bounds(&self, points: &LivePoints) -> Result<Vec<bool>> {
        self.prior().in_bounds(points)
    }

    fn log_prior(&self, points: &LivePoints) -> Result<Vec<f64>> {
        self.prior().log_prior(points)
    }

    fn to_unit_hypercube(&self, points: &LivePoints) -> Result<LivePoints> {
        self.prior().to_unit_hypercube(points)
    }

    fn from_unit_hypercube(&self, points: &LivePoints) -> Result<LivePoints> {
        self.prior().from_unit_hypercube(points)
    }
}
