//! Uniform priors over axis-aligned bounds.

use rand::Rng;

use crate::error::{ModelError, Result};
use crate::points::LivePoints;

/// Independent uniform prior on each named parameter.
///
/// Every model owns one of these and delegates prior evaluation and the
/// unit-hypercube mapping to it.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformPrior {
    names: Vec<String>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl UniformPrior {
    /// Parameters with explicit `[lower, upper]` bounds, in order.
    pub fn new(names: Vec<String>, bounds: Vec<[f64; 2]>) -> Result<Self> {
        if names.is_empty() {
            return Err(ModelError::InvalidArgument(
                "a prior needs at least one parameter".into(),
            ));
        }
        if names.len() != bounds.len() {
            return Err(ModelError::InvalidArgument(format!(
                "{} names but {} bounds",
                names.len(),
                bounds.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ModelError::InvalidArgument(format!(
                    "duplicate parameter `{name}`"
                )));
            }
        }
        for (name, &[lower, upper]) in names.iter().zip(&bounds) {
            if !(lower.is_finite() && upper.is_finite() && lower < upper) {
                return Err(ModelError::InvalidBounds(format!(
                    "`{name}` has bounds [{lower}, {upper}]"
                )));
            }
        }
        let (lower, upper) = bounds.iter().map(|&[l, u]| (l, u)).unzip();
        Ok(Self {
            names,
            lower,
            upper,
        })
    }

    /// `dims` parameters `x_0 .. x_{dims-1}` sharing one pair of bounds.
    pub fn n_dimensional(dims: usize, bounds: &[f64]) -> Result<Self> {
        let &[lower, upper] = bounds else {
            return Err(ModelError::InvalidArgument(format!(
                "bounds must have length 2, got {}",
                bounds.len()
            )));
        };
        let names = (0..dims).map(|i| format!("x_{i}")).collect();
        Self::new(names, vec![[lower, upper]; dims])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn dims(&self) -> usize {
        self.names.len()
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }

    pub fn bounds(&self, name: &str) -> Option<[f64; 2]> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some([self.lower[idx], self.upper[idx]])
    }

    /// `(name, [lower, upper])` in parameter order.
    pub fn iter_bounds(&self) -> impl Iterator<Item = (&str, [f64; 2])> + '_ {
        self.names
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(name, (&l, &u))| (name.as_str(), [l, u]))
    }

    /// Log of the prior volume.
    pub fn ln_volume(&self) -> f64 {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(l, u)| (u - l).ln())
            .sum()
    }

    /// Whether every parameter of each sample lies within its bounds.
    pub fn in_bounds(&self, points: &LivePoints) -> Result<Vec<bool>> {
        let mut out = vec![true; points.len()];
        for (name, [lower, upper]) in self.iter_bounds() {
            let col = points.column(name)?;
            out.iter_mut().zip(col).for_each(|(ok, &x)| {
                *ok &= (x >= lower) & (x <= upper);
            });
        }
        Ok(out)
    }

    /// Uniform log-density, `-inf` for samples outside the bounds.
    pub fn log_prior(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let ln_volume = self.ln_volume();
        Ok(self
            .in_bounds(points)?
            .into_iter()
            .map(|ok| if ok { -ln_volume } else { f64::NEG_INFINITY })
            .collect())
    }

    pub fn to_unit_hypercube(&self, points: &LivePoints) -> Result<LivePoints> {
        let mut out = points.clone();
        for (name, [lower, upper]) in self.iter_bounds() {
            let width = upper - lower;
            out.column_mut(name)?
                .iter_mut()
                .for_each(|x| *x = (*x - lower) / width);
        }
        Ok(out)
    }

    pub fn from_unit_hypercube(&self, points: &LivePoints) -> Result<LivePoints> {
        let mut out = points.clone();
        for (name, [lower, upper]) in self.iter_bounds() {
            let width = upper - lower;
            out.column_mut(name)?
                .iter_mut()
                .for_each(|x| *x = width * *x + lower);
        }
        Ok(out)
    }

    /// Draw `n` samples uniformly within the bounds.
    pub fn new_points<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> LivePoints {
        let columns = self
            .lower
            .iter()
            .zip(&self.upper)
            .map(|(&l, &u)| (0..n).map(|_| rng.random_range(l..u)).collect())
            .collect();
        LivePoints::from_parts(self.names.clone(), columns, n)
    }
}
