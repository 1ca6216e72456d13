//! N-dimensional egg box likelihood (Feroz et al. 2008).

use std::f64::consts::PI;

use crate::error::Result;
use crate::model::Model;
use crate::points::LivePoints;
use crate::prior::UniformPrior;

#[derive(Debug, Clone)]
pub struct EggBoxSettings {
    pub dims: usize,
    pub bounds: [f64; 2],
}

impl Default for EggBoxSettings {
    fn default() -> Self {
        Self {
            dims: 2,
            bounds: [0., 10. * PI],
        }
    }
}

/// `log L = (2 + sum_i cos(x_i / 2))^5`, many modes of equal height.
#[derive(Debug, Clone)]
pub struct EggBox {
    prior: UniformPrior,
}

impl EggBox {
    pub fn new(settings: EggBoxSettings) -> Result<Self> {
        let prior = UniformPrior::n_dimensional(settings.dims, &settings.bounds)?;
        Ok(Self { prior })
    }
}

impl Model for EggBox {
    fn prior(&self) -> &UniformPrior {
        &self.prior
    }

    fn log_likelihood(&self, points: &LivePoints) -> Result<Vec<f64>> {
        let mut sum = vec![2.; points.len()];
        for name in self.prior.names() {
            sum.iter_mut()
                .zip(points.column(name)?)
                .for_each(|(s, x)| *s += (x / 2.).cos());
        }
        Ok(sum.into_iter().map(|s| s.powi(5)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn equal_height_modes() {
        let model = EggBox::new(EggBoxSettings::default()).unwrap();
        let modes = [vec![0., 0.], vec![4. * PI, 0.], vec![4. * PI, 8. * PI]];
        let x = LivePoints::from_rows(model.names(), &modes).unwrap();
        for log_l in model.log_likelihood(&x).unwrap() {
            assert_relative_eq!(log_l, 4f64.powi(5), epsilon = 1e-9);
        }
    }

    #[test]
    fn trough() {
        let model = EggBox::new(EggBoxSettings::default()).unwrap();
        let x = LivePoints::from_point(model.names(), &[2. * PI, 2. * PI]).unwrap();
        assert_relative_eq!(model.log_likelihood(&x).unwrap()[0], 0., epsilon = 1e-9);
    }
}
