//! A tool to generate and clamp noise.

use rand::Rng;
use rand_distr::{Normal, Distribution};
use serde::{Deserialize, Serialize};
use crate::error::{ConfigurationError, SpikeMechanismError};


/// Calculates the normal distribution at the given mean and standard deviation and clamps
/// the output value between the given minimum and maximum, if standard deviation is `0.` the
/// mean is always returned
pub fn limited_distr<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std: f64,
    minimum: f64,
    maximum: f64,
) -> Result<f64, SpikeMechanismError> {
    if std == 0.0 {
        return Ok(mean);
    }

    let normal = Normal::new(mean, std)
        .map_err(|err| ConfigurationError::InvalidNoise(err.to_string()))?;
    let output: f64 = normal.sample(rng);

    Ok(output.max(minimum).min(maximum))
}

/// Parameters used in generating noise on a commanded voltage (mV)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaussianParameters {
    /// Mean of distribution
    pub mean: f64,
    /// Standard deviation of distribution
    pub std: f64,
    /// Maximum cutoff value
    pub max: f64,
    /// Minimum cutoff value
    pub min: f64,
}

impl Default for GaussianParameters {
    fn default() -> Self {
        GaussianParameters {
            mean: 0.,
            std: 0.,
            max: 5.,
            min: -5.,
        }
    }
}

impl GaussianParameters {
    /// Checks that a distribution can be built and that the cutoffs are ordered
    pub fn validate(&self) -> Result<(), SpikeMechanismError> {
        if !(self.min <= self.max) {
            return Err(
                ConfigurationError::InvalidNoise(
                    format!("minimum {} is greater than maximum {}", self.min, self.max)
                ).into()
            );
        }
        if self.std != 0. {
            Normal::new(self.mean, self.std)
                .map_err(|err| ConfigurationError::InvalidNoise(err.to_string()))?;
        }

        Ok(())
    }

    /// Samples a clamped value from the distribution
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, SpikeMechanismError> {
        limited_distr(rng, self.mean, self.std, self.min, self.max)
    }
}
