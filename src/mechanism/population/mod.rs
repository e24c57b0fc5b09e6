//! A set of independent mechanisms, one per membrane patch, stepped in parallel.

use rayon::prelude::*;
use tracing::debug;
use super::IonPool;
use super::currents::Conductances;
use super::spike::{CurrentContribution, SpikeMechanism};
use crate::error::{PreconditionError, SpikeMechanismError};


fn check_length(expected: usize, actual: usize) -> Result<(), SpikeMechanismError> {
    if expected != actual {
        return Err(PreconditionError::LengthMismatch { expected, actual }.into());
    }

    Ok(())
}

/// Mechanisms of many patches, each patch is only ever touched by one worker at a time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MechanismPopulation {
    mechanisms: Vec<SpikeMechanism>,
}

impl From<Vec<SpikeMechanism>> for MechanismPopulation {
    fn from(mechanisms: Vec<SpikeMechanism>) -> Self {
        MechanismPopulation { mechanisms }
    }
}

impl MechanismPopulation {
    /// Creates `size` identical mechanisms
    pub fn uniform(size: usize, conductances: Conductances) -> Self {
        debug!(size, "creating uniform mechanism population");

        MechanismPopulation {
            mechanisms: vec![SpikeMechanism::new(conductances); size],
        }
    }

    pub fn len(&self) -> usize {
        self.mechanisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mechanisms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SpikeMechanism> {
        self.mechanisms.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpikeMechanism> {
        self.mechanisms.iter()
    }

    /// Initializes every patch at its voltage, patches already initialized by other workers
    /// stay initialized if another patch fails
    pub fn initialize<P: IonPool + Sync>(
        &mut self,
        voltages: &[f64],
        pools: &[P],
    ) -> Result<(), SpikeMechanismError> {
        check_length(self.len(), voltages.len())?;
        check_length(self.len(), pools.len())?;

        self.mechanisms.par_iter_mut()
            .zip(voltages.par_iter())
            .zip(pools.par_iter())
            .try_for_each(|((mechanism, v), pool)| mechanism.initialize(*v, pool))
    }

    /// Evaluates the current contribution of every patch, accumulating into each patch's pool,
    /// on the first failure the remaining work is abandoned but pools already accumulated into
    /// by other workers keep their contributions
    pub fn compute_currents<P: IonPool + Send>(
        &mut self,
        voltages: &[f64],
        pools: &mut [P],
    ) -> Result<Vec<CurrentContribution>, SpikeMechanismError> {
        check_length(self.len(), voltages.len())?;
        check_length(self.len(), pools.len())?;

        self.mechanisms.par_iter_mut()
            .zip(voltages.par_iter())
            .zip(pools.par_iter_mut())
            .map(|((mechanism, v), pool)| mechanism.compute_current(*v, pool))
            .collect()
    }

    /// Advances the gating state of every patch at its resolved voltage, on the first failure
    /// the remaining work is abandoned but patches already advanced by other workers stay advanced
    pub fn advance_states<P: IonPool + Sync>(
        &mut self,
        voltages: &[f64],
        dt: f64,
        pools: &[P],
    ) -> Result<(), SpikeMechanismError> {
        check_length(self.len(), voltages.len())?;
        check_length(self.len(), pools.len())?;

        self.mechanisms.par_iter_mut()
            .zip(voltages.par_iter())
            .zip(pools.par_iter())
            .try_for_each(|((mechanism, v), pool)| mechanism.advance_state(*v, dt, pool))
    }
}
