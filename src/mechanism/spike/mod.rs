//! Lifecycle of the mechanism as driven by a host engine: initialization,
//! current evaluation for the host's linear system and gating state advance.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use super::{Ion, IonPool, NamedVariables};
use super::currents::{Conductances, IonEnvironment, IonSlopes, IonicCurrents};
use super::gating::{checked_kinetics, validate_timestep, GatingState};
use super::kinetics::{Gate, Kinetics, StepFactors};
use crate::error::{ConfigurationError, NumericalError, SpikeMechanismError};


/// Default voltage perturbation for finite difference linearization (mV)
pub const DEFAULT_PERTURBATION: f64 = 0.001;

/// How the derivative of the current with respect to voltage is calculated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Linearization {
    /// Difference of the currents at `v + epsilon` and `v`
    FiniteDifference { epsilon: f64 },
    /// Exact derivative at a fixed gating state
    Analytic,
}

impl Default for Linearization {
    fn default() -> Self {
        Linearization::FiniteDifference { epsilon: DEFAULT_PERTURBATION }
    }
}

/// How gating variables are set when the mechanism is initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initialization {
    /// Fixed values tuned for a -60 mV resting potential
    #[default]
    Resting,
    /// Steady state values at the initialization voltage
    SteadyState,
}

/// What the mechanism contributes to the host's linear system for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentContribution {
    /// Total membrane current to subtract from the right hand side (mA/cm^2)
    pub current: f64,
    /// Derivative of the total current to add to the diagonal (S/cm^2)
    pub conductance: f64,
    /// Individual currents at the evaluation voltage
    pub currents: IonicCurrents,
    /// Derivative of each ion's current
    pub slopes: IonSlopes,
}

/// Spike mechanism of a single membrane patch
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeMechanism {
    conductances: Conductances,
    gating: GatingState,
    linearization: Linearization,
    initialization: Initialization,
    currents: IonicCurrents,
    kinetics: Option<Kinetics>,
    step_factors: Option<StepFactors>,
}

impl Default for SpikeMechanism {
    fn default() -> Self {
        SpikeMechanism::new(Conductances::default())
    }
}

impl SpikeMechanism {
    /// Creates a mechanism at the resting gating state
    pub fn new(conductances: Conductances) -> Self {
        debug!(?conductances, "creating spike mechanism");

        SpikeMechanism {
            conductances,
            gating: GatingState::resting(),
            linearization: Linearization::default(),
            initialization: Initialization::default(),
            currents: IonicCurrents::default(),
            kinetics: None,
            step_factors: None,
        }
    }

    /// Sets how current derivatives are calculated, a finite difference
    /// perturbation must be finite and non-zero
    pub fn with_linearization(mut self, linearization: Linearization) -> Result<Self, SpikeMechanismError> {
        if let Linearization::FiniteDifference { epsilon } = linearization {
            if !epsilon.is_finite() || epsilon == 0. {
                return Err(ConfigurationError::InvalidPerturbation(epsilon).into());
            }
        }
        self.linearization = linearization;

        Ok(self)
    }

    /// Sets how gating is initialized
    pub fn with_initialization(mut self, initialization: Initialization) -> Self {
        self.initialization = initialization;

        self
    }

    pub fn conductances(&self) -> &Conductances {
        &self.conductances
    }

    pub fn gating(&self) -> &GatingState {
        &self.gating
    }

    pub fn linearization(&self) -> Linearization {
        self.linearization
    }

    pub fn initialization(&self) -> Initialization {
        self.initialization
    }

    /// Currents from the last current evaluation
    pub fn currents(&self) -> &IonicCurrents {
        &self.currents
    }

    /// Kinetics from the last state advance or kinetics evaluation
    pub fn kinetics(&self) -> Option<&Kinetics> {
        self.kinetics.as_ref()
    }

    /// Decay factors from the last state advance or kinetics evaluation
    pub fn step_factors(&self) -> Option<&StepFactors> {
        self.step_factors.as_ref()
    }

    /// Reads a range variable by name, gating variables (`m`), currents (`i_na`),
    /// steady states (`m_inf`), time constants (`tau_m`) and decay factors (`m_exp`)
    /// are available, kinetic variables only after they have been evaluated
    pub fn range_variable(&self, name: &str) -> Option<f64> {
        if let Some(value) = self.gating.get_variable(name) {
            return Some(value);
        }
        if let Some(value) = self.currents.get_variable(name) {
            return Some(value);
        }

        if let Some(gate) = name.strip_suffix("_inf").and_then(Gate::from_name) {
            return self.kinetics.map(|kinetics| kinetics.get(gate).inf);
        }
        if let Some(gate) = name.strip_prefix("tau_").and_then(Gate::from_name) {
            return self.kinetics.map(|kinetics| kinetics.get(gate).tau);
        }
        if let Some(gate) = name.strip_suffix("_exp") {
            return self.step_factors.and_then(|factors| factors.get_variable(gate));
        }

        None
    }

    /// Resets gating at the start of a simulation, the ion pool is read so
    /// that a mechanism with invalid ion state fails before the first step
    pub fn initialize<P: IonPool + ?Sized>(&mut self, v: f64, pool: &P) -> Result<(), SpikeMechanismError> {
        let environment = IonEnvironment::from_pool(pool);
        debug!(v, ?environment, initialization = ?self.initialization, "initializing spike mechanism");

        if !environment.is_finite() {
            error!(?environment, "ion state is not finite");
            return Err(NumericalError::NonFiniteIonState.into());
        }

        self.gating = match self.initialization {
            Initialization::Resting => GatingState::resting(),
            Initialization::SteadyState => GatingState::steady_state(&checked_kinetics(v)?),
        };
        self.currents = IonicCurrents::default();
        self.kinetics = None;
        self.step_factors = None;

        Ok(())
    }

    /// Evaluates the membrane current and its derivative at the present gating state,
    /// accumulating each ion's current and derivative into the pool
    pub fn compute_current<P: IonPool + ?Sized>(
        &mut self,
        v: f64,
        pool: &mut P,
    ) -> Result<CurrentContribution, SpikeMechanismError> {
        if !v.is_finite() {
            error!(v, "membrane potential is not finite");
            return Err(NumericalError::NonFiniteVoltage(v).into());
        }

        let environment = IonEnvironment::from_pool(&*pool);

        let (currents, slopes, conductance) = match self.linearization {
            Linearization::FiniteDifference { epsilon } => {
                let perturbed = IonicCurrents::compute(&self.conductances, &self.gating, v + epsilon, &environment);
                let currents = IonicCurrents::compute(&self.conductances, &self.gating, v, &environment);
                let slopes = IonSlopes::finite_difference(&perturbed, &currents, epsilon);

                (currents, slopes, (perturbed.total() - currents.total()) / epsilon)
            },
            Linearization::Analytic => {
                let currents = IonicCurrents::compute(&self.conductances, &self.gating, v, &environment);
                let slopes = IonSlopes::analytic(&self.conductances, &self.gating, &environment);

                (currents, slopes, slopes.total())
            },
        };

        if !currents.is_finite() || !slopes.is_finite() || !conductance.is_finite() {
            error!(v, ?environment, ?currents, "membrane current is not finite");
            return Err(NumericalError::NonFiniteCurrent { voltage: v }.into());
        }

        for ion in Ion::ALL {
            pool.accumulate(ion, currents.get(ion), slopes.get(ion));
        }
        self.currents = currents;

        Ok(
            CurrentContribution {
                current: currents.total(),
                conductance,
                currents,
                slopes,
            }
        )
    }

    /// Advances the gating state by one exponential Euler step at the resolved voltage,
    /// gating kinetics do not depend on ion state so the pool is not read
    pub fn advance_state<P: IonPool + ?Sized>(
        &mut self,
        v: f64,
        dt: f64,
        _pool: &P,
    ) -> Result<(), SpikeMechanismError> {
        // rejected timesteps are already logged when validated
        let step = self.gating.integrate(v, dt)
            .map_err(|err| {
                if matches!(err, SpikeMechanismError::NumericalRelatedError(_)) {
                    error!(v, dt, %err, "could not advance gating state");
                }
                err
            })?;

        self.gating = step.state;
        self.kinetics = Some(step.kinetics);
        self.step_factors = Some(step.factors);

        Ok(())
    }

    /// Evaluates kinetics and decay factors at a voltage without changing the gating state
    pub fn evaluate_kinetics(&mut self, v: f64, dt: f64) -> Result<(Kinetics, StepFactors), SpikeMechanismError> {
        let dt = validate_timestep(dt)?;
        let kinetics = checked_kinetics(v)?;
        let factors = kinetics.step_factors(dt);

        self.kinetics = Some(kinetics);
        self.step_factors = Some(factors);

        Ok((kinetics, factors))
    }
}
