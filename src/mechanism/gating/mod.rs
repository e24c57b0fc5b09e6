//! Gating state of the mechanism and its exponential Euler update.
//!
//! Each gating variable relaxes toward its steady state with
//! `x += (1 - exp(-dt / tau_x)) * (x_inf - x)`, which is exact while the
//! voltage is held constant over the step and stable for any `dt > 0`.

use tracing::warn;
use super::NamedVariables;
use super::kinetics::{Gate, Kinetics, StepFactors};
use crate::error::{NumericalError, PreconditionError, SpikeMechanismError};


/// Checks that a timestep is finite and greater than zero
pub fn validate_timestep(dt: f64) -> Result<f64, SpikeMechanismError> {
    if dt.is_finite() && dt > 0. {
        Ok(dt)
    } else {
        warn!(dt, "rejecting non-positive timestep");
        Err(PreconditionError::NonPositiveTimestep(dt).into())
    }
}

/// Evaluates kinetics at a voltage, failing if the voltage or any gate's kinetics are not finite
pub fn checked_kinetics(v: f64) -> Result<Kinetics, SpikeMechanismError> {
    if !v.is_finite() {
        return Err(NumericalError::NonFiniteVoltage(v).into());
    }

    let kinetics = Kinetics::evaluate(v);
    match kinetics.first_non_finite() {
        Some(gate) => Err(NumericalError::NonFiniteKinetics { gate, voltage: v }.into()),
        None => Ok(kinetics),
    }
}

/// Fraction of open gates for each gating process
#[derive(Debug, Clone, Copy, PartialEq, NamedVariables)]
pub struct GatingState {
    m: f64,
    h: f64,
    n: f64,
    p: f64,
    q: f64,
    c: f64,
}

impl Default for GatingState {
    fn default() -> Self {
        // resting values at -60 mV
        GatingState {
            m: 0.0345,
            h: 0.8594,
            n: 0.1213,
            p: 0.0862,
            q: 0.2534,
            c: 0.0038,
        }
    }
}

/// Outcome of one integration step along with the values used to compute it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatingStep {
    /// Updated gating state
    pub state: GatingState,
    /// Kinetics evaluated at the step voltage
    pub kinetics: Kinetics,
    /// Decay factors for the step
    pub factors: StepFactors,
}

impl GatingState {
    /// Returns the fixed initial gating values
    pub fn resting() -> Self {
        GatingState::default()
    }

    /// Returns the gating state at steady state for the given kinetics
    pub fn steady_state(kinetics: &Kinetics) -> Self {
        GatingState {
            m: kinetics.m.inf,
            h: kinetics.h.inf,
            n: kinetics.n.inf,
            p: kinetics.p.inf,
            q: kinetics.q.inf,
            c: kinetics.c.inf,
        }
    }

    pub fn m(&self) -> f64 { self.m }
    pub fn h(&self) -> f64 { self.h }
    pub fn n(&self) -> f64 { self.n }
    pub fn p(&self) -> f64 { self.p }
    pub fn q(&self) -> f64 { self.q }
    pub fn c(&self) -> f64 { self.c }

    pub fn get(&self, gate: Gate) -> f64 {
        match gate {
            Gate::M => self.m,
            Gate::H => self.h,
            Gate::N => self.n,
            Gate::P => self.p,
            Gate::Q => self.q,
            Gate::C => self.c,
        }
    }

    /// Moves every gating variable toward its steady state by its decay factor
    pub fn relax_toward(&self, kinetics: &Kinetics, factors: &StepFactors) -> GatingState {
        GatingState {
            m: self.m + factors.m * (kinetics.m.inf - self.m),
            h: self.h + factors.h * (kinetics.h.inf - self.h),
            n: self.n + factors.n * (kinetics.n.inf - self.n),
            p: self.p + factors.p * (kinetics.p.inf - self.p),
            q: self.q + factors.q * (kinetics.q.inf - self.q),
            c: self.c + factors.c * (kinetics.c.inf - self.c),
        }
    }

    /// Integrates the gating state over one timestep (ms) at a fixed voltage (mV)
    pub fn integrate(&self, v: f64, dt: f64) -> Result<GatingStep, SpikeMechanismError> {
        let dt = validate_timestep(dt)?;
        let kinetics = checked_kinetics(v)?;
        let factors = kinetics.step_factors(dt);

        Ok(
            GatingStep {
                state: self.relax_toward(&kinetics, &factors),
                kinetics,
                factors,
            }
        )
    }

    /// Returns the gating state after one timestep (ms) at a fixed voltage (mV)
    pub fn advance(&self, v: f64, dt: f64) -> Result<GatingState, SpikeMechanismError> {
        Ok(self.integrate(v, dt)?.state)
    }
}
