//! Voltage dependent rate functions of the six gating processes, their steady states,
//! time constants and the exponential decay factors used to step them.
//!
//! Rates are in 1/ms and voltages in mV, constants follow Fohlmeister et al. (1990)
//! as tuned for spiking retinal ganglion cells.

use std::fmt::{Display, Formatter, Result};
use super::NamedVariables;


/// Below this magnitude of the exponent the linoid rate is replaced by its limit
const SINGULARITY_TOLERANCE: f64 = 1e-6;

/// Evaluates `scale * x / (1 - exp(-rate * x))`, which has a removable singularity at `x = 0`,
/// close to the singularity the analytic limit `scale / rate` is used with a first order correction
fn linoid(scale: f64, x: f64, rate: f64) -> f64 {
    let exponent = rate * x;

    if exponent.abs() < SINGULARITY_TOLERANCE {
        (scale / rate) * (1. + exponent / 2.)
    } else {
        (-scale * x) / ((-exponent).exp() - 1.)
    }
}

/// Opening and closing rates of a gating process (1/ms)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateConstants {
    /// Opening rate
    pub alpha: f64,
    /// Closing rate
    pub beta: f64,
}

impl RateConstants {
    /// Converts the rates into a steady state and time constant
    pub fn to_kinetics(&self) -> GateKinetics {
        let tau = 1. / (self.alpha + self.beta);

        GateKinetics {
            inf: self.alpha * tau,
            tau,
        }
    }
}

/// Sodium activation (`m`)
pub fn na_activation(v: f64) -> RateConstants {
    RateConstants {
        alpha: linoid(0.6, v + 30., 0.1),
        beta: 20. * (-(v + 55.) / 18.).exp(),
    }
}

/// Sodium inactivation (`h`)
pub fn na_inactivation(v: f64) -> RateConstants {
    RateConstants {
        alpha: 0.4 * (-(v + 50.) / 20.).exp(),
        beta: 6. / (1. + (-0.1 * (v + 20.)).exp()),
    }
}

/// Delayed rectifier potassium activation (`n`), non-inactivating
pub fn kdr_activation(v: f64) -> RateConstants {
    RateConstants {
        alpha: linoid(0.02, v + 40., 0.1),
        beta: 0.4 * (-(v + 50.) / 80.).exp(),
    }
}

/// A-type potassium activation (`p`)
pub fn ka_activation(v: f64) -> RateConstants {
    RateConstants {
        alpha: linoid(0.006, v + 90., 0.1),
        beta: 0.1 * (-(v + 30.) / 10.).exp(),
    }
}

/// A-type potassium inactivation (`q`)
pub fn ka_inactivation(v: f64) -> RateConstants {
    RateConstants {
        alpha: 0.04 * (-(v + 70.) / 20.).exp(),
        beta: 0.6 / (1. + (-0.1 * (v + 40.)).exp()),
    }
}

/// Calcium activation (`c`)
pub fn ca_activation(v: f64) -> RateConstants {
    RateConstants {
        alpha: linoid(0.3, v + 13., 0.1),
        beta: 10. * (-(v + 38.) / 18.).exp(),
    }
}

/// The six gating processes of the mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Sodium activation
    M,
    /// Sodium inactivation
    H,
    /// Delayed rectifier potassium activation
    N,
    /// A-type potassium activation
    P,
    /// A-type potassium inactivation
    Q,
    /// Calcium activation
    C,
}

impl Gate {
    /// Every gate in state order
    pub const ALL: [Gate; 6] = [Gate::M, Gate::H, Gate::N, Gate::P, Gate::Q, Gate::C];

    /// Name of the gating variable
    pub fn name(&self) -> &'static str {
        match self {
            Gate::M => "m",
            Gate::H => "h",
            Gate::N => "n",
            Gate::P => "p",
            Gate::Q => "q",
            Gate::C => "c",
        }
    }

    /// Finds a gate by the name of its gating variable
    pub fn from_name(name: &str) -> Option<Gate> {
        Gate::ALL.into_iter()
            .find(|gate| gate.name() == name)
    }

    /// Rate constants of the gate at the given voltage (mV)
    pub fn rates(&self, v: f64) -> RateConstants {
        match self {
            Gate::M => na_activation(v),
            Gate::H => na_inactivation(v),
            Gate::N => kdr_activation(v),
            Gate::P => ka_activation(v),
            Gate::Q => ka_inactivation(v),
            Gate::C => ca_activation(v),
        }
    }
}

impl Display for Gate {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.name())
    }
}

/// Steady state and time constant of a single gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateKinetics {
    /// Steady state value
    pub inf: f64,
    /// Time constant (ms)
    pub tau: f64,
}

impl GateKinetics {
    /// Fraction of the distance to steady state covered in one step, `1 - exp(-dt / tau)`
    pub fn step_factor(&self, dt: f64) -> f64 {
        1. - (-dt / self.tau).exp()
    }

    pub fn is_finite(&self) -> bool {
        self.inf.is_finite() && self.tau.is_finite()
    }
}

/// Kinetics of all six gates evaluated at one voltage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinetics {
    pub m: GateKinetics,
    pub h: GateKinetics,
    pub n: GateKinetics,
    pub p: GateKinetics,
    pub q: GateKinetics,
    pub c: GateKinetics,
}

impl Kinetics {
    /// Evaluates every rate function at the given voltage (mV)
    pub fn evaluate(v: f64) -> Self {
        Kinetics {
            m: na_activation(v).to_kinetics(),
            h: na_inactivation(v).to_kinetics(),
            n: kdr_activation(v).to_kinetics(),
            p: ka_activation(v).to_kinetics(),
            q: ka_inactivation(v).to_kinetics(),
            c: ca_activation(v).to_kinetics(),
        }
    }

    pub fn get(&self, gate: Gate) -> GateKinetics {
        match gate {
            Gate::M => self.m,
            Gate::H => self.h,
            Gate::N => self.n,
            Gate::P => self.p,
            Gate::Q => self.q,
            Gate::C => self.c,
        }
    }

    /// Returns the first gate with a non-finite steady state or time constant
    pub fn first_non_finite(&self) -> Option<Gate> {
        Gate::ALL.into_iter()
            .find(|gate| !self.get(*gate).is_finite())
    }

    /// Calculates the exponential decay factors for a timestep (ms)
    pub fn step_factors(&self, dt: f64) -> StepFactors {
        StepFactors {
            m: self.m.step_factor(dt),
            h: self.h.step_factor(dt),
            n: self.n.step_factor(dt),
            p: self.p.step_factor(dt),
            q: self.q.step_factor(dt),
            c: self.c.step_factor(dt),
        }
    }
}

/// Exponential decay factors of each gate for one timestep
#[derive(Debug, Clone, Copy, PartialEq, NamedVariables)]
pub struct StepFactors {
    pub m: f64,
    pub h: f64,
    pub n: f64,
    pub p: f64,
    pub q: f64,
    pub c: f64,
}

impl StepFactors {
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
}
