//! Ionic currents of the mechanism and their voltage derivatives.

use super::{Ion, IonReading, NamedVariables};
use super::gating::GatingState;
use crate::error::{ConfigurationError, SpikeMechanismError};


/// Ideal gas constant (J / (mol K))
const GAS_CONSTANT: f64 = 8.314462618;
/// Faraday constant (C / mol)
const FARADAY: f64 = 96485.33212;
/// Calcium concentration at which the calcium activated potassium conductance is half open (mM)
const KCA_HALF_ACTIVATION: f64 = 0.001;
/// Default temperature used for the calcium reversal potential (degC)
pub const DEFAULT_CELSIUS: f64 = 6.3;

/// Calculates the reversal potential (mV) of an ion from the Nernst equation
pub fn nernst_potential(valence: f64, inside: f64, outside: f64, celsius: f64) -> f64 {
    let temperature = celsius + 273.15;

    1000. * (GAS_CONSTANT * temperature) / (valence * FARADAY) * (outside / inside).ln()
}

/// Activation of the calcium activated potassium conductance,
/// `0` without intracellular calcium and approaching `1` as calcium grows
pub fn kca_activation(ca_i: f64) -> f64 {
    let ratio = ca_i / KCA_HALF_ACTIVATION;

    if ratio.is_infinite() {
        return 1.;
    }

    ratio / (1. + ratio)
}

/// Maximal conductances of each current (S/cm^2), fixed once constructed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conductances {
    g_na: f64,
    g_kdr: f64,
    g_a: f64,
    g_ca: f64,
    g_kca: f64,
}

impl Default for Conductances {
    fn default() -> Self {
        Conductances {
            g_na: 0.04,
            g_kdr: 0.012,
            g_a: 0.036,
            g_ca: 0.002,
            g_kca: 0.00005,
        }
    }
}

impl Conductances {
    /// Creates a set of conductances, each must be non-negative and finite
    pub fn new(
        g_na: f64,
        g_kdr: f64,
        g_a: f64,
        g_ca: f64,
        g_kca: f64,
    ) -> Result<Self, SpikeMechanismError> {
        let named = [
            ("g_na", g_na), ("g_kdr", g_kdr), ("g_a", g_a), ("g_ca", g_ca), ("g_kca", g_kca),
        ];

        for (name, value) in named {
            if !(value.is_finite() && value >= 0.) {
                return Err(ConfigurationError::InvalidConductance { name, value }.into());
            }
        }

        Ok(Conductances { g_na, g_kdr, g_a, g_ca, g_kca })
    }

    /// Sodium conductance
    pub fn g_na(&self) -> f64 { self.g_na }
    /// Delayed rectifier potassium conductance
    pub fn g_kdr(&self) -> f64 { self.g_kdr }
    /// A-type potassium conductance
    pub fn g_a(&self) -> f64 { self.g_a }
    /// Calcium conductance
    pub fn g_ca(&self) -> f64 { self.g_ca }
    /// Calcium activated potassium conductance
    pub fn g_kca(&self) -> f64 { self.g_kca }
}

/// Ion state supplied by the host each step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonEnvironment {
    /// Sodium reversal potential (mV)
    pub e_na: f64,
    /// Potassium reversal potential (mV)
    pub e_k: f64,
    /// Calcium reversal potential (mV)
    pub e_ca: f64,
    /// Intracellular calcium concentration (mM)
    pub ca_i: f64,
    /// Extracellular calcium concentration (mM)
    pub ca_o: f64,
}

impl Default for IonEnvironment {
    fn default() -> Self {
        let ca_i = 0.0001;
        let ca_o = 1.8;

        IonEnvironment {
            e_na: 35.,
            e_k: -75.,
            e_ca: nernst_potential(2., ca_i, ca_o, DEFAULT_CELSIUS),
            ca_i,
            ca_o,
        }
    }
}

impl IonEnvironment {
    /// Reads the environment from an ion pool
    pub fn from_pool<P: super::IonPool + ?Sized>(pool: &P) -> Self {
        let calcium = pool.read(Ion::Calcium);

        IonEnvironment {
            e_na: pool.read(Ion::Sodium).reversal_potential,
            e_k: pool.read(Ion::Potassium).reversal_potential,
            e_ca: calcium.reversal_potential,
            ca_i: calcium.inner_concentration,
            ca_o: calcium.outer_concentration,
        }
    }

    /// Returns the environment as a reading of a single ion, sodium and potassium
    /// concentrations are not tracked and read as `NaN`
    pub fn reading(&self, ion: Ion) -> IonReading {
        match ion {
            Ion::Sodium => IonReading {
                reversal_potential: self.e_na,
                inner_concentration: f64::NAN,
                outer_concentration: f64::NAN,
            },
            Ion::Potassium => IonReading {
                reversal_potential: self.e_k,
                inner_concentration: f64::NAN,
                outer_concentration: f64::NAN,
            },
            Ion::Calcium => IonReading {
                reversal_potential: self.e_ca,
                inner_concentration: self.ca_i,
                outer_concentration: self.ca_o,
            },
        }
    }

    /// Reversal potential of an ion
    pub fn reversal_potential(&self, ion: Ion) -> f64 {
        match ion {
            Ion::Sodium => self.e_na,
            Ion::Potassium => self.e_k,
            Ion::Calcium => self.e_ca,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.e_na.is_finite() && self.e_k.is_finite() && self.e_ca.is_finite()
            && self.ca_i.is_finite() && self.ca_o.is_finite()
    }
}

/// Ionic currents (mA/cm^2) at one gating state and voltage
#[derive(Debug, Clone, Copy, PartialEq, Default, NamedVariables)]
pub struct IonicCurrents {
    /// Sodium current
    pub i_na: f64,
    /// Delayed rectifier potassium current
    pub i_kdr: f64,
    /// A-type potassium current
    pub i_a: f64,
    /// Calcium activated potassium current
    pub i_kca: f64,
    /// Total potassium current
    pub i_k: f64,
    /// Calcium current
    pub i_ca: f64,
}

impl IonicCurrents {
    /// Calculates every current at the given voltage (mV)
    pub fn compute(
        conductances: &Conductances,
        gating: &GatingState,
        v: f64,
        environment: &IonEnvironment,
    ) -> Self {
        let (m, h, n, p, q, c) = (gating.m(), gating.h(), gating.n(), gating.p(), gating.q(), gating.c());

        let i_na = conductances.g_na * m * m * m * h * (v - environment.e_na);
        let i_kdr = conductances.g_kdr * n * n * n * n * (v - environment.e_k);
        let i_a = conductances.g_a * p * p * p * q * (v - environment.e_k);
        let i_kca = conductances.g_kca * kca_activation(environment.ca_i) * (v - environment.e_k);
        let i_k = i_kdr + i_a + i_kca;
        let i_ca = conductances.g_ca * c * c * c * (v - environment.e_ca);

        IonicCurrents { i_na, i_kdr, i_a, i_kca, i_k, i_ca }
    }

    /// Total transmembrane current
    pub fn total(&self) -> f64 {
        self.i_na + self.i_k + self.i_ca
    }

    /// Current carried by an ion
    pub fn get(&self, ion: Ion) -> f64 {
        match ion {
            Ion::Sodium => self.i_na,
            Ion::Potassium => self.i_k,
            Ion::Calcium => self.i_ca,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.variable_values().iter().all(|i| i.is_finite())
    }
}

/// Derivative of each ion's current with respect to voltage (S/cm^2) at a fixed gating state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IonSlopes {
    pub na: f64,
    pub k: f64,
    pub ca: f64,
}

impl IonSlopes {
    /// Exact slopes, every current is linear in voltage once gating is fixed
    pub fn analytic(
        conductances: &Conductances,
        gating: &GatingState,
        environment: &IonEnvironment,
    ) -> Self {
        let (m, h, n, p, q, c) = (gating.m(), gating.h(), gating.n(), gating.p(), gating.q(), gating.c());

        IonSlopes {
            na: conductances.g_na * m * m * m * h,
            k: conductances.g_kdr * n * n * n * n
                + conductances.g_a * p * p * p * q
                + conductances.g_kca * kca_activation(environment.ca_i),
            ca: conductances.g_ca * c * c * c,
        }
    }

    /// Slopes from the difference of currents at two voltages separated by `epsilon`
    pub fn finite_difference(perturbed: &IonicCurrents, base: &IonicCurrents, epsilon: f64) -> Self {
        IonSlopes {
            na: (perturbed.i_na - base.i_na) / epsilon,
            k: (perturbed.i_k - base.i_k) / epsilon,
            ca: (perturbed.i_ca - base.i_ca) / epsilon,
        }
    }

    pub fn get(&self, ion: Ion) -> f64 {
        match ion {
            Ion::Sodium => self.na,
            Ion::Potassium => self.k,
            Ion::Calcium => self.ca,
        }
    }

    /// Total membrane conductance
    pub fn total(&self) -> f64 {
        self.na + self.k + self.ca
    }

    pub fn is_finite(&self) -> bool {
        self.na.is_finite() && self.k.is_finite() && self.ca.is_finite()
    }
}
