//! The spike mechanism: Hodgkin Huxley style sodium, delayed rectifier and A-type
//! potassium, calcium activated potassium and calcium conductances for a single
//! membrane patch, along with the interface through which a host engine supplies
//! ion state and collects ionic currents.
//!
//! Each step the host first asks the mechanism for its current contribution
//! at the present gating state ([`spike::SpikeMechanism::compute_current`]), then once
//! the membrane potential is resolved it advances the gating state
//! ([`spike::SpikeMechanism::advance_state`]).

pub mod kinetics;
pub mod gating;
pub mod currents;
pub mod spike;
pub mod population;
pub mod clamp;
use currents::IonEnvironment;

/// Derive macro for [`NamedVariables`]
pub use mechanism_traits::NamedVariables;


/// Exposes a set of scalar variables by name, used to read range variables
/// and to build trace columns
pub trait NamedVariables {
    /// Names of every variable in declaration order
    fn variable_names() -> &'static [&'static str];
    /// Values of every variable in declaration order
    fn variable_values(&self) -> Vec<f64>;
    /// Gets a variable by name
    fn get_variable(&self, name: &str) -> Option<f64>;
}

/// Ions the mechanism reads from and writes currents to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ion {
    Sodium,
    Potassium,
    Calcium,
}

impl Ion {
    pub const ALL: [Ion; 3] = [Ion::Sodium, Ion::Potassium, Ion::Calcium];
}

/// State of an ion as seen by the mechanism
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonReading {
    /// Reversal potential (mV)
    pub reversal_potential: f64,
    /// Intracellular concentration (mM)
    pub inner_concentration: f64,
    /// Extracellular concentration (mM)
    pub outer_concentration: f64,
}

/// Ion bookkeeping owned by the host, the mechanism reads ion state from it and
/// accumulates its ionic currents and their voltage derivatives into it
pub trait IonPool {
    /// Reads the current state of an ion
    fn read(&self, ion: Ion) -> IonReading;
    /// Adds an ionic current (mA/cm^2) and its derivative with respect to voltage (S/cm^2)
    fn accumulate(&mut self, ion: Ion, current: f64, slope: f64);
}

/// Ion pool of a single isolated patch with fixed ion state,
/// accumulated currents persist until [`IsolatedIonPool::reset`] is called
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IsolatedIonPool {
    /// Reversal potentials and calcium concentrations
    pub environment: IonEnvironment,
    /// Accumulated sodium current
    pub i_na: f64,
    /// Accumulated sodium current derivative
    pub di_na_dv: f64,
    /// Accumulated potassium current
    pub i_k: f64,
    /// Accumulated potassium current derivative
    pub di_k_dv: f64,
    /// Accumulated calcium current
    pub i_ca: f64,
    /// Accumulated calcium current derivative
    pub di_ca_dv: f64,
}

impl IsolatedIonPool {
    pub fn new(environment: IonEnvironment) -> Self {
        IsolatedIonPool {
            environment,
            ..IsolatedIonPool::default()
        }
    }

    /// Clears accumulated currents and derivatives
    pub fn reset(&mut self) {
        *self = IsolatedIonPool::new(self.environment);
    }

    /// Accumulated current of an ion
    pub fn current(&self, ion: Ion) -> f64 {
        match ion {
            Ion::Sodium => self.i_na,
            Ion::Potassium => self.i_k,
            Ion::Calcium => self.i_ca,
        }
    }

    /// Accumulated current derivative of an ion
    pub fn slope(&self, ion: Ion) -> f64 {
        match ion {
            Ion::Sodium => self.di_na_dv,
            Ion::Potassium => self.di_k_dv,
            Ion::Calcium => self.di_ca_dv,
        }
    }
}

impl IonPool for IsolatedIonPool {
    fn read(&self, ion: Ion) -> IonReading {
        self.environment.reading(ion)
    }

    fn accumulate(&mut self, ion: Ion, current: f64, slope: f64) {
        match ion {
            Ion::Sodium => {
                self.i_na += current;
                self.di_na_dv += slope;
            },
            Ion::Potassium => {
                self.i_k += current;
                self.di_k_dv += slope;
            },
            Ion::Calcium => {
                self.i_ca += current;
                self.di_ca_dv += slope;
            },
        }
    }
}
