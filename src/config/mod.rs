//! Simulation configuration read from TOML.
//!
//! ```toml
//! [conductances]
//! g_na = 0.04
//!
//! [ions]
//! e_na = 35
//! e_k = -75
//! ca_i = 0.0001
//! ca_o = 1.8
//! celsius = 6.3
//!
//! [simulation]
//! dt = 0.025
//! linearization = { method = "finite_difference", epsilon = 0.001 }
//! initialization = "resting"
//!
//! [[clamp]]
//! voltage = -60
//! iterations = 400
//!
//! [[clamp]]
//! voltage = -10
//! iterations = 400
//! ```
//!
//! Every section is optional, missing values use the mechanism's defaults.
//! Without an explicit `e_ca` the calcium reversal potential is calculated from
//! the configured calcium concentrations and temperature.

use std::{fs::read_to_string, path::{Path, PathBuf}};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::distribution::GaussianParameters;
use crate::error::{ConfigurationError, SpikeMechanismError};
use crate::mechanism::{
    IsolatedIonPool,
    clamp::VoltageStep,
    currents::{nernst_potential, Conductances, IonEnvironment, DEFAULT_CELSIUS},
    spike::{Initialization, Linearization, SpikeMechanism},
};


/// Maximal conductances as written in a configuration file (S/cm^2)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConductanceParameters {
    pub g_na: f64,
    pub g_kdr: f64,
    pub g_a: f64,
    pub g_ca: f64,
    pub g_kca: f64,
}

impl Default for ConductanceParameters {
    fn default() -> Self {
        let defaults = Conductances::default();

        ConductanceParameters {
            g_na: defaults.g_na(),
            g_kdr: defaults.g_kdr(),
            g_a: defaults.g_a(),
            g_ca: defaults.g_ca(),
            g_kca: defaults.g_kca(),
        }
    }
}

impl TryFrom<ConductanceParameters> for Conductances {
    type Error = SpikeMechanismError;

    fn try_from(parameters: ConductanceParameters) -> Result<Self, Self::Error> {
        Conductances::new(
            parameters.g_na,
            parameters.g_kdr,
            parameters.g_a,
            parameters.g_ca,
            parameters.g_kca,
        )
    }
}

/// Ion state as written in a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IonParameters {
    /// Sodium reversal potential (mV)
    pub e_na: f64,
    /// Potassium reversal potential (mV)
    pub e_k: f64,
    /// Calcium reversal potential (mV), calculated with the Nernst equation if not given
    pub e_ca: Option<f64>,
    /// Intracellular calcium concentration (mM)
    pub ca_i: f64,
    /// Extracellular calcium concentration (mM)
    pub ca_o: f64,
    /// Temperature (degC)
    pub celsius: f64,
}

impl Default for IonParameters {
    fn default() -> Self {
        let defaults = IonEnvironment::default();

        IonParameters {
            e_na: defaults.e_na,
            e_k: defaults.e_k,
            e_ca: None,
            ca_i: defaults.ca_i,
            ca_o: defaults.ca_o,
            celsius: DEFAULT_CELSIUS,
        }
    }
}

impl IonParameters {
    /// Calcium reversal potential, either given or from the configured concentrations
    pub fn calcium_reversal_potential(&self) -> f64 {
        self.e_ca
            .unwrap_or_else(|| nernst_potential(2., self.ca_i, self.ca_o, self.celsius))
    }
}

impl From<IonParameters> for IonEnvironment {
    fn from(parameters: IonParameters) -> Self {
        IonEnvironment {
            e_na: parameters.e_na,
            e_k: parameters.e_k,
            e_ca: parameters.calcium_reversal_potential(),
            ca_i: parameters.ca_i,
            ca_o: parameters.ca_o,
        }
    }
}

/// Integration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationParameters {
    /// Timestep (ms)
    pub dt: f64,
    /// Initial voltage (mV)
    pub v_init: f64,
    pub linearization: Linearization,
    pub initialization: Initialization,
    /// Seed for voltage noise, a random seed is used if not given
    pub seed: Option<u64>,
    /// Path of the csv output, standard output if not given
    pub output: Option<PathBuf>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            dt: 0.025,
            v_init: -60.,
            linearization: Linearization::default(),
            initialization: Initialization::default(),
            seed: None,
            output: None,
        }
    }
}

/// Full configuration of a voltage clamp simulation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub conductances: ConductanceParameters,
    pub ions: IonParameters,
    pub simulation: SimulationParameters,
    pub clamp: Vec<VoltageStep>,
    pub noise: Option<GaussianParameters>,
}

impl SimulationConfig {
    /// Parses a configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, SpikeMechanismError> {
        toml::from_str(content)
            .map_err(|err| ConfigurationError::from(err).into())
    }

    /// Reads and parses a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SpikeMechanismError> {
        let path = path.as_ref();
        info!(path = %path.display(), "reading configuration");

        let content = read_to_string(path)
            .map_err(ConfigurationError::from)?;

        SimulationConfig::from_toml_str(&content)
    }

    /// Builds a mechanism from the configured conductances, linearization and initialization
    pub fn build_mechanism(&self) -> Result<SpikeMechanism, SpikeMechanismError> {
        let conductances = Conductances::try_from(self.conductances)?;

        Ok(
            SpikeMechanism::new(conductances)
                .with_linearization(self.simulation.linearization)?
                .with_initialization(self.simulation.initialization)
        )
    }

    /// Builds an isolated ion pool from the configured ion state
    pub fn build_pool(&self) -> IsolatedIonPool {
        IsolatedIonPool::new(IonEnvironment::from(self.ions))
    }
}
