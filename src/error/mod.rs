//! Error set for the mechanism, split by concern with one crate-wide error
//! that every fallible operation returns.

use thiserror::Error;
use crate::mechanism::kinetics::Gate;


/// Error set for invalid construction parameters or configuration files
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Conductances must be non-negative and finite
    #[error("Conductance `{name}` must be non-negative and finite, got {value}")]
    InvalidConductance { name: &'static str, value: f64 },
    /// Finite difference perturbation must be finite and non-zero
    #[error("Finite difference perturbation must be finite and non-zero, got {0}")]
    InvalidPerturbation(f64),
    /// Noise parameters cannot build a normal distribution
    #[error("Invalid noise parameters: {0}")]
    InvalidNoise(String),
    /// Configuration file could not be read
    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid TOML for a simulation
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Error set for calls that break the calling contract of the mechanism
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// Timestep must be finite and greater than zero
    #[error("Timestep must be finite and greater than zero, got {0}")]
    NonPositiveTimestep(f64),
    /// Per patch inputs do not line up with the number of patches
    #[error("Expected {expected} per patch inputs, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Error set for numerical failures, these are fatal and never retried
#[derive(Debug, Error)]
pub enum NumericalError {
    /// Membrane potential supplied by the host is not finite
    #[error("Membrane potential is not finite: {0}")]
    NonFiniteVoltage(f64),
    /// Rate functions produced a non-finite steady state or time constant
    #[error("Kinetics of gate `{gate}` are not finite at {voltage} mV")]
    NonFiniteKinetics { gate: Gate, voltage: f64 },
    /// Reversal potentials or calcium concentrations read from the ion pool are not finite
    #[error("Ion state read from the ion pool is not finite")]
    NonFiniteIonState,
    /// Current or its derivative is not finite
    #[error("Membrane current is not finite at {voltage} mV")]
    NonFiniteCurrent { voltage: f64 },
}

/// Error set for recording and writing traces
#[derive(Debug, Error)]
pub enum TraceError {
    /// Trace could not be written as csv
    #[error("Could not write trace: {0}")]
    Csv(#[from] csv::Error),
    /// Output could not be opened or flushed
    #[error("Could not write trace output: {0}")]
    Io(#[from] std::io::Error),
    /// Columns of the trace have different lengths
    #[error("Trace column `{0}` has a different length than the others")]
    RaggedColumn(String),
}

/// A set of errors that may occur when using the library
#[derive(Debug, Error)]
pub enum SpikeMechanismError {
    /// Errors related to construction parameters and configuration
    #[error(transparent)]
    ConfigurationRelatedError(#[from] ConfigurationError),
    /// Errors related to the calling contract
    #[error(transparent)]
    PreconditionRelatedError(#[from] PreconditionError),
    /// Errors related to numerical evaluation
    #[error(transparent)]
    NumericalRelatedError(#[from] NumericalError),
    /// Errors related to traces
    #[error(transparent)]
    TraceRelatedError(#[from] TraceError),
}
