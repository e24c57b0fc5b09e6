//! Voltage clamp protocols for a single patch: the voltage is commanded rather
//! than solved for, so the mechanism's response can be recorded step by step.

use std::{collections::HashMap, io::Write};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use super::{IonPool, NamedVariables};
use super::currents::IonicCurrents;
use super::gating::{validate_timestep, GatingState};
use super::spike::SpikeMechanism;
use crate::distribution::GaussianParameters;
use crate::error::{SpikeMechanismError, TraceError};


/// Holds the membrane at a voltage (mV) for a number of iterations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageStep {
    pub voltage: f64,
    pub iterations: usize,
}

/// Recorded state over time, one value per column per iteration
#[derive(Debug, Clone, PartialEq)]
pub struct ClampTrace {
    /// Column names in output order
    pub columns: Vec<String>,
    /// Values of each column
    pub data: HashMap<String, Vec<f64>>,
}

impl ClampTrace {
    fn new() -> Self {
        let columns: Vec<String> = std::iter::once("voltage")
            .chain(GatingState::variable_names().iter().copied())
            .chain(IonicCurrents::variable_names().iter().copied())
            .chain(std::iter::once("total_current"))
            .map(String::from)
            .collect();
        let data = columns.iter()
            .map(|column| (column.clone(), vec![]))
            .collect();

        ClampTrace { columns, data }
    }

    fn push(&mut self, column: &str, value: f64) {
        if let Some(values) = self.data.get_mut(column) {
            values.push(value);
        }
    }

    fn record(&mut self, voltage: f64, mechanism: &SpikeMechanism) {
        self.push("voltage", voltage);
        for (name, value) in GatingState::variable_names().iter().zip(mechanism.gating().variable_values()) {
            self.push(name, value);
        }
        for (name, value) in IonicCurrents::variable_names().iter().zip(mechanism.currents().variable_values()) {
            self.push(name, value);
        }
        self.push("total_current", mechanism.currents().total());
    }

    /// Values of a column
    pub fn get(&self, column: &str) -> Option<&[f64]> {
        self.data.get(column).map(|values| values.as_slice())
    }

    /// Number of recorded iterations
    pub fn len(&self) -> usize {
        self.get("voltage").map_or(0, |values| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the trace as csv with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), SpikeMechanismError> {
        let length = self.len();
        let mut columns = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            match self.data.get(name) {
                Some(values) if values.len() == length => columns.push(values),
                _ => return Err(TraceError::RaggedColumn(name.clone()).into()),
            }
        }

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)
            .map_err(TraceError::from)?;
        for row in 0..length {
            csv_writer.write_record(columns.iter().map(|values| values[row].to_string()))
                .map_err(TraceError::from)?;
        }
        csv_writer.flush()
            .map_err(TraceError::from)?;

        Ok(())
    }
}

/// Runs the mechanism under a sequence of commanded voltages, each iteration the current
/// is evaluated at the present gating state before the gating state is advanced, the
/// recorded currents are the ones evaluated during the iteration, if `noise` is given
/// a clamped gaussian sample is added to the commanded voltage every iteration
pub fn run_voltage_clamp<P: IonPool + ?Sized, R: Rng + ?Sized>(
    mechanism: &mut SpikeMechanism,
    pool: &mut P,
    steps: &[VoltageStep],
    dt: f64,
    noise: Option<&GaussianParameters>,
    rng: &mut R,
) -> Result<ClampTrace, SpikeMechanismError> {
    let dt = validate_timestep(dt)?;
    if let Some(noise) = noise {
        noise.validate()?;
    }

    let mut trace = ClampTrace::new();

    for step in steps {
        debug!(voltage = step.voltage, iterations = step.iterations, "running clamp step");

        for _ in 0..step.iterations {
            let voltage = match noise {
                Some(noise) => step.voltage + noise.sample(rng)?,
                None => step.voltage,
            };

            mechanism.compute_current(voltage, pool)?;
            mechanism.advance_state(voltage, dt, &*pool)?;

            trace.record(voltage, mechanism);
        }
    }

    Ok(trace)
}
