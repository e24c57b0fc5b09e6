//! # Spike Mechanism
//!
//! `spike_mechanism` implements the "spike" membrane mechanism used for spiking
//! retinal ganglion cells: Hodgkin Huxley style sodium, delayed rectifier and
//! A-type potassium, calcium activated potassium and calcium conductances
//! (modified from Fohlmeister et al., 1990). The crate covers the numerical core a
//! compartmental simulator calls into for each membrane patch: gating kinetics,
//! the exponential Euler state update and the ionic currents (with their voltage
//! derivatives) handed back to the simulator's linear system each step.
//!
//! The host engine owns the membrane potential, the timestep and the ion pools,
//! ion state is read and ionic currents are written through the
//! [`mechanism::IonPool`] trait.
//!
//! ## Example Code
//!
//! ### Stepping a single patch
//!
//! ```rust
//! use spike_mechanism::{
//!     error::SpikeMechanismError,
//!     mechanism::{
//!         IsolatedIonPool,
//!         currents::{Conductances, IonEnvironment},
//!         spike::SpikeMechanism,
//!     },
//! };
//!
//! fn main() -> Result<(), SpikeMechanismError> {
//!     let mut mechanism = SpikeMechanism::new(Conductances::default());
//!     let mut pool = IsolatedIonPool::new(IonEnvironment::default());
//!
//!     let v = -60.;
//!     let dt = 0.025;
//!     mechanism.initialize(v, &pool)?;
//!
//!     for _ in 0..100 {
//!         pool.reset();
//!
//!         // contribution to the host's right hand side and diagonal
//!         let contribution = mechanism.compute_current(v, &mut pool)?;
//!         assert!(contribution.conductance > 0.);
//!
//!         // the host would solve for the new voltage here
//!         mechanism.advance_state(v, dt, &pool)?;
//!     }
//!
//!     assert!(mechanism.range_variable("m_inf").is_some());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Voltage clamp with a configuration file
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use spike_mechanism::{
//!     config::SimulationConfig,
//!     error::SpikeMechanismError,
//!     mechanism::clamp::run_voltage_clamp,
//! };
//!
//! fn main() -> Result<(), SpikeMechanismError> {
//!     let config = SimulationConfig::from_toml_str(r#"
//!         [simulation]
//!         dt = 0.025
//!
//!         [[clamp]]
//!         voltage = -60.0
//!         iterations = 40
//!
//!         [[clamp]]
//!         voltage = 0.0
//!         iterations = 40
//!     "#)?;
//!
//!     let mut mechanism = config.build_mechanism()?;
//!     let mut pool = config.build_pool();
//!     let mut rng = StdRng::seed_from_u64(0);
//!
//!     let trace = run_voltage_clamp(
//!         &mut mechanism,
//!         &mut pool,
//!         &config.clamp,
//!         config.simulation.dt,
//!         config.noise.as_ref(),
//!         &mut rng,
//!     )?;
//!
//!     assert_eq!(trace.len(), 80);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod distribution;
pub mod error;
pub mod mechanism;
