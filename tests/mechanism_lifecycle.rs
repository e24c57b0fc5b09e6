// check host facing lifecycle of the mechanism
// check population, voltage clamp and configuration built on top of it

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    extern crate spike_mechanism;
    use spike_mechanism::{
        config::SimulationConfig,
        distribution::GaussianParameters,
        error::{
            ConfigurationError, NumericalError, PreconditionError, SpikeMechanismError,
        },
        mechanism::{
            Ion, IonPool, IonReading, IsolatedIonPool,
            clamp::{run_voltage_clamp, VoltageStep},
            currents::{nernst_potential, Conductances, IonEnvironment, IonicCurrents},
            gating::GatingState,
            kinetics::Kinetics,
            population::MechanismPopulation,
            spike::{Initialization, Linearization, SpikeMechanism},
        },
    };


    /// Records every accumulation made by the mechanism
    #[derive(Debug, Default)]
    struct RecordingPool {
        environment: IonEnvironment,
        accumulated: Vec<(Ion, f64, f64)>,
    }

    impl IonPool for RecordingPool {
        fn read(&self, ion: Ion) -> IonReading {
            self.environment.reading(ion)
        }

        fn accumulate(&mut self, ion: Ion, current: f64, slope: f64) {
            self.accumulated.push((ion, current, slope));
        }
    }

    #[test]
    pub fn test_current_accumulates_into_pool() -> Result<(), SpikeMechanismError> {
        let mut mechanism = SpikeMechanism::default();
        let mut pool = IsolatedIonPool::new(IonEnvironment::default());

        let contribution = mechanism.compute_current(-20., &mut pool)?;

        assert_eq!(contribution.current, contribution.currents.total());
        assert_eq!(mechanism.currents(), &contribution.currents);
        for ion in Ion::ALL {
            assert_eq!(pool.current(ion), contribution.currents.get(ion));
            assert_eq!(pool.slope(ion), contribution.slopes.get(ion));
        }

        // accumulation persists until the host clears the pool
        mechanism.compute_current(-20., &mut pool)?;
        assert_eq!(pool.i_na, 2. * contribution.currents.i_na);

        pool.reset();
        assert_eq!(pool.i_na, 0.);
        assert_eq!(pool.di_k_dv, 0.);
        assert_eq!(pool.environment, IonEnvironment::default());

        Ok(())
    }

    #[test]
    pub fn test_accumulates_once_per_ion() -> Result<(), SpikeMechanismError> {
        let mut mechanism = SpikeMechanism::default();
        let mut pool = RecordingPool::default();

        let contribution = mechanism.compute_current(-45., &mut pool)?;

        assert_eq!(pool.accumulated.len(), 3);
        for (ion, current, slope) in pool.accumulated {
            assert_eq!(current, contribution.currents.get(ion));
            assert_eq!(slope, contribution.slopes.get(ion));
        }

        Ok(())
    }

    #[test]
    pub fn test_linearization_methods_agree() -> Result<(), SpikeMechanismError> {
        let mut finite_difference = SpikeMechanism::default();
        let mut analytic = SpikeMechanism::default()
            .with_linearization(Linearization::Analytic)?;

        assert_eq!(finite_difference.linearization(), Linearization::FiniteDifference { epsilon: 0.001 });

        for v in [-70., -40., 0.] {
            let mut pool = IsolatedIonPool::new(IonEnvironment::default());
            let approximate = finite_difference.compute_current(v, &mut pool)?;
            let exact = analytic.compute_current(v, &mut pool)?;

            assert_eq!(approximate.currents, exact.currents);
            assert_eq!(exact.conductance, exact.slopes.total());
            assert!(
                (approximate.conductance - exact.conductance).abs() < 1e-6 * exact.conductance,
                "{} vs {}", approximate.conductance, exact.conductance,
            );
        }

        Ok(())
    }

    #[test]
    pub fn test_rejects_invalid_perturbation() {
        for epsilon in [0., f64::NAN, f64::INFINITY] {
            match SpikeMechanism::default().with_linearization(Linearization::FiniteDifference { epsilon }) {
                Err(SpikeMechanismError::ConfigurationRelatedError(
                    ConfigurationError::InvalidPerturbation(_)
                )) => {},
                other => panic!("expected perturbation error for {}, got {:?}", epsilon, other),
            }
        }
    }

    #[test]
    pub fn test_non_finite_voltage_is_fatal() {
        let mut mechanism = SpikeMechanism::default();
        let mut pool = IsolatedIonPool::new(IonEnvironment::default());

        match mechanism.compute_current(f64::NAN, &mut pool) {
            Err(SpikeMechanismError::NumericalRelatedError(NumericalError::NonFiniteVoltage(_))) => {},
            other => panic!("expected voltage error, got {:?}", other),
        }
        assert_eq!(pool, IsolatedIonPool::new(IonEnvironment::default()));

        assert!(mechanism.advance_state(f64::INFINITY, 0.025, &pool).is_err());
        assert_eq!(mechanism.gating(), &GatingState::resting());
    }

    #[test]
    pub fn test_rejected_timestep_leaves_state_unchanged() -> Result<(), SpikeMechanismError> {
        let pool = IsolatedIonPool::new(IonEnvironment::default());
        let mut mechanism = SpikeMechanism::default();
        mechanism.advance_state(-40., 0.025, &pool)?;
        let before = mechanism.clone();

        match mechanism.advance_state(-40., 0., &pool) {
            Err(SpikeMechanismError::PreconditionRelatedError(PreconditionError::NonPositiveTimestep(_))) => {},
            other => panic!("expected timestep error, got {:?}", other),
        }
        assert_eq!(mechanism, before);

        Ok(())
    }

    #[test]
    pub fn test_initialization_modes() -> Result<(), SpikeMechanismError> {
        let pool = IsolatedIonPool::new(IonEnvironment::default());

        let mut resting = SpikeMechanism::default();
        resting.advance_state(0., 0.025, &pool)?;
        resting.initialize(-50., &pool)?;
        assert_eq!(resting.gating(), &GatingState::resting());
        assert!(resting.kinetics().is_none());

        let mut steady = SpikeMechanism::default()
            .with_initialization(Initialization::SteadyState);
        steady.initialize(-50., &pool)?;
        assert_eq!(steady.gating(), &GatingState::steady_state(&Kinetics::evaluate(-50.)));

        let broken = IsolatedIonPool::new(IonEnvironment { e_na: f64::NAN, ..IonEnvironment::default() });
        match steady.initialize(-50., &broken) {
            Err(SpikeMechanismError::NumericalRelatedError(NumericalError::NonFiniteIonState)) => {},
            other => panic!("expected ion state error, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    pub fn test_range_variables() -> Result<(), SpikeMechanismError> {
        let mut mechanism = SpikeMechanism::default();
        let mut pool = IsolatedIonPool::new(IonEnvironment::default());

        assert_eq!(mechanism.range_variable("m"), Some(0.0345));
        assert_eq!(mechanism.range_variable("m_inf"), None);
        assert_eq!(mechanism.range_variable("tau_q"), None);
        assert_eq!(mechanism.range_variable("c_exp"), None);
        assert_eq!(mechanism.range_variable("i_na"), Some(0.));

        let contribution = mechanism.compute_current(-30., &mut pool)?;
        assert_eq!(mechanism.range_variable("i_k"), Some(contribution.currents.i_k));

        mechanism.advance_state(-30., 0.025, &pool)?;
        let kinetics = Kinetics::evaluate(-30.);
        assert_eq!(mechanism.range_variable("m_inf"), Some(kinetics.m.inf));
        assert_eq!(mechanism.range_variable("tau_q"), Some(kinetics.q.tau));
        assert_eq!(mechanism.range_variable("c_exp"), Some(kinetics.step_factors(0.025).c));
        assert_eq!(mechanism.range_variable("h"), Some(mechanism.gating().h()));

        let (_, factors) = mechanism.evaluate_kinetics(-10., 0.05)?;
        assert_eq!(mechanism.range_variable("n_exp"), Some(factors.n));
        assert_eq!(mechanism.range_variable("x_inf"), None);
        assert_eq!(mechanism.range_variable("g_na"), None);

        Ok(())
    }

    #[test]
    pub fn test_population_matches_serial() -> Result<(), SpikeMechanismError> {
        let size = 16;
        let voltages: Vec<f64> = (0..size).map(|i| -80. + 5. * i as f64).collect();

        let mut population = MechanismPopulation::uniform(size, Conductances::default());
        let mut pools = vec![IsolatedIonPool::new(IonEnvironment::default()); size];
        let mut serial = vec![SpikeMechanism::default(); size];
        let mut serial_pools = pools.clone();

        population.initialize(&voltages, &pools)?;
        let contributions = population.compute_currents(&voltages, &mut pools)?;
        population.advance_states(&voltages, 0.025, &pools)?;

        for (i, mechanism) in serial.iter_mut().enumerate() {
            mechanism.initialize(voltages[i], &serial_pools[i])?;
            let contribution = mechanism.compute_current(voltages[i], &mut serial_pools[i])?;
            mechanism.advance_state(voltages[i], 0.025, &serial_pools[i])?;

            assert_eq!(contributions[i], contribution);
            assert_eq!(pools[i], serial_pools[i]);
            assert_eq!(population.get(i), Some(&*mechanism));
        }

        assert_eq!(population.len(), size);
        assert!(population.get(size).is_none());

        Ok(())
    }

    #[test]
    pub fn test_population_failure_keeps_finished_patches() {
        let size = 64;
        let mut voltages = vec![-50.; size];
        voltages[size / 2] = f64::NAN;

        let mut population = MechanismPopulation::uniform(size, Conductances::default());
        let mut pools = vec![IsolatedIonPool::new(IonEnvironment::default()); size];

        match population.compute_currents(&voltages, &mut pools) {
            Err(SpikeMechanismError::NumericalRelatedError(NumericalError::NonFiniteVoltage(_))) => {},
            other => panic!("expected voltage error, got {:?}", other),
        }

        // each pool is either untouched or holds exactly its own patch's contribution
        let mut expected = IsolatedIonPool::new(IonEnvironment::default());
        SpikeMechanism::default().compute_current(-50., &mut expected)
            .expect("Could not compute current");
        let untouched = IsolatedIonPool::new(IonEnvironment::default());

        for (i, pool) in pools.iter().enumerate() {
            assert!(*pool == untouched || *pool == expected, "pool {} partially updated", i);
        }
        assert_eq!(pools[size / 2], untouched);
    }

    #[test]
    pub fn test_population_length_mismatch() {
        let mut population = MechanismPopulation::uniform(4, Conductances::default());
        let mut pools = vec![IsolatedIonPool::default(); 4];

        match population.compute_currents(&[-60.; 3], &mut pools) {
            Err(SpikeMechanismError::PreconditionRelatedError(
                PreconditionError::LengthMismatch { expected: 4, actual: 3 }
            )) => {},
            other => panic!("expected length error, got {:?}", other),
        }

        assert!(population.advance_states(&[-60.; 4], 0.025, &pools[..2]).is_err());
        assert!(MechanismPopulation::default().is_empty());
    }

    #[test]
    pub fn test_voltage_clamp_trace() -> Result<(), SpikeMechanismError> {
        let mut mechanism = SpikeMechanism::default();
        let mut pool = IsolatedIonPool::new(IonEnvironment::default());
        let mut rng = StdRng::seed_from_u64(1);

        let steps = [
            VoltageStep { voltage: -60., iterations: 20 },
            VoltageStep { voltage: -10., iterations: 30 },
        ];
        let trace = run_voltage_clamp(&mut mechanism, &mut pool, &steps, 0.025, None, &mut rng)?;

        assert_eq!(trace.len(), 50);
        assert_eq!(
            trace.columns,
            [
                "voltage", "m", "h", "n", "p", "q", "c",
                "i_na", "i_kdr", "i_a", "i_kca", "i_k", "i_ca", "total_current",
            ],
        );
        for column in &trace.columns {
            assert_eq!(trace.get(column).map(|values| values.len()), Some(50));
        }

        // first recorded currents are evaluated before the first gating update
        let first = IonicCurrents::compute(
            &Conductances::default(), &GatingState::resting(), -60., &IonEnvironment::default(),
        );
        assert_eq!(trace.get("i_na").map(|values| values[0]), Some(first.i_na));
        assert_eq!(trace.get("voltage").map(|values| values[20]), Some(-10.));
        assert_eq!(trace.get("m").and_then(|values| values.last().copied()), Some(mechanism.gating().m()));

        let mut output = vec![];
        trace.write_csv(&mut output)?;
        let output = String::from_utf8_lossy(&output);
        let mut lines = output.lines();

        assert_eq!(lines.next(), Some(trace.columns.join(",").as_str()));
        assert_eq!(lines.count(), 50);

        Ok(())
    }

    #[test]
    pub fn test_voltage_clamp_noise() -> Result<(), SpikeMechanismError> {
        let noise = GaussianParameters { mean: 0., std: 1., max: 0.5, min: -0.5 };
        let steps = [VoltageStep { voltage: -60., iterations: 100 }];

        let run = |seed: u64| {
            let mut mechanism = SpikeMechanism::default();
            let mut pool = IsolatedIonPool::new(IonEnvironment::default());
            let mut rng = StdRng::seed_from_u64(seed);

            run_voltage_clamp(&mut mechanism, &mut pool, &steps, 0.025, Some(&noise), &mut rng)
        };

        let trace = run(42)?;
        let voltages = trace.get("voltage").unwrap_or_default();
        assert_eq!(voltages.len(), 100);
        assert!(voltages.iter().all(|v| (-60.5..=-59.5).contains(v)));
        assert!(voltages.iter().any(|v| *v != -60.));

        assert_eq!(run(42)?, trace);

        let reversed = GaussianParameters { max: -1., min: 1., ..noise };
        let mut rng = StdRng::seed_from_u64(0);
        let result = run_voltage_clamp(
            &mut SpikeMechanism::default(),
            &mut IsolatedIonPool::default(),
            &steps,
            0.025,
            Some(&reversed),
            &mut rng,
        );
        assert!(result.is_err());

        Ok(())
    }

    #[test]
    pub fn test_config_defaults() -> Result<(), SpikeMechanismError> {
        let config = SimulationConfig::from_toml_str("")?;

        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.simulation.dt, 0.025);
        assert_eq!(config.simulation.v_init, -60.);
        assert!(config.clamp.is_empty());
        assert!(config.noise.is_none());

        let mechanism = config.build_mechanism()?;
        assert_eq!(mechanism, SpikeMechanism::default());
        assert_eq!(config.build_pool(), IsolatedIonPool::new(IonEnvironment::default()));

        Ok(())
    }

    #[test]
    pub fn test_config_sections() -> Result<(), SpikeMechanismError> {
        let config = SimulationConfig::from_toml_str(r#"
            [conductances]
            g_na = 0.05

            [ions]
            e_k = -80.0

            [simulation]
            dt = 0.01
            linearization = { method = "analytic" }
            initialization = "steady_state"
            seed = 7

            [[clamp]]
            voltage = -70.0
            iterations = 10

            [noise]
            std = 0.5
        "#)?;

        let mechanism = config.build_mechanism()?;
        assert_eq!(mechanism.conductances().g_na(), 0.05);
        assert_eq!(mechanism.conductances().g_kdr(), 0.012);
        assert_eq!(mechanism.linearization(), Linearization::Analytic);
        assert_eq!(mechanism.initialization(), Initialization::SteadyState);

        assert_eq!(config.ions.e_k, -80.);
        assert_eq!(config.ions.e_na, 35.);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.clamp, vec![VoltageStep { voltage: -70., iterations: 10 }]);
        assert_eq!(config.noise.map(|noise| noise.std), Some(0.5));
        assert_eq!(config.noise.map(|noise| noise.max), Some(5.));

        let finite_difference = SimulationConfig::from_toml_str(r#"
            [simulation]
            linearization = { method = "finite_difference", epsilon = 0.0001 }
        "#)?;
        assert_eq!(
            finite_difference.simulation.linearization,
            Linearization::FiniteDifference { epsilon: 0.0001 },
        );

        Ok(())
    }

    #[test]
    pub fn test_config_calcium_reversal_follows_concentrations() -> Result<(), SpikeMechanismError> {
        let config = SimulationConfig::from_toml_str("[ions]\nca_i = 0.01\n")?;
        let pool = config.build_pool();

        let expected = nernst_potential(2., 0.01, 1.8, 6.3);
        assert_eq!(pool.environment.e_ca, expected);
        assert!((pool.environment.e_ca - 62.526).abs() < 1e-2, "e_ca: {}", pool.environment.e_ca);
        assert_eq!(pool.environment.ca_i, 0.01);

        let warmer = SimulationConfig::from_toml_str("[ions]\nca_o = 2.0\ncelsius = 22.0\n")?;
        assert_eq!(warmer.build_pool().environment.e_ca, nernst_potential(2., 0.0001, 2.0, 22.0));

        let explicit = SimulationConfig::from_toml_str("[ions]\nca_i = 0.01\ne_ca = 120.0\n")?;
        assert_eq!(explicit.build_pool().environment.e_ca, 120.);

        Ok(())
    }

    #[test]
    pub fn test_config_errors() -> Result<(), SpikeMechanismError> {
        match SimulationConfig::from_toml_str("[conductances]\ng_leak = 0.1\n") {
            Err(SpikeMechanismError::ConfigurationRelatedError(ConfigurationError::Parse(_))) => {},
            other => panic!("expected parse error, got {:?}", other),
        }

        let negative = SimulationConfig::from_toml_str("[conductances]\ng_a = -0.1\n")?;
        assert!(negative.build_mechanism().is_err());

        let zero_epsilon = SimulationConfig::from_toml_str(
            "[simulation]\nlinearization = { method = \"finite_difference\", epsilon = 0.0 }\n"
        )?;
        assert!(zero_epsilon.build_mechanism().is_err());

        for typo in ["[ions]\neca = 50.0\n", "[noise]\nstdev = 1.0\n"] {
            match SimulationConfig::from_toml_str(typo) {
                Err(SpikeMechanismError::ConfigurationRelatedError(ConfigurationError::Parse(_))) => {},
                other => panic!("expected parse error for {:?}, got {:?}", typo, other),
            }
        }

        match SimulationConfig::from_file("does/not/exist.toml") {
            Err(SpikeMechanismError::ConfigurationRelatedError(ConfigurationError::Io(_))) => {},
            other => panic!("expected io error, got {:?}", other),
        }

        Ok(())
    }
}
