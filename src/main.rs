use std::{env, fs::File, io::{stdout, BufWriter}, process::ExitCode};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use spike_mechanism::{
    config::SimulationConfig,
    error::{SpikeMechanismError, TraceError},
    mechanism::clamp::run_voltage_clamp,
};


fn run(config_path: &str) -> Result<(), SpikeMechanismError> {
    let config = SimulationConfig::from_file(config_path)?;

    let mut mechanism = config.build_mechanism()?;
    let mut pool = config.build_pool();
    mechanism.initialize(config.simulation.v_init, &pool)?;

    let mut rng = match config.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let trace = run_voltage_clamp(
        &mut mechanism,
        &mut pool,
        &config.clamp,
        config.simulation.dt,
        config.noise.as_ref(),
        &mut rng,
    )?;

    match &config.simulation.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(TraceError::from)?;
            trace.write_csv(BufWriter::new(file))?;
            info!(path = %path.display(), iterations = trace.len(), "wrote trace");
        },
        None => trace.write_csv(stdout().lock())?,
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        error!("Requires .toml argument file");
        return ExitCode::FAILURE;
    }

    match run(&args[1]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "simulation failed");
            ExitCode::FAILURE
        },
    }
}
