use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use spike_mechanism::mechanism::{
    IsolatedIonPool,
    currents::{Conductances, IonEnvironment},
    kinetics::Kinetics,
    population::MechanismPopulation,
    spike::{Linearization, SpikeMechanism},
};


fn bench_kinetics(c: &mut Criterion) {
    c.bench_function("evaluate kinetics", |b| {
        b.iter(|| Kinetics::evaluate(black_box(-42.5)))
    });
}

fn bench_single_step(c: &mut Criterion) {
    let mut pool = IsolatedIonPool::new(IonEnvironment::default());

    let mut finite_difference = SpikeMechanism::default();
    c.bench_function("single step finite difference", |b| {
        b.iter(|| {
            pool.reset();
            finite_difference.compute_current(black_box(-50.), &mut pool).expect("Could not compute current");
            finite_difference.advance_state(black_box(-50.), 0.025, &pool).expect("Could not advance state");
        })
    });

    let mut analytic = SpikeMechanism::default()
        .with_linearization(Linearization::Analytic)
        .expect("Could not set linearization");
    c.bench_function("single step analytic", |b| {
        b.iter(|| {
            pool.reset();
            analytic.compute_current(black_box(-50.), &mut pool).expect("Could not compute current");
            analytic.advance_state(black_box(-50.), 0.025, &pool).expect("Could not advance state");
        })
    });
}

fn bench_population(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);

    for size in [100, 10_000] {
        let mut population = MechanismPopulation::uniform(size, Conductances::default());
        let mut pools = vec![IsolatedIonPool::new(IonEnvironment::default()); size];
        let voltages: Vec<f64> = (0..size).map(|_| rng.gen_range(-80.0..20.0)).collect();

        c.bench_function(&format!("population step {}", size), |b| {
            b.iter(|| {
                pools.iter_mut().for_each(|pool| pool.reset());
                population.compute_currents(&voltages, &mut pools).expect("Could not compute currents");
                population.advance_states(&voltages, 0.025, &pools).expect("Could not advance states");
            })
        });
    }
}

criterion_group!(benches, bench_kinetics, bench_single_step, bench_population);
criterion_main!(benches);
