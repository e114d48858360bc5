use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use prescan::{sequential, Backend, BankLayout, Correction, Prescan, ScanConfig, LOG_NUM_BANKS};
use rand::{Rng, SeedableRng};
use rand_hc::Hc128Rng;

const SEED: &[u8; 32] = b"pZ3q8XkVfL0aWm7RtB2yN5cJ9hGdE4sU";

/// Creates the specified number of random values in `[0, 1)`.
fn create_random_values(count: usize, rng: &mut impl Rng) -> Vec<f32> {
    (0..count).map(|_| rng.gen()).collect()
}

pub fn scan_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Scan comparison");
    group.sample_size(10);
    group.sampling_mode(SamplingMode::Flat);

    for n in [256usize, 512, 1024, 2048] {
        let mut rng = Hc128Rng::from_seed(*SEED);
        let xs = create_random_values(n, &mut rng);

        group.bench_with_input(BenchmarkId::new("Sequential", n), &n, |b, _| {
            let mut ys = vec![0.0; n];
            b.iter(|| sequential::exclusive_scan(&xs, &mut ys))
        });

        let threaded = Prescan::default();
        group.bench_with_input(BenchmarkId::new("Threaded", n), &n, |b, _| {
            b.iter(|| threaded.scan_to_vec(&xs).unwrap())
        });

        for (name, correction) in [
            ("Stepped unpadded", Correction::None),
            ("Stepped padded", Correction::FirstOrder),
        ] {
            let config = ScanConfig::default()
                .with_backend(Backend::Stepped)
                .with_layout(BankLayout::new(LOG_NUM_BANKS, correction));
            let stepped = Prescan::new(config);
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter(|| stepped.scan_to_vec(&xs).unwrap())
            });
        }
    }

    group.finish();
}

criterion_group!(benches, scan_comparison);
criterion_main!(benches);
