use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rcpsp_mm::{estimate_bounds, Encoding, Instance};

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("formulations");
    group.sample_size(50);

    for file in ["chain.json", "linked.json"] {
        let contents = std::fs::read_to_string(format!("../instances/{file}")).unwrap();
        let instance = Instance::parse(&contents).unwrap();
        let bounds = estimate_bounds(&instance).unwrap();

        for encoding in Encoding::ALL {
            let formulation = encoding.formulation();
            group.bench_with_input(
                BenchmarkId::new(format!("build_{encoding}"), file),
                &instance,
                |b, instance| b.iter(|| formulation.build(instance, &bounds).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
