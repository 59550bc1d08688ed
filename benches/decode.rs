use criterion::{criterion_group, criterion_main, Criterion};
use rankdb::prelude::*;
use rankdb::test_utilities::{random_database, NRANDOM_FEATURES, NRANDOM_GENES};

const SIGNATURE_SIZE: usize = 500;

fn bench_loads(c: &mut Criterion) {
    // create the benchmark group
    let mut group = c.benchmark_group("load");

    // create the test data
    let file = random_database::<i16>(NRANDOM_FEATURES, NRANDOM_GENES);
    let db = RankingDatabase::open(file.path(), "bench", "HGNC").unwrap();
    let genes: Vec<String> = (0..SIGNATURE_SIZE)
        .map(|i| format!("gene{}", i * (NRANDOM_GENES / SIGNATURE_SIZE)))
        .collect();

    // configure the sample size for the group
    group.sample_size(10);

    group.bench_function("load_full", |b| {
        b.iter(|| db.load_full().unwrap().ngenes());
    });

    group.bench_function("load_signature", |b| {
        b.iter(|| db.load_genes(&genes).unwrap().ngenes());
    });
}

criterion_group!(benches, bench_loads,);
criterion_main!(benches);
