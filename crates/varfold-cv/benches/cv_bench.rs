//! Criterion benchmarks for varfold-cv: fold assignment and full runs.

use criterion::{Criterion, criterion_group, criterion_main};

use varfold_cv::{ClassifierOptions, CrossValidation, FoldMode, FoldPartitioner, RandomForestClassifier};
use varfold_data::{SyntheticConfig, imbalance};

fn bench_stratified_partition(c: &mut Criterion) {
    let dataset = SyntheticConfig::new(10_000, 10).unwrap().generate().unwrap();

    c.bench_function("stratified_partition_10000_10fold", |b| {
        b.iter(|| FoldPartitioner::new(&dataset, 10, &FoldMode::Stratified, 42).unwrap());
    });
}

fn bench_cross_validation(c: &mut Criterion) {
    let generated = SyntheticConfig::new(2_000, 10).unwrap().generate().unwrap();
    let dataset = imbalance(&generated, 50, 42).unwrap();
    let base = RandomForestClassifier::new(ClassifierOptions::new(1, 10).unwrap());

    let mut group = c.benchmark_group("cv_forest_5fold");
    group.sample_size(10);
    for parallel in [false, true] {
        let cv = CrossValidation::new(5).unwrap().with_parallel(parallel);
        let id = if parallel { "parallel" } else { "sequential" };
        group.bench_function(id, |b| {
            b.iter(|| cv.run(&dataset, |fold| base.for_fold(fold)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_stratified_partition, bench_cross_validation);
criterion_main!(benches);
