use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pcstat::{render, ResidencyBitmap};

fn bitmap(pages: usize) -> ResidencyBitmap {
    // every third page cached, with a fully cached stretch in the middle
    (0..pages)
        .map(|i| i % 3 == 0 || (pages / 3..pages / 2).contains(&i))
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let small = bitmap(40);
    let large = bitmap(1 << 20);

    c.bench_function("render exact", |b| b.iter(|| render(black_box(&small), 100)));
    c.bench_function("render 4GiB file", |b| b.iter(|| render(black_box(&large), 60)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
