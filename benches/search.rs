//! Benchmarks fixed-depth search throughput.

use criterion::{criterion_group, criterion_main, Criterion};
use harrier::{game::Game, search, transposition_table::TranspositionTable};

fn bench_startpos_depth_6(c: &mut Criterion) {
    c.bench_function("search startpos depth 6", |b| {
        b.iter(|| {
            let mut game = Game::from_startpos();
            let mut tt = TranspositionTable::with_megabytes(16);
            search::search(&mut game, &mut tt, 6, None);
        });
    });
}

criterion_group!(benches, bench_startpos_depth_6);
criterion_main!(benches);
