//! Benchmarks move generation throughput from a handful of representative
//! positions.

use criterion::{criterion_group, criterion_main, Criterion};
use harrier::{movegen, position::Position};

fn bench_startpos_movegen(c: &mut Criterion) {
    let position = Position::startpos();
    c.bench_function("movegen startpos", |b| {
        b.iter(|| movegen::generate_legal_moves(&position));
    });
}

fn bench_kiwipete_movegen(c: &mut Criterion) {
    let position = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    c.bench_function("movegen kiwipete", |b| {
        b.iter(|| movegen::generate_legal_moves(&position));
    });
}

criterion_group!(benches, bench_startpos_movegen, bench_kiwipete_movegen);
criterion_main!(benches);
