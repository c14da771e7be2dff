//! Generates the line-between lookup table at build time and places it in
//! `OUT_DIR`, where [`lookups`](src/lookups.rs) pulls it in with
//! `include_bytes!`.
//!
//! Square 0 is a8 (top-left); square 63 is h1 (bottom-right). Rank and file
//! are `square / 8` and `square % 8` respectively.

use std::{env, fs, mem::size_of, path::Path};

/// A table of bitboard rays between two squares (exclusive of both ends).
type LineBetween = [[u64; 64]; 64];

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let dest = Path::new(&out_dir).join("line_between.bin");

    let table = build_line_between();
    let bytes = line_between_to_bytes(&table);
    fs::write(dest, bytes).expect("failed to write line_between.bin");

    println!("cargo::rerun-if-changed=build.rs");
}

fn rank_of(square: i32) -> i32 {
    square / 8
}

fn file_of(square: i32) -> i32 {
    square % 8
}

/// Returns the (rank, file) step of the ray from `from` towards `to`, if one
/// of the eight compass directions reaches `to` from `from`.
fn step_towards(from: i32, to: i32) -> Option<(i32, i32)> {
    let (fr, ff) = (rank_of(from), file_of(from));
    let (tr, tf) = (rank_of(to), file_of(to));
    let (dr, df) = (tr - fr, tf - ff);

    if dr == 0 && df == 0 {
        return None;
    }
    if dr == 0 {
        return Some((0, df.signum()));
    }
    if df == 0 {
        return Some((dr.signum(), 0));
    }
    if dr.abs() == df.abs() {
        return Some((dr.signum(), df.signum()));
    }
    None
}

fn build_line_between() -> LineBetween {
    let mut table = [[0u64; 64]; 64];

    for from in 0..64 {
        for to in 0..64 {
            if from == to {
                continue;
            }
            let Some((dr, df)) = step_towards(from, to) else {
                continue;
            };

            let mut bitboard = 0u64;
            let (mut rank, mut file) = (rank_of(from) + dr, file_of(from) + df);
            while (rank, file) != (rank_of(to), file_of(to)) {
                if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                    break;
                }
                let square = rank * 8 + file;
                bitboard |= 1u64 << square;
                rank += dr;
                file += df;
            }
            table[from as usize][to as usize] = bitboard;
        }
    }

    table
}

fn line_between_to_bytes(table: &LineBetween) -> Vec<u8> {
    const SIZE: usize = size_of::<LineBetween>();
    let mut bytes = Vec::with_capacity(SIZE);
    for row in table {
        for &bb in row {
            bytes.extend_from_slice(&bb.to_le_bytes());
        }
    }
    bytes
}
