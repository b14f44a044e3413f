//! Benchmarks for report decoding
//!
//! Measures the decode path and snapshot encoding for each report kind.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use protocol::{AxisState, DeviceId, Snapshot, SnapshotFormat, decode};

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let reports: [(&str, [u8; 8]); 3] = [
        ("translation", [1, 0x10, 0x01, 0xf0, 0xfe, 0x00, 0x00, 0x00]),
        ("rotation", [2, 0x00, 0x80, 0xff, 0x7f, 0x2c, 0x00, 0x00]),
        ("button", [3, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ];

    for (name, raw) in reports {
        group.bench_function(name, |b| {
            let mut state = AxisState::new();
            b.iter(|| decode(black_box(&raw), &mut state))
        });
    }

    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let snapshot = Snapshot::new([0, -14336, 0, 1, 0, -1, 1, 0]);

    group.bench_function("list", |b| {
        b.iter(|| black_box(&snapshot).encode(DeviceId(0), SnapshotFormat::List))
    });
    group.bench_function("json", |b| {
        b.iter(|| black_box(&snapshot).encode(DeviceId(0), SnapshotFormat::Json))
    });

    group.finish();
}

criterion_group!(benches, benchmark_decode, benchmark_encode);
criterion_main!(benches);
