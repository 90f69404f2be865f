//! Throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use prosense_core::core::protocol::{lrc_checksum, ProtocolVariant};
use prosense_core::core::replay::{replay, Capture};
use prosense_core::core::sensor::ProsenseSensor;
use prosense_core::core::simulator::{FaultConfig, Simulator};
use prosense_core::core::transport::MemorySource;

fn checksum_benchmark(c: &mut Criterion) {
    let data: Vec<u8> = (0..13).map(|i| (i * 37) as u8).collect();

    let mut group = c.benchmark_group("checksum");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("lrc_dsrf_frame", |b| {
        b.iter(|| black_box(lrc_checksum(black_box(&data))))
    });

    group.finish();
}

fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for variant in ProtocolVariant::all() {
        let frame = Simulator::new(*variant, 1000, 1).next_frame();
        group.throughput(Throughput::Bytes(frame.len() as u64));

        group.bench_function(format!("poll_{}", variant.name()), |b| {
            let mut sensor = ProsenseSensor::new(*variant);
            let mut source = MemorySource::new();
            let mut now = 0u32;
            b.iter(|| {
                source.push(&frame);
                now = now.wrapping_add(1000);
                black_box(sensor.poll_input(now, &mut source))
            })
        });
    }

    group.finish();
}

fn replay_benchmark(c: &mut Criterion) {
    let faults = FaultConfig {
        corrupt_checksum: 0.05,
        garbage: 0.1,
        truncate: 0.05,
        drop: 0.0,
    };
    let run = Simulator::new(ProtocolVariant::MultiGasFrame, 1000, 7)
        .with_faults(faults, 8)
        .run(1000);
    let text = run.capture.to_text();

    let mut group = c.benchmark_group("replay");
    group.throughput(Throughput::Bytes(run.capture.total_bytes() as u64));

    group.bench_function("parse_text", |b| {
        b.iter(|| black_box(Capture::parse_text(black_box(&text)).unwrap()))
    });

    group.bench_function("noisy_dsrf_1000_frames", |b| {
        b.iter(|| {
            let mut sensor = ProsenseSensor::new(ProtocolVariant::MultiGasFrame);
            black_box(replay(black_box(&run.capture), &mut sensor))
        })
    });

    group.finish();
}

criterion_group!(benches, checksum_benchmark, decode_benchmark, replay_benchmark);
criterion_main!(benches);
