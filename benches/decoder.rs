//! Benchmarks for the message decoder.

use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use crowd_player::protocol::{
    ByteReader, DecodeLimits, DensitySample, FloatOrder, Message, MessageDecoder, MessageWriter,
    PersonPose,
};

fn encode(message: &Message, repeats: usize) -> Vec<u8> {
    let mut writer = MessageWriter::new(Vec::new(), FloatOrder::Native);
    for _ in 0..repeats {
        writer.write_message(message).unwrap();
    }
    writer.into_inner()
}

fn decode_all(bytes: &[u8]) -> usize {
    let mut decoder = MessageDecoder::new(
        ByteReader::new(Cursor::new(bytes), FloatOrder::Native),
        DecodeLimits::default(),
    );
    let mut decoded = 0;
    while decoder.wait_ready().unwrap() {
        black_box(decoder.decode_next().unwrap());
        decoded += 1;
    }
    decoded
}

fn bench_decode_locations(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_locations");

    for people in [10, 100, 1000, 10_000] {
        let message = Message::Locations {
            people: (0..people)
                .map(|i| PersonPose {
                    x: (i % 640) as i16,
                    y: (i / 640) as i16,
                    heading: i as f64 * 0.01,
                })
                .collect(),
        };
        let bytes = encode(&message, 10);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} people", people)),
            &bytes,
            |b, bytes| {
                b.iter(|| decode_all(black_box(bytes)));
            },
        );
    }

    group.finish();
}

fn bench_decode_density_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_density_map");

    for side in [16, 64, 256] {
        let message = Message::DensityMap {
            cells: (0..side * side)
                .map(|i| DensitySample {
                    x: (i % side) as i16,
                    y: (i / side) as i16,
                    density: (i % 7) as f64,
                })
                .collect(),
        };
        let bytes = encode(&message, 4);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", side, side)),
            &bytes,
            |b, bytes| {
                b.iter(|| decode_all(black_box(bytes)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode_locations, bench_decode_density_map);
criterion_main!(benches);
