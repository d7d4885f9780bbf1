//! Criterion benchmarks for the remote-stream record decoder.
//!
//! Measures how fast [`RecordCodec`] splits typical server output into
//! records: many short lines in one read, CRLF-terminated lines, and a long
//! line arriving in small chunks.
//!
//! Run with:
//! ```bash
//! cargo bench --package muninn-bridge --bench record_codec_bench
//! ```

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use muninn_bridge::application::RecordCodec;
use muninn_bridge::domain::config::DEFAULT_MAX_LINE_LENGTH;
use tokio_util::codec::Decoder;

// ── Input fixtures ────────────────────────────────────────────────────────────

/// `count` short lines, as a MUD prints a room description.
fn short_lines(count: usize, terminator: &str) -> Vec<u8> {
    (0..count)
        .map(|i| format!("You see a torch on the wall ({i}).{terminator}"))
        .collect::<String>()
        .into_bytes()
}

/// Decodes every record in `input`, returning how many were produced.
fn drain(input: &[u8]) -> usize {
    let mut codec = RecordCodec::new(DEFAULT_MAX_LINE_LENGTH);
    let mut buf = BytesMut::from(input);
    let mut records = 0;
    while let Ok(Some(record)) = codec.decode(&mut buf) {
        black_box(record);
        records += 1;
    }
    records
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_single_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_single_read");
    for count in [1usize, 16, 256] {
        for (name, terminator) in [("lf", "\n"), ("crlf", "\r\n")] {
            let input = short_lines(count, terminator);
            group.throughput(Throughput::Bytes(input.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(name, count),
                &input,
                |b, input| b.iter(|| drain(black_box(input))),
            );
        }
    }
    group.finish();
}

fn bench_chunked_long_line(c: &mut Criterion) {
    // One 32 KiB line delivered 512 bytes at a time: exercises the
    // resume-from-last-scan path.
    let mut line = vec![b'x'; 32 * 1024];
    line.push(b'\n');

    let mut group = c.benchmark_group("decode_chunked");
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("long_line_512b_chunks", |b| {
        b.iter(|| {
            let mut codec = RecordCodec::new(DEFAULT_MAX_LINE_LENGTH);
            let mut buf = BytesMut::new();
            let mut record = None;
            for chunk in line.chunks(512) {
                buf.extend_from_slice(chunk);
                if let Some(r) = codec.decode(&mut buf).unwrap() {
                    record = Some(r);
                }
            }
            black_box(record)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_single_read, bench_chunked_long_line);
criterion_main!(benches);
