use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use fbank_core::MemoryStore;
use fbank_types::{FilterPolicy, FilterbankHeader};
use fbank_writer::{Session, SessionOptions, SimulatedSpectrometer};
use tempfile::TempDir;

fn voyager_integration() -> (FilterbankHeader, Vec<u8>) {
    let header = FilterbankHeader::voyager1();
    let data = SimulatedSpectrometer::new(&header, 1)
        .map(|mut s| s.next_integrations(1))
        .unwrap_or_default();
    (header, data)
}

fn bench_session_write(c: &mut Criterion) {
    let (header, integration) = voyager_integration();
    let mut group = c.benchmark_group("session_write");
    let Ok(dir) = TempDir::new() else {
        return;
    };
    let path = dir.path().join("bench.h5");

    for per_write in [1usize, 4, 16] {
        let buffer = integration.repeat(per_write);
        group.throughput(Throughput::Bytes(buffer.len() as u64));

        // Новая сессия на каждую итерацию: закрытие вне замера
        group.bench_with_input(
            BenchmarkId::new("memory", per_write),
            &buffer,
            |b, buffer| {
                b.iter_batched(
                    || {
                        let mut session = Session::new();
                        let options =
                            SessionOptions::default().with_filter_policy(FilterPolicy::None);
                        session
                            .open_with(MemoryStore::new(), &header, 0, options)
                            .map(|_| session)
                    },
                    |session| {
                        session.and_then(|mut s| s.write(&header, black_box(buffer)).map(|_| s))
                    },
                    BatchSize::PerIteration,
                )
            },
        );

        for policy in [FilterPolicy::None, FilterPolicy::BitshuffleLz4] {
            group.bench_with_input(
                BenchmarkId::new(format!("file_{policy}"), per_write),
                &buffer,
                |b, buffer| {
                    b.iter_batched(
                        || {
                            let mut session: Session = Session::new();
                            let options = SessionOptions::default().with_filter_policy(policy);
                            session.open(&header, 0, &path, options).map(|_| session)
                        },
                        |session| {
                            session
                                .and_then(|mut s| s.write(&header, black_box(buffer)).map(|_| s))
                        },
                        BatchSize::PerIteration,
                    )
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_session_write);
criterion_main!(benches);
