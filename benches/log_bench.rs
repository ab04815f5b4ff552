use criterion::{Criterion, criterion_group, criterion_main};
use jlog::store::LogLocalFile;
use jlog::{LogReader, LogWriter};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BenchRecord {
    pub user: String,
    pub name: String,
    pub number: String,
}

fn bench_record() -> BenchRecord {
    BenchRecord {
        user: "123456".to_string(),
        name: "bob".to_string(),
        number: "123456789".to_string(),
    }
}

fn bench_append(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let log = rt
        .block_on(LogLocalFile::open(dir.path().join("bench.jsonl")))
        .unwrap();

    let record = bench_record();

    c.bench_function("append_record", |b| {
        b.to_async(&rt).iter(|| async {
            log.append(record.clone()).await.unwrap();
        });
    });
}

fn bench_append_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let log = rt
        .block_on(LogLocalFile::open(dir.path().join("bench.jsonl")))
        .unwrap();

    let record = bench_record();

    c.bench_function("append_1000_records", |b| {
        b.to_async(&rt).iter(|| async {
            for _i in 0..1000 {
                log.append(record.clone()).await.unwrap();
            }
        });
    });
}

fn bench_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let log = rt
        .block_on(LogLocalFile::open(dir.path().join("bench.jsonl")))
        .unwrap();

    let record = bench_record();

    // Pre-fill the log with 1000 records
    for _i in 0..1000 {
        rt.block_on(log.append(record.clone())).unwrap();
    }

    c.bench_function("stream_1000_linear", |b| {
        b.to_async(&rt).iter(|| async {
            let iterator = LogReader::<BenchRecord>::stream_from(&log, 0).await.unwrap();
            let mut count = 0;
            for res in iterator {
                let _ = res.unwrap();
                count += 1;
            }
            assert_eq!(count, 1000);
        });
    });
}

criterion_group!(benches, bench_append, bench_append_1000, bench_stream);
criterion_main!(benches);
