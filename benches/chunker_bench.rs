use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use multidust::{SeekRewind, TttdChunker};

fn bench_chunking(c: &mut Criterion) {
    let data: Vec<u8> = (0u32..4_000_000).map(|i| (i % 251) as u8).collect();
    let chunker = TttdChunker::with_average_size(8192).unwrap();

    c.bench_function("tttd_chunk_4mb", |b| {
        b.iter(|| {
            let mut cursor = SeekRewind::new(Cursor::new(black_box(data.clone())));
            let mut count = 0usize;
            while cursor.cut_chunk(&chunker).unwrap().is_some() {
                count += 1;
            }
            count
        })
    });
}

criterion_group!(benches, bench_chunking);
criterion_main!(benches);
