use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use multidust::compressor::{BzCoder, CompressSession};

fn bench_compression(c: &mut Criterion) {
    let data = vec![0u8; 1024 * 1024];

    c.bench_function("compress_stream_1mb_zero_fill", |b| {
        b.iter(|| {
            let mut out = Cursor::new(Vec::new());
            let mut session =
                CompressSession::new_known_size(&mut out, Box::new(BzCoder::new()), 256 * 1024, data.len() as u64);
            let mut input = Cursor::new(black_box(data.clone()));
            loop {
                let n = session.compress_stream(&mut input, 0, true).unwrap();
                if n == 0 {
                    break;
                }
            }
            session.finish().unwrap();
            out.into_inner()
        })
    });
}

criterion_group!(benches, bench_compression);
criterion_main!(benches);
