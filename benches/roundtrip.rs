//! Benchmark: decode and decode+encode over a synthetic chunk stream, plus
//! the raw VLQ scalar path.

use binschema::{jpeg, png, Value};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A PNG-shaped stream with many small IDAT chunks.
fn chunk_stream_bytes(chunks: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&png::SIGNATURE);
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&64i32.to_be_bytes());
    bytes.extend_from_slice(&64i32.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&0u32.to_be_bytes());
    for i in 0..chunks {
        let payload = [(i & 0xFF) as u8; 32];
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(b"IDAT");
        bytes.extend_from_slice(&payload);
        bytes.extend_from_slice(&0u32.to_be_bytes());
    }
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(b"IEND");
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes
}

fn jpeg_stream_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0xFF, 0xD8]);
    bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    bytes.extend_from_slice(&[0u8; 14]);
    bytes.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x04, 0x01, 0x02]);
    for i in 0..4096u32 {
        bytes.push((i % 251) as u8);
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

fn bench_roundtrip(c: &mut Criterion) {
    let png_schema = png::stream().expect("png schema");
    let png_bytes = chunk_stream_bytes(256);
    eprintln!("roundtrip: png stream is {} byte(s)", png_bytes.len());

    c.bench_function("png_decode", |b| {
        b.iter(|| {
            let (value, n) = png_schema.decode(black_box(&png_bytes), 0).expect("decode");
            black_box((value, n))
        });
    });

    let (png_value, _) = png_schema.decode(&png_bytes, 0).expect("decode");
    c.bench_function("png_encode", |b| {
        b.iter(|| black_box(png_schema.encode(black_box(&png_value)).expect("encode")));
    });

    c.bench_function("png_decode_encode", |b| {
        b.iter(|| {
            let (value, _) = png_schema.decode(black_box(&png_bytes), 0).expect("decode");
            black_box(png_schema.encode(&value).expect("encode"))
        });
    });

    let jpeg_schema = jpeg::stream().expect("jpeg schema");
    let jpeg_bytes = jpeg_stream_bytes();
    c.bench_function("jpeg_decode_encode", |b| {
        b.iter(|| {
            let (value, _) = jpeg_schema.decode(black_box(&jpeg_bytes), 0).expect("decode");
            black_box(jpeg_schema.encode(&value).expect("encode"))
        });
    });

    let uv = binschema::PrimType::parse("uv").expect("uv");
    c.bench_function("uvar_roundtrip", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for i in 0..1024u64 {
                let v = Value::U64(i * 2654435761);
                let bytes = binschema::prim::encode_prim(&uv, &v, &[]).expect("encode");
                let (_, n) = binschema::prim::decode_prim(&uv, &bytes, 0, &[]).expect("decode");
                total += n;
            }
            black_box(total)
        });
    });
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
