// SPDX-License-Identifier: MPL-2.0
use criterion::{criterion_group, criterion_main, Criterion};
use image_rs::{Rgba, RgbaImage};
use linkpage_studio::config::{CropConfig, OutputFormat};
use linkpage_studio::domain::geometry::{Rotation, Size};
use linkpage_studio::media::raster::{encode, rasterize};
use linkpage_studio::media::CropSession;
use std::hint::black_box;

fn source(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

fn rasterize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");
    group.sample_size(20);

    let image = source(1024, 768);
    for degrees in [0.0, 90.0, 17.5] {
        let mut session = CropSession::new(
            Size::new(1024.0, 768.0),
            Size::new(400.0, 400.0),
            &CropConfig::default(),
        )
        .unwrap();
        session.set_rotation(Rotation::new(degrees));
        let params = session.params();
        group.bench_function(format!("avatar_400_rot_{degrees}"), |b| {
            b.iter(|| {
                black_box(rasterize(&image, params.rect, params.rotation, 400, 400).unwrap())
            });
        });
    }

    let surface = source(400, 400);
    group.bench_function("encode_png_400", |b| {
        b.iter(|| black_box(encode(&surface, OutputFormat::Png, 85).unwrap()));
    });
    group.bench_function("encode_jpeg_400", |b| {
        b.iter(|| black_box(encode(&surface, OutputFormat::Jpeg, 85).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, rasterize_benchmark);
criterion_main!(benches);
