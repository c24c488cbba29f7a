// SPDX-License-Identifier: MPL-2.0
use criterion::{criterion_group, criterion_main, Criterion};
use linkpage_studio::domain::settings::{BackgroundMode, DesignSettings};
use linkpage_studio::domain::theme::ThemeCatalog;
use linkpage_studio::style;
use std::hint::black_box;

fn style_resolution_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("style_resolution");
    let catalog = ThemeCatalog::builtin();

    for theme in catalog.templates() {
        let mut settings = DesignSettings::from_template(catalog.default_template());
        settings.apply_template(theme);
        group.bench_function(format!("resolve_{}", theme.id), |b| {
            b.iter(|| black_box(style::resolve(black_box(&settings), catalog)));
        });
    }

    let mut image_mode = DesignSettings::from_template(catalog.default_template());
    image_mode.background_mode = BackgroundMode::Image;
    group.bench_function("resolve_image_background", |b| {
        b.iter(|| black_box(style::resolve(black_box(&image_mode), catalog)));
    });

    group.finish();
}

criterion_group!(benches, style_resolution_benchmark);
criterion_main!(benches);
