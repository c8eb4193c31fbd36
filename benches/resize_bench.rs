use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use screenshot_server::{parse_dimension, resize, OutputSize, ResizeLimits};
use std::io::Cursor;
use std::time::Duration;

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));
    group.sample_size(20);
}

fn page_png(width: u32, height: u32) -> Vec<u8> {
    let page = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(page)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

fn benchmark_cover_top(c: &mut Criterion) {
    let mut group = c.benchmark_group("cover_top");
    configure_fast_group(&mut group);

    let viewport = page_png(1920, 1080);
    let full_page = page_png(1920, 4000);

    group.bench_function("viewport_to_thumbnail", |b| {
        b.iter(|| {
            let output = resize::cover_top(
                black_box(&viewport),
                OutputSize {
                    width: 400,
                    height: 300,
                },
                ResizeLimits::default(),
            );
            let _ = black_box(output);
        });
    });

    group.bench_function("full_page_to_viewport", |b| {
        b.iter(|| {
            let output = resize::cover_top(
                black_box(&full_page),
                OutputSize {
                    width: 1920,
                    height: 1080,
                },
                ResizeLimits::default(),
            );
            let _ = black_box(output);
        });
    });

    group.bench_function("passthrough", |b| {
        b.iter(|| {
            let output = resize::cover_top(
                black_box(&viewport),
                OutputSize {
                    width: 1920,
                    height: 1080,
                },
                ResizeLimits::default(),
            );
            let _ = black_box(output);
        });
    });

    group.finish();
}

fn benchmark_parse_dimension(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_dimension");
    configure_fast_group(&mut group);

    let inputs = ["1920", " 800px", "+300", "abc", "-5", "99999999999"];

    group.bench_function("parse", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(parse_dimension(Some(black_box(input))));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_cover_top, benchmark_parse_dimension);
criterion_main!(benches);
