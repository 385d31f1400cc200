//! Benchmarks for vision-frame
//!
//! Measures the per-frame cost of preparing capture output for display.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vision_frame::{
    prepare_for_display, resize_nearest, yuyv_to_rgb888, Frame, UVec2, DEFAULT_DISPLAY_BOUNDS,
};

fn bench_prepare_for_display(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare_for_display");

    for (w, h) in [(640u32, 480u32), (1280, 720), (1920, 1080)].iter() {
        let frame = Frame::filled(*w, *h, 3, 128).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{w}x{h}")),
            &frame,
            |b, frame| {
                b.iter(|| {
                    let display = prepare_for_display(frame.clone(), DEFAULT_DISPLAY_BOUNDS);
                    black_box(display.unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_resize_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize_nearest");
    let frame = Frame::filled(1920, 1080, 3, 64).unwrap();

    group.bench_function("1080p_to_360p", |b| {
        b.iter(|| black_box(resize_nearest(&frame, UVec2::new(640, 360))));
    });

    group.bench_function("1080p_gray_to_360p", |b| {
        let gray = Frame::filled(1920, 1080, 1, 64).unwrap();
        b.iter(|| black_box(resize_nearest(&gray, UVec2::new(640, 360))));
    });

    group.finish();
}

fn bench_yuyv_decode(c: &mut Criterion) {
    let input = vec![128u8; 1280 * 720 * 2];

    c.bench_function("yuyv_to_rgb888_720p", |b| {
        b.iter(|| black_box(yuyv_to_rgb888(&input, 1280, 720).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_prepare_for_display,
    bench_resize_nearest,
    bench_yuyv_decode
);
criterion_main!(benches);
