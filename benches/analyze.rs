// this_file: benches/analyze.rs
//! Pixel analyzer benchmarks

use cjkprobe::analyze::{content_bbox, has_visible_content, non_background_pixels};
use cjkprobe::font_info::BltPixel;
use cjkprobe::platform::ImageOutput;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Blank image with one lit pixel in the last row.
fn late_hit(width: u32, height: u32) -> ImageOutput {
    let mut image = ImageOutput::filled(width, height, BltPixel::BLACK);
    if let Some(bitmap) = image.bitmap.as_mut() {
        let last = bitmap.len() - 1;
        bitmap[last] = BltPixel::WHITE;
    }
    image
}

fn bench_visibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_visible_content");
    for (w, h) in [(16u32, 16u32), (320, 32), (1024, 768)] {
        let blank = ImageOutput::filled(w, h, BltPixel::BLACK);
        let hit = late_hit(w, h);
        group.bench_with_input(BenchmarkId::new("blank", format!("{}x{}", w, h)), &blank, |b, img| {
            b.iter(|| black_box(has_visible_content(Some(img))));
        });
        group.bench_with_input(BenchmarkId::new("late_hit", format!("{}x{}", w, h)), &hit, |b, img| {
            b.iter(|| black_box(has_visible_content(Some(img))));
        });
    }
    group.finish();
}

fn bench_counting(c: &mut Criterion) {
    let image = late_hit(1024, 768);
    c.bench_function("non_background_pixels_1024x768", |b| {
        b.iter(|| black_box(non_background_pixels(&image)));
    });
    c.bench_function("content_bbox_1024x768", |b| {
        b.iter(|| black_box(content_bbox(&image)));
    });
}

criterion_group!(benches, bench_visibility, bench_counting);
criterion_main!(benches);
