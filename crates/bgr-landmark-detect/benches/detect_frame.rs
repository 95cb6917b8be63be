use bgr_landmark_core::{bgr_to_gray, BgrImage};
use bgr_landmark_detect::{
    match_dual_template, render_grid_pattern, LandmarkDetector, LandmarkParams, LandmarkTemplate,
    PatternCode, ShapeCheckParams, BW_POSITIVE,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// 640×480 gray frame with the twelve coded markers on a 4×3 grid.
fn make_frame() -> BgrImage {
    let mut frame = BgrImage::filled(640, 480, [128, 128, 128]);
    for code in PatternCode::all() {
        let v = code.value() as i32;
        let (col, row) = (v % 4, v / 4);
        let marker = render_grid_pattern(&code.to_pattern(), 25);
        frame.blit(&marker, 80 + col * 140, 80 + row * 130);
    }
    frame
}

fn bench_correlation(c: &mut Criterion) {
    let frame = make_frame();
    let gray = bgr_to_gray(&frame.view());
    let template = LandmarkTemplate::new(BW_POSITIVE, 11);
    c.bench_function("dual_template_640x480_k11", |b| {
        b.iter(|| black_box(match_dual_template(black_box(&gray.view()), &template)))
    });
}

fn bench_detect(c: &mut Criterion) {
    let frame = make_frame();
    let gray = bgr_to_gray(&frame.view());
    let detector = LandmarkDetector::new(LandmarkParams::default());
    c.bench_function("detect_640x480_range_color", |b| {
        b.iter(|| black_box(detector.detect(black_box(&frame.view()), &gray.view())))
    });

    let with_shape = LandmarkDetector::new(LandmarkParams {
        shape: Some(ShapeCheckParams::default()),
        ..Default::default()
    });
    c.bench_function("detect_640x480_range_shape_color", |b| {
        b.iter(|| black_box(with_shape.detect(black_box(&frame.view()), &gray.view())))
    });
}

criterion_group!(detect_frame, bench_correlation, bench_detect);
criterion_main!(detect_frame);
