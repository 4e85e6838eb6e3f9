use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use detector::processing::{PostProcessor, PreProcessor, TransformParams};
use image::{Rgb, RgbImage};
use ndarray::{Array, IxDyn};

const NUM_ANCHORS: usize = 8400;

/// Mock YOLOv8 output with N confident, non-overlapping boxes
fn create_mock_yolo_output(num_classes: usize, num_detections: usize) -> Array<f32, IxDyn> {
    let mut output = Array::from_elem(IxDyn(&[1, 4 + num_classes, NUM_ANCHORS]), 0.01f32);

    for i in 0..num_detections.min(NUM_ANCHORS) {
        output[[0, 0, i]] = 20.0 + (i % 20) as f32 * 30.0;
        output[[0, 1, i]] = 20.0 + (i / 20) as f32 * 30.0;
        output[[0, 2, i]] = 20.0;
        output[[0, 3, i]] = 20.0;
        output[[0, 4 + i % num_classes, i]] = 0.9;
    }

    output
}

fn bench_postprocess(c: &mut Criterion) {
    let transform = TransformParams {
        orig_width: 1280,
        orig_height: 720,
        input_width: 640,
        input_height: 640,
        scale: 0.5,
        offset_x: 0.0,
        offset_y: 140.0,
    };
    let post = PostProcessor::default();

    let mut group = c.benchmark_group("parse_detections");
    for num_detections in [0, 10, 100, 300] {
        let output = create_mock_yolo_output(8, num_detections);
        group.bench_with_input(
            BenchmarkId::from_parameter(num_detections),
            &output,
            |b, output| {
                b.iter(|| {
                    post.parse_detections(black_box(&output.view()), &transform)
                        .unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_preprocess(c: &mut Criterion) {
    let mut pre = PreProcessor::new((640, 640));
    let image = RgbImage::from_pixel(1280, 720, Rgb([128, 128, 128]));

    c.bench_function("letterbox_1280x720", |b| {
        b.iter(|| pre.preprocess(black_box(&image)).unwrap())
    });
}

criterion_group!(benches, bench_postprocess, bench_preprocess);
criterion_main!(benches);
