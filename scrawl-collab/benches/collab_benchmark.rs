use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scrawl_collab::protocol::Command;
use scrawl_core::{Color, Point, Shape, Sketch};

fn sample_polyline(points: usize) -> Shape {
    Shape::polyline(
        (0..points as i32).map(|i| Point::new(i * 7, i * 3)).collect(),
        Color::RED,
    )
}

fn bench_command_encode(c: &mut Criterion) {
    let simple = Command::Add(Shape::ellipse(10, 10, 50, 50, Color::RED));
    let stroke = Command::Add(sample_polyline(64));

    c.bench_function("encode_add_ellipse", |b| {
        b.iter(|| black_box(black_box(&simple).encode()))
    });
    c.bench_function("encode_add_polyline_64pt", |b| {
        b.iter(|| black_box(black_box(&stroke).encode()))
    });
}

fn bench_command_parse(c: &mut Criterion) {
    let simple = Command::Add(Shape::ellipse(10, 10, 50, 50, Color::RED)).encode();
    let stroke = Command::Add(sample_polyline(64)).encode();

    c.bench_function("parse_add_ellipse", |b| {
        b.iter(|| black_box(Command::parse(black_box(&simple)).unwrap()))
    });
    c.bench_function("parse_add_polyline_64pt", |b| {
        b.iter(|| black_box(Command::parse(black_box(&stroke)).unwrap()))
    });
}

fn bench_sketch_replay(c: &mut Criterion) {
    let lines: Vec<String> = (0..256)
        .map(|i| {
            let x = (i % 50) * 10;
            Command::Add(Shape::rectangle(x, 0, x + 10, 10, Color::BLACK)).encode()
        })
        .collect();

    c.bench_function("replay_256_adds", |b| {
        b.iter(|| {
            let mut sketch = Sketch::new();
            for line in &lines {
                Command::parse(line).unwrap().apply(&mut sketch);
            }
            black_box(sketch.len())
        })
    });
}

fn bench_hit_test(c: &mut Criterion) {
    let mut sketch = Sketch::new();
    for i in 0..200 {
        let x = (i % 40) * 12;
        sketch.add(Shape::rectangle(x, 0, x + 10, 10, Color::BLACK));
    }

    c.bench_function("shape_at_200_shapes", |b| {
        b.iter(|| black_box(sketch.shape_at(black_box(5), black_box(5))))
    });
}

criterion_group!(
    benches,
    bench_command_encode,
    bench_command_parse,
    bench_sketch_replay,
    bench_hit_test
);
criterion_main!(benches);
