use criterion::{black_box, criterion_group, criterion_main, Criterion};
use focusflow_core::prelude::*;

fn stereo_block(c: &mut Criterion) {
    let sr = 48_000.0;
    let mut left = PhaseOsc::new(432.0, Wave::Sine);
    let mut right = PhaseOsc::new(467.0, Wave::Sine);
    let mut gain = SlewLimiter::new(15.0, sr);
    let target = volume_to_gain(41.0);
    let mut buf = vec![0.0_f32; 512 * 2];

    c.bench_function("binaural_block_512", |b| {
        b.iter(|| {
            for frame in buf.chunks_mut(2) {
                let g = gain.process(target);
                frame[0] = left.next(sr) * g;
                frame[1] = right.next(sr) * g;
            }
            black_box(&buf);
        })
    });
}

criterion_group!(benches, stereo_block);
criterion_main!(benches);
