use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use ttstream::audio::f32_to_pcm16_bytes;
use ttstream::pipeline::{FrameBuffer, FrameFormat};

/// Synthetic waveform of `secs` seconds at the output rate
fn waveform(secs: f32) -> Vec<u8> {
    let samples = (22050.0 * secs) as usize;
    let floats: Vec<f32> = (0..samples)
        .map(|i| ((i as f32) * 0.01).sin() * 0.8)
        .collect();
    f32_to_pcm16_bytes(&floats)
}

fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_chunking");

    for secs in [1.0f32, 10.0, 60.0] {
        let pcm = waveform(secs);
        for frame_ms in [20u64, 200] {
            let frame_bytes = FrameFormat::new(Duration::from_millis(frame_ms)).frame_bytes();
            group.bench_with_input(
                BenchmarkId::new(format!("{}ms", frame_ms), format!("{}s", secs)),
                &pcm,
                |b, pcm| b.iter(|| FrameBuffer::from_waveform(black_box(pcm), frame_bytes)),
            );
        }
    }

    group.finish();
}

fn bench_pcm_conversion(c: &mut Criterion) {
    let floats: Vec<f32> = (0..22050 * 10).map(|i| ((i as f32) * 0.01).sin()).collect();
    c.bench_function("f32_to_pcm16_10s", |b| {
        b.iter(|| f32_to_pcm16_bytes(black_box(&floats)))
    });
}

criterion_group!(benches, bench_chunking, bench_pcm_conversion);
criterion_main!(benches);
