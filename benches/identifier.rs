use criterion::{black_box, criterion_group, criterion_main, Criterion};
use workout_player::config::PlayerConfig;
use workout_player::video::{embed_url, extract_id, VideoDescriptor};

const URLS: &[&str] = &[
    "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
    "https://www.youtube.com/shorts/Dy28eq2PjcM",
    "https://www.youtube.com/embed/pYcpY20QaE8?start=10",
    "https://youtu.be/0326dy_-CzM",
    "https://example.com/short",
    "not a url",
];

/// Benchmark identifier extraction across URL shapes
fn bench_extract_id(c: &mut Criterion) {
    c.bench_function("extract_id", |b| {
        b.iter(|| {
            for url in URLS {
                black_box(extract_id(black_box(url)));
            }
        })
    });
}

/// Benchmark full descriptor resolution plus embed URL construction
fn bench_resolve(c: &mut Criterion) {
    let config = PlayerConfig::default();
    let video = VideoDescriptor::new("https://www.youtube.com/shorts/Dy28eq2PjcM", "Goblet Squat")
        .with_start_offset(12.0)
        .with_mute(true);

    c.bench_function("resolve_and_embed", |b| {
        b.iter(|| {
            let resolved = video.resolve(black_box(&config.offsets)).ok()?;
            embed_url(
                &config.embed.embed_base,
                &resolved.video_id,
                resolved.start_offset,
                resolved.mute,
            )
            .ok()
        })
    });
}

criterion_group!(benches, bench_extract_id, bench_resolve);
criterion_main!(benches);
