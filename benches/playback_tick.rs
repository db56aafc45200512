// SPDX-License-Identifier: MPL-2.0
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use vidsync::config::PlaybackConfig;
use vidsync::domain::media::{Point, RawImage, Size};
use vidsync::infrastructure::{ImagePresenter, SimulatedAudioChannel, SyntheticClip};
use vidsync::{Playback, PlaybackSession};

fn setup(cache: bool) -> (tempfile::TempDir, SimulatedAudioChannel, PlaybackSession, Playback) {
    let dir = tempfile::tempdir().unwrap();
    let channel = SimulatedAudioChannel::manual();
    let session = PlaybackSession::new(channel.clone(), ImagePresenter::new());
    let config = PlaybackConfig {
        cache,
        temp_dir: Some(dir.path().to_path_buf()),
        ..PlaybackConfig::default()
    };
    let clip = SyntheticClip::new(320, 180, 30.0, 3600.0);
    let playback = Playback::from_source(&session, Box::new(clip.open()), config).unwrap();
    playback.prepare().unwrap().play(-1, 0.0).unwrap();
    (dir, channel, session, playback)
}

fn playback_tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("playback_tick");

    // Same frame every tick: served from the cache after the first decode
    let (_dir, _channel, _session, playback) = setup(true);
    group.bench_function("cached_frame", |b| {
        b.iter(|| black_box(playback.advance_and_render(None, Point::default()).unwrap()));
    });

    // Clock moves one frame per tick: decode on every call
    let (_dir, channel, _session, playback) = setup(false);
    group.bench_function("decode_per_tick", |b| {
        b.iter(|| {
            channel.advance(1000.0 / 30.0);
            black_box(playback.advance_and_render(None, Point::default()).unwrap())
        });
    });

    // Full tick with display scaling and blit onto a screen
    let (_dir, channel, _session, playback) = setup(true);
    playback.set_size(Some(Size::new(640, 360))).unwrap();
    let mut screen = RawImage::blank(Size::new(1280, 720));
    group.bench_function("scale_and_blit", |b| {
        b.iter(|| {
            channel.advance(1000.0 / 30.0);
            black_box(
                playback
                    .advance_and_render(Some(&mut screen), Point::new(320, 180))
                    .unwrap(),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, playback_tick_benchmark);
criterion_main!(benches);
