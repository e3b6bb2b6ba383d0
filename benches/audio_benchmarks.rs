use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sound_studio::audio::OneShotGraph;
use sound_studio::catalog::SoundCatalog;
use sound_studio::synth::oscillator::{Oscillator, SimpleOscillator, WaveformType};
use sound_studio::{Session, StudioConfig};

/// Recipe resolution for the whole catalog (runs on every trigger)
fn bench_resolve_catalog(c: &mut Criterion) {
    let catalog = SoundCatalog::builtin();
    let ids: Vec<String> = catalog.sounds().map(|s| s.id.clone()).collect();

    c.bench_function("resolve_catalog", |b| {
        b.iter(|| {
            for id in &ids {
                black_box(catalog.resolve(id).ok());
            }
        });
    });
}

fn bench_oscillator_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("oscillator");
    let sample_rate = 48000.0;
    let buffer_size = 512;

    for waveform in [
        WaveformType::Sine,
        WaveformType::Square,
        WaveformType::Saw,
        WaveformType::Triangle,
    ] {
        let mut osc = SimpleOscillator::new(waveform, sample_rate);
        osc.set_frequency(440.0);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", waveform)),
            &buffer_size,
            |b, &size| {
                b.iter(|| {
                    for _ in 0..size {
                        black_box(osc.next_sample());
                    }
                });
            },
        );
    }
    group.finish();
}

/// One audio buffer from each recipe kind
fn bench_graph_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");
    let catalog = SoundCatalog::builtin();
    let sample_rate = 48000.0;
    let buffer_size = 512;

    // single, multi and noise recipes
    for id in ["laser_fire", "achievement_unlock", "explosion_large"] {
        let Ok((recipe, volume)) = catalog.resolve(id) else {
            continue;
        };
        let graph = OneShotGraph::build(id, &recipe, volume, 0.0, 0.0, sample_rate);

        group.bench_with_input(BenchmarkId::from_parameter(id), &buffer_size, |b, &size| {
            b.iter(|| {
                let mut graph = graph.clone();
                for _ in 0..size {
                    black_box(graph.next_frame());
                }
            });
        });
    }
    group.finish();
}

fn demo_session() -> Session {
    let (mut session, _) = Session::offline(StudioConfig::default());
    for t in 0..4 {
        let track = session.add_track();
        for i in 0..16 {
            let start = t as f64 * 0.1 + i as f64 * 1.5;
            let _ = session.add_clip("ui_click", track, start);
        }
    }
    session
}

/// Transport tick over a busy timeline (runs once per frame)
fn bench_session_tick(c: &mut Criterion) {
    let mut session = demo_session();
    session.play();

    c.bench_function("session_tick", |b| {
        b.iter(|| black_box(session.tick(1.0 / 60.0)));
    });
}

fn bench_bounce(c: &mut Criterion) {
    let mut session = demo_session();
    session.set_timeline_length(5.0);

    let mut group = c.benchmark_group("bounce");
    group.sample_size(10);
    group.bench_function("five_seconds", |b| {
        b.iter(|| black_box(session.bounce(22050.0)));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_catalog,
    bench_oscillator_generation,
    bench_graph_render,
    bench_session_tick,
    bench_bounce
);
criterion_main!(benches);
