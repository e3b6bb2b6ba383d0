// Transport and timeline behavior across many ticks

use sound_studio::catalog::SoundCatalog;
use sound_studio::sequencer::timeline::MIN_CLIP_DURATION;
use sound_studio::sequencer::{
    ResizeEdge, SchedulingMode, TimelineModel, TransportClock, TransportState,
};

const TICK: f64 = 1.0 / 60.0;

fn timeline(clips: &[(&str, f64)]) -> TimelineModel {
    let catalog = SoundCatalog::builtin();
    let mut timeline = TimelineModel::new();
    let track = timeline.add_track();
    for &(id, start) in clips {
        timeline
            .add_clip(catalog.lookup(id).unwrap(), track, start)
            .unwrap();
    }
    timeline
}

fn playing(length: f64, mode: SchedulingMode) -> TransportClock {
    let mut clock = TransportClock::new(TransportState::new(120.0, length), mode);
    clock.play();
    clock
}

#[test]
fn test_wrap_resets_to_zero_and_retriggers_next_pass() {
    let mut timeline = timeline(&[("explosion_large", 0.0)]);
    let mut clock = playing(1.0, SchedulingMode::Polling);

    assert_eq!(clock.advance(0.0, &mut timeline).len(), 1);
    assert!(timeline.clips()[0].triggered);

    let mut fired = 1;
    for _ in 0..59 {
        fired += clock.advance(TICK, &mut timeline).len();
    }
    assert_eq!(fired, 1);

    // Crossing the end wraps to exactly 0 and clears every flag
    assert!(clock.advance(TICK * 2.0, &mut timeline).is_empty());
    assert_eq!(clock.current_time(), 0.0);
    assert!(timeline.clips().iter().all(|c| !c.triggered));

    assert_eq!(clock.advance(0.0, &mut timeline).len(), 1);
}

#[test]
fn test_each_clip_fires_once_per_pass() {
    let mut timeline = timeline(&[("ui_click", 0.25), ("ui_hover", 0.5), ("laser_fire", 1.5)]);
    let mut clock = playing(2.0, SchedulingMode::Polling);

    let mut fired = Vec::new();
    let mut t = 0.0;
    while t < 2.0 - TICK {
        let triggers = clock.advance(TICK, &mut timeline);
        fired.extend(triggers.into_iter().map(|trigger| trigger.sound_id));
        t += TICK;
    }

    assert_eq!(fired, vec!["ui_click", "ui_hover", "laser_fire"]);
}

#[test]
fn test_lookahead_fires_early_with_exact_offset() {
    let mut timeline = timeline(&[("ui_click", 0.5)]);
    let mut clock = playing(10.0, SchedulingMode::default());

    clock.state_mut().current_time = 0.42;
    let triggers = clock.advance(0.0, &mut timeline);
    assert_eq!(triggers.len(), 1);
    assert!((triggers[0].start_offset - 0.08).abs() < 1e-9);

    // Entering the clip does not fire it a second time
    assert!(clock.advance(0.1, &mut timeline).is_empty());
}

#[test]
fn test_rewind_keeps_play_state() {
    let mut timeline = timeline(&[("ui_click", 0.0)]);
    let mut clock = playing(10.0, SchedulingMode::Polling);
    clock.advance(0.05, &mut timeline);

    clock.rewind(&mut timeline);
    assert!(clock.is_playing());
    assert_eq!(clock.current_time(), 0.0);
    assert_eq!(clock.advance(0.0, &mut timeline).len(), 1);

    clock.stop(&mut timeline);
    assert!(!clock.is_playing());
    assert!(clock.advance(1.0, &mut timeline).is_empty());
    assert_eq!(clock.current_time(), 0.0);
}

#[test]
fn test_resize_edges() {
    let mut timeline = timeline(&[("explosion_large", 1.0)]);
    let id = timeline.clips()[0].id;

    // Left edge keeps the end
    timeline.resize_clip(id, ResizeEdge::Left, 1.5).unwrap();
    let clip = timeline.clip(id).unwrap();
    assert_eq!(clip.start_time, 1.5);
    assert!((clip.end_time() - 1.8).abs() < 1e-9);

    // Past the end: start stops at end - minimum
    timeline.resize_clip(id, ResizeEdge::Left, 5.0).unwrap();
    let clip = timeline.clip(id).unwrap();
    assert!((clip.start_time - 1.7).abs() < 1e-9);
    assert!((clip.duration - MIN_CLIP_DURATION).abs() < 1e-9);

    // Right edge changes duration only
    timeline.resize_clip(id, ResizeEdge::Right, 3.0).unwrap();
    let clip = timeline.clip(id).unwrap();
    assert!((clip.start_time - 1.7).abs() < 1e-9);
    assert!((clip.duration - 1.3).abs() < 1e-9);
}

#[test]
fn test_right_edge_short_duration_clamps_to_minimum() {
    let mut timeline = timeline(&[("ui_click", 2.0)]);
    let id = timeline.clips()[0].id;

    timeline.resize_clip(id, ResizeEdge::Right, 2.05).unwrap();
    assert_eq!(timeline.clip(id).unwrap().duration, MIN_CLIP_DURATION);

    timeline.resize_clip(id, ResizeEdge::Right, 0.0).unwrap();
    assert_eq!(timeline.clip(id).unwrap().duration, MIN_CLIP_DURATION);
}
