// Every catalog sound resolves the same way every time and renders to
// finite, audible output.

use sound_studio::audio::OneShotGraph;
use sound_studio::catalog::{LookupError, SoundCatalog};

const SAMPLE_RATE: f32 = 16000.0;

#[test]
fn test_resolution_is_stable_across_catalog_instances() {
    let first = SoundCatalog::builtin();
    let second = SoundCatalog::builtin();

    for sound in first.sounds() {
        assert_eq!(
            first.resolve(&sound.id).unwrap(),
            second.resolve(&sound.id).unwrap(),
            "{}",
            sound.id
        );
    }
}

#[test]
fn test_every_sound_renders_audibly() {
    let catalog = SoundCatalog::builtin();

    for sound in catalog.sounds() {
        let (recipe, volume) = catalog.resolve(&sound.id).unwrap();
        let graph = OneShotGraph::build(&sound.id, &recipe, volume, 0.0, 0.0, SAMPLE_RATE);
        let frames = graph.render();

        let expected = (recipe.duration() * SAMPLE_RATE) as usize;
        assert!(frames.len() + 1 >= expected, "{} too short", sound.id);

        let peak = frames
            .iter()
            .map(|&(l, r)| l.abs().max(r.abs()))
            .fold(0.0f32, f32::max);
        assert!(peak.is_finite(), "{} produced non-finite samples", sound.id);
        assert!(peak > 1e-4, "{} is silent", sound.id);
    }
}

#[test]
fn test_pitch_shift_keeps_shape() {
    let catalog = SoundCatalog::builtin();
    let (recipe, _) = catalog.resolve("laser_fire").unwrap();

    let shifted = recipe.clone().with_pitch(2.0);
    assert_eq!(shifted.kind(), recipe.kind());
    assert_eq!(shifted.duration(), recipe.duration());
    assert_ne!(shifted, recipe);
}

#[test]
fn test_unknown_sound_is_a_lookup_error() {
    let catalog = SoundCatalog::builtin();
    assert!(matches!(
        catalog.resolve("does_not_exist"),
        Err(LookupError::UnknownSound(id)) if id == "does_not_exist"
    ));
}
