// Recipe resolver - maps (category, sound id) to a synthesis recipe
//
// Pure: no state, no randomness. The id hash jitters frequencies and
// durations inside each preset band so sibling sounds differ slightly while
// a given id always sounds the same.
//
// Each category owns an ordered rule table. The first rule whose matcher
// accepts the id wins; categories without a table use the generic tone.

use crate::synth::filter::FilterType;
use crate::synth::oscillator::WaveformType;
use crate::synth::recipe::{
    EnvelopeSpec, FilterSpec, LayerSpec, NoiseDecay, NoiseSpec, SynthesisRecipe, ToneSpec,
    Vibrato,
};

use self::Matcher::{AllOf, Always, AnyOf, Contains};
use FilterType::{BandPass, HighPass, LowPass};
use WaveformType::{Saw, Sine, Square, Triangle};

/// Polynomial string hash (h = h * 31 + code unit, 32-bit signed, absolute value)
pub fn id_hash(id: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in id.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    h.unsigned_abs()
}

/// Per-id parameter jitter derived from the hash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    /// 0.00 to 0.99
    pub variation: f32,
    /// 0.80 to 1.29
    pub pitch_factor: f32,
}

impl Jitter {
    pub fn from_id(id: &str) -> Self {
        let hash = id_hash(id);
        Self {
            variation: (hash % 100) as f32 / 100.0,
            pitch_factor: 0.8 + (hash % 50) as f32 / 100.0,
        }
    }

    /// Base frequency scaled by the pitch factor
    pub fn freq(&self, hz: f32) -> f32 {
        hz * self.pitch_factor
    }

    /// Duration stretched by up to +/-10%
    pub fn dur(&self, seconds: f32) -> f32 {
        seconds * (0.9 + 0.2 * self.variation)
    }

    /// Pick a value inside [lo, hi] using the variation
    pub fn spread(&self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.variation
    }
}

/// Id predicate of a rule
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    Always,
    Contains(&'static str),
    AnyOf(&'static [&'static str]),
    AllOf(&'static [&'static str]),
}

impl Matcher {
    pub fn matches(&self, id: &str) -> bool {
        match *self {
            Matcher::Always => true,
            Matcher::Contains(needle) => id.contains(needle),
            Matcher::AnyOf(needles) => needles.iter().any(|n| id.contains(n)),
            Matcher::AllOf(needles) => needles.iter().all(|n| id.contains(n)),
        }
    }
}

type Build = fn(&Jitter) -> (SynthesisRecipe, f32);

/// Matcher paired with the preset it selects
pub struct Rule {
    pub matcher: Matcher,
    build: Build,
}

const fn rule(matcher: Matcher, build: Build) -> Rule {
    Rule { matcher, build }
}

/// Resolve a sound to its recipe and volume scalar
pub fn resolve(category: &str, sound_id: &str) -> (SynthesisRecipe, f32) {
    let jitter = Jitter::from_id(sound_id);
    rules_for(category)
        .and_then(|rules| rules.iter().find(|r| r.matcher.matches(sound_id)))
        .map(|r| (r.build)(&jitter))
        .unwrap_or_else(|| generic(&jitter))
}

/// Rule table for a category, `None` when the category has no presets
pub fn rules_for(category: &str) -> Option<&'static [Rule]> {
    let rules: &'static [Rule] = match category {
        "ui" => UI_RULES,
        "weapons" => WEAPON_RULES,
        "explosions" => EXPLOSION_RULES,
        "ship" => SHIP_RULES,
        "loot" => LOOT_RULES,
        "alerts" => ALERT_RULES,
        "achievements" => ACHIEVEMENT_RULES,
        "docking" => DOCKING_RULES,
        "boarding" => BOARDING_RULES,
        "ambient" => AMBIENT_RULES,
        "music" => MUSIC_RULES,
        _ => return None,
    };
    Some(rules)
}

fn generic(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(WaveformType::Sine, j.freq(440.0), None, env(0.01, 0.7, j.dur(0.3))),
        0.3,
    )
}

// ---------------------------------------------------------------------------
// Building blocks

fn env(attack: f32, sustain: f32, duration: f32) -> EnvelopeSpec {
    EnvelopeSpec {
        attack,
        sustain,
        duration,
    }
}

fn filter(filter_type: FilterType, cutoff: f32, resonance: f32) -> FilterSpec {
    FilterSpec {
        filter_type,
        cutoff,
        resonance,
    }
}

fn tone(
    waveform: WaveformType,
    frequency: f32,
    target: Option<f32>,
    envelope: EnvelopeSpec,
) -> ToneSpec {
    ToneSpec {
        waveform,
        frequency,
        frequency_target: target,
        envelope,
        filter: None,
    }
}

fn single(
    waveform: WaveformType,
    frequency: f32,
    target: Option<f32>,
    envelope: EnvelopeSpec,
) -> SynthesisRecipe {
    SynthesisRecipe::Single(tone(waveform, frequency, target, envelope))
}

fn filtered(mut tone: ToneSpec, spec: FilterSpec) -> SynthesisRecipe {
    tone.filter = Some(spec);
    SynthesisRecipe::Single(tone)
}

fn layer(tone: ToneSpec, offset: f32, gain: f32) -> LayerSpec {
    LayerSpec {
        tone,
        offset,
        gain,
        vibrato: None,
    }
}

fn wobble(mut layer: LayerSpec, rate: f32, depth: f32) -> LayerSpec {
    layer.vibrato = Some(Vibrato { rate, depth });
    layer
}

fn noise(decay: NoiseDecay, filter: FilterSpec, duration: f32) -> SynthesisRecipe {
    SynthesisRecipe::Noise(NoiseSpec {
        decay,
        filter,
        duration,
    })
}

// ---------------------------------------------------------------------------
// ui

const UI_RULES: &[Rule] = &[
    rule(Contains("notification"), ui_notification),
    rule(Contains("hover"), ui_hover),
    rule(Contains("deny"), ui_deny),
    rule(AnyOf(&["cancel", "close"]), ui_close),
    rule(Contains("open"), ui_open),
    rule(Contains("confirm"), ui_confirm),
    rule(Contains("scroll"), ui_scroll),
    rule(Always, ui_click),
];

fn ui_notification(j: &Jitter) -> (SynthesisRecipe, f32) {
    let first = tone(Sine, j.freq(660.0), None, env(0.005, 0.6, 0.1));
    let second = tone(Sine, j.freq(880.0), None, env(0.005, 0.6, j.dur(0.15)));
    (
        SynthesisRecipe::Multi(vec![layer(first, 0.0, 1.0), layer(second, 0.1, 1.0)]),
        0.4,
    )
}

fn ui_hover(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Sine, j.freq(600.0), None, env(0.005, 0.4, j.dur(0.05))), 0.15)
}

fn ui_deny(j: &Jitter) -> (SynthesisRecipe, f32) {
    let buzz = tone(Square, j.freq(300.0), Some(j.freq(100.0)), env(0.005, 0.6, j.dur(0.2)));
    (filtered(buzz, filter(LowPass, 1200.0, 1.0)), 0.35)
}

fn ui_close(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Triangle, j.freq(400.0), Some(j.freq(200.0)), env(0.005, 0.6, j.dur(0.12))),
        0.3,
    )
}

fn ui_open(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Sine, j.freq(300.0), Some(j.freq(600.0)), env(0.01, 0.6, j.dur(0.12))),
        0.3,
    )
}

fn ui_confirm(j: &Jitter) -> (SynthesisRecipe, f32) {
    let root = tone(Sine, j.freq(880.0), None, env(0.005, 0.6, j.dur(0.1)));
    let fifth = tone(Sine, j.freq(1320.0), None, env(0.005, 0.5, j.dur(0.1)));
    (
        SynthesisRecipe::Multi(vec![layer(root, 0.0, 1.0), layer(fifth, 0.0, 0.6)]),
        0.35,
    )
}

fn ui_scroll(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Sine, j.freq(500.0), None, env(0.002, 0.4, 0.02)), 0.1)
}

fn ui_click(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Sine, j.freq(800.0), None, env(0.002, 0.7, j.dur(0.05))), 0.3)
}

// ---------------------------------------------------------------------------
// weapons

const WEAPON_RULES: &[Rule] = &[
    rule(Contains("charge"), weapon_charge),
    rule(AnyOf(&["explode", "explosion"]), weapon_explode),
    rule(Contains("heavy"), weapon_heavy),
    rule(Contains("hit"), weapon_hit),
    rule(Contains("laser"), weapon_laser),
    rule(Contains("missile"), weapon_missile),
    rule(Contains("railgun"), weapon_railgun),
    rule(Always, weapon_generic),
];

fn weapon_charge(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(0.8);
    let sweep = tone(Saw, j.freq(100.0), Some(j.freq(2000.0)), env(duration * 0.8, 0.5, duration));
    let hum = tone(Sine, j.freq(200.0), Some(j.freq(400.0)), env(0.1, 0.3, duration));
    (
        SynthesisRecipe::Multi(vec![
            wobble(layer(sweep, 0.0, 1.0), 12.0, 30.0),
            layer(hum, 0.0, 0.5),
        ]),
        0.4,
    )
}

fn weapon_explode(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Exponential { rate: 6.0 },
            filter(LowPass, j.spread(600.0, 1000.0), 1.0),
            j.dur(0.5),
        ),
        0.6,
    )
}

fn weapon_heavy(j: &Jitter) -> (SynthesisRecipe, f32) {
    let blast = tone(Saw, j.freq(900.0), Some(j.freq(150.0)), env(0.005, 0.8, j.dur(0.25)));
    (filtered(blast, filter(LowPass, 3000.0, 1.5)), 0.5)
}

fn weapon_hit(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Square, j.freq(1500.0), Some(j.freq(300.0)), env(0.002, 0.6, j.dur(0.1))),
        0.35,
    )
}

fn weapon_laser(j: &Jitter) -> (SynthesisRecipe, f32) {
    let zap = tone(Saw, j.freq(2000.0), Some(j.freq(500.0)), env(0.002, 0.7, j.dur(0.12)));
    (filtered(zap, filter(LowPass, j.spread(3000.0, 5000.0), 2.0)), 0.4)
}

fn weapon_missile(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(0.5);
    let whoosh = tone(Saw, j.freq(150.0), Some(j.freq(600.0)), env(0.05, 0.6, duration));
    let tail = tone(Triangle, j.freq(80.0), Some(j.freq(60.0)), env(0.02, 0.5, duration));
    (
        SynthesisRecipe::Multi(vec![layer(whoosh, 0.0, 0.8), layer(tail, 0.05, 0.6)]),
        0.5,
    )
}

fn weapon_railgun(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Exponential { rate: 10.0 },
            filter(HighPass, j.spread(2000.0, 3000.0), 1.0),
            j.dur(0.3),
        ),
        0.5,
    )
}

fn weapon_generic(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Square, j.freq(440.0), Some(j.freq(220.0)), env(0.005, 0.6, j.dur(0.15))),
        0.35,
    )
}

// ---------------------------------------------------------------------------
// explosions

const EXPLOSION_RULES: &[Rule] = &[
    rule(AnyOf(&["large", "ship"]), explosion_large),
    rule(Contains("small"), explosion_small),
    rule(Always, explosion_medium),
];

fn explosion_large(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Exponential { rate: 3.0 },
            filter(LowPass, j.spread(300.0, 500.0), 1.2),
            j.dur(1.0),
        ),
        0.8,
    )
}

fn explosion_small(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Exponential { rate: 8.0 },
            filter(LowPass, j.spread(1200.0, 2000.0), 1.0),
            j.dur(0.3),
        ),
        0.5,
    )
}

fn explosion_medium(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Exponential { rate: 5.0 },
            filter(LowPass, j.spread(700.0, 1100.0), 1.0),
            j.dur(0.5),
        ),
        0.65,
    )
}

// ---------------------------------------------------------------------------
// ship

const SHIP_RULES: &[Rule] = &[
    rule(AnyOf(&["idle", "rumble"]), ship_idle),
    rule(Contains("thrust"), ship_thrust),
    rule(Contains("boost"), ship_boost),
    rule(Contains("damage"), ship_damage),
    rule(AllOf(&["shield", "hit"]), ship_shield_hit),
    rule(Contains("down"), ship_shield_down),
    rule(AnyOf(&["recharge", "charge"]), ship_recharge),
    rule(Always, ship_generic),
];

fn ship_idle(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(2.0);
    let low = tone(Saw, j.freq(55.0), None, env(0.3, 0.5, duration));
    let high = tone(Sine, j.freq(110.0), None, env(0.3, 0.3, duration));
    (
        SynthesisRecipe::Multi(vec![
            wobble(layer(low, 0.0, 0.7), 2.0, 3.0),
            wobble(layer(high, 0.0, 0.4), 3.0, 2.0),
        ]),
        0.3,
    )
}

fn ship_thrust(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Linear,
            filter(BandPass, j.spread(400.0, 700.0), 2.0),
            j.dur(1.0),
        ),
        0.4,
    )
}

fn ship_boost(j: &Jitter) -> (SynthesisRecipe, f32) {
    let rise = tone(Saw, j.freq(100.0), Some(j.freq(400.0)), env(0.05, 0.6, j.dur(0.4)));
    (filtered(rise, filter(LowPass, 2000.0, 1.0)), 0.45)
}

fn ship_damage(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Power { exponent: 2.0 },
            filter(LowPass, j.spread(800.0, 1500.0), 1.5),
            j.dur(0.3),
        ),
        0.55,
    )
}

fn ship_shield_hit(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Sine, j.freq(2000.0), Some(j.freq(500.0)), env(0.002, 0.6, j.dur(0.1))),
        0.4,
    )
}

fn ship_shield_down(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Triangle, j.freq(1000.0), Some(j.freq(100.0)), env(0.01, 0.6, j.dur(0.4))),
        0.45,
    )
}

fn ship_recharge(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(0.5);
    let rise = tone(Sine, j.freq(200.0), Some(j.freq(800.0)), env(0.05, 0.5, duration));
    let shimmer = tone(Triangle, j.freq(400.0), Some(j.freq(1600.0)), env(0.1, 0.3, duration));
    (
        SynthesisRecipe::Multi(vec![
            wobble(layer(rise, 0.0, 1.0), 8.0, 15.0),
            layer(shimmer, 0.05, 0.4),
        ]),
        0.35,
    )
}

fn ship_generic(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Triangle, j.freq(200.0), None, env(0.02, 0.6, j.dur(0.3))), 0.3)
}

// ---------------------------------------------------------------------------
// loot

const LOOT_RULES: &[Rule] = &[
    rule(Contains("legendary"), loot_legendary),
    rule(Contains("epic"), loot_epic),
    rule(Contains("rare"), loot_rare),
    rule(Contains("uncommon"), loot_uncommon),
    rule(Always, loot_common),
];

fn loot_legendary(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(0.6);
    let harmonics = [(1.0, 1.0), (1.5, 0.6), (2.0, 0.4)];
    let layers = harmonics
        .iter()
        .enumerate()
        .map(|(i, &(ratio, gain))| {
            let base = j.freq(523.0) * ratio;
            let t = tone(Sine, base, Some(base * 1.5), env(0.01, 0.6, duration - 0.05 * i as f32));
            layer(t, 0.05 * i as f32, gain)
        })
        .collect();
    (SynthesisRecipe::Multi(layers), 0.6)
}

fn loot_epic(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(0.45);
    let lead = tone(Sine, j.freq(440.0), Some(j.freq(880.0)), env(0.01, 0.6, duration));
    let sparkle = tone(
        Triangle,
        j.freq(660.0),
        Some(j.freq(1320.0)),
        env(0.01, 0.4, duration - 0.08),
    );
    (
        SynthesisRecipe::Multi(vec![layer(lead, 0.0, 1.0), layer(sparkle, 0.08, 0.6)]),
        0.5,
    )
}

fn loot_rare(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(0.35);
    let lead = tone(Sine, j.freq(500.0), Some(j.freq(750.0)), env(0.01, 0.6, duration));
    let octave = tone(Sine, j.freq(1000.0), Some(j.freq(1500.0)), env(0.01, 0.3, duration));
    (
        SynthesisRecipe::Multi(vec![layer(lead, 0.0, 1.0), layer(octave, 0.0, 0.4)]),
        0.45,
    )
}

fn loot_uncommon(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Sine, j.freq(500.0), Some(j.freq(700.0)), env(0.01, 0.6, j.dur(0.25))),
        0.4,
    )
}

fn loot_common(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Sine, j.freq(400.0), Some(j.freq(600.0)), env(0.01, 0.6, j.dur(0.2))),
        0.35,
    )
}

// ---------------------------------------------------------------------------
// alerts

const ALERT_RULES: &[Rule] = &[
    rule(Contains("critical"), alert_critical),
    rule(Contains("warning"), alert_warning),
    rule(Contains("final"), alert_final),
    rule(AnyOf(&["timer", "countdown"]), alert_timer),
    rule(Always, alert_generic),
];

fn alert_critical(j: &Jitter) -> (SynthesisRecipe, f32) {
    let siren = tone(Square, j.freq(880.0), None, env(0.01, 0.5, j.dur(0.4)));
    let sub = tone(Square, j.freq(440.0), None, env(0.01, 0.3, j.dur(0.4)));
    (
        SynthesisRecipe::Multi(vec![
            wobble(layer(siren, 0.0, 0.8), 8.0, 60.0),
            layer(sub, 0.0, 0.4),
        ]),
        0.5,
    )
}

fn alert_warning(j: &Jitter) -> (SynthesisRecipe, f32) {
    let pulse = tone(Triangle, j.freq(440.0), None, env(0.02, 0.6, j.dur(0.5)));
    (
        SynthesisRecipe::Multi(vec![wobble(layer(pulse, 0.0, 1.0), 4.0, 40.0)]),
        0.45,
    )
}

fn alert_final(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Sine, j.freq(1200.0), None, env(0.005, 0.7, j.dur(0.3))), 0.5)
}

fn alert_timer(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Sine, j.freq(1000.0), None, env(0.002, 0.6, j.dur(0.08))), 0.35)
}

fn alert_generic(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Sine, j.freq(880.0), None, env(0.005, 0.6, j.dur(0.2))), 0.4)
}

// ---------------------------------------------------------------------------
// achievements

const ACHIEVEMENT_RULES: &[Rule] = &[
    rule(Contains("achievement"), achievement_arpeggio),
    rule(Contains("level"), achievement_level),
    rule(Contains("money"), achievement_money),
    rule(Always, achievement_generic),
];

fn achievement_arpeggio(j: &Jitter) -> (SynthesisRecipe, f32) {
    // C5 E5 G5 C6
    let notes = [523.0, 659.0, 784.0, 1047.0];
    let layers = notes
        .iter()
        .enumerate()
        .map(|(i, &hz)| {
            let note_len = if i == notes.len() - 1 { j.dur(0.3) } else { 0.15 };
            layer(tone(Sine, j.freq(hz), None, env(0.005, 0.6, note_len)), 0.1 * i as f32, 1.0)
        })
        .collect();
    (SynthesisRecipe::Multi(layers), 0.5)
}

fn achievement_level(j: &Jitter) -> (SynthesisRecipe, f32) {
    let up = tone(Sine, j.freq(400.0), Some(j.freq(800.0)), env(0.01, 0.6, 0.2));
    let higher = tone(Sine, j.freq(600.0), Some(j.freq(1200.0)), env(0.01, 0.6, j.dur(0.3)));
    (
        SynthesisRecipe::Multi(vec![layer(up, 0.0, 1.0), layer(higher, 0.2, 1.0)]),
        0.5,
    )
}

fn achievement_money(j: &Jitter) -> (SynthesisRecipe, f32) {
    let ding = tone(Sine, j.freq(1200.0), None, env(0.002, 0.6, 0.06));
    let dong = tone(Sine, j.freq(1600.0), None, env(0.002, 0.6, j.dur(0.07)));
    (
        SynthesisRecipe::Multi(vec![layer(ding, 0.0, 1.0), layer(dong, 0.06, 1.0)]),
        0.4,
    )
}

fn achievement_generic(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Sine, j.freq(660.0), Some(j.freq(990.0)), env(0.01, 0.6, j.dur(0.3))),
        0.45,
    )
}

// ---------------------------------------------------------------------------
// docking

const DOCKING_RULES: &[Rule] = &[
    rule(Contains("clamp"), dock_clamp),
    rule(Contains("seal"), dock_seal),
    rule(Contains("approach"), dock_approach),
    rule(Contains("undock"), dock_undock),
    rule(Always, dock_generic),
];

fn dock_clamp(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Exponential { rate: 12.0 },
            filter(BandPass, j.spread(800.0, 1200.0), 3.0),
            j.dur(0.4),
        ),
        0.6,
    )
}

fn dock_seal(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Linear,
            filter(HighPass, j.spread(1500.0, 2500.0), 1.0),
            j.dur(0.5),
        ),
        0.35,
    )
}

fn dock_approach(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(1.7);
    let drone = tone(Saw, j.freq(80.0), None, env(0.4, 0.4, duration));
    let beep = tone(Sine, j.freq(1000.0), None, env(0.005, 0.5, 0.1));
    (
        SynthesisRecipe::Multi(vec![
            wobble(layer(drone, 0.0, 0.6), 1.5, 2.0),
            layer(beep, duration * 0.5, 0.5),
        ]),
        0.35,
    )
}

fn dock_undock(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Saw, j.freq(100.0), Some(j.freq(300.0)), env(0.05, 0.5, j.dur(0.6))),
        0.4,
    )
}

fn dock_generic(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Sine, j.freq(150.0), None, env(0.05, 0.6, j.dur(0.5))), 0.35)
}

// ---------------------------------------------------------------------------
// boarding

const BOARDING_RULES: &[Rule] = &[
    rule(Contains("open"), door_open),
    rule(Contains("close"), door_close),
    rule(Always, boarding_generic),
];

fn door_open(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Triangle, j.freq(100.0), Some(j.freq(300.0)), env(0.02, 0.6, j.dur(0.3))),
        0.4,
    )
}

fn door_close(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        single(Triangle, j.freq(300.0), Some(j.freq(100.0)), env(0.02, 0.6, j.dur(0.3))),
        0.4,
    )
}

fn boarding_generic(j: &Jitter) -> (SynthesisRecipe, f32) {
    (single(Square, j.freq(200.0), None, env(0.01, 0.5, j.dur(0.3))), 0.3)
}

// ---------------------------------------------------------------------------
// ambient

const AMBIENT_RULES: &[Rule] = &[
    rule(Contains("static"), ambient_static),
    rule(Contains("ventilation"), ambient_ventilation),
    rule(Always, ambient_drone),
];

fn ambient_static(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Power { exponent: 0.2 },
            filter(HighPass, j.spread(3000.0, 5000.0), 0.8),
            j.dur(5.0),
        ),
        0.1,
    )
}

fn ambient_ventilation(j: &Jitter) -> (SynthesisRecipe, f32) {
    (
        noise(
            NoiseDecay::Power { exponent: 0.1 },
            filter(LowPass, j.spread(300.0, 600.0), 0.7),
            j.dur(10.0),
        ),
        0.15,
    )
}

fn ambient_drone(j: &Jitter) -> (SynthesisRecipe, f32) {
    let duration = j.dur(10.0);
    let root = tone(Sine, j.freq(55.0), None, env(1.0, 0.5, duration));
    let fifth = tone(Sine, j.freq(82.5), None, env(1.5, 0.3, duration));
    let air = tone(Triangle, j.freq(220.0), None, env(2.0, 0.15, duration));
    (
        SynthesisRecipe::Multi(vec![
            wobble(layer(root, 0.0, 1.0), 0.2, 1.0),
            wobble(layer(fifth, 0.0, 0.6), 0.3, 1.5),
            layer(air, 0.0, 0.3),
        ]),
        0.2,
    )
}

// ---------------------------------------------------------------------------
// music
//
// A piece is a set of phrases laid out over a fixed length. Every pitch is
// scaled by the id's pitch factor so the whole piece transposes together.

const MUSIC_RULES: &[Rule] = &[
    rule(Contains("victory"), music_victory),
    rule(Contains("defeat"), music_defeat),
    rule(AllOf(&["combat", "intense"]), music_combat_intense),
    rule(Contains("combat"), music_combat_light),
    rule(AnyOf(&["boarding", "tension"]), music_boarding),
    rule(AnyOf(&["exploration", "cinematic"]), music_exploration),
    rule(Always, music_theme),
];

const C3: f32 = 130.81;
const E3: f32 = 164.81;
const F3: f32 = 174.61;
const G3: f32 = 196.00;
const A3: f32 = 220.00;
const B3: f32 = 246.94;
const C4: f32 = 261.63;
const D4: f32 = 293.66;
const E4: f32 = 329.63;
const F4: f32 = 349.23;
const G4: f32 = 392.00;
const A4: f32 = 440.00;
const C5: f32 = 523.25;
const E5: f32 = 659.25;
const G5: f32 = 783.99;

/// Slow pitch drift on pad fundamentals: rate in Hz, depth as a fraction of the pitch
const PAD_DRIFT_RATE: f32 = 0.08;
const PAD_DRIFT_DEPTH: f32 = 0.02;

/// Start times of back-to-back bars of `bar` seconds filling `length`
fn bars(length: f32, bar: f32) -> impl Iterator<Item = (usize, f32)> {
    (0..)
        .map(move |i| (i, i as f32 * bar))
        .take_while(move |&(_, start)| start < length)
}

/// Layers of one piece; nothing sounds past `length`
struct Arrangement {
    length: f32,
    pitch: f32,
    layers: Vec<LayerSpec>,
}

impl Arrangement {
    fn new(j: &Jitter, length: f32) -> Self {
        Self {
            length,
            pitch: j.pitch_factor,
            layers: Vec::new(),
        }
    }

    fn voice(
        &mut self,
        waveform: WaveformType,
        hz: f32,
        start: f32,
        envelope: EnvelopeSpec,
        gain: f32,
        drift: f32,
    ) {
        if start >= self.length {
            return;
        }
        let hz = hz * self.pitch;
        let duration = envelope.duration.min(self.length - start);
        let envelope = env(envelope.attack.min(duration), envelope.sustain, duration);
        let voice = layer(tone(waveform, hz, None, envelope), start, gain);
        self.layers.push(if drift > 0.0 {
            wobble(voice, PAD_DRIFT_RATE, hz * drift)
        } else {
            voice
        });
    }

    /// Melodic note: fundamental with its second and third partials
    fn note(&mut self, hz: f32, start: f32, length: f32, gain: f32) {
        let envelope = env((length * 0.1).max(0.01), 0.8, length);
        for (partial, weight) in [(1.0, 0.6), (2.0, 0.25), (3.0, 0.15)] {
            self.voice(Sine, hz * partial, start, envelope, gain * weight, 0.0);
        }
    }

    /// Swelling chord tone with a sub-octave and a fifth above
    fn pad(&mut self, hz: f32, start: f32, length: f32, gain: f32) {
        let envelope = env(length * 0.3, 0.9, length);
        self.voice(Sine, hz, start, envelope, gain * 0.5, PAD_DRIFT_DEPTH);
        self.voice(Sine, hz * 0.5, start, envelope, gain * 0.3, 0.0);
        self.voice(Sine, hz * 1.5, start, envelope, gain * 0.2, 0.0);
    }

    fn bass(&mut self, hz: f32, start: f32, length: f32, gain: f32) {
        self.voice(Triangle, hz, start, env(0.02, 0.9, length), gain, 0.0);
    }

    /// Short percussive accent
    fn stab(&mut self, hz: f32, start: f32, length: f32, gain: f32) {
        self.voice(Triangle, hz, start, env(0.01, 0.8, length), gain, 0.0);
    }

    /// Consecutive notes of `step` seconds each
    fn arp(&mut self, notes: &[f32], start: f32, step: f32, gain: f32) {
        for (i, &hz) in notes.iter().enumerate() {
            self.note(hz, start + step * i as f32, step, gain);
        }
    }

    fn finish(self, volume: f32) -> (SynthesisRecipe, f32) {
        (SynthesisRecipe::Multi(self.layers), volume)
    }
}

fn music_theme(j: &Jitter) -> (SynthesisRecipe, f32) {
    // Am F C G
    let chords = [[A3, C4, E4], [F3, A3, C4], [C3, E3, G3], [G3, B3, D4]];
    let mut piece = Arrangement::new(j, 60.0);
    for (i, start) in bars(piece.length, 4.0) {
        for hz in chords[i % chords.len()] {
            piece.pad(hz, start, 4.0, 0.15);
        }
        if i % 2 == 1 {
            piece.arp(&[E5, A4, C5, E4], start, 0.5, 0.1);
        }
    }
    piece.pad(A3 * 0.5, 0.0, piece.length, 0.12);
    piece.finish(0.7)
}

fn music_exploration(j: &Jitter) -> (SynthesisRecipe, f32) {
    let chords = [[C4, G4, C5], [A3, E4, A4], [F3, C4, F4], [G3, D4, G4]];
    let roots = [C3, A3 * 0.5, F3 * 0.5, G3 * 0.5];
    let mut piece = Arrangement::new(j, 90.0);
    for (i, start) in bars(piece.length, 6.0) {
        for hz in chords[i % chords.len()] {
            piece.pad(hz, start, 6.0, 0.12);
        }
        piece.bass(roots[i % roots.len()], start, 6.0, 0.2);
        if i % 2 == 1 {
            piece.arp(&[G5, E5, C5, G4, E5, C5], start, 0.4, 0.08);
        }
    }
    piece.finish(0.7)
}

fn music_combat_light(j: &Jitter) -> (SynthesisRecipe, f32) {
    combat(j, false)
}

fn music_combat_intense(j: &Jitter) -> (SynthesisRecipe, f32) {
    combat(j, true)
}

fn combat(j: &Jitter, intense: bool) -> (SynthesisRecipe, f32) {
    let (tempo, level) = if intense { (1.5, 1.2) } else { (1.0, 1.0) };
    let (root, chord) = if intense {
        (E3 * 0.5, [E3, G3, B3])
    } else {
        (A3 * 0.5, [A3, C4, E4])
    };
    let mut piece = Arrangement::new(j, 60.0);

    // Pulse then rest of the same length
    let pulse = 0.25 / tempo;
    for (_, start) in bars(piece.length, pulse * 2.0) {
        piece.bass(root, start, pulse, 0.3 * level);
    }
    for (_, start) in bars(piece.length, 8.0) {
        for hz in chord {
            piece.pad(hz, start, 8.0, 0.15 * level);
        }
    }
    // Sixteen-step pattern, accents every fourth step (every second when intense)
    let step = 0.15;
    for (i, start) in bars(piece.length, step) {
        let beat = i % 16;
        if beat % 4 == 0 || (intense && beat % 2 == 0) {
            let hz = if beat % 8 == 0 { C4 } else { G3 };
            piece.stab(hz, start, step, 0.2 * level);
        }
    }
    piece.finish(0.6)
}

fn music_boarding(j: &Jitter) -> (SynthesisRecipe, f32) {
    let mut piece = Arrangement::new(j, 60.0);
    let length = piece.length;
    piece.pad(C3 * 0.5, 0.0, length, 0.15);
    // Minor second rub
    piece.pad(C4, 0.0, length, 0.1);
    piece.pad(C4 * 1.059, 0.0, length, 0.08);
    // Heartbeat: strong thump, softer echo
    for (_, start) in bars(length, 0.8) {
        piece.bass(C3 * 0.5, start, 0.1, 0.25);
        piece.bass(C3 * 0.5, start + 0.15, 0.08, 0.15);
    }
    piece.finish(0.7)
}

fn music_victory(j: &Jitter) -> (SynthesisRecipe, f32) {
    let mut piece = Arrangement::new(j, 15.0);
    let mut at = 0.0;
    for hz in [C4, E4, G4, C5] {
        piece.note(hz, at, 0.5, 0.3);
        at += 0.5;
    }
    for (i, hz) in [C4, E4, G4, C5, E5, G5].into_iter().enumerate() {
        piece.note(hz, at, 0.2, 0.25 + 0.02 * i as f32);
        at += 0.2;
    }
    let hold = piece.length - at;
    for hz in [C4, E4, G4, C5] {
        piece.pad(hz, at, hold, 0.2);
    }
    piece.finish(0.6)
}

fn music_defeat(j: &Jitter) -> (SynthesisRecipe, f32) {
    let mut piece = Arrangement::new(j, 10.0);
    let mut at = 0.0;
    for hz in [A4, G4, F4, E4, D4, C4] {
        piece.note(hz, at, 0.8, 0.25);
        at += 0.8;
    }
    let hold = piece.length - at;
    for hz in [A3 * 0.5, C3, E3] {
        piece.pad(hz, at, hold, 0.15);
    }
    piece.finish(0.7)
}
