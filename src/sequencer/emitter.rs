// Cue emitter - timeline to engine-ready audio cue records
//
// Pure serialization; the timeline already guarantees every invariant.

use serde::Serialize;

use crate::catalog::SoundCatalog;
use crate::sequencer::timeline::TimelineModel;

/// Emitted when the timeline has no clips
pub const EMPTY_TABLE_PLACEHOLDER: &str = "# No audio cues: the timeline is empty";

/// One cue per clip, values rounded for hand-off
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioCueRecord {
    pub name: String,
    pub path: String,
    pub start_time: f64,
    pub duration: f64,
    pub volume_db: i32,
    pub pitch_scale: f64,
    pub fade_in: f64,
    pub fade_out: f64,
    pub bus: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Records for every clip, in clip creation order
///
/// `resource_root` prefixes each sound's relative path.
pub fn emit(
    timeline: &TimelineModel,
    catalog: &SoundCatalog,
    resource_root: &str,
) -> Vec<AudioCueRecord> {
    let root = resource_root.trim_end_matches('/');
    timeline
        .clips()
        .iter()
        .map(|clip| {
            let relative = catalog
                .lookup(&clip.sound_id)
                .map(|s| s.relative_path.clone())
                .unwrap_or_else(|_| format!("{}.wav", clip.sound_id));
            AudioCueRecord {
                name: clip.sound_id.clone(),
                path: format!("{root}/{relative}"),
                start_time: round2(clip.start_time),
                duration: round2(clip.duration),
                volume_db: clip.volume_db.round() as i32,
                pitch_scale: round2(clip.pitch as f64),
                fade_in: round2(clip.fade_in),
                fade_out: round2(clip.fade_out),
                bus: clip.bus.clone(),
            }
        })
        .collect()
}

fn quoted(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Render records as a GDScript constant table
pub fn render_cue_table(records: &[AudioCueRecord]) -> String {
    if records.is_empty() {
        return format!("{EMPTY_TABLE_PLACEHOLDER}\n");
    }

    let mut out = String::from("const AUDIO_CUES := [\n");
    for r in records {
        out.push_str(&format!(
            "\t{{\"name\": {}, \"path\": {}, \"start_time\": {:.2}, \"duration\": {:.2}, \
             \"volume_db\": {}, \"pitch_scale\": {:.2}, \"fade_in\": {:.2}, \"fade_out\": {:.2}, \
             \"bus\": {}}},\n",
            quoted(&r.name),
            quoted(&r.path),
            r.start_time,
            r.duration,
            r.volume_db,
            r.pitch_scale,
            r.fade_in,
            r.fade_out,
            quoted(&r.bus),
        ));
    }
    out.push_str("]\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::timeline::ClipProperties;

    const ROOT: &str = "res://assets/audio";

    #[test]
    fn test_two_clips_in_creation_order() {
        let catalog = SoundCatalog::builtin();
        let mut timeline = TimelineModel::new();
        let track = timeline.add_track();
        timeline
            .add_clip(catalog.lookup("laser_fire").unwrap(), track, 2.0)
            .unwrap();
        let second = timeline
            .add_clip(catalog.lookup("ui_click").unwrap(), track, 0.333)
            .unwrap();
        timeline
            .update_clip(
                second,
                ClipProperties {
                    volume_db: Some(-3.6),
                    pitch: Some(1.257),
                    ..Default::default()
                },
            )
            .unwrap();

        let records = emit(&timeline, &catalog, ROOT);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "laser_fire");
        assert_eq!(records[0].path, "res://assets/audio/sfx/weapons/laser_fire.wav");
        assert_eq!(records[0].start_time, 2.0);
        assert_eq!(records[0].duration, 0.12);
        assert_eq!(records[0].bus, "SFX");

        assert_eq!(records[1].name, "ui_click");
        assert_eq!(records[1].start_time, 0.33);
        assert_eq!(records[1].volume_db, -4);
        assert_eq!(records[1].pitch_scale, 1.26);
    }

    #[test]
    fn test_trailing_slash_in_root() {
        let catalog = SoundCatalog::builtin();
        let mut timeline = TimelineModel::new();
        let track = timeline.add_track();
        timeline
            .add_clip(catalog.lookup("space_hum").unwrap(), track, 0.0)
            .unwrap();
        let records = emit(&timeline, &catalog, "res://audio/");
        assert_eq!(records[0].path, "res://audio/ambient/space_hum.wav");
    }

    #[test]
    fn test_empty_timeline_emits_placeholder() {
        let table = render_cue_table(&[]);
        assert!(table.starts_with('#'));
        assert!(!table.contains('['));
    }

    #[test]
    fn test_cue_table_format() {
        let record = AudioCueRecord {
            name: "ui_click".to_string(),
            path: "res://assets/audio/sfx/ui/ui_click.wav".to_string(),
            start_time: 1.25,
            duration: 0.1,
            volume_db: -2,
            pitch_scale: 1.0,
            fade_in: 0.0,
            fade_out: 0.05,
            bus: "UI".to_string(),
        };
        let table = render_cue_table(&[record]);
        assert!(table.starts_with("const AUDIO_CUES := [\n"));
        assert!(table.contains("\"start_time\": 1.25"));
        assert!(table.contains("\"duration\": 0.10"));
        assert!(table.contains("\"volume_db\": -2,"));
        assert!(table.contains("\"bus\": \"UI\"},"));
        assert!(table.ends_with("]\n"));
    }
}
