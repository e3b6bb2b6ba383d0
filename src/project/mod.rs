// Session documents - export and re-import of an arrangement
//
// JSON is the hand-off format; RON is offered for hand editing. The file
// extension picks the format on save and load.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::SoundCatalog;
use crate::sequencer::timeline::{Clip, TimelineModel, Track, MIN_CLIP_DURATION};
use crate::sequencer::transport::{TransportState, MAX_BPM, MIN_BPM};

/// Current document layout
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid session structure: {0}")]
    InvalidStructure(String),
}

/// Serializable snapshot of a session's arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub bpm: f64,
    pub timeline_length: f64,
    pub tracks: Vec<Track>,
    pub clips: Vec<Clip>,
}

fn invalid(message: impl Into<String>) -> ProjectError {
    ProjectError::InvalidStructure(message.into())
}

impl SessionDocument {
    pub fn capture(timeline: &TimelineModel, transport: &TransportState) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            exported_at: Utc::now(),
            bpm: transport.bpm(),
            timeline_length: transport.timeline_length(),
            tracks: timeline.tracks().to_vec(),
            clips: timeline.clips().to_vec(),
        }
    }

    /// Check a document before it replaces a timeline
    pub fn validate(&self, catalog: &SoundCatalog) -> Result<(), ProjectError> {
        if self.format_version == 0 || self.format_version > FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion(self.format_version));
        }
        if !(MIN_BPM..=MAX_BPM).contains(&self.bpm) {
            return Err(invalid(format!("BPM {} outside {MIN_BPM}..{MAX_BPM}", self.bpm)));
        }
        if !(self.timeline_length.is_finite() && self.timeline_length > 0.0) {
            return Err(invalid(format!("Invalid timeline length {}", self.timeline_length)));
        }

        let mut track_ids = HashSet::new();
        for track in &self.tracks {
            if !track_ids.insert(track.id) {
                return Err(invalid(format!("Duplicate {}", track.id)));
            }
        }

        let mut clip_ids = HashSet::new();
        for clip in &self.clips {
            if !clip_ids.insert(clip.id) {
                return Err(invalid(format!("Duplicate {}", clip.id)));
            }
            if !track_ids.contains(&clip.track_id) {
                return Err(invalid(format!("{} references missing {}", clip.id, clip.track_id)));
            }
            if !(clip.start_time.is_finite() && clip.start_time >= 0.0) {
                return Err(invalid(format!("{} has invalid start time", clip.id)));
            }
            if !(clip.duration >= MIN_CLIP_DURATION) {
                return Err(invalid(format!(
                    "{} is shorter than {MIN_CLIP_DURATION} s",
                    clip.id
                )));
            }
            if catalog.lookup(&clip.sound_id).is_err() {
                return Err(invalid(format!("{} uses unknown sound {}", clip.id, clip.sound_id)));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, ProjectError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn from_ron(text: &str) -> Result<Self, ProjectError> {
        Ok(ron::from_str(text)?)
    }

    /// Write as RON for a `.ron` path, JSON otherwise
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        let text = if is_ron(path) { self.to_ron()? } else { self.to_json()? };
        std::fs::write(path, text)?;
        tracing::info!(path = %path.display(), clips = self.clips.len(), "Session exported");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if is_ron(path) {
            Self::from_ron(&text)
        } else {
            Self::from_json(&text)
        }
    }
}

fn is_ron(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ron"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::timeline::{ClipId, TrackId};
    use tempfile::TempDir;

    fn sample_document() -> SessionDocument {
        let catalog = SoundCatalog::builtin();
        let mut timeline = TimelineModel::new();
        let t1 = timeline.add_track();
        let t2 = timeline.add_track();
        timeline
            .add_clip(catalog.lookup("laser_fire").unwrap(), t1, 0.5)
            .unwrap();
        timeline
            .add_clip(catalog.lookup("explosion_small").unwrap(), t2, 1.0)
            .unwrap();
        SessionDocument::capture(&timeline, &TransportState::default())
    }

    #[test]
    fn test_json_shape() {
        let json = sample_document().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bpm"], 120.0);
        assert_eq!(value["timeline_length"], 30.0);
        assert_eq!(value["tracks"].as_array().unwrap().len(), 2);
        assert_eq!(value["clips"][0]["track_id"], 1);
        assert_eq!(value["clips"][1]["sound_id"], "explosion_small");
        // Playback state is not persisted
        assert!(value["clips"][0].get("triggered").is_none());
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = TempDir::new().unwrap();
        let document = sample_document();
        for name in ["session.json", "session.ron"] {
            let path = dir.path().join(name);
            document.save(&path).unwrap();
            let loaded = SessionDocument::load(&path).unwrap();
            assert_eq!(loaded, document, "{name}");
        }
    }

    #[test]
    fn test_validation_rejects_dangling_track() {
        let mut document = sample_document();
        document.clips[0].track_id = TrackId(42);
        assert!(matches!(
            document.validate(&SoundCatalog::builtin()),
            Err(ProjectError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let catalog = SoundCatalog::builtin();

        let mut short = sample_document();
        short.clips[0].duration = 0.05;
        assert!(short.validate(&catalog).is_err());

        let mut duplicate = sample_document();
        duplicate.clips[1].id = ClipId(1);
        assert!(duplicate.validate(&catalog).is_err());

        let mut tempo = sample_document();
        tempo.bpm = 500.0;
        assert!(tempo.validate(&catalog).is_err());

        let mut unknown = sample_document();
        unknown.clips[0].sound_id = "kazoo".to_string();
        assert!(unknown.validate(&catalog).is_err());

        let mut future = sample_document();
        future.format_version = FORMAT_VERSION + 1;
        assert!(matches!(
            future.validate(&catalog),
            Err(ProjectError::UnsupportedVersion(_))
        ));

        assert!(sample_document().validate(&catalog).is_ok());
    }
}
