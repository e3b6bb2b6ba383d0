// Timeline - tracks, placed clips and time/pixel mapping
//
// All times are seconds. The model owns its own id counters, so several
// timelines can live side by side without sharing ids.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::SoundDefinition;

/// Shortest clip the timeline accepts (seconds)
pub const MIN_CLIP_DURATION: f64 = 0.1;

pub const MIN_TRACK_VOLUME_DB: f32 = -40.0;
pub const MAX_TRACK_VOLUME_DB: f32 = 6.0;
pub const MIN_PITCH: f32 = 0.25;
pub const MAX_PITCH: f32 = 4.0;
pub const DEFAULT_BUS: &str = "SFX";

/// Volume in dB, clamped to the track range; NaN becomes 0 dB
fn clamp_db(volume_db: f32) -> f32 {
    if volume_db.is_nan() {
        0.0
    } else {
        volume_db.clamp(MIN_TRACK_VOLUME_DB, MAX_TRACK_VOLUME_DB)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track {}", self.0)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("Unknown {0}")]
    UnknownTrack(TrackId),

    #[error("Unknown {0}")]
    UnknownClip(ClipId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub muted: bool,
    /// Stored and exported; does not affect triggering
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub volume_db: f32,
    #[serde(default)]
    pub pan: f32,
}

impl Track {
    fn new(id: TrackId) -> Self {
        Self {
            id,
            name: format!("Track {}", id.0),
            muted: false,
            solo: false,
            volume_db: 0.0,
            pan: 0.0,
        }
    }

    /// Pull stored mix settings back into range
    fn clamp_settings(&mut self) {
        self.volume_db = clamp_db(self.volume_db);
        self.pan = if self.pan.is_nan() { 0.0 } else { self.pan.clamp(-1.0, 1.0) };
    }
}

fn default_pitch() -> f32 {
    1.0
}

fn default_bus() -> String {
    DEFAULT_BUS.to_string()
}

/// A sound placed on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub track_id: TrackId,
    pub sound_id: String,
    pub start_time: f64,
    pub duration: f64,
    /// Offset added to the track volume
    #[serde(default)]
    pub volume_db: f32,
    /// Frequency multiplier applied to the recipe
    #[serde(default = "default_pitch")]
    pub pitch: f32,
    #[serde(default)]
    pub fade_in: f64,
    #[serde(default)]
    pub fade_out: f64,
    /// Routing label carried to the emitted cues
    #[serde(default = "default_bus")]
    pub bus: String,
    /// Set once the clip fired during the current playback pass
    #[serde(skip)]
    pub triggered: bool,
}

impl Clip {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether `time` lies in [start, end)
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }

    fn clamp_fades(&mut self) {
        let clamp = |fade: f64| if fade.is_nan() { 0.0 } else { fade.clamp(0.0, self.duration) };
        self.fade_in = clamp(self.fade_in);
        self.fade_out = clamp(self.fade_out);
    }

    /// Pull every stored field back into range
    fn clamp_settings(&mut self) {
        if !(self.start_time.is_finite() && self.start_time >= 0.0) {
            self.start_time = 0.0;
        }
        if !(self.duration.is_finite() && self.duration >= MIN_CLIP_DURATION) {
            self.duration = MIN_CLIP_DURATION;
        }
        self.volume_db = clamp_db(self.volume_db);
        self.pitch = if self.pitch.is_nan() { 1.0 } else { self.pitch.clamp(MIN_PITCH, MAX_PITCH) };
        self.clamp_fades();
    }
}

/// Which clip edge a resize drags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    /// Moves the start, keeps the end
    Left,
    /// Moves the end, keeps the start
    Right,
}

/// Partial clip edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipProperties {
    pub volume_db: Option<f32>,
    pub pitch: Option<f32>,
    pub fade_in: Option<f64>,
    pub fade_out: Option<f64>,
    pub bus: Option<String>,
}

/// Tracks and clips of one arrangement
#[derive(Debug, Clone)]
pub struct TimelineModel {
    tracks: Vec<Track>,
    clips: Vec<Clip>,
    next_track_id: u32,
    next_clip_id: u32,
}

impl Default for TimelineModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineModel {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            clips: Vec::new(),
            next_track_id: 1,
            next_clip_id: 1,
        }
    }

    /// Rebuild a model from stored tracks and clips
    ///
    /// New ids continue after the largest stored id. Out-of-range mix
    /// settings, pitches and fades are clamped the way the setters clamp
    /// them. Callers validate references first.
    pub fn from_parts(mut tracks: Vec<Track>, mut clips: Vec<Clip>) -> Self {
        let next_track_id = tracks.iter().map(|t| t.id.0).max().unwrap_or(0) + 1;
        let next_clip_id = clips.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        for track in tracks.iter_mut() {
            track.clamp_settings();
        }
        for clip in clips.iter_mut() {
            clip.clamp_settings();
            clip.triggered = false;
        }
        Self {
            tracks,
            clips,
            next_track_id,
            next_clip_id,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Clips in creation order
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub(crate) fn clips_mut(&mut self) -> &mut [Clip] {
        &mut self.clips
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn clips_on_track(&self, track_id: TrackId) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(move |c| c.track_id == track_id)
    }

    pub fn clip_end(&self, id: ClipId) -> Option<f64> {
        self.clip(id).map(Clip::end_time)
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track, TimelineError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TimelineError::UnknownTrack(id))
    }

    fn clip_mut(&mut self, id: ClipId) -> Result<&mut Clip, TimelineError> {
        self.clips
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(TimelineError::UnknownClip(id))
    }

    fn ensure_track(&self, id: TrackId) -> Result<(), TimelineError> {
        self.track(id).map(|_| ()).ok_or(TimelineError::UnknownTrack(id))
    }

    // ---- Tracks -------------------------------------------------------

    /// Append a track named "Track N"
    pub fn add_track(&mut self) -> TrackId {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;
        self.tracks.push(Track::new(id));
        id
    }

    pub fn rename_track(
        &mut self,
        id: TrackId,
        name: impl Into<String>,
    ) -> Result<(), TimelineError> {
        self.track_mut(id)?.name = name.into();
        Ok(())
    }

    /// Remove a track and every clip on it; returns the removed clip ids
    pub fn delete_track(&mut self, id: TrackId) -> Result<Vec<ClipId>, TimelineError> {
        self.ensure_track(id)?;
        self.tracks.retain(|t| t.id != id);

        let removed = self.clips_on_track(id).map(|c| c.id).collect();
        self.clips.retain(|c| c.track_id != id);
        Ok(removed)
    }

    pub fn set_track_muted(&mut self, id: TrackId, muted: bool) -> Result<(), TimelineError> {
        self.track_mut(id)?.muted = muted;
        Ok(())
    }

    pub fn set_track_solo(&mut self, id: TrackId, solo: bool) -> Result<(), TimelineError> {
        self.track_mut(id)?.solo = solo;
        Ok(())
    }

    /// Clamped to -40..+6 dB
    pub fn set_track_volume(&mut self, id: TrackId, volume_db: f32) -> Result<(), TimelineError> {
        let clamped = clamp_db(volume_db);
        if clamped != volume_db {
            tracing::debug!(%id, volume_db, clamped, "Track volume clamped");
        }
        self.track_mut(id)?.volume_db = clamped;
        Ok(())
    }

    /// Clamped to -1..1
    pub fn set_track_pan(&mut self, id: TrackId, pan: f32) -> Result<(), TimelineError> {
        let track = self.track_mut(id)?;
        track.pan = pan;
        track.clamp_settings();
        Ok(())
    }

    pub fn is_track_muted(&self, id: TrackId) -> bool {
        self.track(id).is_some_and(|t| t.muted)
    }

    // ---- Clips --------------------------------------------------------

    /// Place `sound` on a track
    ///
    /// The clip lasts the sound's nominal duration (at least
    /// `MIN_CLIP_DURATION`). Negative start times are clamped to 0.
    pub fn add_clip(
        &mut self,
        sound: &SoundDefinition,
        track_id: TrackId,
        start_time: f64,
    ) -> Result<ClipId, TimelineError> {
        self.ensure_track(track_id)?;

        let id = ClipId(self.next_clip_id);
        self.next_clip_id += 1;
        self.clips.push(Clip {
            id,
            track_id,
            sound_id: sound.id.clone(),
            start_time: start_time.max(0.0),
            duration: sound.nominal_duration.max(MIN_CLIP_DURATION),
            volume_db: 0.0,
            pitch: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
            bus: default_bus(),
            triggered: false,
        });
        Ok(id)
    }

    /// Move a clip to a (possibly different) track and start time
    pub fn move_clip(
        &mut self,
        id: ClipId,
        track_id: TrackId,
        start_time: f64,
    ) -> Result<(), TimelineError> {
        self.ensure_track(track_id)?;
        let clip = self.clip_mut(id)?;
        clip.track_id = track_id;
        clip.start_time = start_time.max(0.0);
        Ok(())
    }

    /// Drag one edge of a clip to time `value`
    ///
    /// Left keeps the end time; right keeps the start time. Duration never
    /// drops below `MIN_CLIP_DURATION`.
    pub fn resize_clip(
        &mut self,
        id: ClipId,
        edge: ResizeEdge,
        value: f64,
    ) -> Result<(), TimelineError> {
        let clip = self.clip_mut(id)?;
        match edge {
            ResizeEdge::Left => {
                let end = clip.end_time();
                let start = value.min(end - MIN_CLIP_DURATION).max(0.0);
                clip.start_time = start;
                clip.duration = (end - start).max(MIN_CLIP_DURATION);
            }
            ResizeEdge::Right => {
                let duration = value - clip.start_time;
                if duration < MIN_CLIP_DURATION {
                    tracing::debug!(%id, duration, "Clip duration clamped to minimum");
                }
                clip.duration = duration.max(MIN_CLIP_DURATION);
            }
        }
        clip.clamp_fades();
        Ok(())
    }

    pub fn delete_clip(&mut self, id: ClipId) -> Result<(), TimelineError> {
        let before = self.clips.len();
        self.clips.retain(|c| c.id != id);
        if self.clips.len() == before {
            return Err(TimelineError::UnknownClip(id));
        }
        Ok(())
    }

    /// Edit per-clip playback properties
    pub fn update_clip(&mut self, id: ClipId, props: ClipProperties) -> Result<(), TimelineError> {
        let clip = self.clip_mut(id)?;
        if let Some(volume_db) = props.volume_db {
            clip.volume_db = volume_db;
        }
        if let Some(pitch) = props.pitch {
            clip.pitch = pitch;
        }
        if let Some(fade_in) = props.fade_in {
            clip.fade_in = fade_in;
        }
        if let Some(fade_out) = props.fade_out {
            clip.fade_out = fade_out;
        }
        if let Some(bus) = props.bus {
            clip.bus = bus;
        }
        clip.clamp_settings();
        Ok(())
    }

    /// Forget which clips already fired (new playback pass)
    pub fn clear_triggered_flags(&mut self) {
        for clip in self.clips.iter_mut() {
            clip.triggered = false;
        }
    }
}

/// Round `time` to the nearest multiple of `grid`
///
/// A non-positive grid leaves the time unchanged.
pub fn quantize(time: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return time;
    }
    (time / grid).round() * grid
}

pub const MIN_ZOOM_PERCENT: f64 = 10.0;
pub const MAX_ZOOM_PERCENT: f64 = 1000.0;

/// Seconds <-> pixels mapping of the timeline view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pub origin_x: f64,
    pub pixels_per_second: f64,
    zoom_percent: f64,
}

impl TimeScale {
    pub fn new(origin_x: f64, pixels_per_second: f64, zoom_percent: f64) -> Self {
        Self {
            origin_x,
            pixels_per_second,
            zoom_percent: zoom_percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT),
        }
    }

    pub fn zoom_percent(&self) -> f64 {
        self.zoom_percent
    }

    pub fn set_zoom_percent(&mut self, zoom_percent: f64) {
        self.zoom_percent = zoom_percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
    }

    fn scale(&self) -> f64 {
        self.pixels_per_second * self.zoom_percent / 100.0
    }

    pub fn time_to_x(&self, seconds: f64) -> f64 {
        self.origin_x + seconds * self.scale()
    }

    pub fn x_to_time(&self, x: f64) -> f64 {
        (x - self.origin_x) / self.scale()
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(0.0, 100.0, 100.0)
    }
}
