// Transport - play/stop/record state, playhead and clip trigger scheduling
//
// Playback runs in real time: each tick adds the wall-clock elapsed seconds
// to the playhead. BPM only drives the ruler. When the playhead reaches the
// timeline length it wraps to 0 and a new pass begins.

use serde::{Deserialize, Serialize};

use super::timeline::{
    ClipId, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT, TimelineModel, TrackId, quantize,
};

pub const MIN_BPM: f64 = 30.0;
pub const MAX_BPM: f64 = 300.0;

/// Default pre-scheduling horizon (seconds)
pub const DEFAULT_LOOKAHEAD: f64 = 0.1;

/// How clip triggers are timed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Fire when the playhead is inside the clip; jitter up to one tick
    Polling,
    /// Also fire clips starting within `window` seconds, delayed to their exact start
    Lookahead { window: f64 },
}

impl Default for SchedulingMode {
    fn default() -> Self {
        SchedulingMode::Lookahead {
            window: DEFAULT_LOOKAHEAD,
        }
    }
}

impl SchedulingMode {
    fn window(&self) -> f64 {
        match *self {
            SchedulingMode::Polling => 0.0,
            SchedulingMode::Lookahead { window } => window.max(0.0),
        }
    }
}

/// Playback state of one session
#[derive(Debug, Clone, PartialEq)]
pub struct TransportState {
    pub current_time: f64,
    pub is_playing: bool,
    /// Orthogonal flag; no effect on playback
    pub is_recording: bool,
    bpm: f64,
    timeline_length: f64,
    zoom_percent: f64,
    pub snap_enabled: bool,
    snap_value: f64,
}

impl TransportState {
    pub fn new(bpm: f64, timeline_length: f64) -> Self {
        Self {
            current_time: 0.0,
            is_playing: false,
            is_recording: false,
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            timeline_length: timeline_length.max(1.0),
            zoom_percent: 100.0,
            snap_enabled: true,
            snap_value: 0.25,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        let clamped = bpm.clamp(MIN_BPM, MAX_BPM);
        if clamped != bpm {
            tracing::debug!(bpm, clamped, "BPM clamped");
        }
        self.bpm = clamped;
    }

    pub fn timeline_length(&self) -> f64 {
        self.timeline_length
    }

    /// At least one second
    pub fn set_timeline_length(&mut self, seconds: f64) {
        self.timeline_length = seconds.max(1.0);
    }

    pub fn zoom_percent(&self) -> f64 {
        self.zoom_percent
    }

    pub fn set_zoom_percent(&mut self, zoom_percent: f64) {
        self.zoom_percent = zoom_percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
    }

    pub fn snap_value(&self) -> f64 {
        self.snap_value
    }

    /// Grid size in seconds; non-positive values disable snapping
    pub fn set_snap(&mut self, enabled: bool, value: f64) {
        self.snap_enabled = enabled && value > 0.0;
        if value > 0.0 {
            self.snap_value = value;
        }
    }

    /// Apply the snap grid if enabled
    pub fn snap(&self, time: f64) -> f64 {
        if self.snap_enabled {
            quantize(time, self.snap_value)
        } else {
            time
        }
    }

    pub fn beat_duration(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Ruler beat positions from 0 up to the timeline length
    pub fn beat_times(&self) -> Vec<f64> {
        let beat = self.beat_duration();
        let count = (self.timeline_length / beat).floor() as usize;
        (0..=count).map(|i| i as f64 * beat).collect()
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(120.0, 30.0)
    }
}

/// One clip that fired during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct ClipTrigger {
    pub clip_id: ClipId,
    pub track_id: TrackId,
    pub sound_id: String,
    /// Seconds from now until the clip start (0 when already inside it)
    pub start_offset: f64,
}

/// Drives the playhead and decides which clips fire
#[derive(Debug, Clone)]
pub struct TransportClock {
    state: TransportState,
    mode: SchedulingMode,
}

impl TransportClock {
    pub fn new(state: TransportState, mode: SchedulingMode) -> Self {
        Self { state, mode }
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TransportState {
        &mut self.state
    }

    pub fn mode(&self) -> SchedulingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SchedulingMode) {
        self.mode = mode;
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn play(&mut self) {
        if !self.state.is_playing {
            tracing::info!(at = self.state.current_time, "Transport playing");
        }
        self.state.is_playing = true;
    }

    /// Stop and return the playhead to 0
    pub fn stop(&mut self, timeline: &mut TimelineModel) {
        if self.state.is_playing {
            tracing::info!("Transport stopped");
        }
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        timeline.clear_triggered_flags();
    }

    /// Return the playhead to 0 without changing the play state
    pub fn rewind(&mut self, timeline: &mut TimelineModel) {
        self.state.current_time = 0.0;
        timeline.clear_triggered_flags();
    }

    pub fn toggle_record(&mut self) -> bool {
        self.state.is_recording = !self.state.is_recording;
        tracing::info!(recording = self.state.is_recording, "Record toggled");
        self.state.is_recording
    }

    /// Advance the playhead by `elapsed` seconds and collect clip triggers
    ///
    /// Does nothing while stopped. Reaching the timeline length wraps the
    /// playhead to exactly 0, clears every triggered flag and fires nothing
    /// on that tick.
    pub fn advance(&mut self, elapsed: f64, timeline: &mut TimelineModel) -> Vec<ClipTrigger> {
        if !self.state.is_playing {
            return Vec::new();
        }

        self.state.current_time += elapsed.max(0.0);
        if self.state.current_time >= self.state.timeline_length {
            tracing::debug!("Playhead wrapped");
            self.state.current_time = 0.0;
            timeline.clear_triggered_flags();
            return Vec::new();
        }

        self.scan(timeline)
    }

    fn scan(&self, timeline: &mut TimelineModel) -> Vec<ClipTrigger> {
        let now = self.state.current_time;
        let window = self.mode.window();
        let muted: Vec<TrackId> = timeline
            .tracks()
            .iter()
            .filter(|t| t.muted)
            .map(|t| t.id)
            .collect();

        let mut triggers = Vec::new();
        for clip in timeline.clips_mut() {
            let inside = clip.contains(now);
            let upcoming = clip.start_time > now && clip.start_time - now < window;

            if !inside && !upcoming {
                clip.triggered = false;
                continue;
            }
            if clip.triggered || muted.contains(&clip.track_id) {
                continue;
            }

            clip.triggered = true;
            let start_offset = if inside { 0.0 } else { clip.start_time - now };
            tracing::debug!(
                clip = %clip.id,
                sound = %clip.sound_id,
                start_offset,
                "Clip triggered"
            );
            triggers.push(ClipTrigger {
                clip_id: clip.id,
                track_id: clip.track_id,
                sound_id: clip.sound_id.clone(),
                start_offset,
            });
        }
        triggers
    }
}
