// Session - one catalog, one timeline, one transport and one output
//
// Sessions are independent values; tests routinely run several side by side.
// Gesture commit points (add, move, resize) apply the snap grid here, while
// the timeline model itself stores whatever it is given.

use crate::audio::builder::GraphBuilder;
use crate::audio::dsp_utils::db_to_gain;
use crate::audio::engine::CpalOutput;
use crate::audio::export::{ExportError, write_wav};
use crate::audio::offline::{OfflineHandle, OfflineSink};
use crate::audio::sink::{DeviceError, OutputSink};
use crate::catalog::{LookupError, SoundCatalog, SoundDefinition};
use crate::config::StudioConfig;
use crate::messaging::channels::{NotificationConsumer, Notifier, drain};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::project::{ProjectError, SessionDocument};
use crate::sequencer::emitter::{self, AudioCueRecord};
use crate::sequencer::timeline::{
    ClipId, ClipProperties, ResizeEdge, TimeScale, TimelineError, TimelineModel, TrackId,
};
use crate::sequencer::transport::{TransportClock, TransportState};

/// Frame period used when bouncing through the transport
const BOUNCE_TICK: f64 = 1.0 / 60.0;

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub struct Session {
    config: StudioConfig,
    catalog: SoundCatalog,
    timeline: TimelineModel,
    transport: TransportClock,
    builder: GraphBuilder,
    notifier: Notifier,
    notifications: NotificationConsumer,
}

fn initial_transport(config: &StudioConfig) -> TransportClock {
    let mut state = TransportState::new(config.default_bpm, config.default_timeline_length);
    state.set_zoom_percent(config.default_zoom_percent);
    state.set_snap(config.default_snap_enabled, config.default_snap_value);
    TransportClock::new(state, config.scheduling)
}

impl Session {
    /// Session writing to `sink`
    pub fn new(config: StudioConfig, catalog: SoundCatalog, sink: Box<dyn OutputSink>) -> Self {
        let (notifier, notifications) = Notifier::channel(config.notification_capacity);
        Self::assemble(config, catalog, sink, notifier, notifications)
    }

    /// Session on the default audio device (opened on the first gesture)
    pub fn with_device(config: StudioConfig) -> Self {
        let (notifier, notifications) = Notifier::channel(config.notification_capacity);
        let output = CpalOutput::new(
            notifier.clone(),
            config.command_capacity,
            config.fallback_sample_rate,
        );
        Self::assemble(
            config,
            SoundCatalog::builtin(),
            Box::new(output),
            notifier,
            notifications,
        )
    }

    /// Session on an offline sink running at `fallback_sample_rate`
    pub fn offline(config: StudioConfig) -> (Self, OfflineHandle) {
        let sink = OfflineSink::new(config.fallback_sample_rate);
        let handle = sink.handle();
        (
            Self::new(config, SoundCatalog::builtin(), Box::new(sink)),
            handle,
        )
    }

    fn assemble(
        config: StudioConfig,
        catalog: SoundCatalog,
        sink: Box<dyn OutputSink>,
        notifier: Notifier,
        notifications: NotificationConsumer,
    ) -> Self {
        let mut builder = GraphBuilder::new(sink, notifier.clone());
        builder.set_master_volume(config.master_volume);
        let transport = initial_transport(&config);

        Self {
            config,
            catalog,
            timeline: TimelineModel::new(),
            transport,
            builder,
            notifier,
            notifications,
        }
    }

    // ---- Accessors ----------------------------------------------------

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    pub fn timeline(&self) -> &TimelineModel {
        &self.timeline
    }

    pub fn transport(&self) -> &TransportState {
        self.transport.state()
    }

    pub fn current_time(&self) -> f64 {
        self.transport.current_time()
    }

    pub fn time_scale(&self) -> TimeScale {
        TimeScale::new(
            self.config.origin_x,
            self.config.pixels_per_second,
            self.transport.state().zoom_percent(),
        )
    }

    pub fn is_audio_active(&self) -> bool {
        self.builder.is_active()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Take every pending notice
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        drain(&mut self.notifications)
    }

    // ---- Transport settings -------------------------------------------

    pub fn set_bpm(&mut self, bpm: f64) {
        self.transport.state_mut().set_bpm(bpm);
    }

    pub fn set_timeline_length(&mut self, seconds: f64) {
        self.transport.state_mut().set_timeline_length(seconds);
    }

    pub fn set_zoom_percent(&mut self, zoom_percent: f64) {
        self.transport.state_mut().set_zoom_percent(zoom_percent);
    }

    pub fn set_snap(&mut self, enabled: bool, value: f64) {
        self.transport.state_mut().set_snap(enabled, value);
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.config.master_volume = volume.clamp(0.0, 1.0);
        self.builder.set_master_volume(self.config.master_volume);
    }

    // ---- Tracks -------------------------------------------------------

    pub fn add_track(&mut self) -> TrackId {
        self.timeline.add_track()
    }

    pub fn rename_track(&mut self, id: TrackId, name: &str) -> Result<(), StudioError> {
        Ok(self.timeline.rename_track(id, name)?)
    }

    /// Remove a track and its clips; returns the removed clip ids
    pub fn delete_track(&mut self, id: TrackId) -> Result<Vec<ClipId>, StudioError> {
        Ok(self.timeline.delete_track(id)?)
    }

    pub fn set_track_muted(&mut self, id: TrackId, muted: bool) -> Result<(), StudioError> {
        Ok(self.timeline.set_track_muted(id, muted)?)
    }

    pub fn set_track_solo(&mut self, id: TrackId, solo: bool) -> Result<(), StudioError> {
        Ok(self.timeline.set_track_solo(id, solo)?)
    }

    pub fn set_track_volume(&mut self, id: TrackId, volume_db: f32) -> Result<(), StudioError> {
        Ok(self.timeline.set_track_volume(id, volume_db)?)
    }

    pub fn set_track_pan(&mut self, id: TrackId, pan: f32) -> Result<(), StudioError> {
        Ok(self.timeline.set_track_pan(id, pan)?)
    }

    // ---- Clips --------------------------------------------------------

    fn lookup_or_notify(&self, sound_id: &str) -> Result<SoundDefinition, LookupError> {
        self.catalog.lookup(sound_id).cloned().map_err(|e| {
            self.notifier
                .post(Notification::error(NotificationCategory::Catalog, e.to_string()));
            e
        })
    }

    /// Look up a catalog sound; a missing id posts a notice
    pub fn lookup_sound(&self, sound_id: &str) -> Result<SoundDefinition, StudioError> {
        Ok(self.lookup_or_notify(sound_id)?)
    }

    /// Place a sound on a track at the snapped `start_time`
    pub fn add_clip(
        &mut self,
        sound_id: &str,
        track_id: TrackId,
        start_time: f64,
    ) -> Result<ClipId, StudioError> {
        let sound = self.lookup_or_notify(sound_id)?;
        let start = self.transport.state().snap(start_time);
        let id = self.timeline.add_clip(&sound, track_id, start)?;
        tracing::debug!(clip = %id, sound = sound_id, start, "Clip added");
        Ok(id)
    }

    /// Place a sound at the playhead on the first track, creating one if needed
    pub fn place_at_playhead(&mut self, sound_id: &str) -> Result<ClipId, StudioError> {
        let sound = self.lookup_or_notify(sound_id)?;
        let track = match self.timeline.tracks().first() {
            Some(track) => track.id,
            None => self.timeline.add_track(),
        };
        let start = self.transport.current_time();
        Ok(self.timeline.add_clip(&sound, track, start)?)
    }

    /// Commit a clip move at the snapped `start_time`
    pub fn move_clip(
        &mut self,
        id: ClipId,
        track_id: TrackId,
        start_time: f64,
    ) -> Result<(), StudioError> {
        let start = self.transport.state().snap(start_time);
        self.timeline.move_clip(id, track_id, start)?;
        tracing::debug!(clip = %id, track = %track_id, start, "Clip moved");
        Ok(())
    }

    /// Commit an edge drag at the snapped `value`
    pub fn resize_clip(
        &mut self,
        id: ClipId,
        edge: ResizeEdge,
        value: f64,
    ) -> Result<(), StudioError> {
        let value = self.transport.state().snap(value);
        self.timeline.resize_clip(id, edge, value)?;
        tracing::debug!(clip = %id, ?edge, value, "Clip resized");
        Ok(())
    }

    pub fn delete_clip(&mut self, id: ClipId) -> Result<(), StudioError> {
        Ok(self.timeline.delete_clip(id)?)
    }

    pub fn update_clip(&mut self, id: ClipId, props: ClipProperties) -> Result<(), StudioError> {
        Ok(self.timeline.update_clip(id, props)?)
    }

    // ---- Playback -----------------------------------------------------

    /// Audition a catalog sound (a user gesture: wakes the output)
    ///
    /// Returns whether the sound reached the output. An unknown id posts
    /// a notice and fails without touching anything else.
    pub fn preview_sound(&mut self, sound_id: &str) -> Result<bool, StudioError> {
        let sound = self.lookup_or_notify(sound_id)?;
        let _ = self.builder.activate();
        let (recipe, volume) = self.catalog.resolve(&sound.id)?;
        Ok(self.builder.trigger(&sound.id, &recipe, volume, 0.0, 0.0))
    }

    /// Start playback (a user gesture: wakes the output)
    pub fn play(&mut self) {
        let _ = self.builder.activate();
        self.transport.play();
    }

    /// Stop playback and return to 0; sounding triggers run out on their own
    pub fn stop(&mut self) {
        self.transport.stop(&mut self.timeline);
    }

    pub fn rewind(&mut self) {
        self.transport.rewind(&mut self.timeline);
    }

    pub fn toggle_record(&mut self) -> bool {
        self.transport.toggle_record()
    }

    /// Advance the transport by `elapsed` seconds and fire due clips
    ///
    /// Returns the clips triggered on this tick.
    pub fn tick(&mut self, elapsed: f64) -> Vec<ClipId> {
        let triggers = self.transport.advance(elapsed, &mut self.timeline);

        for trigger in &triggers {
            let (recipe, volume) = match self.catalog.resolve(&trigger.sound_id) {
                Ok(resolved) => resolved,
                Err(e) => {
                    self.notifier
                        .post(Notification::warning(NotificationCategory::Timeline, e.to_string()));
                    continue;
                }
            };

            let (track_db, pan) = self
                .timeline
                .track(trigger.track_id)
                .map_or((0.0, 0.0), |t| (t.volume_db, t.pan));
            let (clip_db, pitch) = self
                .timeline
                .clip(trigger.clip_id)
                .map_or((0.0, 1.0), |c| (c.volume_db, c.pitch));

            let gain = volume * db_to_gain(track_db + clip_db);
            self.builder.trigger(
                &trigger.sound_id,
                &recipe.with_pitch(pitch),
                gain,
                trigger.start_offset as f32,
                pan,
            );
        }

        triggers.into_iter().map(|t| t.clip_id).collect()
    }

    // ---- Output -------------------------------------------------------

    /// Cue records for the external engine, in clip creation order
    pub fn emit_records(&self) -> Vec<AudioCueRecord> {
        emitter::emit(&self.timeline, &self.catalog, &self.config.resource_root)
    }

    pub fn render_cue_table(&self) -> String {
        emitter::render_cue_table(&self.emit_records())
    }

    pub fn export_document(&self) -> SessionDocument {
        SessionDocument::capture(&self.timeline, self.transport.state())
    }

    /// Replace the arrangement with a validated document
    ///
    /// Playback stops. On error nothing changes.
    pub fn import_document(&mut self, document: SessionDocument) -> Result<(), StudioError> {
        document.validate(&self.catalog)?;

        self.transport.stop(&mut self.timeline);
        let state = self.transport.state_mut();
        state.set_bpm(document.bpm);
        state.set_timeline_length(document.timeline_length);
        self.timeline = TimelineModel::from_parts(document.tracks, document.clips);

        tracing::info!(
            tracks = self.timeline.tracks().len(),
            clips = self.timeline.clips().len(),
            "Session imported"
        );
        Ok(())
    }

    /// Render one full pass of the arrangement offline
    ///
    /// The transport is simulated at 60 ticks per second, so clip timing
    /// matches live playback with the configured scheduling mode. This
    /// session is left untouched.
    pub fn bounce(&self, sample_rate: f32) -> Vec<(f32, f32)> {
        let mut config = self.config.clone();
        config.fallback_sample_rate = sample_rate;

        let (mut offline, handle) = Session::offline(config);
        offline.catalog = self.catalog.clone();
        offline.timeline = self.timeline.clone();
        offline.timeline.clear_triggered_flags();

        let mut state = self.transport.state().clone();
        state.current_time = 0.0;
        state.is_playing = false;
        offline.transport = TransportClock::new(state, self.transport.mode());

        offline.play();
        offline.tick(0.0);

        let length = offline.transport.state().timeline_length();
        let mut t = 0.0;
        while t + BOUNCE_TICK < length {
            handle.advance(BOUNCE_TICK);
            offline.tick(BOUNCE_TICK);
            t += BOUNCE_TICK;
        }

        handle.mixdown()
    }

    /// Bounce to a 16-bit stereo WAV file
    pub fn bounce_to_wav(
        &self,
        path: impl AsRef<std::path::Path>,
        sample_rate: f32,
    ) -> Result<usize, StudioError> {
        let frames = self.bounce(sample_rate);
        write_wav(path, &frames, sample_rate)?;
        Ok(frames.len())
    }
}
