// Device output - cpal stream fed with one-shot graphs
//
// # Format Support
//
// The stream is opened in the device's preferred sample format (F32, I16 or
// U16). Graphs render f32 internally; conversion happens when writing the
// interleaved output buffer through cpal's `FromSample<f32>`.
//
// # Acquisition
//
// Nothing is opened until `activate()`, which callers only invoke from a
// user gesture. A failed acquisition leaves the output inactive and the next
// gesture tries again. A stream error flips the status to Error and posts a
// notice; the next `activate()` reopens the device.
//
// # Voice Limit
//
// At most MAX_ACTIVE_GRAPHS graphs sound at once. The callback never frees
// memory: graphs that finish, or arrive while the limit is reached, travel
// back over a return ring and are dropped by the control thread on its next
// submit. Rejected graphs are counted so the control side can warn.
//
// # Stream Limitations
//
// On macOS (CoreAudio) the Stream is neither Send nor Sync, so `CpalOutput`
// stays on the thread that created it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};

use crate::audio::dsp_utils::{OnePoleSmoother, flush_denormals_to_zero, soft_clip};
use crate::audio::format_conversion::write_stereo_to_interleaved_frame;
use crate::audio::graph::OneShotGraph;
use crate::audio::sink::{AtomicDeviceStatus, DeviceError, DeviceStatus, OutputSink};
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, GraphReturnConsumer, GraphReturnProducer, Notifier,
    create_command_channel, create_graph_return_channel,
};
use crate::messaging::command::EngineCommand;
use crate::messaging::notification::{Notification, NotificationCategory};

/// Graphs sounding at once; extra triggers are rejected in the callback
pub const MAX_ACTIVE_GRAPHS: usize = 64;

/// Master volume smoothing (ms)
const VOLUME_SMOOTHING_MS: f32 = 10.0;

/// Callback side of the voice pool
///
/// Nothing here allocates or frees in normal operation: the active list is
/// preallocated and graphs leave it through the return ring.
pub struct GraphMixer {
    active: Vec<Box<OneShotGraph>>,
    retired: GraphReturnProducer,
    rejected: Arc<AtomicUsize>,
}

/// Control side of the voice pool
pub struct GraphReclaimer {
    retired: GraphReturnConsumer,
    rejected: Arc<AtomicUsize>,
}

/// Create a mixer and its reclaimer
///
/// The return ring holds every graph that can be in flight between two
/// reclaims: the active ones plus a full command queue.
pub fn graph_mixer(command_capacity: usize) -> (GraphMixer, GraphReclaimer) {
    let (tx, rx) = create_graph_return_channel(MAX_ACTIVE_GRAPHS + command_capacity.max(1));
    let rejected = Arc::new(AtomicUsize::new(0));
    (
        GraphMixer {
            active: Vec::with_capacity(MAX_ACTIVE_GRAPHS),
            retired: tx,
            rejected: Arc::clone(&rejected),
        },
        GraphReclaimer {
            retired: rx,
            rejected,
        },
    )
}

impl GraphMixer {
    /// Start `graph`, or hand it straight back when the voice limit is reached
    pub fn accept(&mut self, graph: Box<OneShotGraph>) {
        if self.active.len() < MAX_ACTIVE_GRAPHS {
            self.active.push(graph);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            self.retire(graph);
        }
    }

    /// Sum one stereo frame over every active graph
    #[inline]
    pub fn mix_frame(&mut self) -> (f32, f32) {
        let (mut left, mut right) = (0.0f32, 0.0f32);
        for graph in self.active.iter_mut() {
            let (l, r) = graph.next_frame();
            left += l;
            right += r;
        }
        (left, right)
    }

    /// Move finished graphs to the return ring
    pub fn collect_finished(&mut self) {
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].is_finished() {
                let graph = self.active.swap_remove(i);
                self.retire(graph);
            } else {
                i += 1;
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn retire(&mut self, graph: Box<OneShotGraph>) {
        // Only fails if the control side stopped reclaiming; the graph is then freed here
        if let Err(graph) = self.retired.try_push(graph) {
            drop(graph);
        }
    }
}

impl GraphReclaimer {
    /// Free every graph handed back so far
    ///
    /// Returns how many graphs were freed and how many of them were rejected
    /// at the voice limit since the previous call.
    pub fn reclaim(&mut self) -> (usize, usize) {
        let mut freed = 0;
        while let Some(graph) = self.retired.try_pop() {
            drop(graph);
            freed += 1;
        }
        (freed, self.rejected.swap(0, Ordering::Relaxed))
    }
}

struct OpenStream {
    _stream: Stream,
    sample_rate: f32,
    commands: CommandProducer,
    reclaimer: GraphReclaimer,
}

impl OpenStream {
    /// Free returned graphs and report rejected ones
    fn reclaim(&mut self, notifier: &Notifier) {
        let (freed, rejected) = self.reclaimer.reclaim();
        if freed > 0 {
            tracing::trace!(freed, "Reclaimed finished graphs");
        }
        if rejected > 0 {
            notifier.post(Notification::warning(
                NotificationCategory::Audio,
                format!(
                    "{rejected} sound(s) skipped: more than {MAX_ACTIVE_GRAPHS} playing at once"
                ),
            ));
        }
    }
}

/// Default cpal output device, opened lazily
pub struct CpalOutput {
    open: Option<OpenStream>,
    status: AtomicDeviceStatus,
    notifier: Notifier,
    command_capacity: usize,
    fallback_sample_rate: f32,
    master_volume: f32,
}

impl CpalOutput {
    pub fn new(notifier: Notifier, command_capacity: usize, fallback_sample_rate: f32) -> Self {
        Self {
            open: None,
            status: AtomicDeviceStatus::default(),
            notifier,
            command_capacity: command_capacity.max(1),
            fallback_sample_rate,
            master_volume: 0.8,
        }
    }

    pub fn status(&self) -> DeviceStatus {
        self.status.get()
    }

    fn open_stream(&self) -> Result<OpenStream, DeviceError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(DeviceError::NoDevice)?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            "Opening audio output"
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| DeviceError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        tracing::debug!(?sample_format, sample_rate, channels, "Audio output config");

        let (mut commands, commands_rx) = create_command_channel(self.command_capacity);
        let _ = commands.try_push(EngineCommand::SetMasterVolume(self.master_volume));
        let (mixer, reclaimer) = graph_mixer(self.command_capacity);
        let callback = (commands_rx, mixer);

        let stream = match sample_format {
            SampleFormat::F32 => {
                self.build_stream::<f32>(&device, &config, channels, sample_rate, callback)
            }
            SampleFormat::I16 => {
                self.build_stream::<i16>(&device, &config, channels, sample_rate, callback)
            }
            SampleFormat::U16 => {
                self.build_stream::<u16>(&device, &config, channels, sample_rate, callback)
            }
            other => return Err(DeviceError::UnsupportedFormat(format!("{other:?}"))),
        }?;

        stream.play().map_err(|e| DeviceError::Play(e.to_string()))?;

        Ok(OpenStream {
            _stream: stream,
            sample_rate,
            commands,
            reclaimer,
        })
    }

    /// Build the output stream for sample type `T`
    fn build_stream<T>(
        &self,
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        sample_rate: f32,
        (mut commands, mut mixer): (CommandConsumer, GraphMixer),
    ) -> Result<Stream, DeviceError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let mut master = OnePoleSmoother::new(self.master_volume, VOLUME_SMOOTHING_MS, sample_rate);
        let mut master_target = self.master_volume;

        let status = self.status.clone();
        let notifier = self.notifier.clone();

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocation, no I/O, no blocking locks past this point
                    while let Some(command) = commands.try_pop() {
                        match command {
                            EngineCommand::Play(graph) => mixer.accept(graph),
                            EngineCommand::SetMasterVolume(volume) => {
                                master_target = volume.clamp(0.0, 1.0);
                            }
                        }
                    }

                    for frame in data.chunks_mut(channels) {
                        let (mut left, mut right) = mixer.mix_frame();

                        let gain = master.process(master_target);
                        left = soft_clip(flush_denormals_to_zero(left) * gain);
                        right = soft_clip(flush_denormals_to_zero(right) * gain);

                        write_stereo_to_interleaved_frame((left, right), frame);
                    }

                    mixer.collect_finished();
                },
                move |err| {
                    status.set(DeviceStatus::Error);
                    notifier.post(Notification::error(
                        NotificationCategory::Audio,
                        format!("Audio stream error: {err}"),
                    ));
                },
                None,
            )
            .map_err(|e| DeviceError::Stream(e.to_string()))
    }
}

impl OutputSink for CpalOutput {
    fn activate(&mut self) -> Result<(), DeviceError> {
        if self.open.is_some() && self.status.get() == DeviceStatus::Active {
            return Ok(());
        }

        // Drop a failed stream before reopening
        self.open = None;
        self.status.set(DeviceStatus::Connecting);

        match self.open_stream() {
            Ok(open) => {
                tracing::info!(sample_rate = open.sample_rate, "Audio output active");
                self.open = Some(open);
                self.status.set(DeviceStatus::Active);
                Ok(())
            }
            Err(e) => {
                self.status.set(DeviceStatus::Inactive);
                Err(e)
            }
        }
    }

    fn is_active(&self) -> bool {
        self.open.is_some() && self.status.get() == DeviceStatus::Active
    }

    fn sample_rate(&self) -> f32 {
        self.open
            .as_ref()
            .map_or(self.fallback_sample_rate, |open| open.sample_rate)
    }

    fn submit(&mut self, graph: OneShotGraph) -> Result<(), DeviceError> {
        if !self.is_active() {
            return Err(DeviceError::NotActive);
        }
        let open = self.open.as_mut().ok_or(DeviceError::NotActive)?;
        open.reclaim(&self.notifier);
        open.commands
            .try_push(EngineCommand::Play(Box::new(graph)))
            .map_err(|_| DeviceError::QueueFull)
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        if let Some(open) = self.open.as_mut() {
            let _ = open
                .commands
                .try_push(EngineCommand::SetMasterVolume(self.master_volume));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_starts_inactive() {
        let (notifier, _rx) = Notifier::channel(4);
        let mut output = CpalOutput::new(notifier, 16, 44100.0);

        assert!(!output.is_active());
        assert_eq!(output.status(), DeviceStatus::Inactive);
        assert_eq!(output.sample_rate(), 44100.0);

        let graph = OneShotGraph::build(
            "x",
            &crate::synth::resolve("ui", "ui_click").0,
            1.0,
            0.0,
            0.0,
            44100.0,
        );
        assert!(matches!(output.submit(graph), Err(DeviceError::NotActive)));
    }

    fn short_graph() -> Box<OneShotGraph> {
        let (recipe, volume) = crate::synth::resolve("ui", "ui_click");
        Box::new(OneShotGraph::build("click", &recipe, volume, 0.0, 0.0, 8000.0))
    }

    #[test]
    fn test_mixer_rejects_past_voice_limit() {
        let (mut mixer, mut reclaimer) = graph_mixer(16);
        for _ in 0..MAX_ACTIVE_GRAPHS + 1 {
            mixer.accept(short_graph());
        }
        assert_eq!(mixer.active_count(), MAX_ACTIVE_GRAPHS);

        // The rejected graph came back for freeing and was counted
        assert_eq!(reclaimer.reclaim(), (1, 1));
        // The count resets once read
        assert_eq!(reclaimer.reclaim(), (0, 0));
    }

    #[test]
    fn test_mixer_returns_finished_graphs() {
        let (mut mixer, mut reclaimer) = graph_mixer(16);
        mixer.accept(short_graph());
        mixer.accept(short_graph());

        let mut peak = 0.0f32;
        for _ in 0..8000 {
            let (l, r) = mixer.mix_frame();
            peak = peak.max(l.abs()).max(r.abs());
        }
        assert!(peak > 0.0);

        mixer.collect_finished();
        assert_eq!(mixer.active_count(), 0);
        assert_eq!(reclaimer.reclaim(), (2, 0));
        assert_eq!(mixer.mix_frame(), (0.0, 0.0));
    }

    #[test]
    fn test_collect_keeps_playing_graphs() {
        let (mut mixer, mut reclaimer) = graph_mixer(4);
        mixer.accept(short_graph());
        mixer.mix_frame();
        mixer.collect_finished();

        assert_eq!(mixer.active_count(), 1);
        assert_eq!(reclaimer.reclaim(), (0, 0));
    }
}
