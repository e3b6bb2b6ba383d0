// Output sinks - where built graphs go to be heard
//
// A sink starts inactive. `activate` is only called in response to a user
// gesture (preview, play); until then triggers are dropped by the builder.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::audio::graph::OneShotGraph;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Device configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build output stream: {0}")]
    Stream(String),

    #[error("Failed to start output stream: {0}")]
    Play(String),

    #[error("Audio output is not active")]
    NotActive,

    #[error("Audio command queue is full")]
    QueueFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Inactive = 0,
    Connecting = 1,
    Active = 2,
    Error = 3,
}

impl From<u8> for DeviceStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => DeviceStatus::Connecting,
            2 => DeviceStatus::Active,
            3 => DeviceStatus::Error,
            _ => DeviceStatus::Inactive,
        }
    }
}

/// Device status shared with the stream error callback
#[derive(Debug, Clone)]
pub struct AtomicDeviceStatus {
    inner: Arc<AtomicU8>,
}

impl AtomicDeviceStatus {
    pub fn new(status: DeviceStatus) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(status as u8)),
        }
    }

    pub fn get(&self) -> DeviceStatus {
        DeviceStatus::from(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, status: DeviceStatus) {
        self.inner.store(status as u8, Ordering::Relaxed);
    }
}

impl Default for AtomicDeviceStatus {
    fn default() -> Self {
        Self::new(DeviceStatus::Inactive)
    }
}

/// Audio output the graph builder schedules into
pub trait OutputSink {
    /// Acquire or resume the output. Idempotent once active.
    fn activate(&mut self) -> Result<(), DeviceError>;

    fn is_active(&self) -> bool;

    /// Sample rate graphs must be built for
    fn sample_rate(&self) -> f32;

    /// Hand a built graph to the output
    fn submit(&mut self, graph: OneShotGraph) -> Result<(), DeviceError>;

    /// Master gain, 0.0 to 1.0
    fn set_master_volume(&mut self, _volume: f32) {}
}
