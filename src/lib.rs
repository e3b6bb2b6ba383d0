// Sound Studio - Library exports for the CLI, tests and benchmarks

pub mod audio;
pub mod catalog;
pub mod config;
pub mod messaging;
pub mod project;
pub mod sequencer;
pub mod session;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::{CpalOutput, DeviceError, GraphBuilder, OfflineHandle, OfflineSink, OutputSink};
pub use catalog::{LookupError, SoundCatalog, SoundDefinition};
pub use config::{ConfigError, StudioConfig};
pub use messaging::notification::{Notification, NotificationCategory, NotificationLevel};
pub use project::{ProjectError, SessionDocument};
pub use sequencer::{
    AudioCueRecord, Clip, ClipId, DragPayload, InteractionController, ResizeEdge, SchedulingMode,
    TimelineModel, Track, TrackId, TransportState,
};
pub use session::{Session, StudioError};
pub use synth::SynthesisRecipe;
