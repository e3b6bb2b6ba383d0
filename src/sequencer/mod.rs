// Sequencer - timeline model, transport clock, pointer gestures and cue emission

pub mod emitter;
pub mod interaction;
pub mod timeline;
pub mod transport;

pub use emitter::{AudioCueRecord, emit, render_cue_table};
pub use interaction::{DragPayload, Gesture, GestureError, GesturePreview, InteractionController};
pub use timeline::{
    Clip, ClipId, ClipProperties, ResizeEdge, TimeScale, TimelineModel, Track, TrackId,
};
pub use transport::{ClipTrigger, SchedulingMode, TransportClock, TransportState};
