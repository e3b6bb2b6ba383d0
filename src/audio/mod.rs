// Audio - signal graphs, output sinks and offline rendering

pub mod builder;
pub mod dsp_utils;
pub mod engine;
pub mod export;
pub mod format_conversion;
pub mod graph;
pub mod offline;
pub mod sink;

pub use builder::GraphBuilder;
pub use engine::CpalOutput;
pub use graph::OneShotGraph;
pub use offline::{OfflineHandle, OfflineSink};
pub use sink::{DeviceError, OutputSink};
