// Control thread -> audio callback commands

use crate::audio::graph::OneShotGraph;

#[derive(Debug)]
pub enum EngineCommand {
    /// Start a freshly built one-shot graph
    Play(Box<OneShotGraph>),
    /// Master gain, 0.0 to 1.0
    SetMasterVolume(f32),
}
