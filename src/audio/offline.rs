// Offline sink - deterministic stand-in for the audio device
//
// The caller drives a sample cursor with `OfflineHandle::advance`; every
// submitted graph is pinned to the cursor position at submission time and
// can later be mixed down to stereo frames.

use std::cell::RefCell;
use std::rc::Rc;

use crate::audio::dsp_utils::soft_clip;
use crate::audio::graph::OneShotGraph;
use crate::audio::sink::{DeviceError, OutputSink};

/// A graph accepted by the sink
#[derive(Debug, Clone)]
pub struct RecordedTrigger {
    pub label: String,
    /// Cursor position when the graph was submitted
    pub submitted_at: u64,
    /// Absolute sample where the graph starts sounding
    pub starts_at: u64,
    pub gain: f32,
    pub pan_gains: (f32, f32),
    graph: OneShotGraph,
}

#[derive(Debug)]
struct OfflineState {
    sample_rate: f32,
    /// Seconds advanced so far; `cursor` is derived from it
    elapsed: f64,
    cursor: u64,
    active: bool,
    available: bool,
    activations: usize,
    master_volume: f32,
    triggers: Vec<RecordedTrigger>,
}

/// Output sink that records instead of playing
pub struct OfflineSink {
    state: Rc<RefCell<OfflineState>>,
}

/// Inspection and clock control for an `OfflineSink`
#[derive(Clone)]
pub struct OfflineHandle {
    state: Rc<RefCell<OfflineState>>,
}

impl OfflineSink {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_availability(sample_rate, true)
    }

    /// A sink whose activation always fails, like a machine without audio output
    pub fn unavailable(sample_rate: f32) -> Self {
        Self::with_availability(sample_rate, false)
    }

    fn with_availability(sample_rate: f32, available: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(OfflineState {
                sample_rate,
                elapsed: 0.0,
                cursor: 0,
                active: false,
                available,
                activations: 0,
                master_volume: 1.0,
                triggers: Vec::new(),
            })),
        }
    }

    pub fn handle(&self) -> OfflineHandle {
        OfflineHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl OutputSink for OfflineSink {
    fn activate(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        if !state.available {
            return Err(DeviceError::NoDevice);
        }
        if !state.active {
            state.active = true;
            state.activations += 1;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    fn sample_rate(&self) -> f32 {
        self.state.borrow().sample_rate
    }

    fn submit(&mut self, graph: OneShotGraph) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        if !state.active {
            return Err(DeviceError::NotActive);
        }
        let submitted_at = state.cursor;
        state.triggers.push(RecordedTrigger {
            label: graph.label().to_string(),
            submitted_at,
            starts_at: submitted_at + graph.delay_samples(),
            gain: graph.gain(),
            pan_gains: graph.pan_gains(),
            graph,
        });
        Ok(())
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.state.borrow_mut().master_volume = volume.clamp(0.0, 1.0);
    }
}

impl OfflineHandle {
    /// Move the cursor forward
    pub fn advance(&self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        state.elapsed += seconds.max(0.0);
        state.cursor = (state.elapsed * state.sample_rate as f64).round() as u64;
    }

    pub fn cursor(&self) -> u64 {
        self.state.borrow().cursor
    }

    pub fn sample_rate(&self) -> f32 {
        self.state.borrow().sample_rate
    }

    /// Successful inactive -> active transitions
    pub fn activations(&self) -> usize {
        self.state.borrow().activations
    }

    /// Simulate the device going away (or coming back)
    pub fn set_available(&self, available: bool) {
        let mut state = self.state.borrow_mut();
        state.available = available;
        if !available {
            state.active = false;
        }
    }

    pub fn trigger_count(&self) -> usize {
        self.state.borrow().triggers.len()
    }

    pub fn triggers(&self) -> Vec<RecordedTrigger> {
        self.state.borrow().triggers.clone()
    }

    /// Labels of every accepted graph, in submission order
    pub fn labels(&self) -> Vec<String> {
        self.state
            .borrow()
            .triggers
            .iter()
            .map(|t| t.label.clone())
            .collect()
    }

    /// Sum every recorded graph at its position
    ///
    /// The result runs until the last graph finishes; master volume and
    /// soft clipping are applied the way the device output does.
    pub fn mixdown(&self) -> Vec<(f32, f32)> {
        let state = self.state.borrow();
        let len = state
            .triggers
            .iter()
            .map(|t| t.submitted_at + t.graph.total_samples())
            .max()
            .unwrap_or(0) as usize;

        let mut frames = vec![(0.0f32, 0.0f32); len];
        for trigger in &state.triggers {
            let start = trigger.submitted_at as usize;
            let rendered = trigger.graph.clone().render();
            for (slot, (l, r)) in frames[start..].iter_mut().zip(rendered) {
                slot.0 += l;
                slot.1 += r;
            }
        }

        for frame in frames.iter_mut() {
            frame.0 = soft_clip(frame.0 * state.master_volume);
            frame.1 = soft_clip(frame.1 * state.master_volume);
        }
        frames
    }
}
