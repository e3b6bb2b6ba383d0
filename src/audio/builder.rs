// Graph builder - turns resolved recipes into scheduled one-shot graphs
//
// `trigger` never fails: with no active output the call is a no-op and a
// single warning notice is posted for the whole inactive period.

use crate::audio::graph::OneShotGraph;
use crate::audio::sink::{DeviceError, OutputSink};
use crate::messaging::channels::Notifier;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::synth::recipe::SynthesisRecipe;

pub struct GraphBuilder {
    sink: Box<dyn OutputSink>,
    notifier: Notifier,
    inactive_warned: bool,
}

impl GraphBuilder {
    pub fn new(sink: Box<dyn OutputSink>, notifier: Notifier) -> Self {
        Self {
            sink,
            notifier,
            inactive_warned: false,
        }
    }

    /// Acquire or resume the output; call only from a user gesture
    ///
    /// Failures are reported as a notice and returned.
    pub fn activate(&mut self) -> Result<(), DeviceError> {
        match self.sink.activate() {
            Ok(()) => {
                self.inactive_warned = false;
                Ok(())
            }
            Err(e) => {
                self.notifier.post(Notification::warning(
                    NotificationCategory::Audio,
                    format!("Audio output unavailable: {e}"),
                ));
                Err(e)
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.sink.is_active()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sink.sample_rate()
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.sink.set_master_volume(volume);
    }

    /// Build a fresh graph for `recipe` and schedule it
    ///
    /// `start_offset` is seconds from now. Returns whether the graph was
    /// handed to the output.
    pub fn trigger(
        &mut self,
        label: &str,
        recipe: &SynthesisRecipe,
        volume: f32,
        start_offset: f32,
        pan: f32,
    ) -> bool {
        if !self.sink.is_active() {
            if !self.inactive_warned {
                self.inactive_warned = true;
                self.notifier.post(Notification::warning(
                    NotificationCategory::Audio,
                    "Audio output is not active; sounds will be silent",
                ));
            }
            tracing::debug!(label, "Trigger dropped, output inactive");
            return false;
        }

        let graph = OneShotGraph::build(
            label,
            recipe,
            volume,
            start_offset,
            pan,
            self.sink.sample_rate(),
        );

        match self.sink.submit(graph) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(label, error = %e, "Trigger dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::offline::OfflineSink;
    use crate::messaging::channels::drain;
    use crate::synth::resolve;

    #[test]
    fn test_inactive_trigger_warns_once() {
        let (notifier, mut rx) = Notifier::channel(16);
        let sink = OfflineSink::unavailable(8000.0);
        let handle = sink.handle();
        let mut builder = GraphBuilder::new(Box::new(sink), notifier);
        let (recipe, volume) = resolve("weapons", "laser_fire");

        for _ in 0..10 {
            assert!(!builder.trigger("laser_fire", &recipe, volume, 0.0, 0.0));
        }
        assert_eq!(handle.trigger_count(), 0);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn test_activation_failure_is_reported_not_fatal() {
        let (notifier, mut rx) = Notifier::channel(16);
        let mut builder = GraphBuilder::new(Box::new(OfflineSink::unavailable(8000.0)), notifier);

        assert!(builder.activate().is_err());
        assert!(!builder.is_active());
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].category, NotificationCategory::Audio);
    }

    #[test]
    fn test_warning_rearms_after_reactivation() {
        let (notifier, mut rx) = Notifier::channel(16);
        let sink = OfflineSink::new(8000.0);
        let handle = sink.handle();
        let mut builder = GraphBuilder::new(Box::new(sink), notifier);
        let (recipe, volume) = resolve("ui", "ui_click");

        builder.trigger("ui_click", &recipe, volume, 0.0, 0.0);
        builder.activate().unwrap();
        assert!(builder.trigger("ui_click", &recipe, volume, 0.0, 0.0));

        handle.set_available(false);
        builder.trigger("ui_click", &recipe, volume, 0.0, 0.0);
        builder.trigger("ui_click", &recipe, volume, 0.0, 0.0);

        // One warning per inactive period
        assert_eq!(drain(&mut rx).len(), 2);
        assert_eq!(handle.trigger_count(), 1);
    }

    #[test]
    fn test_each_trigger_builds_a_new_graph() {
        let (notifier, _rx) = Notifier::channel(16);
        let sink = OfflineSink::new(8000.0);
        let handle = sink.handle();
        let mut builder = GraphBuilder::new(Box::new(sink), notifier);
        builder.activate().unwrap();

        let (recipe, volume) = resolve("ui", "ui_click");
        builder.trigger("a", &recipe, volume, 0.0, -1.0);
        builder.trigger("b", &recipe, volume * 0.5, 0.1, 1.0);

        let triggers = handle.triggers();
        assert_eq!(triggers.len(), 2);
        assert!((triggers[1].gain - volume * 0.5).abs() < 1e-6);
        assert_eq!(triggers[1].starts_at, 800);
        assert!(triggers[0].pan_gains.0 > triggers[0].pan_gains.1);
    }
}
