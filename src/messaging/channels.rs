// Lock-free channels between the control thread and the audio callback

use std::sync::{Arc, Mutex};

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Producer, Split};

use crate::audio::graph::OneShotGraph;
use crate::messaging::command::EngineCommand;
use crate::messaging::notification::{Notification, NotificationLevel};

pub type CommandProducer = ringbuf::HeapProd<EngineCommand>;
pub type CommandConsumer = ringbuf::HeapCons<EngineCommand>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<EngineCommand>::new(capacity);
    rb.split()
}

/// Audio callback -> control thread: graphs handed back for freeing
pub type GraphReturnProducer = ringbuf::HeapProd<Box<OneShotGraph>>;
pub type GraphReturnConsumer = ringbuf::HeapCons<Box<OneShotGraph>>;

pub fn create_graph_return_channel(
    capacity: usize,
) -> (GraphReturnProducer, GraphReturnConsumer) {
    let rb = HeapRb::<Box<OneShotGraph>>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Shared sending side of the notification channel
///
/// Every notice is mirrored to the log. Posting never blocks: if the
/// producer is busy or the ring is full the notice only reaches the log.
#[derive(Clone)]
pub struct Notifier {
    tx: Arc<Mutex<NotificationProducer>>,
}

impl Notifier {
    pub fn new(tx: NotificationProducer) -> Self {
        Self {
            tx: Arc::new(Mutex::new(tx)),
        }
    }

    /// Create a notifier together with its receiving side
    pub fn channel(capacity: usize) -> (Self, NotificationConsumer) {
        let (tx, rx) = create_notification_channel(capacity);
        (Self::new(tx), rx)
    }

    pub fn post(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => {
                tracing::info!(category = ?notification.category, "{}", notification.message)
            }
            NotificationLevel::Warning => {
                tracing::warn!(category = ?notification.category, "{}", notification.message)
            }
            NotificationLevel::Error => {
                tracing::error!(category = ?notification.category, "{}", notification.message)
            }
        }

        if let Ok(mut tx) = self.tx.try_lock() {
            if tx.try_push(notification).is_err() {
                tracing::debug!("Notification ring full, notice dropped");
            }
        }
    }
}

/// Pop everything currently queued
pub fn drain(rx: &mut NotificationConsumer) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Some(notification) = rx.try_pop() {
        out.push(notification);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::notification::NotificationCategory;

    #[test]
    fn test_notifier_delivers_in_order() {
        let (notifier, mut rx) = Notifier::channel(8);
        notifier.post(Notification::info(NotificationCategory::Generic, "first"));
        notifier.clone().post(Notification::warning(NotificationCategory::Audio, "second"));

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].message, "first");
        assert_eq!(notices[1].level, NotificationLevel::Warning);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_full_ring_drops_without_blocking() {
        let (notifier, mut rx) = Notifier::channel(2);
        for i in 0..5 {
            notifier.post(Notification::info(NotificationCategory::Generic, format!("n{i}")));
        }
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[test]
    fn test_command_channel_capacity() {
        let (mut tx, mut rx) = create_command_channel(1);
        assert!(tx.try_push(EngineCommand::SetMasterVolume(0.5)).is_ok());
        assert!(tx.try_push(EngineCommand::SetMasterVolume(0.7)).is_err());
        assert!(matches!(rx.try_pop(), Some(EngineCommand::SetMasterVolume(v)) if v == 0.5));
    }
}
