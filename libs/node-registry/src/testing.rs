use parking_lot::Mutex;

use net_state_api::{BusError, BusPublisher, BusSubscriber};

/// Bus request seen by `RecordingBus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    Subscribe(String),
    Unsubscribe(String),
    UnsubscribeAll,
    Publish(String, String),
}

/// In-memory bus that records every request; optionally rejects them all.
#[derive(Default)]
pub struct RecordingBus {
    calls: Mutex<Vec<BusCall>>,
    reject: bool,
}

impl RecordingBus {
    pub fn rejecting() -> Self {
        Self { calls: Mutex::new(Vec::new()), reject: true }
    }

    pub fn calls(&self) -> Vec<BusCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: BusCall, topic: &str) -> Result<(), BusError> {
        self.calls.lock().push(call);
        if self.reject {
            return Err(BusError::rejected(topic, "queue full"));
        }
        Ok(())
    }
}

impl BusSubscriber for RecordingBus {
    fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        self.record(BusCall::Subscribe(topic.into()), topic)
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), BusError> {
        self.record(BusCall::Unsubscribe(topic.into()), topic)
    }

    fn unsubscribe_all(&self) -> Result<(), BusError> {
        self.record(BusCall::UnsubscribeAll, "*")
    }
}

impl BusPublisher for RecordingBus {
    fn publish(&self, topic: &str, message: &str) -> Result<(), BusError> {
        self.record(BusCall::Publish(topic.into(), message.into()), topic)
    }
}
