mod client;
mod consumer;

pub use client::{MqttBus, MqttConfig};
pub use consumer::spawn_consumer;
