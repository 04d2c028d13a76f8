use std::sync::Arc;

use serde::Deserialize;

use net_state_api::Bus;

use crate::error::RelayError;

/// Команда viewer'а для шины.
///
/// Wire-формат: `{"action":"publish","topic":"…","message":"…"}`,
/// `{"action":"subscribe","topic":"…"}`, `{"action":"unsubscribe_all"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RelayCommand {
    Publish { topic: String, message: String },
    Subscribe { topic: String },
    UnsubscribeAll,
}

impl RelayCommand {
    /// Проверить форму команды. Других проверок нет.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Пробрасывает команды viewer'ов в шину без изменений.
/// Состояния не держит и registry не трогает.
#[derive(Clone)]
pub struct CommandRelay {
    bus: Arc<dyn Bus>,
}

impl CommandRelay {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    pub fn forward(&self, command: &RelayCommand) -> Result<(), RelayError> {
        match command {
            RelayCommand::Publish { topic, message } => self.bus.publish(topic, message)?,
            RelayCommand::Subscribe { topic } => self.bus.subscribe(topic)?,
            RelayCommand::UnsubscribeAll => self.bus.unsubscribe_all()?,
        }
        Ok(())
    }

    /// Разобрать текстовую команду и переслать её.
    pub fn handle_text(&self, text: &str) -> Result<RelayCommand, RelayError> {
        let command = RelayCommand::parse(text)?;
        self.forward(&command)?;
        Ok(command)
    }
}
