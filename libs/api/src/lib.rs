pub mod bus;
pub mod error;
pub mod event;

use serde::{Deserialize, Serialize};

pub use bus::{Bus, BusPublisher, BusSubscriber, MessageHandler};
pub use error::{BusError, ErrorKind, ParseError};
pub use event::{normalize, NormalizedEvent};

// ════════════════════════════════════════════════════════════════
//  Lifecycle commands
// ════════════════════════════════════════════════════════════════

/// Класс lifecycle-команды: добавляет узел, удаляет узел или неизвестна.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmdKind {
    Start,
    Stop,
    Unknown,
}

/// Команда из lifecycle-события runtime'а (`cmd` в payload).
///
/// Неизвестные строки сохраняются как есть в `Other`. Для registry они
/// no-op, но остаются видимы в нормализованном событии.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeCmd {
    ModuleInst,
    ModuleUninst,
    PubStart,
    PubStop,
    SubStart,
    SubStop,
    RtStart,
    RtStop,
    Other(String),
}

impl NodeCmd {
    pub fn parse(s: &str) -> Self {
        match s {
            "module-inst" => NodeCmd::ModuleInst,
            "module-uninst" => NodeCmd::ModuleUninst,
            "pub-start" => NodeCmd::PubStart,
            "pub-stop" => NodeCmd::PubStop,
            "sub-start" => NodeCmd::SubStart,
            "sub-stop" => NodeCmd::SubStop,
            "rt-start" => NodeCmd::RtStart,
            "rt-stop" => NodeCmd::RtStop,
            other => NodeCmd::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeCmd::ModuleInst => "module-inst",
            NodeCmd::ModuleUninst => "module-uninst",
            NodeCmd::PubStart => "pub-start",
            NodeCmd::PubStop => "pub-stop",
            NodeCmd::SubStart => "sub-start",
            NodeCmd::SubStop => "sub-stop",
            NodeCmd::RtStart => "rt-start",
            NodeCmd::RtStop => "rt-stop",
            NodeCmd::Other(s) => s,
        }
    }

    pub fn kind(&self) -> CmdKind {
        match self {
            NodeCmd::ModuleInst | NodeCmd::PubStart | NodeCmd::SubStart | NodeCmd::RtStart => {
                CmdKind::Start
            }
            NodeCmd::ModuleUninst | NodeCmd::PubStop | NodeCmd::SubStop | NodeCmd::RtStop => {
                CmdKind::Stop
            }
            NodeCmd::Other(_) => CmdKind::Unknown,
        }
    }
}

impl std::fmt::Display for NodeCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeCmd {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeCmd {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(NodeCmd::parse(&raw))
    }
}

// ════════════════════════════════════════════════════════════════
//  Node records
// ════════════════════════════════════════════════════════════════

/// Запись об узле в registry. Создаётся из start-события и больше
/// не изменяется.
///
/// Сериализуется плоским объектом: `{"id", "cmd", "topic", ...extra}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub cmd: NodeCmd,
    /// Topic события: значение из payload, если оно там есть,
    /// иначе topic, на который пришло сообщение.
    pub topic: String,
    /// Остальные поля payload'а, без изменений.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Элемент snapshot'а: `{"data": NodeRecord}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub data: NodeRecord,
}

impl From<NodeRecord> for NodeEntry {
    fn from(data: NodeRecord) -> Self {
        Self { data }
    }
}
