/// Why an inbound lifecycle payload was rejected by the normalizer.
///
/// Always non-fatal: the message is dropped and ingest moves on.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("payload is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotObject,

    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("field '{0}' is not a string")]
    NotString(&'static str),
}

/// Category of a bus dispatch error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bus client is gone (event loop stopped, channel closed).
    Closed,
    /// Request was not accepted (queue full, invalid topic, etc.).
    Rejected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Closed => f.write_str("closed"),
            ErrorKind::Rejected => f.write_str("rejected"),
        }
    }
}

/// Error returned by fire-and-forget bus requests (subscribe, publish,
/// unsubscribe).
///
/// Carries an `ErrorKind` and the topic the request was about, so callers
/// can log it without extra context.
#[derive(Clone)]
pub struct BusError {
    kind: ErrorKind,
    topic: String,
    message: String,
}

impl BusError {
    pub fn closed(topic: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Closed, topic: topic.into(), message: msg.into() }
    }

    pub fn rejected(topic: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Rejected, topic: topic.into(), message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.topic, self.message)
    }
}

impl std::fmt::Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.topic, self.message)
    }
}

impl std::error::Error for BusError {}
