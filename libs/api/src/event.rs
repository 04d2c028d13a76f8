use serde_json::{Map, Value};

use crate::{CmdKind, NodeCmd, NodeRecord, ParseError};

/// Lifecycle-событие после разбора payload'а.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub id: String,
    pub cmd: NodeCmd,
    /// Topic, на который пришло сообщение.
    pub topic: String,
    /// Строковое поле `topic` из самого payload'а, если было.
    pub payload_topic: Option<String>,
    /// Все остальные поля payload'а. Нестроковый `topic` остаётся здесь как есть.
    pub fields: Map<String, Value>,
}

impl NormalizedEvent {
    pub fn kind(&self) -> CmdKind {
        self.cmd.kind()
    }

    /// Собрать запись для registry. `topic` из payload'а имеет приоритет
    /// над topic'ом доставки; нестроковое значение хранится своим JSON-текстом.
    pub fn into_record(mut self) -> NodeRecord {
        let topic = match (self.payload_topic, self.fields.remove("topic")) {
            (Some(t), _) => t,
            (None, Some(Value::Null) | None) => self.topic,
            (None, Some(raw)) => raw.to_string(),
        };
        NodeRecord {
            id: self.id,
            cmd: self.cmd,
            topic,
            extra: self.fields,
        }
    }
}

/// Разобрать сырой payload, пришедший на `topic`.
///
/// Payload должен быть JSON-объектом со строковыми `id` и `cmd`.
/// Нестроковый `topic` в payload'е не теряется: он остаётся в `fields`.
pub fn normalize(topic: &str, payload: &[u8]) -> Result<NormalizedEvent, ParseError> {
    let value: Value = serde_json::from_slice(payload)?;
    let Value::Object(mut fields) = value else {
        return Err(ParseError::NotObject);
    };

    let id = take_string(&mut fields, "id")?;
    let cmd = take_string(&mut fields, "cmd")?;
    let payload_topic = match fields.remove("topic") {
        Some(Value::String(t)) => Some(t),
        Some(other) => {
            fields.insert("topic".into(), other);
            None
        }
        None => None,
    };

    Ok(NormalizedEvent {
        id,
        cmd: NodeCmd::parse(&cmd),
        topic: topic.to_string(),
        payload_topic,
        fields,
    })
}

fn take_string(fields: &mut Map<String, Value>, name: &'static str) -> Result<String, ParseError> {
    match fields.remove(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ParseError::NotString(name)),
        None => Err(ParseError::MissingField(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_event_with_extra_fields() {
        let ev = normalize(
            "realm/proc",
            br#"{"id":"m1","cmd":"module-inst","name":"arena-demo","parent":"r1","cpu":0.5}"#,
        )
        .unwrap();
        assert_eq!(ev.id, "m1");
        assert_eq!(ev.cmd, NodeCmd::ModuleInst);
        assert_eq!(ev.kind(), CmdKind::Start);
        assert_eq!(ev.topic, "realm/proc");
        assert_eq!(ev.payload_topic, None);
        assert_eq!(ev.fields.len(), 3);
        assert_eq!(ev.fields["cpu"], serde_json::json!(0.5));

        let rec = ev.into_record();
        assert_eq!(rec.topic, "realm/proc");
        assert!(!rec.extra.contains_key("id"));
        assert!(!rec.extra.contains_key("cmd"));
    }

    #[test]
    fn payload_topic_wins_in_record() {
        let ev = normalize("realm/proc", br#"{"id":"m1","cmd":"module-inst","topic":"x"}"#).unwrap();
        assert_eq!(ev.topic, "realm/proc");
        assert_eq!(ev.payload_topic.as_deref(), Some("x"));
        let rec = ev.into_record();
        assert_eq!(rec.topic, "x");
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn non_string_payload_topic_is_kept() {
        let ev = normalize("rt", br#"{"id":"a","cmd":"pub-start","topic":7}"#).unwrap();
        assert_eq!(ev.topic, "rt");
        assert_eq!(ev.payload_topic, None);
        assert_eq!(ev.fields["topic"], serde_json::json!(7));

        let rec = ev.into_record();
        assert_eq!(rec.topic, "7");
        assert!(rec.extra.is_empty());
        // one `topic` key in the flat form
        assert_eq!(
            serde_json::to_value(&rec).unwrap(),
            serde_json::json!({"id": "a", "cmd": "pub-start", "topic": "7"})
        );
    }

    #[test]
    fn structured_payload_topic_is_stored_as_json_text() {
        let ev = normalize("rt", br#"{"id":"a","cmd":"sub-start","topic":{"name":"x"}}"#).unwrap();
        assert_eq!(ev.into_record().topic, r#"{"name":"x"}"#);
    }

    #[test]
    fn null_payload_topic_uses_arrival_topic() {
        let ev = normalize("rt", br#"{"id":"a","cmd":"sub-start","topic":null}"#).unwrap();
        assert_eq!(ev.fields["topic"], serde_json::Value::Null);
        let rec = ev.into_record();
        assert_eq!(rec.topic, "rt");
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn unknown_cmd_still_normalizes() {
        let ev = normalize("rt", br#"{"id":"a","cmd":"heartbeat"}"#).unwrap();
        assert_eq!(ev.kind(), CmdKind::Unknown);
        assert_eq!(ev.cmd.as_str(), "heartbeat");
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(normalize("t", b"not json"), Err(ParseError::NotJson(_))));
        assert!(matches!(normalize("t", b"\xff\xfe"), Err(ParseError::NotJson(_))));
        assert!(matches!(normalize("t", b"[1,2]"), Err(ParseError::NotObject)));
        assert!(matches!(normalize("t", br#""id""#), Err(ParseError::NotObject)));
        assert!(matches!(
            normalize("t", br#"{"cmd":"rt-start"}"#),
            Err(ParseError::MissingField("id"))
        ));
        assert!(matches!(
            normalize("t", br#"{"id":"r1"}"#),
            Err(ParseError::MissingField("cmd"))
        ));
        assert!(matches!(
            normalize("t", br#"{"id":1,"cmd":"rt-start"}"#),
            Err(ParseError::NotString("id"))
        ));
        assert!(matches!(
            normalize("t", br#"{"id":"r1","cmd":null}"#),
            Err(ParseError::NotString("cmd"))
        ));
    }
}
