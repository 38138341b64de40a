//! Channel wire format.
//!
//! Request bodies are built with `json!` since they are write-only; poll
//! responses are classified by [`classify`], which is pure so the poll
//! loop's decisions can be tested without any I/O.

use serde::Deserialize;
use serde_json::{Value, json};

/// A one-shot command for an app.
#[derive(Debug, Clone, PartialEq)]
pub struct PokeRequest {
    pub ship: String,
    pub app: String,
    pub mark: String,
    pub wire: String,
    pub payload: Value,
}

/// A subscription, identified by app and wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub ship: String,
    pub app: String,
    pub mark: String,
    pub wire: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}

impl SubscriptionAction {
    /// Verb carried in the query string.
    pub fn verb(self) -> &'static str {
        match self {
            SubscriptionAction::Subscribe => "PUT",
            SubscriptionAction::Unsubscribe => "DELETE",
        }
    }
}

pub(crate) fn poke_path(request: &PokeRequest) -> String {
    format!("/~/to/{}/{}", request.app, request.mark)
}

pub(crate) fn poke_body(request: &PokeRequest, session_token: &str) -> Value {
    json!({
        "oryx": session_token,
        "wire": request.wire,
        "xyro": request.payload,
    })
}

pub(crate) fn subscription_path(request: &SubscriptionRequest, action: SubscriptionAction) -> String {
    format!(
        "/~/is/{}/{}.json?{}",
        request.app,
        request.wire.trim_start_matches('/'),
        action.verb()
    )
}

pub(crate) fn subscription_body(request: &SubscriptionRequest, session_token: &str) -> Value {
    json!({
        "appl": request.app,
        "mark": request.mark,
        "wire": request.wire,
        "ship": request.ship,
        "oryx": session_token,
    })
}

pub(crate) fn poll_path(channel: &str, cursor: u64) -> String {
    format!("/~/of/{}?poll={}", channel, cursor)
}

/// What a poll response turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Keep-alive with no data.
    Heartbeat,
    /// A subscription event.
    Data {
        id: u64,
        path: String,
        payload: Value,
    },
    /// Anything else.
    ProtocolError(String),
}

#[derive(Debug, Deserialize)]
struct Heartbeat {
    #[allow(dead_code)]
    beat: bool,
}

#[derive(Debug, Deserialize)]
struct DataEvent {
    data: EventData,
    from: EventSource,
    id: u64,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct EventData {
    json: Value,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct EventSource {
    appl: String,
    path: String,
    ship: String,
}

/// Classify a poll response body.
pub fn classify(body: &str) -> PollOutcome {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return PollOutcome::ProtocolError(format!("poll body is not JSON: {}", e)),
    };

    // serde also accepts sequences for structs; only objects are valid here.
    if !value.is_object() {
        return PollOutcome::ProtocolError(format!("poll body is not an object: {}", value));
    }

    if serde_json::from_value::<Heartbeat>(value.clone()).is_ok() {
        return PollOutcome::Heartbeat;
    }

    match serde_json::from_value::<DataEvent>(value) {
        Ok(event) => PollOutcome::Data {
            id: event.id,
            path: event.from.path,
            payload: event.data.json,
        },
        Err(e) => PollOutcome::ProtocolError(format!("unrecognized poll body: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription() -> SubscriptionRequest {
        SubscriptionRequest {
            ship: "zod".to_string(),
            app: "chat".to_string(),
            mark: "json".to_string(),
            wire: "/messages".to_string(),
        }
    }

    #[test]
    fn heartbeat() {
        assert_eq!(classify(r#"{"beat":true}"#), PollOutcome::Heartbeat);
        assert_eq!(classify(r#"{"beat":false}"#), PollOutcome::Heartbeat);
    }

    #[test]
    fn data_event() {
        let body = r#"{
            "data": {"json": {"text": "hi"}},
            "from": {"appl": "chat", "path": "/messages", "ship": "zod"},
            "id": 7,
            "type": "rush"
        }"#;
        assert_eq!(
            classify(body),
            PollOutcome::Data {
                id: 7,
                path: "/messages".to_string(),
                payload: json!({"text": "hi"}),
            }
        );
    }

    #[test]
    fn data_event_missing_fields_is_protocol_error() {
        let body = r#"{"data": {"json": 1}, "id": 7, "type": "rush"}"#;
        assert!(matches!(classify(body), PollOutcome::ProtocolError(_)));
    }

    #[test]
    fn non_json_is_protocol_error() {
        assert!(matches!(classify("<html>"), PollOutcome::ProtocolError(_)));
        assert!(matches!(classify(""), PollOutcome::ProtocolError(_)));
    }

    #[test]
    fn arrays_are_protocol_errors() {
        assert!(matches!(classify("[false]"), PollOutcome::ProtocolError(_)));
        let body = r#"[
            {"json": 1},
            {"appl": "chat", "path": "/p", "ship": "zod"},
            3,
            "rush"
        ]"#;
        assert!(matches!(classify(body), PollOutcome::ProtocolError(_)));
    }

    #[test]
    fn unknown_object_is_protocol_error() {
        assert!(matches!(
            classify(r#"{"fail":"x","mess":"y"}"#),
            PollOutcome::ProtocolError(_)
        ));
    }

    #[test]
    fn subscription_paths() {
        assert_eq!(
            subscription_path(&subscription(), SubscriptionAction::Subscribe),
            "/~/is/chat/messages.json?PUT"
        );
        assert_eq!(
            subscription_path(&subscription(), SubscriptionAction::Unsubscribe),
            "/~/is/chat/messages.json?DELETE"
        );
    }

    #[test]
    fn subscription_body_fields() {
        assert_eq!(
            subscription_body(&subscription(), "tok"),
            json!({
                "appl": "chat",
                "mark": "json",
                "wire": "/messages",
                "ship": "zod",
                "oryx": "tok",
            })
        );
    }

    #[test]
    fn poke_wire_format() {
        let request = PokeRequest {
            ship: "zod".to_string(),
            app: "chat".to_string(),
            mark: "chat-action".to_string(),
            wire: "/poke".to_string(),
            payload: json!({"message": "hello"}),
        };
        assert_eq!(poke_path(&request), "/~/to/chat/chat-action");
        assert_eq!(
            poke_body(&request, "tok"),
            json!({"oryx": "tok", "wire": "/poke", "xyro": {"message": "hello"}})
        );
    }

    #[test]
    fn poll_paths() {
        assert_eq!(poll_path("abc", 1), "/~/of/abc?poll=1");
    }
}
