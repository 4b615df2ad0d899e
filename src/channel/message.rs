/// Wire format for the embed's cross-frame message protocol
use serde::Deserialize;
use serde_json::{json, Value};

/// Commands understood by the embedded player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Play,
    Pause,
    GetDuration,
    GetCurrentTime,
    GetPlayerState,
}

impl Command {
    /// Function name in the command envelope
    pub fn func_name(&self) -> &'static str {
        match self {
            Command::Play => "playVideo",
            Command::Pause => "pauseVideo",
            Command::GetDuration => "getDuration",
            Command::GetCurrentTime => "getCurrentTime",
            Command::GetPlayerState => "getPlayerState",
        }
    }

    pub fn from_func_name(name: &str) -> Option<Self> {
        match name {
            "playVideo" => Some(Command::Play),
            "pauseVideo" => Some(Command::Pause),
            "getDuration" => Some(Command::GetDuration),
            "getCurrentTime" => Some(Command::GetCurrentTime),
            "getPlayerState" => Some(Command::GetPlayerState),
            _ => None,
        }
    }
}

/// Messages posted into the embed
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Command(Command),
    /// One-time registration; nothing is delivered back before this
    Listening { page_reference: String },
}

impl OutboundMessage {
    pub fn to_json(&self) -> String {
        match self {
            OutboundMessage::Command(command) => json!({
                "event": "command",
                "func": command.func_name(),
                "args": [],
            })
            .to_string(),
            OutboundMessage::Listening { page_reference } => json!({
                "event": "listening",
                "id": page_reference,
                "channel": "widget",
            })
            .to_string(),
        }
    }
}

/// Player states reported by the embed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
    Unknown(i64),
}

impl PlayerState {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => PlayerState::Unstarted,
            0 => PlayerState::Ended,
            1 => PlayerState::Playing,
            2 => PlayerState::Paused,
            3 => PlayerState::Buffering,
            5 => PlayerState::Cued,
            other => PlayerState::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            PlayerState::Unstarted => -1,
            PlayerState::Ended => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Buffering => 3,
            PlayerState::Cued => 5,
            PlayerState::Unknown(code) => *code,
        }
    }
}

/// Raw inbound payload: the embed posts either serialized text or an object
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    Text(String),
    Structured(Value),
}

impl From<&str> for InboundPayload {
    fn from(text: &str) -> Self {
        InboundPayload::Text(text.to_string())
    }
}

impl From<String> for InboundPayload {
    fn from(text: String) -> Self {
        InboundPayload::Text(text)
    }
}

impl From<Value> for InboundPayload {
    fn from(value: Value) -> Self {
        InboundPayload::Structured(value)
    }
}

/// A message as received, before origin filtering
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub origin: String,
    pub payload: InboundPayload,
}

impl InboundMessage {
    pub fn new(origin: impl Into<String>, payload: impl Into<InboundPayload>) -> Self {
        Self {
            origin: origin.into(),
            payload: payload.into(),
        }
    }
}

/// Telemetry and state carried by one inbound message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundUpdate {
    pub duration: Option<f64>,
    pub current_time: Option<f64>,
    pub player_state: Option<PlayerState>,
}

impl InboundUpdate {
    pub fn is_empty(&self) -> bool {
        self.duration.is_none() && self.current_time.is_none() && self.player_state.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    info: Value,
    #[serde(default)]
    data: Value,
}

/// Parse a payload into an update. Unknown events and unparseable payloads
/// yield `None`.
pub fn parse_payload(payload: &InboundPayload) -> Option<InboundUpdate> {
    let envelope: Envelope = match payload {
        InboundPayload::Text(text) => serde_json::from_str(text).ok()?,
        InboundPayload::Structured(value) => serde_json::from_value(value.clone()).ok()?,
    };

    let update = match envelope.event.as_deref()? {
        "onStateChange" => {
            let code = state_code(&envelope.info).or_else(|| state_code(&envelope.data))?;
            InboundUpdate {
                player_state: Some(PlayerState::from_code(code)),
                ..Default::default()
            }
        }
        "infoDelivery" => {
            let info = envelope.info.as_object()?;
            InboundUpdate {
                duration: info.get("duration").and_then(Value::as_f64),
                current_time: info.get("currentTime").and_then(Value::as_f64),
                player_state: info
                    .get("playerState")
                    .and_then(state_code)
                    .map(PlayerState::from_code),
            }
        }
        _ => return None,
    };

    Some(update).filter(|update| !update.is_empty())
}

fn state_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|code| code.fract() == 0.0)
            .map(|code| code as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_envelope() {
        let text = OutboundMessage::Command(Command::Pause).to_json();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "event": "command", "func": "pauseVideo", "args": [] }));
    }

    #[test]
    fn test_listening_envelope() {
        let text = OutboundMessage::Listening {
            page_reference: "https://example.test/#/category/legs".to_string(),
        }
        .to_json();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "listening");
        assert_eq!(value["id"], "https://example.test/#/category/legs");
        assert_eq!(value["channel"], "widget");
    }

    #[test]
    fn test_state_change_info_and_data() {
        let via_info = parse_payload(&r#"{"event":"onStateChange","info":0}"#.into()).unwrap();
        assert_eq!(via_info.player_state, Some(PlayerState::Ended));

        let via_data = parse_payload(&json!({ "event": "onStateChange", "data": 1 }).into()).unwrap();
        assert_eq!(via_data.player_state, Some(PlayerState::Playing));

        assert!(parse_payload(&r#"{"event":"onStateChange","info":"0"}"#.into()).is_none());
    }

    #[test]
    fn test_info_delivery_fields() {
        let update = parse_payload(
            &r#"{"event":"infoDelivery","info":{"duration":42.5,"currentTime":12.0,"playerState":1}}"#.into(),
        )
        .unwrap();
        assert_eq!(update.duration, Some(42.5));
        assert_eq!(update.current_time, Some(12.0));
        assert_eq!(update.player_state, Some(PlayerState::Playing));

        let partial = parse_payload(&r#"{"event":"infoDelivery","info":{"currentTime":3}}"#.into()).unwrap();
        assert_eq!(partial.duration, None);
        assert_eq!(partial.current_time, Some(3.0));
    }

    #[test]
    fn test_garbage_is_discarded() {
        assert!(parse_payload(&"not json".into()).is_none());
        assert!(parse_payload(&"[1,2,3]".into()).is_none());
        assert!(parse_payload(&r#"{"event":"initialDelivery","info":{}}"#.into()).is_none());
        assert!(parse_payload(&r#"{"event":"infoDelivery","info":{"videoData":{}}}"#.into()).is_none());
        assert!(parse_payload(&r#"{"event":"infoDelivery"}"#.into()).is_none());
    }

    #[test]
    fn test_player_state_codes() {
        for code in [-1, 0, 1, 2, 3, 5, 9] {
            assert_eq!(PlayerState::from_code(code).code(), code);
        }
    }
}
