//! Payloads exchanged between the pages and the worker over `postMessage`

use serde::{Deserialize, Serialize};

/// Sent by a page to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate the waiting worker now. No reply.
    SkipWaiting,
    /// Ask for the version, answered with a [VersionReply] on the first port
    GetVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}

/// Broadcast by the worker to every page it controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Activation finished, the worker is controlling the page
    Go,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn control_messages_use_the_type_field() {
        let skip: ControlMessage = serde_json::from_value(json!({ "type": "SKIP_WAITING" })).unwrap();
        let version: ControlMessage = serde_json::from_value(json!({ "type": "GET_VERSION" })).unwrap();

        assert_eq!(skip, ControlMessage::SkipWaiting);
        assert_eq!(version, ControlMessage::GetVersion);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let message: ControlMessage =
            serde_json::from_value(json!({ "type": "GET_VERSION", "sent": 12 })).unwrap();
        assert_eq!(message, ControlMessage::GetVersion);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(serde_json::from_value::<ControlMessage>(json!({ "type": "CLEAR" })).is_err());
        assert!(serde_json::from_value::<ControlMessage>(json!("SKIP_WAITING")).is_err());
    }

    #[test]
    fn outbound_shapes() {
        assert_eq!(serde_json::to_value(ClientMessage::Go).unwrap(), json!({ "type": "GO" }));
        assert_eq!(
            serde_json::to_value(VersionReply { version: "pwa-cache-v12".to_string() }).unwrap(),
            json!({ "version": "pwa-cache-v12" })
        );
    }
}
