//! Event types delivered by the substrate over channels
//!
//! Three streams reach the mediator: protocol action events (inbound
//! requests awaiting an accept/reject decision), state events (transitions
//! of the substrate's protocol state machines), and typed application
//! messages forwarded by a registered message service.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::oneshot;

use courier_core::{CourierError, CourierResult};

/// A loosely-typed DIDComm message as delivered by the substrate
///
/// The substrate hands messages over as JSON maps; components decode them
/// into concrete envelope types on demand.
#[derive(Debug, Clone)]
pub struct DidCommMsg(serde_json::Value);

impl DidCommMsg {
    /// Wrap a raw JSON value.
    pub fn from_value(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Build a message from a serializable envelope.
    pub fn new<T: Serialize>(envelope: &T) -> CourierResult<Self> {
        let value = serde_json::to_value(envelope)
            .map_err(|e| CourierError::internal(e.to_string()))?;

        Ok(Self(value))
    }

    /// Message identifier (`@id`), empty if absent.
    pub fn id(&self) -> &str {
        self.0.get("@id").and_then(|v| v.as_str()).unwrap_or("")
    }

    /// Message type tag (`@type`), empty if absent.
    pub fn type_(&self) -> &str {
        self.0.get("@type").and_then(|v| v.as_str()).unwrap_or("")
    }

    /// Decode into a concrete envelope type.
    pub fn decode<T: DeserializeOwned>(&self) -> CourierResult<T> {
        serde_json::from_value(self.0.clone())
            .map_err(|e| CourierError::decode(e.to_string()))
    }

    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Accept/reject decision for a protocol action
#[derive(Debug)]
pub enum Decision {
    /// Let the substrate's state machine proceed; no negotiated arguments
    Continue,
    /// Abort the protocol instance with a reason
    Stop(String),
}

/// An inbound protocol action awaiting a decision
///
/// Created by the substrate per inbound protocol message and consumed
/// exactly once: resolving the decision consumes the action.
#[derive(Debug)]
pub struct DidCommAction {
    /// The triggering message
    pub message: DidCommMsg,
    decision: oneshot::Sender<Decision>,
}

impl DidCommAction {
    /// Create an action plus the receiver the substrate would await.
    pub fn new(message: DidCommMsg) -> (Self, oneshot::Receiver<Decision>) {
        let (tx, rx) = oneshot::channel();

        (
            Self {
                message,
                decision: tx,
            },
            rx,
        )
    }

    /// Accept the action. The substrate may already have gone away; a
    /// dropped receiver is its concern, not ours.
    pub fn continue_protocol(self) {
        let _ = self.decision.send(Decision::Continue);
    }

    /// Reject the action with a reason.
    pub fn stop(self, reason: impl Into<String>) {
        let _ = self.decision.send(Decision::Stop(reason.into()));
    }
}

/// Phase of a state transition event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePhase {
    /// Emitted before the transition is applied
    Pre,
    /// Emitted after the transition is applied
    Post,
}

/// Type-erased properties attached to a state event
///
/// The substrate attaches protocol-specific payloads; DID-exchange events
/// carry the connection identifier. A foreign or malformed payload simply
/// lacks the expected entries.
#[derive(Debug, Clone, Default)]
pub struct EventProperties(HashMap<String, serde_json::Value>);

impl EventProperties {
    /// Empty properties (a foreign event).
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties carrying a DID-exchange connection identifier.
    pub fn with_connection_id(connection_id: &str) -> Self {
        let mut map = HashMap::new();
        map.insert(
            "connectionID".to_string(),
            serde_json::Value::String(connection_id.to_string()),
        );

        Self(map)
    }

    /// Extract the connection identifier, if this looks like a
    /// DID-exchange event.
    pub fn connection_id(&self) -> Option<&str> {
        self.0.get("connectionID").and_then(|v| v.as_str())
    }
}

/// A state transition notification from a substrate protocol
#[derive(Debug, Clone)]
pub struct StateMsg {
    /// Pre or post transition
    pub phase: StatePhase,
    /// Name of the protocol that transitioned
    pub protocol_name: String,
    /// State the protocol moved to
    pub state_id: String,
    /// Protocol-specific payload
    pub properties: EventProperties,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn msg_exposes_id_and_type() {
        let msg = DidCommMsg::from_value(json!({"@id": "m1", "@type": "t1"}));
        assert_eq!(msg.id(), "m1");
        assert_eq!(msg.type_(), "t1");
    }

    #[test]
    fn msg_without_envelope_fields_is_empty_not_panicking() {
        let msg = DidCommMsg::from_value(json!({"foo": "bar"}));
        assert_eq!(msg.id(), "");
        assert_eq!(msg.type_(), "");
    }

    #[tokio::test]
    async fn action_resolves_exactly_once() {
        let msg = DidCommMsg::from_value(json!({"@id": "m1"}));
        let (action, rx) = DidCommAction::new(msg);

        action.stop("unsupported message type : t1");

        match rx.await.expect("decision should arrive") {
            Decision::Stop(reason) => assert!(reason.contains("unsupported message type")),
            Decision::Continue => panic!("expected stop"),
        }
    }

    #[test]
    fn foreign_event_properties_have_no_connection_id() {
        assert!(EventProperties::new().connection_id().is_none());
        assert_eq!(
            EventProperties::with_connection_id("conn-1").connection_id(),
            Some("conn-1")
        );
    }
}
