//! Wire message envelopes for the blinded-routing protocol
//!
//! JSON-object envelopes with a type tag (`@type`), a message id (`@id`), an
//! optional purpose list (`~purpose`), and a data payload. The request asks
//! the router to mint a fresh peer DID and connect to the sender's document;
//! the response carries either the minted document or an error message, never
//! both.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base URI for blinded-routing message types
pub const MSG_TYPE_BASE_URI: &str = "https://trustbloc.github.io/blinded-routing/1.0";

/// Message type of a create-connection request
pub const CREATE_CONN_REQ_TYPE: &str =
    "https://trustbloc.github.io/blinded-routing/1.0/create-conn-req";

/// Message type of a create-connection response
pub const CREATE_CONN_RESP_TYPE: &str =
    "https://trustbloc.github.io/blinded-routing/1.0/create-conn-resp";

/// Purpose tag carried by create-connection requests
pub const CREATE_CONN_REQ_PURPOSE: &str = "create-conn-req";

/// Purpose tag carried by create-connection responses
pub const CREATE_CONN_RESP_PURPOSE: &str = "create-conn-resp";

/// Fire-and-forget notice sent when DID-exchange reaches its completed state
pub const STATE_COMPLETE_MSG_TYPE: &str =
    "https://trustbloc.dev/didexchange/1.0/state-complete";

/// Action message type of an inbound DID-exchange connection request
pub const DIDEX_REQUEST_MSG_TYPE: &str = "https://didcomm.org/didexchange/1.0/request";

/// Action message type of an inbound mediation request
pub const MEDIATE_REQUEST_MSG_TYPE: &str =
    "https://didcomm.org/coordinatemediate/1.0/mediate-request";

/// Protocol name of the DID-exchange state machine
pub const DIDEXCHANGE_PROTOCOL_NAME: &str = "didexchange";

/// Terminal success state of the DID-exchange protocol
pub const STATE_ID_COMPLETED: &str = "completed";

/// Request asking the router to mint a peer DID and connect back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConnReq {
    /// Message identifier
    #[serde(rename = "@id")]
    pub id: String,
    /// Message type tag
    #[serde(rename = "@type")]
    pub type_: String,
    /// Purpose tags
    #[serde(rename = "~purpose", default, skip_serializing_if = "Vec::is_empty")]
    pub purpose: Vec<String>,
    /// Request payload
    #[serde(default)]
    pub data: Option<CreateConnReqData>,
}

/// Payload of a create-connection request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnReqData {
    /// The requester's DID document; mandatory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_doc: Option<serde_json::Value>,
}

/// Response to a create-connection request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConnResp {
    /// Message identifier
    #[serde(rename = "@id")]
    pub id: String,
    /// Message type tag
    #[serde(rename = "@type")]
    pub type_: String,
    /// Purpose tags
    #[serde(rename = "~purpose", default, skip_serializing_if = "Vec::is_empty")]
    pub purpose: Vec<String>,
    /// Response payload
    pub data: CreateConnRespData,
}

/// Payload of a create-connection response; exactly one field is populated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnRespData {
    /// Failure detail, set on any error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    /// The router-minted DID document, set on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_doc: Option<serde_json::Value>,
}

impl CreateConnResp {
    /// Build a success response carrying the minted document.
    pub fn success(did_doc: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            type_: CREATE_CONN_RESP_TYPE.to_string(),
            purpose: vec![CREATE_CONN_RESP_PURPOSE.to_string()],
            data: CreateConnRespData {
                error_msg: None,
                did_doc: Some(did_doc),
            },
        }
    }

    /// Build an error response carrying the failure detail.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            type_: CREATE_CONN_RESP_TYPE.to_string(),
            purpose: vec![CREATE_CONN_RESP_PURPOSE.to_string()],
            data: CreateConnRespData {
                error_msg: Some(message.into()),
                did_doc: None,
            },
        }
    }
}

/// One-way notice telling a peer the connection protocol completed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateCompleteNotice {
    /// Message identifier
    #[serde(rename = "@id")]
    pub id: String,
    /// Message type tag
    #[serde(rename = "@type")]
    pub type_: String,
}

impl StateCompleteNotice {
    /// Build a fresh notice with a random id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            type_: STATE_COMPLETE_MSG_TYPE.to_string(),
        }
    }
}

impl Default for StateCompleteNotice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_envelope_uses_didcomm_field_names() {
        let req = CreateConnReq {
            id: "r1".to_string(),
            type_: CREATE_CONN_REQ_TYPE.to_string(),
            purpose: vec![CREATE_CONN_REQ_PURPOSE.to_string()],
            data: Some(CreateConnReqData {
                did_doc: Some(json!({"id": "did:example:peer1"})),
            }),
        };

        let value = serde_json::to_value(&req).expect("serialize");
        assert_eq!(value["@id"], "r1");
        assert_eq!(value["@type"], CREATE_CONN_REQ_TYPE);
        assert_eq!(value["~purpose"][0], CREATE_CONN_REQ_PURPOSE);
        assert_eq!(value["data"]["didDoc"]["id"], "did:example:peer1");
    }

    #[test]
    fn error_response_never_carries_a_document() {
        let resp = CreateConnResp::error("did document mandatory");
        assert_eq!(resp.type_, CREATE_CONN_RESP_TYPE);
        assert!(resp.data.did_doc.is_none());
        assert_eq!(resp.data.error_msg.as_deref(), Some("did document mandatory"));
    }

    #[test]
    fn success_response_never_carries_an_error() {
        let resp = CreateConnResp::success(json!({"id": "did:example:router"}));
        assert!(resp.data.error_msg.is_none());
        assert!(resp.data.did_doc.is_some());
    }

    #[test]
    fn state_complete_notice_has_fixed_type() {
        let notice = StateCompleteNotice::new();
        assert_eq!(notice.type_, STATE_COMPLETE_MSG_TYPE);
        assert!(!notice.id.is_empty());
    }
}
