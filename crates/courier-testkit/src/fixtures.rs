//! Shared test fixtures

use courier_core::did::{DIDCOMM_MESSAGING_SERVICE_TYPE, DID_CONTEXT, JSON_WEB_KEY_2020};
use courier_core::{Document, Jwk, Service, VerificationMethod};

/// A well-formed peer DID document for use as a blinded-routing request
/// payload.
pub fn sample_did_doc() -> Document {
    Document {
        context: vec![DID_CONTEXT.to_string()],
        id: "did:example:peer1".to_string(),
        authentication: vec![VerificationMethod {
            id: "#key-1".to_string(),
            type_: JSON_WEB_KEY_2020.to_string(),
            controller: "did:example:peer1".to_string(),
            public_key_jwk: Some(Jwk {
                kty: "OKP".to_string(),
                crv: "Ed25519".to_string(),
                x: "8rK3rTdTGVq56ykYSu8BfNNmglzS3u9tiQTBXKG-arQ".to_string(),
                kid: Some("peer1-key-1".to_string()),
            }),
        }],
        key_agreement: vec![],
        service: vec![Service {
            id: "peer1-didcomm".to_string(),
            type_: DIDCOMM_MESSAGING_SERVICE_TYPE.to_string(),
            service_endpoint: "https://peer1.example.com/didcomm".to_string(),
        }],
    }
}

/// The sample document as a raw JSON value.
pub fn sample_did_doc_value() -> serde_json::Value {
    serde_json::to_value(sample_did_doc()).unwrap_or_default()
}
