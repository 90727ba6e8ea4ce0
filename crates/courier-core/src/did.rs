//! DID document model
//!
//! A minimal serde model of the DID documents exchanged during blinded
//! routing: enough to carry verification methods (as JWKs), key-agreement
//! entries, and service endpoints. Parsing validates the document identifier
//! rather than the full data model; the messaging substrate owns deeper
//! verification.

use crate::error::{CourierError, CourierResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// JSON-LD context for DID documents
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Verification method type used for JWK-encoded keys
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// Service type for DIDComm endpoints
pub const DIDCOMM_MESSAGING_SERVICE_TYPE: &str = "DIDCommMessaging";

/// Key types the mediator can mint through the key-management capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    /// Ed25519 signing key (authentication)
    Ed25519,
    /// X25519 key-agreement key
    X25519,
    /// BLS12-381 G2 key; not representable as an OKP JWK here
    Bls12381G2,
}

/// A public key in JWK form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type family, e.g. "OKP"
    pub kty: String,
    /// Curve name
    pub crv: String,
    /// Base64url-encoded public key bytes
    pub x: String,
    /// Key identifier assigned by the key manager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Jwk {
    /// Build a JWK from raw public key bytes for the given key type.
    ///
    /// Returns an error for key types without an OKP JWK representation;
    /// the caller attributes the failure to the verification relationship
    /// it was building.
    pub fn from_public_key_bytes(kid: &str, bytes: &[u8], key_type: KeyType) -> CourierResult<Self> {
        let crv = match key_type {
            KeyType::Ed25519 => "Ed25519",
            KeyType::X25519 => "X25519",
            KeyType::Bls12381G2 => {
                return Err(CourierError::crypto(format!(
                    "unsupported JWK key type: {key_type:?}"
                )))
            }
        };

        Ok(Self {
            kty: "OKP".to_string(),
            crv: crv.to_string(),
            x: URL_SAFE_NO_PAD.encode(bytes),
            kid: Some(kid.to_string()),
        })
    }
}

/// A verification method entry in a DID document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Method identifier, typically a fragment like "#key-1"
    pub id: String,
    /// Method type, e.g. "JsonWebKey2020"
    #[serde(rename = "type")]
    pub type_: String,
    /// Controlling DID; empty until the registry anchors the document
    #[serde(default)]
    pub controller: String,
    /// Public key in JWK form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
}

impl VerificationMethod {
    /// Create a JWK-backed verification method
    pub fn from_jwk(id: &str, jwk: Jwk) -> Self {
        Self {
            id: id.to_string(),
            type_: JSON_WEB_KEY_2020.to_string(),
            controller: String::new(),
            public_key_jwk: Some(jwk),
        }
    }
}

/// A service entry in a DID document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service identifier
    pub id: String,
    /// Service type, e.g. "DIDCommMessaging"
    #[serde(rename = "type")]
    pub type_: String,
    /// Endpoint URI
    pub service_endpoint: String,
}

/// A DID document
///
/// Covers the subset of the data model the mediator reads and writes:
/// authentication and key-agreement verification methods plus service
/// endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// JSON-LD context
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// Document identifier; empty in unanchored templates
    #[serde(default)]
    pub id: String,
    /// Authentication verification methods
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<VerificationMethod>,
    /// Key-agreement verification methods
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<VerificationMethod>,
    /// Service endpoints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

impl Document {
    /// Parse a DID document from a JSON value, validating the identifier.
    pub fn parse(value: &serde_json::Value) -> CourierResult<Self> {
        let doc: Document = serde_json::from_value(value.clone())
            .map_err(|e| CourierError::decode(format!("document JSON: {e}")))?;

        if doc.id.is_empty() {
            return Err(CourierError::invalid("document missing id"));
        }

        if !doc.id.starts_with("did:") {
            return Err(CourierError::invalid(format!(
                "document id is not a DID: {}",
                doc.id
            )));
        }

        Ok(doc)
    }

    /// Parse a DID document from raw JSON bytes.
    pub fn parse_bytes(bytes: &[u8]) -> CourierResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| CourierError::decode(format!("document bytes: {e}")))?;

        Self::parse(&value)
    }

    /// Serialize the document to a JSON value.
    pub fn to_value(&self) -> CourierResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| CourierError::internal(e.to_string()))
    }
}
