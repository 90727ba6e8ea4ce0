//! Mediator configuration

use courier_core::KeyType;

/// Depth of the action/message/state channels. One slot keeps mild
/// backpressure on the substrate without stalling its inbound pipeline.
pub const EVENT_CHANNEL_DEPTH: usize = 1;

/// Configuration for the mediator core
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// Human-readable label stamped on invitations
    pub label: String,

    /// Endpoint peers route DIDComm traffic through
    pub router_endpoint: String,

    /// Endpoint published in the public DID document
    pub didcomm_endpoint: String,

    /// Protocol media-type profiles accepted on v2 invitations
    pub media_type_profiles: Vec<String>,

    /// Key type for authentication verification methods
    pub key_type: KeyType,

    /// Key type for key-agreement verification methods
    pub key_agreement_type: KeyType,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            label: "courier".to_string(),
            router_endpoint: "https://localhost:10091".to_string(),
            didcomm_endpoint: "https://localhost:10091".to_string(),
            media_type_profiles: vec!["didcomm/v2".to_string()],
            key_type: KeyType::Ed25519,
            key_agreement_type: KeyType::X25519,
        }
    }
}
