//! Capability traits for the messaging/identity substrate
//!
//! Every external collaborator of the mediator is specified here at its
//! interface boundary: out-of-band invitation clients, the DID-exchange and
//! mediation clients, the encrypted messenger, the key manager, the
//! ledger-anchored DID registry, the message-service registrar, and the
//! shared key-value store.
//!
//! Registration methods are synchronous: the substrate just records the
//! channel sender. Everything that can touch the network is async.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use courier_core::{CourierResult, Document, KeyType};

use crate::events::{DidCommAction, DidCommMsg, StateMsg};

/// An out-of-band v1 invitation issued by the substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    /// Invitation identifier
    pub id: String,
    /// Invitation type URI
    #[serde(rename = "type")]
    pub type_: String,
    /// Human-readable label of the issuing router
    pub label: String,
}

/// An out-of-band v2 invitation issued by the substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationV2 {
    /// Invitation identifier
    pub id: String,
    /// Invitation type URI
    #[serde(rename = "type")]
    pub type_: String,
    /// Human-readable label of the issuing router
    pub label: String,
    /// DID the invitation is issued from
    pub from: String,
    /// Accepted protocol media-type profiles
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
}

/// A pairwise connection record owned by the substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Connection identifier
    pub connection_id: String,
    /// This router's DID for the connection
    pub my_did: String,
    /// The peer's DID for the connection
    pub their_did: String,
    /// Current protocol state
    pub state: String,
}

/// Method options for a ledger-anchored DID create operation
#[derive(Debug, Clone)]
pub struct CreateDidOptions {
    /// Public key registered for future document updates
    pub update_key: Vec<u8>,
    /// Public key registered for recovery operations
    pub recovery_key: Vec<u8>,
}

/// Result of anchoring a DID document
#[derive(Debug, Clone)]
pub struct DocResolution {
    /// The anchored document, with its ledger-assigned identifier
    pub did_document: Document,
}

/// Out-of-band v1 invitation client
#[async_trait]
pub trait OutOfBand: Send + Sync {
    /// Create an invitation carrying the given label.
    async fn create_invitation(&self, label: &str) -> CourierResult<Invitation>;
}

/// Out-of-band v2 invitation client
#[async_trait]
pub trait OutOfBandV2: Send + Sync {
    /// Create an invitation from the given DID with the accepted
    /// media-type profiles.
    async fn create_invitation(
        &self,
        from: &str,
        label: &str,
        accept: &[String],
    ) -> CourierResult<InvitationV2>;
}

/// Mediation (route coordination) client
pub trait MediatorClient: Send + Sync {
    /// Register the channel that receives mediation action events.
    fn register_action_event(&self, sender: mpsc::Sender<DidCommAction>) -> CourierResult<()>;
}

/// DID-exchange (connection establishment) client
#[async_trait]
pub trait DidExchange: Send + Sync {
    /// Create a connection from a local DID to the peer's document;
    /// returns the connection identifier.
    async fn create_connection(&self, my_did: &str, their_doc: &Document)
        -> CourierResult<String>;

    /// Register the channel that receives connection action events.
    fn register_action_event(&self, sender: mpsc::Sender<DidCommAction>) -> CourierResult<()>;

    /// Register the channel that receives protocol state events.
    fn register_msg_event(&self, sender: mpsc::Sender<StateMsg>) -> CourierResult<()>;

    /// Look up a connection by identifier.
    async fn get_connection(&self, connection_id: &str) -> CourierResult<Connection>;
}

/// Encrypted messenger over established connections
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Reply on the logical exchange of a previously received message.
    async fn reply_to(&self, msg_id: &str, msg: DidCommMsg) -> CourierResult<()>;

    /// Send a one-way message over a connection.
    async fn send(&self, msg: DidCommMsg, my_did: &str, their_did: &str) -> CourierResult<()>;
}

/// Key-management capability
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Create a key of the given type and export its public bytes;
    /// returns the key identifier and the raw public key.
    async fn create_and_export_pub_key_bytes(
        &self,
        key_type: KeyType,
    ) -> CourierResult<(String, Vec<u8>)>;
}

/// Ledger-anchored DID method capability
#[async_trait]
pub trait DidRegistry: Send + Sync {
    /// Submit a create operation for the given document template.
    async fn create(
        &self,
        doc: &Document,
        options: CreateDidOptions,
    ) -> CourierResult<DocResolution>;
}

/// A message service registered with the substrate's inbound pipeline
///
/// The substrate consults `accept` for every inbound application message and
/// calls `handle_inbound` on a match. `handle_inbound` must not block the
/// substrate's delivery pipeline.
pub trait InboundMessageService: Send + Sync {
    /// Registration identifier.
    fn name(&self) -> &str;

    /// Whether this service handles the given type and purposes.
    fn accept(&self, msg_type: &str, purposes: &[String]) -> bool;

    /// Handle an inbound message; returns a reply placeholder.
    fn handle_inbound(
        &self,
        msg: DidCommMsg,
        my_did: &str,
        their_did: &str,
    ) -> CourierResult<String>;
}

/// Registrar for inbound message services
pub trait MessageRegistrar: Send + Sync {
    /// Register a message service with the inbound pipeline.
    fn register(&self, service: Arc<dyn InboundMessageService>) -> CourierResult<()>;
}

/// Persistent key-value store shared across router replicas
#[async_trait]
pub trait Store: Send + Sync {
    /// Get a value; a missing key yields a `NotFound` error.
    async fn get(&self, key: &str) -> CourierResult<Vec<u8>>;

    /// Put a value.
    async fn put(&self, key: &str, value: &[u8]) -> CourierResult<()>;
}
