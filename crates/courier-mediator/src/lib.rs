//! Courier mediation core
//!
//! The protocol core of the Courier router node. It wires three consumer
//! loops onto channels registered with the DIDComm substrate:
//!
//! - an action arbitrator deciding inbound connection and mediation requests
//! - a blinded-routing responder minting router-side peer DIDs on demand
//! - a state-change notifier telling peers when DID-exchange completes
//!
//! plus two request-driven services: out-of-band invitation generation and
//! idempotent provisioning of the router's ledger-anchored public DID.
//!
//! HTTP transport, CLI parsing, and the DIDComm substrate itself live
//! outside this crate; everything external is reached through the capability
//! traits in `courier-didcomm`.

#![forbid(unsafe_code)]

pub mod arbitrate;
pub mod blinded_routing;
pub mod config;
pub mod invitation;
pub mod mediator;
pub mod msg_service;
pub mod public_did;
pub mod state_events;

pub use config::MediatorConfig;
pub use mediator::{
    Capabilities, HealthCheckResponse, InvitationResponse, InvitationV2Request,
    InvitationV2Response, Mediator,
};
pub use public_did::PublicDidProvisioner;
