//! DIDComm substrate seams
//!
//! The mediator consumes an external messaging/identity substrate: DIDComm
//! transport and encryption, the DID-exchange and mediation state machines,
//! key management, and the ledger-anchored DID method. This crate defines
//! those collaborators as capability traits plus the event types the
//! substrate delivers over channels. Nothing here implements a protocol;
//! mocks live in `courier-testkit`, production bindings live outside this
//! workspace.

#![forbid(unsafe_code)]

pub mod capabilities;
pub mod events;

pub use capabilities::{
    Connection, CreateDidOptions, DidExchange, DidRegistry, DocResolution,
    InboundMessageService, Invitation, InvitationV2, KeyManager, MediatorClient,
    MessageRegistrar, Messenger, OutOfBand, OutOfBandV2, Store,
};
pub use events::{Decision, DidCommAction, DidCommMsg, EventProperties, StateMsg, StatePhase};
