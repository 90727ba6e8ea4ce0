//! Courier core vocabulary
//!
//! Shared types for the Courier mediator/router node:
//! - the unified [`CourierError`] type used across all crates
//! - the DID document model exchanged during blinded routing
//! - the wire message envelopes of the blinded-routing protocol
//!
//! This crate holds no I/O and no async code; everything here is plain data
//! plus parsing and validation.

#![forbid(unsafe_code)]

pub mod did;
pub mod error;
pub mod messages;

pub use did::{Document, Jwk, KeyType, Service, VerificationMethod};
pub use error::{CourierError, CourierResult};
