//! Mock substrate capabilities for Courier tests
//!
//! One mock per capability trait, each with programmable error injection and
//! enough observability (recorded calls, outbound channels) for tests to
//! assert on behavior without a live DIDComm stack.

#![forbid(unsafe_code)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::{sample_did_doc, sample_did_doc_value};
pub use mocks::{
    MemoryStore, MockDidExchange, MockDidRegistry, MockKeyManager, MockMediatorClient,
    MockMessenger, MockOutOfBand, MockOutOfBandV2, MockRegistrar, Outbound,
};
