//! Mock capability implementations
//!
//! Each mock mirrors one trait from `courier-didcomm`. Error injection is a
//! plain `Option<String>` per failing operation; recorded state sits behind
//! `parking_lot` locks so mocks stay `Send + Sync` without async locking.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use courier_core::{CourierError, CourierResult, Document, KeyType};
use courier_didcomm::{
    Connection, CreateDidOptions, DidCommAction, DidCommMsg, DidExchange, DidRegistry,
    DocResolution, InboundMessageService, Invitation, InvitationV2, KeyManager, MediatorClient,
    MessageRegistrar, Messenger, OutOfBand, OutOfBandV2, StateMsg, Store,
};

fn injected(err: &Option<String>) -> CourierResult<()> {
    match err {
        Some(msg) => Err(CourierError::internal(msg.clone())),
        None => Ok(()),
    }
}

/// Mock out-of-band v1 client
#[derive(Default)]
pub struct MockOutOfBand {
    /// Error returned by `create_invitation` when set
    pub create_invitation_err: Option<String>,
}

impl MockOutOfBand {
    /// Mock whose `create_invitation` fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            create_invitation_err: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl OutOfBand for MockOutOfBand {
    async fn create_invitation(&self, label: &str) -> CourierResult<Invitation> {
        injected(&self.create_invitation_err)?;

        Ok(Invitation {
            id: Uuid::new_v4().to_string(),
            type_: "https://didcomm.org/out-of-band/1.0/invitation".to_string(),
            label: label.to_string(),
        })
    }
}

/// Mock out-of-band v2 client
#[derive(Default)]
pub struct MockOutOfBandV2 {
    /// Error returned by `create_invitation` when set
    pub create_err: Option<String>,
}

impl MockOutOfBandV2 {
    /// Mock whose `create_invitation` fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            create_err: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl OutOfBandV2 for MockOutOfBandV2 {
    async fn create_invitation(
        &self,
        from: &str,
        label: &str,
        accept: &[String],
    ) -> CourierResult<InvitationV2> {
        injected(&self.create_err)?;

        Ok(InvitationV2 {
            id: Uuid::new_v4().to_string(),
            type_: "https://didcomm.org/out-of-band/2.0/invitation".to_string(),
            label: label.to_string(),
            from: from.to_string(),
            accept: accept.to_vec(),
        })
    }
}

/// Mock mediation client; records the registered action channel
#[derive(Default)]
pub struct MockMediatorClient {
    /// Error returned by `register_action_event` when set
    pub register_err: Option<String>,
    registered: Mutex<Option<mpsc::Sender<DidCommAction>>>,
}

impl MockMediatorClient {
    /// Whether an action channel was registered.
    pub fn action_channel_registered(&self) -> bool {
        self.registered.lock().is_some()
    }

    /// Clone of the registered action sender, for injecting events.
    pub fn action_sender(&self) -> Option<mpsc::Sender<DidCommAction>> {
        self.registered.lock().clone()
    }
}

impl MediatorClient for MockMediatorClient {
    fn register_action_event(&self, sender: mpsc::Sender<DidCommAction>) -> CourierResult<()> {
        injected(&self.register_err)?;
        *self.registered.lock() = Some(sender);

        Ok(())
    }
}

/// Mock DID-exchange client
#[derive(Default)]
pub struct MockDidExchange {
    /// Error returned by `create_connection` when set
    pub create_conn_err: Option<String>,
    /// Error returned by `get_connection` when set
    pub get_connection_err: Option<String>,
    action_channel: Mutex<Option<mpsc::Sender<DidCommAction>>>,
    state_channel: Mutex<Option<mpsc::Sender<StateMsg>>>,
    created: Mutex<Vec<(String, Document)>>,
}

impl MockDidExchange {
    /// Mock whose `create_connection` fails with the given message.
    pub fn failing_create(message: &str) -> Self {
        Self {
            create_conn_err: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Mock whose `get_connection` fails with the given message.
    pub fn failing_lookup(message: &str) -> Self {
        Self {
            get_connection_err: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Connections created through this mock, as `(my_did, their_doc)`.
    pub fn created_connections(&self) -> Vec<(String, Document)> {
        self.created.lock().clone()
    }

    /// Whether both event channels were registered.
    pub fn channels_registered(&self) -> bool {
        self.action_channel.lock().is_some() && self.state_channel.lock().is_some()
    }

    /// Clone of the registered action sender, for injecting events.
    pub fn action_sender(&self) -> Option<mpsc::Sender<DidCommAction>> {
        self.action_channel.lock().clone()
    }

    /// Clone of the registered state sender, for injecting events.
    pub fn state_sender(&self) -> Option<mpsc::Sender<StateMsg>> {
        self.state_channel.lock().clone()
    }
}

#[async_trait]
impl DidExchange for MockDidExchange {
    async fn create_connection(
        &self,
        my_did: &str,
        their_doc: &Document,
    ) -> CourierResult<String> {
        injected(&self.create_conn_err)?;
        self.created
            .lock()
            .push((my_did.to_string(), their_doc.clone()));

        Ok(Uuid::new_v4().to_string())
    }

    fn register_action_event(&self, sender: mpsc::Sender<DidCommAction>) -> CourierResult<()> {
        *self.action_channel.lock() = Some(sender);

        Ok(())
    }

    fn register_msg_event(&self, sender: mpsc::Sender<StateMsg>) -> CourierResult<()> {
        *self.state_channel.lock() = Some(sender);

        Ok(())
    }

    async fn get_connection(&self, connection_id: &str) -> CourierResult<Connection> {
        injected(&self.get_connection_err)?;

        Ok(Connection {
            connection_id: connection_id.to_string(),
            my_did: "did:example:router".to_string(),
            their_did: "did:example:peer1".to_string(),
            state: "completed".to_string(),
        })
    }
}

/// A message the mock messenger sent outward
#[derive(Debug)]
pub enum Outbound {
    /// A reply on an existing exchange
    Reply {
        /// The replied-to message id
        msg_id: String,
        /// The reply envelope
        msg: DidCommMsg,
    },
    /// A one-way send over a connection
    Send {
        /// The envelope
        msg: DidCommMsg,
        /// Sender DID
        my_did: String,
        /// Recipient DID
        their_did: String,
    },
}

/// Mock messenger; forwards everything it "sends" to a channel the test
/// holds, so async tests can await outbound traffic deterministically.
pub struct MockMessenger {
    /// Error returned by `reply_to` when set
    pub reply_err: Option<String>,
    /// Error returned by `send` when set
    pub send_err: Option<String>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl MockMessenger {
    /// Create a mock plus the receiver of its outbound traffic.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();

        (
            Self {
                reply_err: None,
                send_err: None,
                outbound: tx,
            },
            rx,
        )
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn reply_to(&self, msg_id: &str, msg: DidCommMsg) -> CourierResult<()> {
        injected(&self.reply_err)?;
        let _ = self.outbound.send(Outbound::Reply {
            msg_id: msg_id.to_string(),
            msg,
        });

        Ok(())
    }

    async fn send(&self, msg: DidCommMsg, my_did: &str, their_did: &str) -> CourierResult<()> {
        injected(&self.send_err)?;
        let _ = self.outbound.send(Outbound::Send {
            msg,
            my_did: my_did.to_string(),
            their_did: their_did.to_string(),
        });

        Ok(())
    }
}

/// Mock key manager; mints deterministic 32-byte keys and counts calls
#[derive(Default)]
pub struct MockKeyManager {
    /// Error returned by `create_and_export_pub_key_bytes` when set
    pub create_err: Option<String>,
    calls: AtomicUsize,
}

impl MockKeyManager {
    /// Mock whose key creation fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            create_err: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Number of keys minted through this mock.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyManager for MockKeyManager {
    async fn create_and_export_pub_key_bytes(
        &self,
        _key_type: KeyType,
    ) -> CourierResult<(String, Vec<u8>)> {
        injected(&self.create_err)?;
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        Ok((format!("key-{n}"), vec![n as u8; 32]))
    }
}

/// Mock ledger DID registry; anchors documents under a fresh identifier
#[derive(Default)]
pub struct MockDidRegistry {
    /// Error returned by `create` when set
    pub create_err: Option<String>,
    calls: AtomicUsize,
}

impl MockDidRegistry {
    /// Mock whose `create` fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            create_err: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Number of create operations submitted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DidRegistry for MockDidRegistry {
    async fn create(
        &self,
        doc: &Document,
        _options: CreateDidOptions,
    ) -> CourierResult<DocResolution> {
        injected(&self.create_err)?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut anchored = doc.clone();
        anchored.id = format!("did:orb:{}", Uuid::new_v4());

        Ok(DocResolution {
            did_document: anchored,
        })
    }
}

/// Mock message-service registrar; records registered services
#[derive(Default)]
pub struct MockRegistrar {
    /// Error returned by `register` when set
    pub register_err: Option<String>,
    services: Mutex<Vec<Arc<dyn InboundMessageService>>>,
}

impl MockRegistrar {
    /// Mock whose `register` fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            register_err: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Services registered so far.
    pub fn services(&self) -> Vec<Arc<dyn InboundMessageService>> {
        self.services.lock().clone()
    }
}

impl MessageRegistrar for MockRegistrar {
    fn register(&self, service: Arc<dyn InboundMessageService>) -> CourierResult<()> {
        injected(&self.register_err)?;
        self.services.lock().push(service);

        Ok(())
    }
}

/// In-memory key-value store shared across "replicas" in tests
#[derive(Default)]
pub struct MemoryStore {
    /// Error returned by `put` when set
    pub put_err: Option<String>,
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Store whose `put` fails with the given message.
    pub fn failing_puts(message: &str) -> Self {
        Self {
            put_err: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Seed an entry directly.
    pub fn seed(&self, key: &str, value: &[u8]) {
        self.entries
            .write()
            .insert(key.to_string(), value.to_vec());
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> CourierResult<Vec<u8>> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| CourierError::not_found(format!("key {key}")))
    }

    async fn put(&self, key: &str, value: &[u8]) -> CourierResult<()> {
        injected(&self.put_err)?;
        self.entries
            .write()
            .insert(key.to_string(), value.to_vec());

        Ok(())
    }
}
