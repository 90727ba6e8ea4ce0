//! Mediator coordinator
//!
//! Construction-time wiring of the protocol core: `Mediator::new` creates
//! the event channels and registers them with the substrate clients,
//! `start` spawns one consumer task per stream, and `shutdown` signals all
//! of them and waits. The coordinator also exposes the surface the HTTP
//! layer consumes: invitation generation, public DID provisioning, and the
//! health check.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use courier_core::messages::{CREATE_CONN_REQ_PURPOSE, CREATE_CONN_REQ_TYPE};
use courier_core::{CourierError, CourierResult};
use courier_didcomm::{
    DidCommAction, DidCommMsg, DidExchange, DidRegistry, Invitation, InvitationV2, KeyManager,
    MediatorClient, MessageRegistrar, Messenger, OutOfBand, OutOfBandV2, StateMsg, Store,
};

use crate::arbitrate::ActionArbitrator;
use crate::blinded_routing::BlindedRouting;
use crate::config::{MediatorConfig, EVENT_CHANNEL_DEPTH};
use crate::invitation::InvitationGenerator;
use crate::msg_service::MessageService;
use crate::public_did::PublicDidProvisioner;
use crate::state_events::StateNotifier;

/// Substrate capabilities the mediator consumes
pub struct Capabilities {
    /// Out-of-band v1 invitation client
    pub out_of_band: Arc<dyn OutOfBand>,
    /// Out-of-band v2 invitation client
    pub out_of_band_v2: Arc<dyn OutOfBandV2>,
    /// Mediation client
    pub mediator_client: Arc<dyn MediatorClient>,
    /// DID-exchange client
    pub did_exchange: Arc<dyn DidExchange>,
    /// Encrypted messenger
    pub messenger: Arc<dyn Messenger>,
    /// Key-management capability
    pub key_manager: Arc<dyn KeyManager>,
    /// Ledger-anchored DID registry
    pub did_registry: Arc<dyn DidRegistry>,
    /// Message-service registrar
    pub registrar: Arc<dyn MessageRegistrar>,
    /// Persistent store shared across replicas
    pub store: Arc<dyn Store>,
}

/// Response envelope for the v1 invitation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationResponse {
    /// The generated invitation
    pub invitation: Invitation,
}

/// Request for the v2 invitation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationV2Request {
    /// DID to issue the invitation from
    #[serde(default)]
    pub did: String,
}

/// Response envelope for the v2 invitation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationV2Response {
    /// The generated invitation
    pub invitation: InvitationV2,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Always "success" when the process is serving
    pub status: String,
    /// Server time at the check
    #[serde(with = "time::serde::rfc3339")]
    pub current_time: OffsetDateTime,
}

/// The mediator core: wired channels, consumer loops, upward API
pub struct Mediator {
    invitations: InvitationGenerator,
    blinded: Arc<BlindedRouting>,
    notifier: Arc<StateNotifier>,
    provisioner: PublicDidProvisioner,
    didcomm_endpoint: String,

    action_rx: Option<mpsc::Receiver<DidCommAction>>,
    msg_rx: Option<mpsc::Receiver<DidCommMsg>>,
    state_rx: Option<mpsc::Receiver<StateMsg>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Mediator {
    /// Wire the core: create the event channels, register them with the
    /// substrate clients, and register the blinded-routing message service.
    pub fn new(config: &MediatorConfig, caps: Capabilities) -> CourierResult<Self> {
        let (action_tx, action_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        let (state_tx, state_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        let (msg_tx, msg_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        let (shutdown_tx, _) = watch::channel(false);

        caps.mediator_client
            .register_action_event(action_tx.clone())
            .map_err(|e| CourierError::internal(format!("register mediator action event : {e}")))?;

        caps.did_exchange
            .register_action_event(action_tx)
            .map_err(|e| {
                CourierError::internal(format!("register didexchange action event : {e}"))
            })?;

        caps.did_exchange.register_msg_event(state_tx).map_err(|e| {
            CourierError::internal(format!("register didexchange message event : {e}"))
        })?;

        let msg_service = MessageService::new(
            "create-connection",
            CREATE_CONN_REQ_TYPE,
            vec![CREATE_CONN_REQ_PURPOSE.to_string()],
            msg_tx,
        );

        caps.registrar
            .register(Arc::new(msg_service))
            .map_err(|e| CourierError::internal(format!("message service client: {e}")))?;

        let blinded = Arc::new(BlindedRouting::new(
            caps.key_manager.clone(),
            caps.did_exchange.clone(),
            caps.messenger.clone(),
            &config.router_endpoint,
            config.key_type,
        ));

        let notifier = Arc::new(StateNotifier::new(
            caps.did_exchange.clone(),
            caps.messenger.clone(),
        ));

        let provisioner = PublicDidProvisioner::new(
            caps.store,
            caps.key_manager,
            caps.did_registry,
            config.key_type,
            config.key_agreement_type,
        );

        let invitations = InvitationGenerator::new(
            caps.out_of_band,
            caps.out_of_band_v2,
            &config.label,
            config.media_type_profiles.clone(),
        );

        Ok(Self {
            invitations,
            blinded,
            notifier,
            provisioner,
            didcomm_endpoint: config.didcomm_endpoint.clone(),
            action_rx: Some(action_rx),
            msg_rx: Some(msg_rx),
            state_rx: Some(state_rx),
            shutdown_tx,
            tasks: Vec::new(),
        })
    }

    /// Spawn the three consumer loops. Callable once.
    pub fn start(&mut self) -> CourierResult<()> {
        let action_rx = self
            .action_rx
            .take()
            .ok_or_else(|| CourierError::internal("mediator already started"))?;
        let msg_rx = self
            .msg_rx
            .take()
            .ok_or_else(|| CourierError::internal("mediator already started"))?;
        let state_rx = self
            .state_rx
            .take()
            .ok_or_else(|| CourierError::internal("mediator already started"))?;

        self.tasks.push(tokio::spawn(
            ActionArbitrator.run(action_rx, self.shutdown_tx.subscribe()),
        ));
        self.tasks.push(tokio::spawn(
            self.blinded.clone().run(msg_rx, self.shutdown_tx.subscribe()),
        ));
        self.tasks.push(tokio::spawn(
            self.notifier
                .clone()
                .run(state_rx, self.shutdown_tx.subscribe()),
        ));

        tracing::info!("mediator consumer loops started");

        Ok(())
    }

    /// Signal all consumer loops to stop and wait for them.
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "consumer task ended abnormally");
            }
        }
    }

    /// Provision (or fetch) the router's public DID.
    pub async fn provision_public_did(&self) -> CourierResult<String> {
        self.provisioner.get_or_create(&self.didcomm_endpoint).await
    }

    /// Generate a v1 out-of-band invitation.
    pub async fn generate_invitation(&self) -> CourierResult<InvitationResponse> {
        let invitation = self.invitations.generate().await?;

        Ok(InvitationResponse { invitation })
    }

    /// Generate a v2 out-of-band invitation from the DID in the request.
    /// An empty DID is a bad request, not a capability failure.
    pub async fn generate_invitation_v2(
        &self,
        request: &InvitationV2Request,
    ) -> CourierResult<InvitationV2Response> {
        if request.did.is_empty() {
            return Err(CourierError::invalid("error parsing request: did is mandatory"));
        }

        let invitation = self.invitations.generate_v2(&request.did).await?;

        Ok(InvitationV2Response { invitation })
    }

    /// Liveness probe payload.
    pub fn health_check(&self) -> HealthCheckResponse {
        HealthCheckResponse {
            status: "success".to_string(),
            current_time: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_testkit::{
        MemoryStore, MockDidExchange, MockDidRegistry, MockKeyManager, MockMediatorClient,
        MockMessenger, MockOutOfBand, MockOutOfBandV2, MockRegistrar,
    };

    struct Mocks {
        mediator_client: Arc<MockMediatorClient>,
        did_exchange: Arc<MockDidExchange>,
        registrar: Arc<MockRegistrar>,
    }

    fn capabilities() -> (Capabilities, Mocks) {
        let mediator_client = Arc::new(MockMediatorClient::default());
        let did_exchange = Arc::new(MockDidExchange::default());
        let registrar = Arc::new(MockRegistrar::default());
        let (messenger, _outbound) = MockMessenger::new();

        (
            Capabilities {
                out_of_band: Arc::new(MockOutOfBand::default()),
                out_of_band_v2: Arc::new(MockOutOfBandV2::default()),
                mediator_client: mediator_client.clone(),
                did_exchange: did_exchange.clone(),
                messenger: Arc::new(messenger),
                key_manager: Arc::new(MockKeyManager::default()),
                did_registry: Arc::new(MockDidRegistry::default()),
                registrar: registrar.clone(),
                store: Arc::new(MemoryStore::default()),
            },
            Mocks {
                mediator_client,
                did_exchange,
                registrar,
            },
        )
    }

    #[tokio::test]
    async fn new_registers_channels_and_message_service() {
        let (caps, mocks) = capabilities();

        let _mediator = Mediator::new(&MediatorConfig::default(), caps).expect("wiring succeeds");

        assert!(mocks.mediator_client.action_channel_registered());
        assert!(mocks.did_exchange.channels_registered());

        let services = mocks.registrar.services();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name(), "create-connection");
        assert!(services[0].accept(CREATE_CONN_REQ_TYPE, &[]));
    }

    #[tokio::test]
    async fn registration_failure_surfaces_at_construction() {
        let (mut caps, _mocks) = capabilities();
        caps.registrar = Arc::new(MockRegistrar::failing("registrar down"));

        let err = Mediator::new(&MediatorConfig::default(), caps)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("message service client"));
    }

    #[tokio::test]
    async fn start_twice_is_an_error() {
        let (caps, _mocks) = capabilities();
        let mut mediator = Mediator::new(&MediatorConfig::default(), caps).expect("wiring");

        mediator.start().expect("first start succeeds");
        let err = mediator.start().expect_err("second start fails");
        assert!(err.to_string().contains("already started"));

        mediator.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_all_loops() {
        let (caps, _mocks) = capabilities();
        let mut mediator = Mediator::new(&MediatorConfig::default(), caps).expect("wiring");

        mediator.start().expect("start");
        mediator.shutdown().await;
        assert!(mediator.tasks.is_empty());
    }

    #[tokio::test]
    async fn health_check_reports_success() {
        let (caps, _mocks) = capabilities();
        let mediator = Mediator::new(&MediatorConfig::default(), caps).expect("wiring");

        let health = mediator.health_check();
        assert_eq!(health.status, "success");
    }

    #[tokio::test]
    async fn invitation_v2_requires_a_did() {
        let (caps, _mocks) = capabilities();
        let mediator = Mediator::new(&MediatorConfig::default(), caps).expect("wiring");

        let err = mediator
            .generate_invitation_v2(&InvitationV2Request { did: String::new() })
            .await
            .expect_err("empty did is a bad request");
        assert!(err.to_string().contains("error parsing request"));
    }

    #[tokio::test]
    async fn invitation_endpoints_return_envelopes() {
        let (caps, _mocks) = capabilities();
        let mediator = Mediator::new(&MediatorConfig::default(), caps).expect("wiring");

        let v1 = mediator.generate_invitation().await.expect("v1");
        assert_eq!(v1.invitation.label, "courier");

        let v2 = mediator
            .generate_invitation_v2(&InvitationV2Request {
                did: "did:orb:router".to_string(),
            })
            .await
            .expect("v2");
        assert_eq!(v2.invitation.from, "did:orb:router");
    }

    #[tokio::test]
    async fn provisioning_round_trips_through_the_store() {
        let (caps, _mocks) = capabilities();
        let mediator = Mediator::new(&MediatorConfig::default(), caps).expect("wiring");

        let first = mediator.provision_public_did().await.expect("provision");
        let second = mediator.provision_public_did().await.expect("fast path");
        assert_eq!(first, second);
    }
}
