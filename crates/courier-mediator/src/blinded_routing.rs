//! Blinded-routing responder
//!
//! Handles forwarded `create-conn-req` messages: parses the requester's DID
//! document, mints a fresh router-side peer DID bound to the mediation
//! endpoint, asks the DID-exchange capability to connect the two, and
//! replies on the same logical exchange. Every failure branch converges on
//! one reply path so the requester always gets a typed answer.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use courier_core::did::{DIDCOMM_MESSAGING_SERVICE_TYPE, DID_CONTEXT};
use courier_core::messages::{CreateConnReq, CreateConnResp, CREATE_CONN_REQ_TYPE};
use courier_core::{
    CourierError, CourierResult, Document, Jwk, KeyType, Service, VerificationMethod,
};
use courier_didcomm::{DidCommMsg, DidExchange, KeyManager, Messenger};

/// Responder for the blinded-routing request/response exchange
pub struct BlindedRouting {
    key_manager: Arc<dyn KeyManager>,
    did_exchange: Arc<dyn DidExchange>,
    messenger: Arc<dyn Messenger>,
    endpoint: String,
    key_type: KeyType,
}

impl BlindedRouting {
    /// Create a responder bound to the router's mediation endpoint.
    pub fn new(
        key_manager: Arc<dyn KeyManager>,
        did_exchange: Arc<dyn DidExchange>,
        messenger: Arc<dyn Messenger>,
        endpoint: &str,
        key_type: KeyType,
    ) -> Self {
        Self {
            key_manager,
            did_exchange,
            messenger,
            endpoint: endpoint.to_string(),
            key_type,
        }
    }

    /// Consume forwarded application messages until shutdown or close.
    pub async fn run(
        self: Arc<Self>,
        mut messages: mpsc::Receiver<DidCommMsg>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                maybe = messages.recv() => match maybe {
                    Some(msg) => self.process(msg).await,
                    None => break,
                },
            }
        }

        tracing::info!("blinded-routing responder stopped");
    }

    /// Handle one inbound message and reply on the same exchange. Reply
    /// failures are logged; the consumer loop keeps going either way.
    pub async fn process(&self, msg: DidCommMsg) {
        let msg_id = msg.id().to_string();
        let msg_type = msg.type_().to_string();

        let response = match msg_type.as_str() {
            CREATE_CONN_REQ_TYPE => match self.handle_create_conn_req(&msg).await {
                Ok(resp) => {
                    tracing::info!(%msg_type, %msg_id, "create-conn request handled");
                    resp
                }
                Err(err) => {
                    tracing::error!(%msg_type, %msg_id, error = %err, "create-conn request failed");
                    CreateConnResp::error(err.to_string())
                }
            },
            other => {
                let err = format!("unsupported message service type : {other}");
                tracing::error!(%msg_type, %msg_id, error = %err, "dropping to error reply");
                CreateConnResp::error(err)
            }
        };

        let reply = match DidCommMsg::new(&response) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(%msg_id, error = %err, "response envelope serialization failed");
                return;
            }
        };

        if let Err(err) = self.messenger.reply_to(&msg_id, reply).await {
            tracing::error!(%msg_type, %msg_id, error = %err, "sendReply failed");
        }
    }

    /// The create-connection pipeline: decode, validate, parse, mint,
    /// connect, reply with the minted document.
    pub async fn handle_create_conn_req(&self, msg: &DidCommMsg) -> CourierResult<CreateConnResp> {
        let request: CreateConnReq = msg
            .decode()
            .map_err(|e| CourierError::decode(format!("parse didcomm message : {e}")))?;

        let peer_doc_value = request
            .data
            .and_then(|d| d.did_doc)
            .filter(|doc| !doc.is_null())
            .ok_or_else(|| CourierError::invalid("did document mandatory"))?;

        let peer_doc = Document::parse(&peer_doc_value)
            .map_err(|e| CourierError::invalid(format!("parse did doc : {e}")))?;

        let router_doc = self
            .mint_peer_did_doc()
            .await
            .map_err(|e| CourierError::crypto(format!("create new peer did : {e}")))?;

        self.did_exchange
            .create_connection(&router_doc.id, &peer_doc)
            .await
            .map_err(|e| CourierError::messaging(format!("create connection : {e}")))?;

        let doc_value = router_doc
            .to_value()
            .map_err(|e| CourierError::internal(format!("marshal did doc : {e}")))?;

        Ok(CreateConnResp::success(doc_value))
    }

    /// Mint a fresh verification key and derive a peer DID document bound
    /// to the router's mediation endpoint.
    async fn mint_peer_did_doc(&self) -> CourierResult<Document> {
        let (kid, pub_key_bytes) = self
            .key_manager
            .create_and_export_pub_key_bytes(self.key_type)
            .await?;

        let did = format!("did:peer:{}", URL_SAFE_NO_PAD.encode(&pub_key_bytes));
        let jwk = Jwk::from_public_key_bytes(&kid, &pub_key_bytes, self.key_type)?;

        let mut auth = VerificationMethod::from_jwk("#key-1", jwk);
        auth.controller = did.clone();

        Ok(Document {
            context: vec![DID_CONTEXT.to_string()],
            id: did,
            authentication: vec![auth],
            key_agreement: vec![],
            service: vec![Service {
                id: Uuid::new_v4().to_string(),
                type_: DIDCOMM_MESSAGING_SERVICE_TYPE.to_string(),
                service_endpoint: self.endpoint.clone(),
            }],
        })
    }
}
