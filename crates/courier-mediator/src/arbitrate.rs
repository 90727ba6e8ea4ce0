//! Action arbitration
//!
//! Consumes protocol action events (inbound connection and mediation
//! requests) and decides accept/reject. Dispatch is a closed enum over the
//! known message types; anything else is stopped with an error the substrate
//! relays to the requester.

use tokio::sync::{mpsc, watch};

use courier_core::messages::{DIDEX_REQUEST_MSG_TYPE, MEDIATE_REQUEST_MSG_TYPE};
use courier_didcomm::DidCommAction;

/// The closed set of action types the router arbitrates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    /// Inbound DID-exchange connection request
    DidExchangeRequest,
    /// Inbound mediation (route registration) request
    MediationRequest,
    /// Anything else
    Unsupported,
}

impl ActionKind {
    fn classify(msg_type: &str) -> Self {
        match msg_type {
            DIDEX_REQUEST_MSG_TYPE => Self::DidExchangeRequest,
            MEDIATE_REQUEST_MSG_TYPE => Self::MediationRequest,
            _ => Self::Unsupported,
        }
    }
}

/// Arbitrates protocol action events
#[derive(Debug, Default)]
pub struct ActionArbitrator;

impl ActionArbitrator {
    /// Decide one action. Known request types are accepted unconditionally
    /// with no negotiated arguments; unknown types are stopped.
    pub fn handle(&self, action: DidCommAction) {
        let msg_type = action.message.type_().to_string();
        let msg_id = action.message.id().to_string();

        match ActionKind::classify(&msg_type) {
            ActionKind::DidExchangeRequest | ActionKind::MediationRequest => {
                tracing::info!(%msg_type, %msg_id, "accepting action");
                action.continue_protocol();
            }
            ActionKind::Unsupported => {
                let reason = format!("unsupported message type : {msg_type}");
                tracing::error!(%msg_type, %msg_id, %reason, "rejecting action");
                action.stop(format!("handle {msg_type} : {reason}"));
            }
        }
    }

    /// Consume the action stream until shutdown or channel close.
    pub async fn run(
        self,
        mut actions: mpsc::Receiver<DidCommAction>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                maybe = actions.recv() => match maybe {
                    Some(action) => self.handle(action),
                    None => break,
                },
            }
        }

        tracing::info!("action arbitrator stopped");
    }
}
