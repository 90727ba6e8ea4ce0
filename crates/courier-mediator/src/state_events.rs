//! State-change notifier
//!
//! Watches the DID-exchange state stream and, when a protocol instance
//! reaches its terminal "completed" state, sends a fire-and-forget
//! `state-complete` notice to the peer. Everything else on the stream is
//! ignored. Errors are terminal for the single event only; the consumer
//! loop never stops on them.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use courier_core::messages::{StateCompleteNotice, DIDEXCHANGE_PROTOCOL_NAME, STATE_ID_COMPLETED};
use courier_core::{CourierError, CourierResult};
use courier_didcomm::{DidCommMsg, DidExchange, Messenger, StateMsg, StatePhase};

/// Notifies peers when DID-exchange completes
pub struct StateNotifier {
    did_exchange: Arc<dyn DidExchange>,
    messenger: Arc<dyn Messenger>,
}

impl StateNotifier {
    /// Create a notifier over the given capabilities.
    pub fn new(did_exchange: Arc<dyn DidExchange>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            did_exchange,
            messenger,
        }
    }

    /// Consume the state stream until shutdown or channel close.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<StateMsg>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                maybe = events.recv() => match maybe {
                    Some(event) => {
                        if let Err(err) = self.handle(&event).await {
                            tracing::error!(
                                protocol = %event.protocol_name,
                                state = %event.state_id,
                                error = %err,
                                "state event failed"
                            );
                        }
                    }
                    None => break,
                },
            }
        }

        tracing::info!("state notifier stopped");
    }

    /// Handle one state event. Only `{didexchange, post, completed}`
    /// produces a notification; everything else is a silent pass.
    pub async fn handle(&self, event: &StateMsg) -> CourierResult<()> {
        if event.protocol_name != DIDEXCHANGE_PROTOCOL_NAME {
            tracing::debug!(protocol = %event.protocol_name, "ignoring foreign protocol event");
            return Ok(());
        }

        if event.phase != StatePhase::Post || event.state_id != STATE_ID_COMPLETED {
            return Ok(());
        }

        let connection_id = event.properties.connection_id().ok_or_else(|| {
            CourierError::internal("failed to cast didexchange event properties")
        })?;

        let connection = self
            .did_exchange
            .get_connection(connection_id)
            .await
            .map_err(|e| {
                CourierError::messaging(format!("get connection for id={connection_id} : {e}"))
            })?;

        let notice = DidCommMsg::new(&StateCompleteNotice::new())?;

        self.messenger
            .send(notice, &connection.my_did, &connection.their_did)
            .await
            .map_err(|e| {
                CourierError::messaging(format!("send didex state complete msg : {e}"))
            })?;

        tracing::info!(%connection_id, "sent state-complete notice");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::messages::STATE_COMPLETE_MSG_TYPE;
    use courier_didcomm::EventProperties;
    use courier_testkit::{MockDidExchange, MockMessenger, Outbound};

    fn notifier() -> (StateNotifier, mpsc::UnboundedReceiver<Outbound>) {
        let (messenger, outbound) = MockMessenger::new();

        (
            StateNotifier::new(Arc::new(MockDidExchange::default()), Arc::new(messenger)),
            outbound,
        )
    }

    fn completed_event(phase: StatePhase, protocol: &str) -> StateMsg {
        StateMsg {
            phase,
            protocol_name: protocol.to_string(),
            state_id: STATE_ID_COMPLETED.to_string(),
            properties: EventProperties::with_connection_id("conn-1"),
        }
    }

    #[tokio::test]
    async fn post_completed_sends_notice() {
        let (notifier, mut outbound) = notifier();

        notifier
            .handle(&completed_event(StatePhase::Post, DIDEXCHANGE_PROTOCOL_NAME))
            .await
            .expect("completed event should notify");

        match outbound.recv().await.expect("notice expected") {
            Outbound::Send {
                msg,
                my_did,
                their_did,
            } => {
                assert_eq!(msg.type_(), STATE_COMPLETE_MSG_TYPE);
                assert_eq!(my_did, "did:example:router");
                assert_eq!(their_did, "did:example:peer1");
            }
            Outbound::Reply { .. } => panic!("expected a send, not a reply"),
        }
    }

    #[tokio::test]
    async fn pre_state_is_ignored() {
        let (notifier, mut outbound) = notifier();

        notifier
            .handle(&completed_event(StatePhase::Pre, DIDEXCHANGE_PROTOCOL_NAME))
            .await
            .expect("pre state is a silent pass");

        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn foreign_protocol_is_ignored() {
        let (notifier, mut outbound) = notifier();

        notifier
            .handle(&completed_event(StatePhase::Post, "issue-credential"))
            .await
            .expect("foreign protocol is a silent pass");

        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn intermediate_state_is_ignored() {
        let (notifier, mut outbound) = notifier();
        let mut event = completed_event(StatePhase::Post, DIDEXCHANGE_PROTOCOL_NAME);
        event.state_id = "requested".to_string();

        notifier
            .handle(&event)
            .await
            .expect("intermediate state is a silent pass");

        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_properties_are_a_cast_error() {
        let (notifier, _outbound) = notifier();
        let mut event = completed_event(StatePhase::Post, DIDEXCHANGE_PROTOCOL_NAME);
        event.properties = EventProperties::new();

        let err = notifier
            .handle(&event)
            .await
            .expect_err("missing connection id must fail");
        assert!(err
            .to_string()
            .contains("failed to cast didexchange event properties"));
    }

    #[tokio::test]
    async fn get_connection_failure_is_wrapped() {
        let (messenger, _outbound) = MockMessenger::new();
        let notifier = StateNotifier::new(
            Arc::new(MockDidExchange::failing_lookup("get conn error")),
            Arc::new(messenger),
        );

        let err = notifier
            .handle(&completed_event(StatePhase::Post, DIDEXCHANGE_PROTOCOL_NAME))
            .await
            .expect_err("lookup failure must fail");
        assert!(err.to_string().contains("get connection for id="));
    }

    #[tokio::test]
    async fn send_failure_is_wrapped() {
        let (mut messenger, _outbound) = MockMessenger::new();
        messenger.send_err = Some("send error".to_string());
        let notifier =
            StateNotifier::new(Arc::new(MockDidExchange::default()), Arc::new(messenger));

        let err = notifier
            .handle(&completed_event(StatePhase::Post, DIDEXCHANGE_PROTOCOL_NAME))
            .await
            .expect_err("send failure must fail");
        assert!(err.to_string().contains("send didex state complete msg"));
    }

    #[tokio::test]
    async fn loop_survives_event_errors() {
        let (messenger, mut outbound) = MockMessenger::new();
        let notifier = Arc::new(StateNotifier::new(
            Arc::new(MockDidExchange::default()),
            Arc::new(messenger),
        ));

        let (tx, rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(notifier.run(rx, shutdown_rx));

        // A malformed event errors internally, then a good one still lands.
        let mut bad = completed_event(StatePhase::Post, DIDEXCHANGE_PROTOCOL_NAME);
        bad.properties = EventProperties::new();
        tx.send(bad).await.expect("send bad event");
        tx.send(completed_event(StatePhase::Post, DIDEXCHANGE_PROTOCOL_NAME))
            .await
            .expect("send good event");

        assert_matches::assert_matches!(outbound.recv().await, Some(Outbound::Send { .. }));

        drop(tx);
        handle.await.expect("loop exits when channel closes");
    }
}
