//! Message-service adapter
//!
//! A named filter registered with the substrate's inbound pipeline. It
//! accepts messages by type and purpose and forwards matches onto an
//! internal channel from a detached task, so substrate delivery never blocks
//! on core processing.

use tokio::sync::mpsc;

use courier_core::CourierResult;
use courier_didcomm::{DidCommMsg, InboundMessageService};

/// Inbound message filter forwarding matches to a channel
pub struct MessageService {
    name: String,
    msg_type: String,
    purposes: Vec<String>,
    forward: mpsc::Sender<DidCommMsg>,
}

impl MessageService {
    /// Create a service accepting the given type and purposes.
    pub fn new(
        name: &str,
        msg_type: &str,
        purposes: Vec<String>,
        forward: mpsc::Sender<DidCommMsg>,
    ) -> Self {
        Self {
            name: name.to_string(),
            msg_type: msg_type.to_string(),
            purposes,
            forward,
        }
    }
}

impl InboundMessageService for MessageService {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept(&self, msg_type: &str, purposes: &[String]) -> bool {
        // Fail closed: a service with no type criterion matches nothing.
        if self.msg_type.is_empty() {
            return false;
        }

        if self.msg_type != msg_type {
            return false;
        }

        self.purposes.is_empty() || self.purposes.iter().any(|p| purposes.contains(p))
    }

    fn handle_inbound(
        &self,
        msg: DidCommMsg,
        _my_did: &str,
        _their_did: &str,
    ) -> CourierResult<String> {
        let forward = self.forward.clone();

        // Detached hand-off: the inbound call returns immediately even if
        // the consumer loop is busy and the one-slot channel is full.
        tokio::spawn(async move {
            if forward.send(msg).await.is_err() {
                tracing::warn!("message consumer loop is gone; dropping inbound message");
            }
        });

        Ok(String::new())
    }
}
