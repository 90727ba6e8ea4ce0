//! Invitation generation
//!
//! Stateless façade over the out-of-band capabilities. Invitations are
//! regenerated per request and never persisted; an invitation is never
//! reused across two accept flows.

use std::sync::Arc;

use courier_core::{CourierError, CourierResult};
use courier_didcomm::{Invitation, InvitationV2, OutOfBand, OutOfBandV2};

/// Generates out-of-band invitations for this router
pub struct InvitationGenerator {
    oob: Arc<dyn OutOfBand>,
    oobv2: Arc<dyn OutOfBandV2>,
    label: String,
    media_type_profiles: Vec<String>,
}

impl InvitationGenerator {
    /// Create a generator with the router's label and media-type profiles.
    pub fn new(
        oob: Arc<dyn OutOfBand>,
        oobv2: Arc<dyn OutOfBandV2>,
        label: &str,
        media_type_profiles: Vec<String>,
    ) -> Self {
        Self {
            oob,
            oobv2,
            label: label.to_string(),
            media_type_profiles,
        }
    }

    /// Create a v1 out-of-band invitation.
    pub async fn generate(&self) -> CourierResult<Invitation> {
        self.oob
            .create_invitation(&self.label)
            .await
            .map_err(|e| CourierError::messaging(format!("failed to create router invitation: {e}")))
    }

    /// Create a v2 out-of-band invitation from the given public DID.
    pub async fn generate_v2(&self, from: &str) -> CourierResult<InvitationV2> {
        self.oobv2
            .create_invitation(from, &self.label, &self.media_type_profiles)
            .await
            .map_err(|e| CourierError::messaging(format!("error creating invitation: {e}")))
    }
}
