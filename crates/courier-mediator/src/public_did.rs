//! Public DID provisioning
//!
//! Creates-or-fetches the router's long-lived, ledger-anchored public DID.
//! The DID string is kept under a well-known key in a store shared by all
//! router replicas: the first replica to provision writes it, every later
//! call returns the stored value without touching the key manager or the
//! registry.
//!
//! The read-then-write is not guarded by compare-and-swap; two replicas
//! racing an empty store can both anchor a document. See DESIGN.md.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::sync::Arc;
use uuid::Uuid;

use courier_core::did::{DIDCOMM_MESSAGING_SERVICE_TYPE, DID_CONTEXT};
use courier_core::{
    CourierError, CourierResult, Document, Jwk, KeyType, Service, VerificationMethod,
};
use courier_didcomm::{CreateDidOptions, DidRegistry, KeyManager, Store};

/// Well-known store key holding the router's public DID
pub const STORE_DID_KEY: &str = "did-value";

/// Provisions the router's ledger-anchored public DID
pub struct PublicDidProvisioner {
    store: Arc<dyn Store>,
    key_manager: Arc<dyn KeyManager>,
    registry: Arc<dyn DidRegistry>,
    key_type: KeyType,
    key_agreement_type: KeyType,
}

impl PublicDidProvisioner {
    /// Create a provisioner with the configured key types.
    pub fn new(
        store: Arc<dyn Store>,
        key_manager: Arc<dyn KeyManager>,
        registry: Arc<dyn DidRegistry>,
        key_type: KeyType,
        key_agreement_type: KeyType,
    ) -> Self {
        Self {
            store,
            key_manager,
            registry,
            key_type,
            key_agreement_type,
        }
    }

    /// Get the public DID, creating and anchoring it on first call.
    ///
    /// A persistence failure after anchoring is fatal to this attempt and
    /// must not be retried silently: retrying would mint a second, orphaned
    /// identity on the ledger.
    pub async fn get_or_create(&self, endpoint: &str) -> CourierResult<String> {
        if let Ok(existing) = self.store.get(STORE_DID_KEY).await {
            // Another replica already provisioned and saved the DID.
            let did = String::from_utf8(existing)
                .map_err(|e| CourierError::storage(format!("stored DID is not UTF-8: {e}")))?;

            return Ok(did);
        }

        let template = self.doc_template(endpoint).await?;
        let resolution = self
            .request_ledger_create(&template)
            .await
            .map_err(|e| CourierError::registry(format!("creating public DID: {e}")))?;

        let did = resolution.did_document.id;

        self.store
            .put(STORE_DID_KEY, did.as_bytes())
            .await
            .map_err(|e| CourierError::storage(format!("error saving public DID: {e}")))?;

        tracing::info!(%did, "provisioned public DID");

        Ok(did)
    }

    /// Build the unanchored document template: one authentication entry,
    /// one key-agreement entry, one DIDComm service.
    async fn doc_template(&self, endpoint: &str) -> CourierResult<Document> {
        let auth = self
            .create_verification("#key-1", self.key_type)
            .await
            .map_err(|e| CourierError::crypto(format!("creating did doc Authentication: {e}")))?;

        let key_agreement = self
            .create_verification("#key-2", self.key_agreement_type)
            .await
            .map_err(|e| CourierError::crypto(format!("creating did doc KeyAgreement: {e}")))?;

        Ok(Document {
            context: vec![DID_CONTEXT.to_string()],
            id: String::new(),
            authentication: vec![auth],
            key_agreement: vec![key_agreement],
            service: vec![Service {
                id: Uuid::new_v4().to_string(),
                type_: DIDCOMM_MESSAGING_SERVICE_TYPE.to_string(),
                service_endpoint: endpoint.to_string(),
            }],
        })
    }

    /// Mint a key through the KMS and wrap it as a JWK verification method.
    async fn create_verification(
        &self,
        id: &str,
        key_type: KeyType,
    ) -> CourierResult<VerificationMethod> {
        let (kid, pub_key_bytes) = self
            .key_manager
            .create_and_export_pub_key_bytes(key_type)
            .await
            .map_err(|e| CourierError::crypto(format!("creating public key: {e}")))?;

        let jwk = Jwk::from_public_key_bytes(&kid, &pub_key_bytes, key_type)
            .map_err(|e| CourierError::crypto(format!("creating jwk: {e}")))?;

        Ok(VerificationMethod::from_jwk(id, jwk))
    }

    /// Generate recovery and update keys and submit the create operation.
    /// The ledger method needs both for future rotation and recovery.
    async fn request_ledger_create(
        &self,
        doc: &Document,
    ) -> CourierResult<courier_didcomm::DocResolution> {
        let recovery_key = SigningKey::generate(&mut OsRng).verifying_key();
        let update_key = SigningKey::generate(&mut OsRng).verifying_key();

        self.registry
            .create(
                doc,
                CreateDidOptions {
                    update_key: update_key.to_bytes().to_vec(),
                    recovery_key: recovery_key.to_bytes().to_vec(),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_testkit::{MemoryStore, MockDidRegistry, MockKeyManager};

    struct Fixture {
        store: Arc<MemoryStore>,
        key_manager: Arc<MockKeyManager>,
        registry: Arc<MockDidRegistry>,
        provisioner: PublicDidProvisioner,
    }

    fn fixture_with(store: Arc<MemoryStore>, key_manager: Arc<MockKeyManager>) -> Fixture {
        let registry = Arc::new(MockDidRegistry::default());

        Fixture {
            store: store.clone(),
            key_manager: key_manager.clone(),
            registry: registry.clone(),
            provisioner: PublicDidProvisioner::new(
                store,
                key_manager,
                registry,
                KeyType::Ed25519,
                KeyType::X25519,
            ),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            Arc::new(MemoryStore::default()),
            Arc::new(MockKeyManager::default()),
        )
    }

    #[tokio::test]
    async fn creates_and_persists_on_empty_store() {
        let f = fixture();

        let did = f
            .provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect("provisioning should succeed");

        assert!(did.starts_with("did:"));
        assert_eq!(f.registry.calls(), 1);
        assert_eq!(f.key_manager.calls(), 2); // auth + key agreement

        let stored = f.store.get(STORE_DID_KEY).await.expect("persisted");
        assert_eq!(String::from_utf8(stored).expect("utf8"), did);
    }

    #[tokio::test]
    async fn second_call_is_a_pure_store_read() {
        let f = fixture();

        let first = f
            .provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect("first call");
        let second = f
            .provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect("second call");

        assert_eq!(first, second);
        // No second anchoring, no further key minting.
        assert_eq!(f.registry.calls(), 1);
        assert_eq!(f.key_manager.calls(), 2);
    }

    #[tokio::test]
    async fn seeded_store_skips_capabilities_entirely() {
        let store = Arc::new(MemoryStore::default());
        store.seed(STORE_DID_KEY, b"did:orb:existing");
        let f = fixture_with(store, Arc::new(MockKeyManager::default()));

        let did = f
            .provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect("fast path");

        assert_eq!(did, "did:orb:existing");
        assert_eq!(f.registry.calls(), 0);
        assert_eq!(f.key_manager.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_key_type_is_attributed_to_authentication() {
        let store = Arc::new(MemoryStore::default());
        let provisioner = PublicDidProvisioner::new(
            store,
            Arc::new(MockKeyManager::default()),
            Arc::new(MockDidRegistry::default()),
            KeyType::Bls12381G2,
            KeyType::X25519,
        );

        let err = provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect_err("bad key type must fail");
        assert!(err.to_string().contains("creating did doc Authentication"));
    }

    #[tokio::test]
    async fn unsupported_key_agreement_type_is_attributed() {
        let store = Arc::new(MemoryStore::default());
        let provisioner = PublicDidProvisioner::new(
            store,
            Arc::new(MockKeyManager::default()),
            Arc::new(MockDidRegistry::default()),
            KeyType::Ed25519,
            KeyType::Bls12381G2,
        );

        let err = provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect_err("bad key agreement type must fail");
        assert!(err.to_string().contains("creating did doc KeyAgreement"));
    }

    #[tokio::test]
    async fn registry_failure_is_wrapped() {
        let store = Arc::new(MemoryStore::default());
        let provisioner = PublicDidProvisioner::new(
            store,
            Arc::new(MockKeyManager::default()),
            Arc::new(MockDidRegistry::failing("ledger unreachable")),
            KeyType::Ed25519,
            KeyType::X25519,
        );

        let err = provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect_err("registry failure must fail");
        assert!(err.to_string().contains("creating public DID"));
        assert!(err.to_string().contains("ledger unreachable"));
    }

    #[tokio::test]
    async fn persistence_failure_is_distinct_and_fatal() {
        let store = Arc::new(MemoryStore::failing_puts("disk full"));
        let f = fixture_with(store, Arc::new(MockKeyManager::default()));

        let err = f
            .provisioner
            .get_or_create("https://router.example.com/didcomm")
            .await
            .expect_err("persistence failure must surface");
        assert!(err.to_string().contains("error saving public DID"));

        // The identity was anchored before the save failed; that is exactly
        // why the caller must not retry silently.
        assert_eq!(f.registry.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_provisioning_race_both_succeed() {
        // Two "replicas" share one empty store. Both may anchor a document;
        // the store ends up with whichever wrote last. This documents the
        // check-then-act race rather than asserting exactly-once.
        let store = Arc::new(MemoryStore::default());
        let a = fixture_with(store.clone(), Arc::new(MockKeyManager::default()));
        let b = fixture_with(store.clone(), Arc::new(MockKeyManager::default()));

        let (did_a, did_b) = tokio::join!(
            a.provisioner.get_or_create("https://a.example.com"),
            b.provisioner.get_or_create("https://b.example.com"),
        );

        let did_a = did_a.expect("replica a succeeds");
        let did_b = did_b.expect("replica b succeeds");

        let stored = store.get(STORE_DID_KEY).await.expect("one value stored");
        let stored = String::from_utf8(stored).expect("utf8");
        assert!(stored == did_a || stored == did_b);
    }
}
