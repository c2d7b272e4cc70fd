use crate::common::{ApiError, ApiResult};
use crate::extractors::{Identity, IdentityError};
use crate::models::dtos::device::{RegisterDeviceBodyDto, UpdateDeviceBodyDto};
use crate::models::{Device, DeviceUpdate, UpdateExpression};
use crate::services::authorize::authorize;
use crate::services::store::DeviceStore;
use crate::services::validate;
use std::sync::Arc;

/// The caller as resolved by the transport, possibly unauthenticated.
pub type Caller = Result<Identity, IdentityError>;

pub struct DeviceService {
    store: Arc<dyn DeviceStore>,
}

impl DeviceService {
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self { store }
    }

    /// Validate, authorize against the declared owner, then create if absent.
    pub async fn register(&self, caller: Caller, body: RegisterDeviceBodyDto) -> ApiResult<Device> {
        let device = validate::registration(body)?;
        let identity = caller?;
        if let Err(err) = authorize(&identity, &device.owner).ensure() {
            tracing::warn!(
                "{} tried to register {} on behalf of {}",
                identity.email,
                device.mac,
                device.owner
            );
            return Err(err);
        }
        let device = Device::from(device);
        self.store.create_if_absent(&device).await?;
        tracing::info!("Registered device {} for {}", device.mac, device.owner);
        Ok(device)
    }

    /// Validate, resolve the caller, look up the stored owner, authorize, then
    /// apply the partial update.
    pub async fn update(&self, caller: Caller, body: UpdateDeviceBodyDto) -> ApiResult<()> {
        let DeviceUpdate { mac, patch } = validate::update(body)?;
        // storage is never read on behalf of an unauthenticated caller
        let identity = caller?;
        let existing = self
            .store
            .get_consistent(&mac)
            .await?
            .ok_or_else(|| ApiError::MacNotFound(mac.clone()))?;
        if let Err(err) = authorize(&identity, &existing.owner).ensure() {
            tracing::warn!("{} tried to update {} owned by someone else", identity.email, mac);
            return Err(err);
        }
        let expression = UpdateExpression::build(&patch);
        tracing::debug!("Updating {}: {}", mac, expression);
        self.store.partial_update(&mac, &expression).await?;
        tracing::info!("Updated device {} {:?}", mac, expression.fields());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceStatus;
    use crate::services::store::tests::memory_pool;
    use crate::services::store::{SqliteDeviceStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes on top of a real store.
    struct RecordingStore {
        inner: SqliteDeviceStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl DeviceStore for RecordingStore {
        async fn create_if_absent(&self, device: &Device) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.create_if_absent(device).await
        }
        async fn get_consistent(&self, mac: &str) -> Result<Option<Device>, StoreError> {
            self.inner.get_consistent(mac).await
        }
        async fn partial_update(
            &self,
            mac: &str,
            update: &UpdateExpression,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.partial_update(mac, update).await
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl DeviceStore for BrokenStore {
        async fn create_if_absent(&self, _device: &Device) -> Result<(), StoreError> {
            Err(sqlx::Error::PoolClosed.into())
        }
        async fn get_consistent(&self, _mac: &str) -> Result<Option<Device>, StoreError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn partial_update(&self, _: &str, _: &UpdateExpression) -> Result<(), StoreError> {
            Err(sqlx::Error::PoolClosed.into())
        }
    }

    async fn recording() -> (DeviceService, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore {
            inner: SqliteDeviceStore::new(memory_pool().await),
            writes: AtomicUsize::new(0),
        });
        (DeviceService::new(store.clone()), store)
    }

    fn caller(email: &str) -> Caller {
        Ok(Identity {
            email: email.to_string(),
        })
    }

    fn register_body(name: &str, mac: &str, owner: &str) -> RegisterDeviceBodyDto {
        RegisterDeviceBodyDto {
            name: Some(name.into()),
            mac: Some(mac.into()),
            owner: Some(owner.into()),
        }
    }

    fn update_body(mac: &str, name: Option<&str>, status: Option<&str>) -> UpdateDeviceBodyDto {
        UpdateDeviceBodyDto {
            mac: Some(mac.into()),
            name: name.map(Into::into),
            status: status.map(Into::into),
        }
    }

    #[tokio::test]
    async fn test_register_forces_offline() {
        let (service, store) = recording().await;
        let device = service
            .register(
                caller("a@example.com"),
                register_body("kitchen-sensor", "AA:BB:CC:DD:EE:FF", "a@example.com"),
            )
            .await
            .unwrap();
        assert_eq!(device.status, DeviceStatus::Offline);
        let stored = store.get_consistent("AA:BB:CC:DD:EE:FF").await.unwrap();
        assert_eq!(stored, Some(device));
    }

    #[tokio::test]
    async fn test_register_twice() {
        let (service, store) = recording().await;
        service
            .register(
                caller("a@example.com"),
                register_body("kitchen-sensor", "AA:BB:CC:DD:EE:FF", "a@example.com"),
            )
            .await
            .unwrap();
        let err = service
            .register(
                caller("b@example.com"),
                register_body("porch", "AA:BB:CC:DD:EE:FF", "b@example.com"),
            )
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::DuplicateMac(mac) if mac == "AA:BB:CC:DD:EE:FF"));

        let stored = store
            .get_consistent("AA:BB:CC:DD:EE:FF")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "kitchen-sensor");
        assert_eq!(stored.owner, "a@example.com");
    }

    #[tokio::test]
    async fn test_register_rejections_leave_storage_untouched() {
        let (service, store) = recording().await;
        let err = service
            .register(
                caller("b@example.com"),
                register_body("kitchen-sensor", "AA:BB:CC:DD:EE:FF", "a@example.com"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let err = service
            .register(
                Err(IdentityError::Unauthenticated),
                register_body("kitchen-sensor", "AA:BB:CC:DD:EE:FF", "a@example.com"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));

        let err = service
            .register(
                Err(IdentityError::MalformedIdentity),
                register_body("kitchen-sensor", "AA:BB:CC:DD:EE:FF", "a@example.com"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedIdentity));

        // validation runs before the identity is even looked at
        let err = service
            .register(
                Err(IdentityError::Unauthenticated),
                register_body("kitchen-sensor", "AA:BB:CC:DD:EE", "a@example.com"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_scenario() {
        let (service, store) = recording().await;
        let mac = "AA:BB:CC:DD:EE:FF";
        service
            .register(
                caller("a@example.com"),
                register_body("kitchen-sensor", mac, "a@example.com"),
            )
            .await
            .unwrap();

        service
            .update(caller("a@example.com"), update_body(mac, None, Some("online")))
            .await
            .unwrap();
        let stored = store.get_consistent(mac).await.unwrap().unwrap();
        assert_eq!(stored.status, DeviceStatus::Online);
        assert_eq!(stored.name, "kitchen-sensor");

        let err = service
            .update(caller("b@example.com"), update_body(mac, Some("mine"), Some("offline")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        assert_eq!(store.get_consistent(mac).await.unwrap().unwrap(), stored);

        service
            .update(caller("a@example.com"), update_body(mac, Some("pantry"), None))
            .await
            .unwrap();
        let stored = store.get_consistent(mac).await.unwrap().unwrap();
        assert_eq!(stored.name, "pantry");
        assert_eq!(stored.status, DeviceStatus::Online);
    }

    #[tokio::test]
    async fn test_update_unknown_mac_issues_no_write() {
        let (service, store) = recording().await;
        let err = service
            .update(
                caller("a@example.com"),
                update_body("AA:BB:CC:DD:EE:FF", None, Some("online")),
            )
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::MacNotFound(mac) if mac == "AA:BB:CC:DD:EE:FF"));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_without_fields_is_rejected() {
        let (service, store) = recording().await;
        let err = service
            .update(caller("a@example.com"), update_body("AA:BB:CC:DD:EE:FF", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_resolves_caller_before_lookup() {
        // a broken store would turn any lookup into a storage error
        let service = DeviceService::new(Arc::new(BrokenStore));
        let err = service
            .update(
                Err(IdentityError::Unauthenticated),
                update_body("AA:BB:CC:DD:EE:FF", None, Some("online")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));

        let err = service
            .update(
                Err(IdentityError::MalformedIdentity),
                update_body("AA:BB:CC:DD:EE:FF", None, Some("online")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedIdentity));
    }

    #[tokio::test]
    async fn test_storage_failures() {
        let service = DeviceService::new(Arc::new(BrokenStore));
        let err = service
            .register(
                caller("a@example.com"),
                register_body("kitchen-sensor", "AA:BB:CC:DD:EE:FF", "a@example.com"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));

        let err = service
            .update(
                caller("a@example.com"),
                update_body("AA:BB:CC:DD:EE:FF", Some("porch"), None),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }
}
