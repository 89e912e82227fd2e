//! Permit Catalog: the admin-managed list of permit types

use parking_auth::Session;
use parking_core::{permit::validate_price, NewPermitType, PermitType, Role};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{EngineError, EngineResult};
use crate::storage::ParkingStore;

#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Arc<dyn ParkingStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ParkingStore>) -> Self {
        Self { store }
    }

    /// Public listing of live permit types
    pub async fn list(&self) -> EngineResult<Vec<PermitType>> {
        Ok(self.store.list_permit_types().await?)
    }

    pub async fn create(&self, admin: &Session, request: NewPermitType) -> EngineResult<PermitType> {
        admin.require(Role::Admin)?;
        let permit_type = request.into_permit_type()?;
        self.store.insert_permit_type(permit_type.clone()).await?;
        info!(
            permit_type = %permit_type.id,
            class = %permit_type.class_name,
            duration = %permit_type.duration_class,
            "Permit type created"
        );
        Ok(permit_type)
    }

    pub async fn update_price(&self, admin: &Session, id: Uuid, price_cents: i64) -> EngineResult<PermitType> {
        admin.require(Role::Admin)?;
        validate_price(price_cents)?;
        let updated = self
            .store
            .update_permit_type_price(id, price_cents)
            .await?
            .ok_or(EngineError::PermitTypeNotFound)?;
        info!(permit_type = %id, price_cents, "Permit type repriced");
        Ok(updated)
    }

    pub async fn delete(&self, admin: &Session, id: Uuid) -> EngineResult<()> {
        admin.require(Role::Admin)?;
        if !self.store.soft_delete_permit_type(id).await? {
            return Err(EngineError::PermitTypeNotFound);
        }
        info!(permit_type = %id, "Permit type retired");
        Ok(())
    }
}
