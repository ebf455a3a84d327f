use crate::{
    db::DbPool,
    entities::{contact_person, service_order, sparepart_purchase, vendor},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Service for vendors and their contact persons.
#[derive(Clone)]
pub struct VendorService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVendorInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVendorInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContactPersonInput {
    pub name: String,
    pub designation: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContactPersonInput {
    pub name: Option<String>,
    pub designation: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A vendor with its live contact persons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDetails {
    pub vendor: vendor::Model,
    pub contacts: Vec<contact_person::Model>,
}

impl VendorService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_vendor(
        &self,
        input: CreateVendorInput,
        actor: Uuid,
    ) -> Result<vendor::Model, ServiceError> {
        self.ensure_unique_name(&input.name, None).await?;

        let model = vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::VendorCreated(created.id))
            .await;

        info!("Created vendor: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_vendor(
        &self,
        vendor_id: Uuid,
        input: UpdateVendorInput,
        actor: Uuid,
    ) -> Result<vendor::Model, ServiceError> {
        let existing = self.get_vendor(vendor_id).await?;

        if let Some(ref name) = input.name {
            self.ensure_unique_name(name, Some(vendor_id)).await?;
        }

        let mut active: vendor::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        active.updated_by = Set(Some(actor));

        Ok(active.update(&*self.db).await?)
    }

    /// Soft-delete a vendor. Vendors with existing purchases or service
    /// orders cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_vendor(&self, vendor_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_vendor(vendor_id).await?;

        let live_purchases = sparepart_purchase::Entity::find()
            .filter(sparepart_purchase::Column::VendorId.eq(vendor_id))
            .filter(sparepart_purchase::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_purchases > 0 {
            return Err(ServiceError::Conflict(format!(
                "Vendor {} has {} existing purchase(s)",
                vendor_id, live_purchases
            )));
        }

        let live_orders = service_order::Entity::find()
            .filter(service_order::Column::VendorId.eq(vendor_id))
            .filter(service_order::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Vendor {} has {} existing service order(s)",
                vendor_id, live_orders
            )));
        }

        let now = Utc::now();

        // Contact persons are retired with their vendor
        let contacts = contact_person::Entity::find()
            .filter(contact_person::Column::VendorId.eq(vendor_id))
            .filter(contact_person::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;
        for contact in contacts {
            let mut active: contact_person::ActiveModel = contact.into();
            active.deleted_at = Set(Some(now));
            active.deleted_by = Set(Some(actor));
            active.update(&*self.db).await?;
        }

        let mut active: vendor::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        info!("Soft-deleted vendor: {}", vendor_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_vendor(&self, vendor_id: Uuid) -> Result<vendor::Model, ServiceError> {
        vendor::Entity::find_by_id(vendor_id)
            .filter(vendor::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor with ID {} not found", vendor_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn get_vendor_with_contacts(
        &self,
        vendor_id: Uuid,
    ) -> Result<VendorDetails, ServiceError> {
        let vendor = self.get_vendor(vendor_id).await?;
        let contacts = contact_person::Entity::find()
            .filter(contact_person::Column::VendorId.eq(vendor_id))
            .filter(contact_person::Column::DeletedAt.is_null())
            .order_by_asc(contact_person::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(VendorDetails { vendor, contacts })
    }

    #[instrument(skip(self))]
    pub async fn list_vendors(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<(Vec<vendor::Model>, u64), ServiceError> {
        let mut query = vendor::Entity::find()
            .filter(vendor::Column::DeletedAt.is_null())
            .order_by_asc(vendor::Column::Name);

        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(vendor::Column::Name.contains(term.trim()));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, input), fields(vendor_id = %vendor_id))]
    pub async fn add_contact(
        &self,
        vendor_id: Uuid,
        input: CreateContactPersonInput,
        actor: Uuid,
    ) -> Result<contact_person::Model, ServiceError> {
        self.get_vendor(vendor_id).await?;

        let model = contact_person::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            name: Set(input.name.trim().to_string()),
            designation: Set(input.designation),
            email: Set(input.email),
            phone: Set(input.phone),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };

        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_contact(
        &self,
        vendor_id: Uuid,
        contact_id: Uuid,
        input: UpdateContactPersonInput,
        actor: Uuid,
    ) -> Result<contact_person::Model, ServiceError> {
        let existing = self.find_live_contact(vendor_id, contact_id).await?;

        let mut active: contact_person::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(designation) = input.designation {
            active.designation = Set(Some(designation));
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        active.updated_by = Set(Some(actor));

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_contact(
        &self,
        vendor_id: Uuid,
        contact_id: Uuid,
        actor: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.find_live_contact(vendor_id, contact_id).await?;

        let mut active: contact_person::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        Ok(())
    }

    async fn find_live_contact(
        &self,
        vendor_id: Uuid,
        contact_id: Uuid,
    ) -> Result<contact_person::Model, ServiceError> {
        contact_person::Entity::find_by_id(contact_id)
            .filter(contact_person::Column::VendorId.eq(vendor_id))
            .filter(contact_person::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Contact person with ID {} not found for vendor {}",
                    contact_id, vendor_id
                ))
            })
    }

    async fn ensure_unique_name(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = vendor::Entity::find()
            .filter(vendor::Column::Name.eq(name.trim()))
            .filter(vendor::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            query = query.filter(vendor::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Vendor name '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }
}
