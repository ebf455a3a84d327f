use crate::{
    db::DbPool,
    entities::{customer, sale},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
        actor: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        self.ensure_unique_email(&input.email, None).await?;

        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_string()),
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
            .send_or_log(Event::CustomerCreated(created.id))
            .await;

        info!("Created customer: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
        actor: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        let existing = self.get_customer(customer_id).await?;

        if let Some(ref email) = input.email {
            self.ensure_unique_email(email, Some(customer_id)).await?;
        }

        let mut active: customer::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(email.trim().to_string());
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

    /// Soft-delete a customer; customers with active sales keep their
    /// history and cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_customer(customer_id).await?;

        let live_sales = sale::Entity::find()
            .filter(sale::Column::CustomerId.eq(customer_id))
            .filter(sale::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_sales > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} has {} active sale(s)",
                customer_id, live_sales
            )));
        }

        let mut active: customer::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        info!("Soft-deleted customer: {}", customer_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .filter(customer::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer with ID {} not found", customer_id))
            })
    }

    /// Searches customers by name or email
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let mut query = customer::Entity::find()
            .filter(customer::Column::DeletedAt.is_null())
            .order_by_asc(customer::Column::Name);

        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            let pattern = term.trim().to_string();
            query = query.filter(
                Condition::any()
                    .add(customer::Column::Name.contains(&pattern))
                    .add(customer::Column::Email.contains(&pattern)),
            );
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn ensure_unique_email(
        &self,
        email: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = customer::Entity::find()
            .filter(customer::Column::Email.eq(email.trim()))
            .filter(customer::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            query = query.filter(customer::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Email '{}' is already used by another customer",
                email.trim()
            )));
        }
        Ok(())
    }
}
