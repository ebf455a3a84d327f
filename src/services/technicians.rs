use crate::{
    db::DbPool,
    entities::{technician, testing},
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

/// Service for technicians.
#[derive(Clone)]
pub struct TechnicianService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTechnicianInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTechnicianInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl TechnicianService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_technician(
        &self,
        input: CreateTechnicianInput,
        actor: Uuid,
    ) -> Result<technician::Model, ServiceError> {
        let model = technician::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email),
            phone: Set(input.phone),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::TechnicianCreated(created.id))
            .await;

        info!("Created technician: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_technician(
        &self,
        technician_id: Uuid,
        input: UpdateTechnicianInput,
        actor: Uuid,
    ) -> Result<technician::Model, ServiceError> {
        let existing = self.get_technician(technician_id).await?;

        let mut active: technician::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
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

    /// Soft-delete a technician; technicians with recorded tests keep
    /// their history and cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_technician(
        &self,
        technician_id: Uuid,
        actor: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.get_technician(technician_id).await?;

        let live_tests = testing::Entity::find()
            .filter(testing::Column::TechnicianId.eq(technician_id))
            .filter(testing::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_tests > 0 {
            return Err(ServiceError::Conflict(format!(
                "Technician {} has {} recorded test(s)",
                technician_id, live_tests
            )));
        }

        let mut active: technician::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        info!("Soft-deleted technician: {}", technician_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_technician(
        &self,
        technician_id: Uuid,
    ) -> Result<technician::Model, ServiceError> {
        technician::Entity::find_by_id(technician_id)
            .filter(technician::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Technician with ID {} not found", technician_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_technicians(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<technician::Model>, u64), ServiceError> {
        let query = technician::Entity::find()
            .filter(technician::Column::DeletedAt.is_null())
            .order_by_asc(technician::Column::Name);

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
