//! Write-time uniqueness checks scoped to non-deleted rows.

use chrono::Utc;
use fabtrack_api::{
    entities::{customer, vendor},
    errors::ServiceError,
    events::EventSender,
    services::customers::{CreateCustomerInput, CustomerService},
    services::vendors::VendorService,
};
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

fn event_sender() -> Arc<EventSender> {
    let (tx, _rx) = mpsc::channel(16);
    Arc::new(EventSender::new(tx))
}

fn existing_customer(email: &str) -> customer::Model {
    customer::Model {
        id: Uuid::new_v4(),
        name: "Existing".to_string(),
        email: email.to_string(),
        phone: None,
        address: None,
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn existing_vendor(name: &str) -> vendor::Model {
    vendor::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: None,
        phone: None,
        address: None,
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

#[tokio::test]
async fn duplicate_customer_email_is_a_conflict() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // The live-rows existence check finds another customer
        .append_query_results(vec![vec![existing_customer("dup@example.com")]])
        .into_connection();

    let service = CustomerService::new(Arc::new(db), event_sender());
    let err = service
        .create_customer(
            CreateCustomerInput {
                name: "New".into(),
                email: "dup@example.com".into(),
                phone: None,
                address: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn unique_email_check_passes_when_no_live_row_matches() {
    let created = existing_customer("fresh@example.com");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // Existence check: nothing found
        .append_query_results(vec![Vec::<customer::Model>::new()])
        // Insert (Postgres RETURNING)
        .append_query_results(vec![vec![created.clone()]])
        .into_connection();

    let service = CustomerService::new(Arc::new(db), event_sender());
    let customer = service
        .create_customer(
            CreateCustomerInput {
                name: "Fresh".into(),
                email: "fresh@example.com".into(),
                phone: None,
                address: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

    assert_eq!(customer.email, "fresh@example.com");
}

#[tokio::test]
async fn vendor_with_live_purchases_cannot_be_deleted() {
    let vendor = existing_vendor("Acme Components");
    let vendor_id = vendor.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // get_vendor
        .append_query_results(vec![vec![vendor]])
        // live purchase count
        .append_query_results(vec![vec![num_items_row(1)]])
        .into_connection();

    let service = VendorService::new(Arc::new(db), event_sender());
    let err = service
        .delete_vendor(vendor_id, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

// Count queries come back as a single row with a num_items column.
fn num_items_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
    let mut map = std::collections::BTreeMap::new();
    map.insert("num_items", sea_orm::Value::BigInt(Some(n)));
    map
}
