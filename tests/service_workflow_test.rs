//! Vendor service intake rules.

use chrono::{NaiveDate, Utc};
use fabtrack_api::{
    entities::{service_order, service_order_item, vendor, ServiceStatus},
    errors::ServiceError,
    events::EventSender,
    services::service_orders::{CreateServiceOrderInput, ServiceItemInput, ServiceOrderService},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

fn event_sender() -> Arc<EventSender> {
    let (tx, _rx) = mpsc::channel(16);
    Arc::new(EventSender::new(tx))
}

fn a_vendor() -> vendor::Model {
    vendor::Model {
        id: Uuid::new_v4(),
        name: "Repair Partner".to_string(),
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

fn open_item(serial: &str) -> service_order_item::Model {
    service_order_item::Model {
        id: Uuid::new_v4(),
        service_order_id: Uuid::new_v4(),
        serial_no: serial.to_string(),
        complaint: None,
        diagnosis: None,
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn an_order(vendor_id: Uuid) -> service_order::Model {
    service_order::Model {
        id: Uuid::new_v4(),
        vendor_id,
        challan_no: "SRV-1".to_string(),
        received_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        status: ServiceStatus::Received,
        document_path: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn intake(vendor_id: Uuid, serials: Vec<&str>) -> CreateServiceOrderInput {
    CreateServiceOrderInput {
        vendor_id,
        challan_no: "SRV-1".into(),
        received_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        document_path: None,
        notes: None,
        items: serials
            .into_iter()
            .map(|s| ServiceItemInput {
                serial_no: s.into(),
                complaint: Some("no power".into()),
            })
            .collect(),
    }
}

#[tokio::test]
async fn serial_already_in_open_service_is_a_conflict() {
    let vendor = a_vendor();
    let vendor_id = vendor.id;
    let header = an_order(vendor_id);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // vendor exists
        .append_query_results(vec![vec![vendor]])
        // intake challan uniqueness: no live match
        .append_query_results(vec![Vec::<service_order::Model>::new()])
        // live intake items anywhere: VCI-5 still open
        .append_query_results(vec![vec![open_item("VCI-5")]])
        // no delivery rows for it
        .append_query_results(vec![
            Vec::<fabtrack_api::entities::service_delivery_item::Model>::new(),
        ])
        // header insert (RETURNING)
        .append_query_results(vec![vec![header]])
        .into_connection();

    let service = ServiceOrderService::new(Arc::new(db), event_sender());
    let err = service
        .create_service_order(intake(vendor_id, vec![" vci-5 "]), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_serial_within_one_intake_is_a_conflict() {
    let vendor = a_vendor();
    let vendor_id = vendor.id;
    let header = an_order(vendor_id);
    let first_item = open_item("VCI-9");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![vendor]])
        .append_query_results(vec![Vec::<service_order::Model>::new()])
        // nothing currently in service
        .append_query_results(vec![Vec::<service_order_item::Model>::new()])
        .append_query_results(vec![vec![header]])
        // the first item row inserts fine (RETURNING)
        .append_query_results(vec![vec![first_item]])
        .into_connection();

    let service = ServiceOrderService::new(Arc::new(db), event_sender());
    let err = service
        .create_service_order(intake(vendor_id, vec!["VCI-9", "vci-9"]), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn empty_intake_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let service = ServiceOrderService::new(Arc::new(db), event_sender());
    let err = service
        .create_service_order(intake(Uuid::new_v4(), vec![]), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ValidationError(_)));
}
