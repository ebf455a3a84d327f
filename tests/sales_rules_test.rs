//! Sale creation rules: PASS-tested units only, serials never on two
//! active sales, whole-transaction rejection.

use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use fabtrack_api::{
    entities::{customer, inventory_unit, sale, sale_item, TestedStatus},
    errors::ServiceError,
    events::EventSender,
    services::sales::{CreateSaleInput, SaleService},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

fn event_sender() -> Arc<EventSender> {
    let (tx, _rx) = mpsc::channel(16);
    Arc::new(EventSender::new(tx))
}

fn a_customer() -> customer::Model {
    customer::Model {
        id: Uuid::new_v4(),
        name: "Buyer".to_string(),
        email: "buyer@example.com".to_string(),
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

fn a_unit(serial: &str, status: TestedStatus) -> inventory_unit::Model {
    inventory_unit::Model {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        product_type_id: Uuid::new_v4(),
        serial_no: serial.to_string(),
        tested_status: status,
        assembled_on: None,
        remarks: None,
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn a_sale(customer_id: Uuid) -> sale::Model {
    sale::Model {
        id: Uuid::new_v4(),
        customer_id,
        invoice_no: "INV-1".to_string(),
        challan_no: None,
        sale_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
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

fn sold_item(serial: &str) -> sale_item::Model {
    sale_item::Model {
        id: Uuid::new_v4(),
        sale_id: Uuid::new_v4(),
        inventory_unit_id: Uuid::new_v4(),
        serial_no: serial.to_string(),
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn input(customer_id: Uuid, serials: Vec<&str>) -> CreateSaleInput {
    CreateSaleInput {
        customer_id,
        invoice_no: "INV-1".into(),
        challan_no: None,
        sale_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        document_path: None,
        notes: None,
        serials: serials.into_iter().map(String::from).collect(),
    }
}

#[tokio::test]
async fn failed_unit_cannot_be_sold() {
    let customer = a_customer();
    let customer_id = customer.id;
    let header = a_sale(customer_id);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // customer exists
        .append_query_results(vec![vec![customer]])
        // invoice uniqueness: no live match
        .append_query_results(vec![Vec::<sale::Model>::new()])
        // header insert (RETURNING)
        .append_query_results(vec![vec![header]])
        // live units
        .append_query_results(vec![vec![a_unit("VCI-100", TestedStatus::Fail)]])
        // serials on active sales
        .append_query_results(vec![Vec::<sale_item::Model>::new()])
        .into_connection();

    let service = SaleService::new(Arc::new(db), event_sender());
    let err = service
        .create_sale(input(customer_id, vec!["VCI-100"]), Uuid::new_v4())
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn serial_on_another_active_sale_is_a_conflict() {
    let customer = a_customer();
    let customer_id = customer.id;
    let header = a_sale(customer_id);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![customer]])
        .append_query_results(vec![Vec::<sale::Model>::new()])
        .append_query_results(vec![vec![header]])
        .append_query_results(vec![vec![a_unit("VCI-200", TestedStatus::Pass)]])
        // Already sold elsewhere, matched normalized
        .append_query_results(vec![vec![sold_item(" vci-200 ")]])
        .into_connection();

    let service = SaleService::new(Arc::new(db), event_sender());
    let err = service
        .create_sale(input(customer_id, vec!["VCI-200"]), Uuid::new_v4())
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn unknown_serial_rejects_the_whole_sale() {
    let customer = a_customer();
    let customer_id = customer.id;
    let header = a_sale(customer_id);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![customer]])
        .append_query_results(vec![Vec::<sale::Model>::new()])
        .append_query_results(vec![vec![header]])
        // No live unit carries the requested serial
        .append_query_results(vec![Vec::<inventory_unit::Model>::new()])
        .append_query_results(vec![Vec::<sale_item::Model>::new()])
        .into_connection();

    let service = SaleService::new(Arc::new(db), event_sender());
    let err = service
        .create_sale(input(customer_id, vec!["VCI-999"]), Uuid::new_v4())
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn empty_serial_list_is_rejected_before_touching_the_database() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let service = SaleService::new(Arc::new(db), event_sender());
    let err = service
        .create_sale(input(Uuid::new_v4(), vec![]), Uuid::new_v4())
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}
