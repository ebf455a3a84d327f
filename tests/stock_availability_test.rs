//! Stock availability against a mocked database.
//!
//! The calculator reads purchase items (joined to live headers),
//! product BOMs, assembled units, service part usages, and service
//! serial sets, then aggregates in memory. These tests feed it mock
//! rows in the exact order the service queries them.

use chrono::Utc;
use fabtrack_api::{
    entities::{inventory_unit, product, service_part_usage, sparepart, sparepart_purchase_item},
    services::stock::StockService,
};
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use uuid::Uuid;

fn part(id: Uuid, name: &str) -> sparepart::Model {
    sparepart::Model {
        id,
        name: name.to_string(),
        part_no: None,
        unit: None,
        description: None,
        minimum_stock: None,
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn purchase_item(
    sparepart_id: Uuid,
    quantity: i32,
    serial: Option<&str>,
) -> sparepart_purchase_item::Model {
    sparepart_purchase_item::Model {
        id: Uuid::new_v4(),
        purchase_id: Uuid::new_v4(),
        sparepart_id,
        quantity,
        unit_price: None,
        serial_no: serial.map(|s| s.to_string()),
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn product_with_bom(sparepart_id: Uuid, required_quantity: i32) -> product::Model {
    product::Model {
        id: Uuid::new_v4(),
        name: "Device".to_string(),
        description: None,
        bill_of_materials: serde_json::json!([
            {"sparepart_id": sparepart_id, "required_quantity": required_quantity}
        ]),
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

fn unit(product_id: Uuid, serial: &str) -> inventory_unit::Model {
    inventory_unit::Model {
        id: Uuid::new_v4(),
        product_id,
        product_type_id: Uuid::new_v4(),
        serial_no: serial.to_string(),
        tested_status: fabtrack_api::entities::TestedStatus::Pass,
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

fn usage(sparepart_id: Uuid, quantity: i32) -> service_part_usage::Model {
    service_part_usage::Model {
        id: Uuid::new_v4(),
        service_order_item_id: Uuid::new_v4(),
        sparepart_id,
        quantity,
        serial_no: None,
        created_at: Utc::now(),
        updated_at: None,
        created_by: None,
        updated_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

#[tokio::test]
async fn counted_part_subtracts_assembly_and_service_usage() {
    let part_id = Uuid::new_v4();
    let resistor = part(part_id, "Resistor 10k");
    let device = product_with_bom(part_id, 2);
    let device_id = device.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // find_by_id on the part
        .append_query_results(vec![vec![resistor]])
        // purchase items joined to live headers
        .append_query_results(vec![vec![
            purchase_item(part_id, 60, None),
            purchase_item(part_id, 40, None),
        ]])
        // live products with BOMs
        .append_query_results(vec![vec![device]])
        // live assembled units: 3 of the device
        .append_query_results(vec![vec![
            unit(device_id, "D-001"),
            unit(device_id, "D-002"),
            unit(device_id, "D-003"),
        ]])
        // service part usages
        .append_query_results(vec![vec![usage(part_id, 5)]])
        // in-service intake items
        .append_query_results(vec![Vec::<fabtrack_api::entities::service_order_item::Model>::new()])
        // delivered items
        .append_query_results(vec![
            Vec::<fabtrack_api::entities::service_delivery_item::Model>::new(),
        ])
        .into_connection();

    let service = StockService::new(Arc::new(db));
    let line = service.availability_for(part_id).await.unwrap();

    assert_eq!(line.purchased, 100);
    // 3 assembled units * 2 per unit
    assert_eq!(line.used_by_assembly, 6);
    assert_eq!(line.consumed_by_service, 5);
    assert_eq!(line.available, 89);
    assert!(!line.serial_tracked);
    assert!(line.available_serials.is_none());
}

#[tokio::test]
async fn serialized_part_reports_surviving_serials_verbatim() {
    let part_id = Uuid::new_v4();
    let pcb = part(part_id, "Main PCB");
    let device = product_with_bom(part_id, 1);
    let device_id = device.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![pcb]])
        .append_query_results(vec![vec![
            purchase_item(part_id, 1, Some("PCB-001")),
            purchase_item(part_id, 1, Some("PCB-002")),
            purchase_item(part_id, 1, Some("PCB-003")),
        ]])
        .append_query_results(vec![vec![device]])
        // PCB-001 was assembled into a device (serial matched normalized)
        .append_query_results(vec![vec![unit(device_id, " pcb-001 ")]])
        .append_query_results(vec![Vec::<service_part_usage::Model>::new()])
        .append_query_results(vec![Vec::<fabtrack_api::entities::service_order_item::Model>::new()])
        .append_query_results(vec![
            Vec::<fabtrack_api::entities::service_delivery_item::Model>::new(),
        ])
        .into_connection();

    let service = StockService::new(Arc::new(db));
    let line = service.availability_for(part_id).await.unwrap();

    assert!(line.serial_tracked);
    assert_eq!(line.available, 2);
    assert_eq!(
        line.available_serials.unwrap(),
        vec!["PCB-002".to_string(), "PCB-003".to_string()]
    );
}

#[tokio::test]
async fn unknown_part_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<sparepart::Model>::new()])
        .into_connection();

    let service = StockService::new(Arc::new(db));
    let err = service.availability_for(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        fabtrack_api::errors::ServiceError::NotFound(_)
    ));
}
