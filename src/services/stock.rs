//! Spare-part stock availability.
//!
//! For counted parts: `available = purchased − used_by_assembly −
//! consumed_by_service`, where assembly usage is the assembled unit
//! count times the per-unit quantity from each product's bill of
//! materials. Serial-tracked parts (name contains "pcb") are instead
//! tracked by explicit serial set difference: purchased serials minus
//! assembled minus delivered minus in-service serials. Serials are
//! matched in normalized form and reported verbatim.

use crate::{
    db::DbPool,
    entities::{
        inventory_unit, product, service_delivery_item, service_order_item, service_part_usage,
        sparepart, sparepart_purchase, sparepart_purchase_item,
    },
    errors::ServiceError,
    serials,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Availability report line for one spare part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartAvailability {
    pub sparepart_id: Uuid,
    pub name: String,
    pub serial_tracked: bool,
    pub purchased: i64,
    pub used_by_assembly: i64,
    pub consumed_by_service: i64,
    pub available: i64,
    /// Unconsumed serials (verbatim), present for serial-tracked parts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_serials: Option<Vec<String>>,
    pub below_minimum: bool,
}

/// Raw rows the availability computation consumes; gathered by the
/// service, aggregated in memory.
#[derive(Debug, Default)]
pub struct AvailabilityInputs {
    /// (sparepart_id, quantity, serial_no) of live purchase items
    pub purchase_items: Vec<(Uuid, i32, Option<String>)>,
    /// (product_id, bom) of live products
    pub product_boms: Vec<(Uuid, Vec<product::BomComponent>)>,
    /// live assembled unit count per product
    pub assembled_counts: HashMap<Uuid, i64>,
    /// serials of live assembled units
    pub assembled_serials: Vec<String>,
    /// (sparepart_id, quantity) of live service part usages
    pub service_usages: Vec<(Uuid, i32)>,
    /// serials currently in service (live intake items)
    pub in_service_serials: Vec<String>,
    /// serials already delivered back (live delivery items)
    pub delivered_serials: Vec<String>,
}

/// Compute the availability line for a single part from gathered rows.
pub fn compute_part_availability(
    part: &sparepart::Model,
    inputs: &AvailabilityInputs,
) -> PartAvailability {
    let serial_tracked = part.is_serial_tracked();

    let purchased: i64 = inputs
        .purchase_items
        .iter()
        .filter(|(pid, _, _)| *pid == part.id)
        .map(|(_, qty, _)| *qty as i64)
        .sum();

    let used_by_assembly: i64 = inputs
        .product_boms
        .iter()
        .map(|(product_id, bom)| {
            let units = inputs.assembled_counts.get(product_id).copied().unwrap_or(0);
            bom.iter()
                .filter(|line| line.sparepart_id == part.id)
                .map(|line| units * line.required_quantity as i64)
                .sum::<i64>()
        })
        .sum();

    let consumed_by_service: i64 = inputs
        .service_usages
        .iter()
        .filter(|(pid, _)| *pid == part.id)
        .map(|(_, qty)| *qty as i64)
        .sum();

    if serial_tracked {
        let purchased_serials: Vec<&str> = inputs
            .purchase_items
            .iter()
            .filter(|(pid, _, serial)| *pid == part.id && serial.is_some())
            .map(|(_, _, serial)| serial.as_deref().unwrap_or_default())
            .collect();

        let consumed: HashSet<String> = inputs
            .assembled_serials
            .iter()
            .chain(inputs.delivered_serials.iter())
            .chain(inputs.in_service_serials.iter())
            .map(|s| serials::normalize(s))
            .collect();

        // Keep the first verbatim spelling of each distinct serial
        let mut seen = HashSet::new();
        let available_serials: Vec<String> = purchased_serials
            .into_iter()
            .filter(|s| seen.insert(serials::normalize(s)))
            .filter(|s| !consumed.contains(&serials::normalize(s)))
            .map(|s| s.to_string())
            .collect();

        let available = available_serials.len() as i64;
        let below_minimum = part
            .minimum_stock
            .map(|min| available < min as i64)
            .unwrap_or(false);

        PartAvailability {
            sparepart_id: part.id,
            name: part.name.clone(),
            serial_tracked,
            purchased,
            used_by_assembly,
            consumed_by_service,
            available,
            available_serials: Some(available_serials),
            below_minimum,
        }
    } else {
        let available = purchased - used_by_assembly - consumed_by_service;
        let below_minimum = part
            .minimum_stock
            .map(|min| available < min as i64)
            .unwrap_or(false);

        PartAvailability {
            sparepart_id: part.id,
            name: part.name.clone(),
            serial_tracked,
            purchased,
            used_by_assembly,
            consumed_by_service,
            available,
            available_serials: None,
            below_minimum,
        }
    }
}

/// Service computing spare-part stock on hand.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DbPool>,
}

impl StockService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Availability for every non-deleted spare part.
    #[instrument(skip(self))]
    pub async fn availability_for_all(&self) -> Result<Vec<PartAvailability>, ServiceError> {
        let parts = sparepart::Entity::find()
            .filter(sparepart::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;

        let inputs = self.gather_inputs().await?;
        Ok(parts
            .iter()
            .map(|part| compute_part_availability(part, &inputs))
            .collect())
    }

    /// Availability for one spare part.
    #[instrument(skip(self))]
    pub async fn availability_for(
        &self,
        sparepart_id: Uuid,
    ) -> Result<PartAvailability, ServiceError> {
        let part = sparepart::Entity::find_by_id(sparepart_id)
            .filter(sparepart::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Spare part with ID {} not found", sparepart_id))
            })?;

        let inputs = self.gather_inputs().await?;
        Ok(compute_part_availability(&part, &inputs))
    }

    /// Load every live row the computation needs. Soft-deleted rows are
    /// excluded at every level, including purchase items whose header
    /// was deleted.
    async fn gather_inputs(&self) -> Result<AvailabilityInputs, ServiceError> {
        let purchase_items = sparepart_purchase_item::Entity::find()
            .inner_join(sparepart_purchase::Entity)
            .filter(sparepart_purchase_item::Column::DeletedAt.is_null())
            .filter(sparepart_purchase::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;

        let products = product::Entity::find()
            .filter(product::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;

        let units = inventory_unit::Entity::find()
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;

        let usages = service_part_usage::Entity::find()
            .filter(service_part_usage::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;

        let in_service = service_order_item::Entity::find()
            .filter(service_order_item::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;

        let delivered = service_delivery_item::Entity::find()
            .filter(service_delivery_item::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;

        let mut product_boms = Vec::with_capacity(products.len());
        for p in &products {
            let bom = p.bom_components()?;
            product_boms.push((p.id, bom));
        }

        let mut assembled_counts: HashMap<Uuid, i64> = HashMap::new();
        for unit in &units {
            *assembled_counts.entry(unit.product_id).or_insert(0) += 1;
        }

        Ok(AvailabilityInputs {
            purchase_items: purchase_items
                .into_iter()
                .map(|item| (item.sparepart_id, item.quantity, item.serial_no))
                .collect(),
            product_boms,
            assembled_counts,
            assembled_serials: units.into_iter().map(|u| u.serial_no).collect(),
            service_usages: usages
                .into_iter()
                .map(|u| (u.sparepart_id, u.quantity))
                .collect(),
            in_service_serials: in_service.into_iter().map(|i| i.serial_no).collect(),
            delivered_serials: delivered.into_iter().map(|d| d.serial_no).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::entities::product::BomComponent;

    fn part(name: &str, minimum: Option<i32>) -> sparepart::Model {
        sparepart::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            part_no: None,
            unit: None,
            description: None,
            minimum_stock: minimum,
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn counted_part_availability_is_purchased_minus_usage() {
        let resistor = part("Resistor 10k", None);
        let product_id = Uuid::new_v4();

        let mut assembled_counts = HashMap::new();
        assembled_counts.insert(product_id, 5);

        let inputs = AvailabilityInputs {
            purchase_items: vec![(resistor.id, 100, None), (resistor.id, 50, None)],
            product_boms: vec![(
                product_id,
                vec![BomComponent {
                    sparepart_id: resistor.id,
                    required_quantity: 4,
                }],
            )],
            assembled_counts,
            service_usages: vec![(resistor.id, 7)],
            ..Default::default()
        };

        let line = compute_part_availability(&resistor, &inputs);
        assert_eq!(line.purchased, 150);
        assert_eq!(line.used_by_assembly, 20);
        assert_eq!(line.consumed_by_service, 7);
        assert_eq!(line.available, 123);
        assert!(line.available_serials.is_none());
        assert!(!line.serial_tracked);
    }

    #[test]
    fn bom_quantity_multiplies_per_assembled_unit() {
        let cap = part("Capacitor", None);
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();

        let mut assembled_counts = HashMap::new();
        assembled_counts.insert(p1, 3);
        assembled_counts.insert(p2, 2);

        let inputs = AvailabilityInputs {
            purchase_items: vec![(cap.id, 100, None)],
            product_boms: vec![
                (
                    p1,
                    vec![BomComponent {
                        sparepart_id: cap.id,
                        required_quantity: 2,
                    }],
                ),
                (
                    p2,
                    vec![BomComponent {
                        sparepart_id: cap.id,
                        required_quantity: 5,
                    }],
                ),
            ],
            assembled_counts,
            ..Default::default()
        };

        let line = compute_part_availability(&cap, &inputs);
        // 3 units * 2 + 2 units * 5
        assert_eq!(line.used_by_assembly, 16);
        assert_eq!(line.available, 84);
    }

    #[test]
    fn serialized_part_uses_set_difference_with_normalization() {
        let pcb = part("Main PCB", None);

        let inputs = AvailabilityInputs {
            purchase_items: vec![
                (pcb.id, 1, Some("PCB-001".to_string())),
                (pcb.id, 1, Some("PCB-002".to_string())),
                (pcb.id, 1, Some("PCB-003".to_string())),
                (pcb.id, 1, Some("PCB-004".to_string())),
            ],
            // Assembled with different casing and whitespace; must still match
            assembled_serials: vec![" pcb-001 ".to_string()],
            in_service_serials: vec!["PCB-002".to_string()],
            delivered_serials: vec!["pcb-003".to_string()],
            ..Default::default()
        };

        let line = compute_part_availability(&pcb, &inputs);
        assert!(line.serial_tracked);
        assert_eq!(line.available, 1);
        // The survivor is reported verbatim as purchased
        assert_eq!(line.available_serials.unwrap(), vec!["PCB-004"]);
    }

    #[test]
    fn duplicate_purchased_serials_count_once() {
        let pcb = part("Controller PCB", None);

        let inputs = AvailabilityInputs {
            purchase_items: vec![
                (pcb.id, 1, Some("PCB-9".to_string())),
                (pcb.id, 1, Some("pcb-9 ".to_string())),
            ],
            ..Default::default()
        };

        let line = compute_part_availability(&pcb, &inputs);
        assert_eq!(line.available, 1);
        assert_eq!(line.available_serials.unwrap(), vec!["PCB-9"]);
    }

    #[test]
    fn below_minimum_flags_low_stock() {
        let screw = part("M3 screw", Some(50));
        let inputs = AvailabilityInputs {
            purchase_items: vec![(screw.id, 40, None)],
            ..Default::default()
        };
        let line = compute_part_availability(&screw, &inputs);
        assert!(line.below_minimum);
    }

    #[test]
    fn other_parts_purchases_do_not_leak_in() {
        let a = part("Part A", None);
        let b = part("Part B", None);
        let inputs = AvailabilityInputs {
            purchase_items: vec![(a.id, 10, None), (b.id, 99, None)],
            ..Default::default()
        };
        let line = compute_part_availability(&a, &inputs);
        assert_eq!(line.purchased, 10);
        assert_eq!(line.available, 10);
    }
}
