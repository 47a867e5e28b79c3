use std::collections::HashMap;

use log::{debug, warn};

use crate::discount::{self, DiscountFraction};
use crate::error::Result;
use crate::record::ResourceRecord;


// Consumption of one resource kind by one tenant, local to a single request.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TenantAggregate {
    pub total_quantity: f64,
    pub discount: DiscountFraction,
    pub hostnames: Vec<String>,
    // Number of records folded in so far
    pub records: usize,
}

impl TenantAggregate {

    // Fold a record in. The discount of the last folded record wins.
    fn fold(&mut self, record: &ResourceRecord) -> Result<()> {
        let resolved = discount::resolve(record)?;
        if self.overrides_discount(resolved) {
            // Objects of one tenant disagree on the discount, only the last one counts.
            warn!("{} discount for tenant {} changes from {} to {} at {}",
                  record.kind, record.tenant_id, self.discount.value(),
                  resolved.value(), record.owner_name);
        }
        self.discount = resolved;
        self.total_quantity += record.quantity;
        self.hostnames.extend(record.hostnames.iter().cloned());
        self.records += 1;
        Ok(())
    }

    // Whether folding a record with this discount replaces an earlier one.
    fn overrides_discount(&self, resolved: DiscountFraction) -> bool {
        self.records > 0 && self.discount != resolved
    }
}


// Sum records per tenant.
// Tenants without records get no aggregate at all.
pub fn aggregate(tenant_records: &HashMap<String, Vec<ResourceRecord>>)
    -> Result<HashMap<String, TenantAggregate>> {
    let mut aggregates = HashMap::new();
    for (tenant_id, records) in tenant_records {
        if records.is_empty() {
            continue;
        }
        let mut aggregate = TenantAggregate::default();
        for record in records {
            aggregate.fold(record)?;
        }
        debug!("tenant {} aggregated {} records to {}", tenant_id, records.len(), aggregate.total_quantity);
        aggregates.insert(tenant_id.clone(), aggregate);
    }
    Ok(aggregates)
}


// Sum storage records per tenant and storage class.
pub fn aggregate_by_storage_class(tenant_records: &HashMap<String, Vec<ResourceRecord>>)
    -> Result<HashMap<String, HashMap<String, TenantAggregate>>> {
    let mut aggregates = HashMap::new();
    for (tenant_id, records) in tenant_records {
        let mut by_class: HashMap<String, TenantAggregate> = HashMap::new();
        for record in records {
            let storage_class = match &record.storage_class {
                Some(class) => class.clone(),
                None => {
                    warn!("record {} in tenant {} has no storage class, skipping",
                          record.owner_name, tenant_id);
                    continue;
                }
            };
            by_class.entry(storage_class).or_default().fold(record)?;
        }
        if !by_class.is_empty() {
            aggregates.insert(tenant_id.clone(), by_class);
        }
    }
    Ok(aggregates)
}
