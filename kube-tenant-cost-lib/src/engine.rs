use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use log::{debug, error, info, warn};

use crate::aggregator::{self, TenantAggregate};
use crate::error::{CostError, Result};
use crate::pricing::PriceTable;
use crate::reader::{self, ResourceReader};
use crate::record::ResourceKind;
use crate::source::ResourceSource;


// Per-tenant cost computation over live cluster objects.
// Holds no state between calls besides the read-only price table.
pub struct CostEngine<S> {
    reader: ResourceReader<S>,
    prices: Arc<PriceTable>,
}

impl<S: ResourceSource> CostEngine<S> {

    pub fn new(source: S, prices: Arc<PriceTable>, query_timeout: Duration) -> CostEngine<S> {
        CostEngine {
            reader: ResourceReader::new(source, &prices, query_timeout),
            prices,
        }
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub async fn compute_cpu_costs(&self, tenants: &[String]) -> Result<HashMap<String, f64>> {
        let records = self.reader.read(ResourceKind::Cpu, tenants).await?;
        let aggregates = aggregator::aggregate(&records)?;
        Ok(priced(aggregates, |a| a.total_quantity, |a| self.prices.cpu_cost(a)))
    }

    pub async fn compute_memory_costs(&self, tenants: &[String]) -> Result<HashMap<String, f64>> {
        let records = self.reader.read(ResourceKind::Memory, tenants).await?;
        let aggregates = aggregator::aggregate(&records)?;
        Ok(priced(aggregates, |a| a.total_quantity, |a| self.prices.memory_cost(a)))
    }

    pub async fn compute_ingress_costs(&self, tenants: &[String]) -> Result<HashMap<String, f64>> {
        let records = self.reader.read(ResourceKind::Ingress, tenants).await?;
        let aggregates = aggregator::aggregate(&records)?;
        Ok(priced(aggregates,
                  |a| self.prices.billable_ingress(a),
                  |a| self.prices.ingress_cost(a)))
    }

    // Storage cost per tenant and storage class.
    // An unpriced storage class fails the request.
    pub async fn compute_storage_costs(&self, tenants: &[String])
        -> Result<HashMap<String, HashMap<String, f64>>> {
        let records = self.reader.read(ResourceKind::Storage, tenants).await?;
        let aggregates = aggregator::aggregate_by_storage_class(&records)?;

        let mut costs = HashMap::new();
        for (tenant_id, by_class) in aggregates.into_iter() {
            let mut class_costs = HashMap::new();
            for (storage_class, aggregate) in by_class.iter() {
                if aggregate.total_quantity == 0.0 {
                    continue;
                }
                let cost = self.prices.storage_cost(storage_class, aggregate)?;
                class_costs.insert(storage_class.clone(), cost);
            }
            if !class_costs.is_empty() {
                costs.insert(tenant_id, class_costs);
            }
        }
        Ok(costs)
    }

    // Startup check: every storage class of the cluster must have a price.
    pub async fn verify_storage_classes(&self) -> Result<()> {
        let classes = self.reader.query(
            "storageclasses", "cluster",
            self.reader.source().list_storage_classes()).await?;
        let names: Vec<String> = classes.iter()
            .filter_map(|class| class.metadata.name.clone())
            .collect();

        let missing = self.prices.missing_storage_classes(&names);
        if missing.is_empty() {
            info!("all {} storage classes in cluster have a configured cost", names.len());
            Ok(())
        } else {
            for storage_class in missing.iter() {
                error!("Storage class {} is not set", storage_class);
            }
            Err(CostError::ConfigurationIncomplete(missing))
        }
    }

    // Read a static quota stored as a numeric label on the tenant's namespace.
    // A missing label reads as 0, so does a malformed or negative one.
    pub async fn resource_quota(&self, tenant: &str, label: &str) -> Result<f64> {
        let namespace = self.reader.query(
            "namespaces", tenant,
            self.reader.source().get_namespace(tenant)).await?;

        let raw = match reader::label(&namespace.metadata, label) {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                debug!("namespace {} has no {} label", tenant, label);
                return Ok(0.0);
            }
        };
        match raw.trim().parse::<f64>() {
            Ok(quota) if quota >= 0.0 && quota.is_finite() => Ok(quota),
            _ => {
                warn!("quota value {} is not valid for namespace {} with label {}", raw, tenant, label);
                Ok(0.0)
            }
        }
    }

    pub async fn resource_quotas(&self, tenants: &[String], label: &str) -> Result<HashMap<String, f64>> {
        let quotas = try_join_all(
            tenants.iter().map(|tenant| self.resource_quota(tenant, label))
        ).await?;
        Ok(tenants.iter().cloned().zip(quotas.into_iter()).collect())
    }

    pub async fn tenant_pods(&self, tenants: &[String]) -> Result<HashMap<String, Vec<String>>> {
        self.reader.pod_names(tenants).await
    }
}


// Price every aggregate, leaving out tenants with nothing billable.
fn priced<Q, F>(aggregates: HashMap<String, TenantAggregate>, billable: Q, cost: F) -> HashMap<String, f64>
where
    Q: Fn(&TenantAggregate) -> f64,
    F: Fn(&TenantAggregate) -> f64,
{
    aggregates.into_iter()
        .filter(|(_, aggregate)| billable(aggregate) != 0.0)
        .map(|(tenant_id, aggregate)| {
            let c = cost(&aggregate);
            (tenant_id, c)
        })
        .collect()
}
