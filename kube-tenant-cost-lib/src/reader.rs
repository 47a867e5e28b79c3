use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use futures::future::try_join_all;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use log::{debug, warn};
use tokio::time::timeout;

use crate::error::{CostError, Result};
use crate::pricing::PriceTable;
use crate::quantity;
use crate::record::{ResourceKind, ResourceRecord};
use crate::source::ResourceSource;

// Label prefix set by vcluster on objects it syncs into the host cluster
pub const VCLUSTER_LABEL_PREFIX: &str = "vcluster.loft.sh/";


// Turns a tenant's live objects into consumption records.
pub struct ResourceReader<S> {
    source: S,
    discount_label: String,
    exclude_vcluster_ingress: bool,
    query_timeout: Duration,
}

impl<S: ResourceSource> ResourceReader<S> {

    pub fn new(source: S, prices: &PriceTable, query_timeout: Duration) -> ResourceReader<S> {
        ResourceReader {
            source,
            discount_label: prices.discount_label.clone(),
            exclude_vcluster_ingress: prices.exclude_vcluster_ingress,
            query_timeout,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    // Read records of one kind for every tenant.
    // Tenants are queried concurrently, records keep the platform's order within a tenant.
    // Any failed query fails the whole batch.
    pub async fn read(&self, kind: ResourceKind, tenants: &[String])
        -> Result<HashMap<String, Vec<ResourceRecord>>> {
        let tenants = unique(tenants);
        let per_tenant = try_join_all(
            tenants.iter().map(|tenant| self.read_tenant(kind, tenant))
        ).await?;

        let mut result = HashMap::new();
        for (tenant, records) in tenants.into_iter().zip(per_tenant.into_iter()) {
            if kind == ResourceKind::Storage && records.is_empty() {
                debug!("tenant {} has no storage claims", tenant);
                continue;
            }
            result.insert(tenant, records);
        }
        Ok(result)
    }

    async fn read_tenant(&self, kind: ResourceKind, tenant: &str) -> Result<Vec<ResourceRecord>> {
        match kind {
            ResourceKind::Cpu | ResourceKind::Memory => {
                let pods = self.query("pods", tenant, self.source.list_pods(tenant)).await?;
                pods.iter()
                    .map(|pod| self.pod_record(kind, tenant, pod))
                    .collect()
            },
            ResourceKind::Storage => {
                let claims = self.query(
                    "persistentvolumeclaims", tenant,
                    self.source.list_persistent_volume_claims(tenant)).await?;
                let mut records = Vec::new();
                for claim in claims.iter() {
                    if let Some(record) = self.claim_record(tenant, claim)? {
                        records.push(record);
                    }
                }
                Ok(records)
            },
            ResourceKind::Ingress => {
                let ingresses = self.query("ingresses", tenant, self.source.list_ingresses(tenant)).await?;
                Ok(ingresses.iter()
                    .filter(|ingress| !(self.exclude_vcluster_ingress && is_vcluster_synced(&ingress.metadata)))
                    .map(|ingress| self.ingress_record(tenant, ingress))
                    .collect())
            },
        }
    }

    // List pod names per tenant.
    pub async fn pod_names(&self, tenants: &[String]) -> Result<HashMap<String, Vec<String>>> {
        let tenants = unique(tenants);
        let per_tenant = try_join_all(
            tenants.iter().map(|tenant| self.query("pods", tenant, self.source.list_pods(tenant)))
        ).await?;
        Ok(tenants.into_iter()
            .zip(per_tenant.into_iter())
            .map(|(tenant, pods)| {
                let names = pods.iter().map(|p| object_name(&p.metadata)).collect();
                (tenant, names)
            })
            .collect())
    }

    // Run a platform call bounded by the query timeout.
    pub async fn query<T, F>(&self, what: &'static str, tenant: &str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, String>>,
    {
        match timeout(self.query_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(reason)) => Err(CostError::PlatformQuery {
                what,
                tenant: tenant.to_string(),
                reason,
            }),
            Err(_) => Err(CostError::PlatformQuery {
                what,
                tenant: tenant.to_string(),
                reason: format!("timed out after {:?}", self.query_timeout),
            }),
        }
    }

    // Only the first container's request is read.
    fn pod_record(&self, kind: ResourceKind, tenant: &str, pod: &Pod) -> Result<ResourceRecord> {
        let owner = object_name(&pod.metadata);
        let resource = if kind == ResourceKind::Cpu { "cpu" } else { "memory" };
        let request = pod.spec.as_ref()
            .and_then(|spec| spec.containers.first())
            .and_then(|container| container.resources.as_ref())
            .and_then(|resources| resources.requests.as_ref())
            .and_then(|requests| requests.get(resource));

        let amount = match request {
            Some(q) if kind == ResourceKind::Cpu => parse_request(q, tenant, &owner, quantity::milli_value)?,
            Some(q) => parse_request(q, tenant, &owner, quantity::value)?,
            None => 0.0,
        };

        Ok(ResourceRecord::new(kind, tenant, &owner, amount)
            .with_discount_label(self.discount_label_of(&pod.metadata)))
    }

    fn claim_record(&self, tenant: &str, claim: &PersistentVolumeClaim) -> Result<Option<ResourceRecord>> {
        let owner = object_name(&claim.metadata);
        let spec = match &claim.spec {
            Some(spec) => spec,
            None => return Ok(None),
        };
        let storage_class = match &spec.storage_class_name {
            Some(class) if !class.is_empty() => class,
            _ => {
                warn!("persistent volume claim {} in tenant {} has no storage class, skipping", owner, tenant);
                return Ok(None);
            }
        };
        let request = spec.resources.as_ref()
            .and_then(|resources| resources.requests.as_ref())
            .and_then(|requests| requests.get("storage"));
        let bytes = match request {
            Some(q) => parse_request(q, tenant, &owner, quantity::value)?,
            None => 0.0,
        };

        Ok(Some(ResourceRecord::new(ResourceKind::Storage, tenant, &owner, bytes)
            .with_storage_class(storage_class)
            .with_discount_label(self.discount_label_of(&claim.metadata))))
    }

    fn ingress_record(&self, tenant: &str, ingress: &Ingress) -> ResourceRecord {
        let hostnames: Vec<String> = ingress.spec.as_ref()
            .and_then(|spec| spec.rules.as_ref())
            .map(|rules| rules.iter().filter_map(|rule| rule.host.clone()).collect())
            .unwrap_or_default();

        ResourceRecord::new(ResourceKind::Ingress, tenant, &object_name(&ingress.metadata), 1.0)
            .with_hostnames(hostnames)
            .with_discount_label(self.discount_label_of(&ingress.metadata))
    }

    fn discount_label_of(&self, metadata: &ObjectMeta) -> Option<String> {
        label(metadata, &self.discount_label)
    }
}


pub fn label(metadata: &ObjectMeta, key: &str) -> Option<String> {
    metadata.labels.as_ref().and_then(|labels: &BTreeMap<String, String>| labels.get(key).cloned())
}

fn object_name(metadata: &ObjectMeta) -> String {
    metadata.name.clone().unwrap_or_default()
}

fn is_vcluster_synced(metadata: &ObjectMeta) -> bool {
    metadata.labels.as_ref()
        .map(|labels| labels.keys().any(|k| k.starts_with(VCLUSTER_LABEL_PREFIX)))
        .unwrap_or(false)
}

fn parse_request(q: &Quantity, tenant: &str, owner: &str, scale: fn(&str) -> Option<f64>) -> Result<f64> {
    scale(&q.0).ok_or_else(|| CostError::InvalidQuantity {
        tenant: tenant.to_string(),
        owner: owner.to_string(),
        value: q.0.clone(),
    })
}

// Drop repeated tenant IDs, keeping first occurrence order.
fn unique(tenants: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut result = Vec::new();
    for tenant in tenants {
        if seen.insert(tenant.as_str()) {
            result.push(tenant.clone());
        }
    }
    result
}
