// Per-tenant infrastructure cost over live Kubernetes objects.
//
// Tenants are namespaces. Their pods, persistent volume claims and ingresses
// are read, summed per resource kind, discounted by a label found on the
// objects, and priced with a process-wide price table.

pub mod aggregator;
pub mod cost;
pub mod discount;
pub mod domain;
pub mod engine;
pub mod error;
pub mod pricing;
pub mod quantity;
pub mod reader;
pub mod record;
pub mod source;

#[cfg(test)]
mod testing;

pub use aggregator::TenantAggregate;
pub use discount::DiscountFraction;
pub use engine::CostEngine;
pub use error::{CostError, Result};
pub use pricing::PriceTable;
pub use reader::ResourceReader;
pub use record::{ResourceKind, ResourceRecord};
pub use source::{KubeSource, ResourceSource};
