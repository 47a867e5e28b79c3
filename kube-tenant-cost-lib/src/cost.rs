use crate::aggregator::TenantAggregate;
use crate::domain;
use crate::error::{CostError, Result};
use crate::pricing::PriceTable;

pub const MILLICORES_PER_CORE: f64 = 1000.0;
// Memory and storage are priced per binary gigabyte
pub const BYTES_PER_GIB: f64 = 1073741824.0;


impl PriceTable {

    // Aggregate is in millicores, rate is per core.
    pub fn cpu_cost(&self, aggregate: &TenantAggregate) -> f64 {
        self.cpu_unit_rate * (aggregate.total_quantity / MILLICORES_PER_CORE) * aggregate.discount.remaining()
    }

    // Aggregate is in bytes, rate is per GiB.
    pub fn memory_cost(&self, aggregate: &TenantAggregate) -> f64 {
        self.memory_unit_rate * (aggregate.total_quantity / BYTES_PER_GIB) * aggregate.discount.remaining()
    }

    // Aggregate is in bytes, rate is per GiB of the given storage class.
    pub fn storage_cost(&self, storage_class: &str, aggregate: &TenantAggregate) -> Result<f64> {
        let rate = self.storage_rates.get(storage_class)
            .ok_or_else(|| CostError::UnknownStorageClass(storage_class.to_string()))?;
        Ok(rate * (aggregate.total_quantity / BYTES_PER_GIB) * aggregate.discount.remaining())
    }

    // Ingress objects, or distinct domains when charged per domain.
    pub fn billable_ingress(&self, aggregate: &TenantAggregate) -> f64 {
        if self.ingress_per_domain {
            domain::coalesce(&aggregate.hostnames).len() as f64
        } else {
            aggregate.total_quantity
        }
    }

    pub fn ingress_cost(&self, aggregate: &TenantAggregate) -> f64 {
        self.ingress_unit_rate * self.billable_ingress(aggregate) * aggregate.discount.remaining()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::DiscountFraction;

    fn agg(quantity: f64, discount: f64) -> TenantAggregate {
        TenantAggregate {
            total_quantity: quantity,
            discount: DiscountFraction::new(discount).unwrap(),
            ..TenantAggregate::default()
        }
    }

    fn hosts(hostnames: &[&str]) -> TenantAggregate {
        TenantAggregate {
            total_quantity: hostnames.len() as f64,
            discount: DiscountFraction::NONE,
            hostnames: hostnames.iter().map(|h| h.to_string()).collect(),
            records: hostnames.len(),
        }
    }

    #[test]
    fn cpu_cost_per_core() {
        let prices = PriceTable::default();
        assert_eq!(prices.cpu_cost(&agg(1500.0, 0.25)), 1.125);
        assert_eq!(prices.cpu_cost(&agg(1000.0, 0.0)), 1.0);
    }

    #[test]
    fn cpu_cost_is_monotonic() {
        let prices = PriceTable { cpu_unit_rate: 3.0, ..PriceTable::default() };
        let mut last = 0.0;
        for millicores in (0..5000).step_by(250) {
            let cost = prices.cpu_cost(&agg(millicores as f64, 0.1));
            assert!(cost >= last);
            last = cost;
        }
        let mut last = f64::MAX;
        for step in 0..=10 {
            let cost = prices.cpu_cost(&agg(1200.0, step as f64 / 10.0));
            assert!(cost <= last);
            last = cost;
        }
    }

    #[test]
    fn memory_cost_uses_binary_gigabytes() {
        let prices = PriceTable { memory_unit_rate: 2.00, ..PriceTable::default() };
        assert_eq!(prices.memory_cost(&agg(1073741824.0, 0.0)), 2.00);
        assert!(prices.memory_cost(&agg(1e9, 0.0)) < 2.00);
    }

    #[test]
    fn full_discount_is_free() {
        let prices = PriceTable { ingress_per_domain: true, ..PriceTable::default() };
        assert_eq!(prices.cpu_cost(&agg(4000.0, 1.0)), 0.0);
        assert_eq!(prices.memory_cost(&agg(1073741824.0, 1.0)), 0.0);
        assert_eq!(prices.storage_cost("default", &agg(1073741824.0, 1.0)).unwrap(), 0.0);
        let mut ingress = hosts(&["a.example.com"]);
        ingress.discount = DiscountFraction::new(1.0).unwrap();
        assert_eq!(prices.ingress_cost(&ingress), 0.0);
    }

    #[test]
    fn zero_rate_is_honoured() {
        let prices = PriceTable { cpu_unit_rate: 0.0, ..PriceTable::default() };
        assert_eq!(prices.cpu_cost(&agg(4000.0, 0.0)), 0.0);
    }

    #[test]
    fn storage_cost_by_class() {
        let mut prices = PriceTable::default();
        prices.storage_rates.insert("ssd".to_string(), 0.5);
        assert_eq!(prices.storage_cost("ssd", &agg(2.0 * BYTES_PER_GIB, 0.5)).unwrap(), 0.5);
        assert_eq!(prices.storage_cost("default", &agg(BYTES_PER_GIB, 0.0)).unwrap(), 1.0);
        match prices.storage_cost("hdd", &agg(BYTES_PER_GIB, 0.0)) {
            Err(CostError::UnknownStorageClass(class)) => assert_eq!(class, "hdd"),
            other => panic!("expected unknown storage class, got {:?}", other),
        }
    }

    #[test]
    fn ingress_per_object_and_per_domain() {
        let aggregate = hosts(&["a.api.example.com", "b.api.example.com", "shop.example.org"]);

        let per_object = PriceTable { ingress_unit_rate: 2.0, ..PriceTable::default() };
        assert_eq!(per_object.ingress_cost(&aggregate), 6.0);

        let per_domain = PriceTable { ingress_per_domain: true, ..per_object };
        assert_eq!(per_domain.ingress_cost(&aggregate), 4.0);
    }
}
