use std::collections::BTreeMap;

use log::{info, warn};

use crate::error::{CostError, Result};

pub const DEFAULT_DISCOUNT_LABEL: &str = "natron.io/discount";
pub const DEFAULT_UNIT_RATE: f64 = 1.00;
pub const DEFAULT_STORAGE_CLASS: &str = "default";
const STORAGE_COST_PREFIX: &str = "STORAGE_COST_";


// Unit prices, loaded once at startup and read-only afterwards.
#[derive(Clone, PartialEq, Debug)]
pub struct PriceTable {
    // per core
    pub cpu_unit_rate: f64,
    // per GiB
    pub memory_unit_rate: f64,
    // per ingress object, or per domain
    pub ingress_unit_rate: f64,
    pub ingress_per_domain: bool,
    pub exclude_vcluster_ingress: bool,
    // per GiB, keyed by storage class
    pub storage_rates: BTreeMap<String, f64>,
    // label holding the discount fraction on live objects
    pub discount_label: String,
}

impl Default for PriceTable {
    fn default() -> Self {
        let mut storage_rates = BTreeMap::new();
        storage_rates.insert(DEFAULT_STORAGE_CLASS.to_string(), DEFAULT_UNIT_RATE);
        PriceTable {
            cpu_unit_rate: DEFAULT_UNIT_RATE,
            memory_unit_rate: DEFAULT_UNIT_RATE,
            ingress_unit_rate: DEFAULT_UNIT_RATE,
            ingress_per_domain: false,
            exclude_vcluster_ingress: false,
            storage_rates,
            discount_label: DEFAULT_DISCOUNT_LABEL.to_string(),
        }
    }
}

impl PriceTable {

    // Load prices from process environment.
    pub fn from_env() -> Result<PriceTable> {
        PriceTable::from_vars(std::env::vars())
    }

    // Load prices from key/value pairs shaped like environment variables.
    pub fn from_vars<I>(vars: I) -> Result<PriceTable>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let mut table = PriceTable::default();

        table.discount_label = match vars.get("DISCOUNT_LABEL").filter(|v| !v.is_empty()) {
            Some(label) => {
                info!("DISCOUNT_LABEL set using env: {}", label);
                label.clone()
            },
            None => {
                warn!("DISCOUNT_LABEL is not set, using default: {}", DEFAULT_DISCOUNT_LABEL);
                DEFAULT_DISCOUNT_LABEL.to_string()
            }
        };

        table.cpu_unit_rate = rate_or_default(&vars, "CPU_COST");
        table.memory_unit_rate = rate_or_default(&vars, "MEMORY_COST");
        table.ingress_unit_rate = rate_or_default(&vars, "INGRESS_COST");
        table.ingress_per_domain = flag_or_default(&vars, "INGRESS_COST_PER_DOMAIN");
        table.exclude_vcluster_ingress = flag_or_default(&vars, "EXCLUDE_INGRESS_VCLUSTER");

        let mut storage_rates = BTreeMap::new();
        for (key, value) in vars.iter() {
            if let Some(storage_class) = key.strip_prefix(STORAGE_COST_PREFIX) {
                if storage_class.is_empty() {
                    continue;
                }
                let rate = value.trim().parse::<f64>()
                    .map_err(|_| CostError::InvalidConfiguration(key.clone()))?;
                info!("storage class {} set to cost value: {}", storage_class, rate);
                storage_rates.insert(storage_class.to_string(), rate);
            }
        }
        if storage_rates.is_empty() {
            warn!("STORAGE_COST is not set, storage class {} priced at {}",
                  DEFAULT_STORAGE_CLASS, DEFAULT_UNIT_RATE);
        } else {
            table.storage_rates = storage_rates;
        }

        Ok(table)
    }

    // Storage classes seen in the cluster that have no configured price.
    pub fn missing_storage_classes<I, S>(&self, cluster_classes: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        cluster_classes.into_iter()
            .filter(|c| !self.storage_rates.contains_key(c.as_ref()))
            .map(|c| c.as_ref().to_string())
            .collect()
    }
}

fn rate_or_default(vars: &BTreeMap<String, String>, key: &str) -> f64 {
    match vars.get(key).and_then(|v| v.trim().parse::<f64>().ok()).filter(|v| v.is_finite()) {
        Some(rate) => {
            info!("{} set using env: {}", key, rate);
            rate
        },
        None => {
            warn!("{} is not set or invalid float value, using default: {}", key, DEFAULT_UNIT_RATE);
            DEFAULT_UNIT_RATE
        }
    }
}

fn flag_or_default(vars: &BTreeMap<String, String>, key: &str) -> bool {
    match vars.get(key).and_then(|v| v.trim().parse::<bool>().ok()) {
        Some(flag) => {
            info!("{} set using env: {}", key, flag);
            flag
        },
        None => {
            warn!("{} is not set or invalid bool value, using default: false", key);
            false
        }
    }
}
