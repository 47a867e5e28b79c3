use std::fmt;
use std::str::FromStr;


// Dimension being measured and priced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ResourceKind {
    Cpu,
    Memory,
    Storage,
    Ingress,
}

impl ResourceKind {

    // Unit the raw quantity of this kind is expressed in.
    pub fn unit(&self) -> &'static str {
        match self {
            ResourceKind::Cpu => "millicores",
            ResourceKind::Memory | ResourceKind::Storage => "bytes",
            ResourceKind::Ingress => "objects",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
            ResourceKind::Storage => "storage",
            ResourceKind::Ingress => "ingress",
        };
        f.write_str(name)
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(ResourceKind::Cpu),
            "memory" => Ok(ResourceKind::Memory),
            "storage" => Ok(ResourceKind::Storage),
            "ingress" => Ok(ResourceKind::Ingress),
            _ => Err(format!("unknown resource kind {}", s)),
        }
    }
}


// One raw measurement read from the cluster.
// Built fresh on every read and dropped once aggregated.
#[derive(Clone, PartialEq, Debug)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub tenant_id: String,
    pub owner_name: String,
    pub quantity: f64,
    pub unit: &'static str,
    // Raw value of the discount label, parsed later by the resolver
    pub discount_label: Option<String>,
    // Set for storage claims only
    pub storage_class: Option<String>,
    // Rule hosts, set for ingress objects only
    pub hostnames: Vec<String>,
}

impl ResourceRecord {

    pub fn new(kind: ResourceKind, tenant_id: &str, owner_name: &str, quantity: f64) -> ResourceRecord {
        ResourceRecord {
            kind,
            tenant_id: tenant_id.to_string(),
            owner_name: owner_name.to_string(),
            quantity,
            unit: kind.unit(),
            discount_label: None,
            storage_class: None,
            hostnames: Vec::new(),
        }
    }

    pub fn with_discount_label(mut self, label: Option<String>) -> ResourceRecord {
        self.discount_label = label;
        self
    }

    pub fn with_storage_class(mut self, storage_class: &str) -> ResourceRecord {
        self.storage_class = Some(storage_class.to_string());
        self
    }

    pub fn with_hostnames(mut self, hostnames: Vec<String>) -> ResourceRecord {
        self.hostnames = hostnames;
        self
    }
}
