use thiserror::Error;

pub type Result<T> = std::result::Result<T, CostError>;

// Failures surfaced by the cost engine.
// None of them is retried internally, the caller decides what to do.
#[derive(Debug, Error)]
pub enum CostError {
    // The platform API was unreachable, returned an error or timed out.
    #[error("failed to list {what} for tenant {tenant}: {reason}")]
    PlatformQuery {
        what: &'static str,
        tenant: String,
        reason: String,
    },

    // A discount label is present on an object but is not a fraction in [0,1].
    #[error("invalid discount {value:?} on {owner} in tenant {tenant}")]
    InvalidDiscount {
        tenant: String,
        owner: String,
        value: String,
    },

    #[error("storage class {0} not found")]
    UnknownStorageClass(String),

    // Raised once at startup, storage classes live in the cluster without a price.
    #[error("storage classes without configured cost: {}", .0.join(", "))]
    ConfigurationIncomplete(Vec<String>),

    #[error("invalid quantity {value:?} on {owner} in tenant {tenant}")]
    InvalidQuantity {
        tenant: String,
        owner: String,
        value: String,
    },

    #[error("{0} is not set or invalid float value")]
    InvalidConfiguration(String),
}
