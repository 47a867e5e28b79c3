use crate::error::{CostError, Result};
use crate::record::ResourceRecord;


// A discount share in [0,1], 0 meaning full price.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Default)]
pub struct DiscountFraction(f64);

impl DiscountFraction {

    pub const NONE: DiscountFraction = DiscountFraction(0.0);

    pub fn new(value: f64) -> Option<DiscountFraction> {
        if (0.0..=1.0).contains(&value) {
            Some(DiscountFraction(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    // Share of the price that is still charged.
    pub fn remaining(&self) -> f64 {
        1.0 - self.0
    }
}


// Resolve the discount carried by a record.
// A missing label means no discount, a malformed one is always an error.
pub fn resolve(record: &ResourceRecord) -> Result<DiscountFraction> {
    let raw = match &record.discount_label {
        Some(raw) => raw,
        None => return Ok(DiscountFraction::NONE),
    };

    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(DiscountFraction::new)
        .ok_or_else(|| CostError::InvalidDiscount {
            tenant: record.tenant_id.clone(),
            owner: record.owner_name.clone(),
            value: raw.clone(),
        })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ResourceKind;

    fn labelled(label: Option<&str>) -> ResourceRecord {
        ResourceRecord::new(ResourceKind::Cpu, "team-a", "web-0", 100.0)
            .with_discount_label(label.map(String::from))
    }

    #[test]
    fn missing_label_is_no_discount() {
        assert_eq!(resolve(&labelled(None)).unwrap(), DiscountFraction::NONE);
    }

    #[test]
    fn valid_labels() {
        assert_eq!(resolve(&labelled(Some("0.25"))).unwrap().value(), 0.25);
        assert_eq!(resolve(&labelled(Some("1"))).unwrap().value(), 1.0);
        assert_eq!(resolve(&labelled(Some("0"))).unwrap().value(), 0.0);
        assert_eq!(resolve(&labelled(Some(" 0.5 "))).unwrap().value(), 0.5);
    }

    #[test]
    fn out_of_range_or_garbage_is_rejected() {
        for raw in &["1.5", "-0.1", "ten", "", "NaN", "inf"] {
            match resolve(&labelled(Some(raw))) {
                Err(CostError::InvalidDiscount { tenant, owner, value }) => {
                    assert_eq!(tenant, "team-a");
                    assert_eq!(owner, "web-0");
                    assert_eq!(&value, raw);
                }
                other => panic!("expected invalid discount for {:?}, got {:?}", raw, other),
            }
        }
    }
}
