use std::collections::BTreeSet;

use log::warn;


// Reduce hostnames to their last two labels, deduplicated.
// This is a heuristic: multi-part public suffixes such as co.uk are not recognised.
pub fn coalesce<I, S>(hostnames: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut domains = BTreeSet::new();
    for host in hostnames {
        let host = host.as_ref();
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() < 2 || labels[labels.len() - 2..].iter().any(|l| l.is_empty()) {
            warn!("domain is not valid for hostname {}", host);
            continue;
        }
        domains.insert(labels[labels.len() - 2..].join("."));
    }
    domains
}
