use std::collections::HashMap;

use tracing::debug;

use crate::model::{AnalyticRecord, ItemSummary};
use crate::normalize::{base_identity, is_owned_variant, normalize};

#[derive(Debug, Default, PartialEq)]
pub struct Resolution {
    pub good: Vec<ItemSummary>,
    pub bad: Vec<ItemSummary>,
}

/// Picks at most one winner per base identity.
///
/// The first regular record accepted by `is_candidate` wins and goes to
/// `good`; every owned variant of that group is rejected. A group without a
/// winner is rejected whole, in input order.
pub fn resolve<F>(records: &[AnalyticRecord], owned_marker: &str, is_candidate: F) -> Resolution
where
    F: Fn(&AnalyticRecord) -> bool,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<&AnalyticRecord>> = Vec::new();

    for record in records {
        let name = normalize(&record.name);
        let base = base_identity(&name, owned_marker).to_string();

        let slot = *index.entry(base).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    let mut resolution = Resolution::default();

    for group in groups {
        let (owned, regular): (Vec<&AnalyticRecord>, Vec<&AnalyticRecord>) = group
            .iter()
            .copied()
            .partition(|r| is_owned_variant(&r.name, owned_marker));

        match regular.into_iter().find(|r| is_candidate(r)) {
            Some(winner) => {
                debug!(item = %winner.name, rejected_owned = owned.len(), "group winner");
                resolution.good.push(winner.summary());
                resolution.bad.extend(owned.iter().map(|r| r.summary()));
            }
            None => {
                resolution.bad.extend(group.iter().map(|r| r.summary()));
            }
        }
    }

    resolution
}
