//! Ordering of resolved middleware by the kernel's priority list.

use std::collections::HashMap;

/// Anything carrying a middleware name the priority list can rank
pub trait Prioritized {
    fn priority_name(&self) -> &str;
}

impl<T: Prioritized + ?Sized> Prioritized for std::sync::Arc<T> {
    fn priority_name(&self) -> &str {
        (**self).priority_name()
    }
}

impl Prioritized for super::ParsedMiddleware {
    fn priority_name(&self) -> &str {
        self.name()
    }
}

/// Reorder `middleware` so entries ranked by `priority` appear in priority order.
///
/// Scans left to right remembering the last ranked entry. The first entry that
/// ranks lower than it is moved in front of it and the scan restarts, until a
/// full pass moves nothing. Unranked entries keep their relative order.
pub fn sort_by_priority<T: Prioritized>(middleware: &mut Vec<T>, priority: &[String]) {
    if middleware.is_empty() || priority.is_empty() {
        return;
    }

    // First occurrence wins when the list repeats a name
    let mut ranks: HashMap<&str, usize> = HashMap::with_capacity(priority.len());
    for (rank, name) in priority.iter().enumerate() {
        ranks.entry(name.as_str()).or_insert(rank);
    }

    'scan: loop {
        let mut last: Option<(usize, usize)> = None;

        for index in 0..middleware.len() {
            let Some(&rank) = ranks.get(middleware[index].priority_name()) else {
                continue;
            };

            if let Some((last_index, last_rank)) = last {
                if rank < last_rank {
                    let entry = middleware.remove(index);
                    middleware.insert(last_index, entry);
                    continue 'scan;
                }
            }

            last = Some((index, rank));
        }

        return;
    }
}

/// Insert `middleware` into `priority` next to the `anchors` already listed.
///
/// Placing after picks the slot past the furthest listed anchor and falls back
/// to appending; an anchor at the head of the list still gets the slot right
/// behind it rather than the end of the list. Placing before picks the slot of the earliest listed anchor
/// and falls back to prepending. Nothing changes if `middleware` is listed.
pub fn insert_relative(priority: &mut Vec<String>, anchors: &[&str], middleware: &str, after: bool) {
    if priority.iter().any(|listed| listed == middleware) {
        return;
    }

    let positions = anchors
        .iter()
        .filter_map(|anchor| priority.iter().position(|listed| listed == anchor));

    let index = if after {
        positions.max().map_or(priority.len(), |position| position + 1)
    } else {
        positions.min().unwrap_or(0)
    };

    priority.insert(index, middleware.to_string());
}
