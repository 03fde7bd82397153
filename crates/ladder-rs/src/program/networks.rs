// crates/ladder-rs/src/program/networks.rs
//! Network-id normalization and assignment.
//!
//! Every node belongs to exactly one network, rooted at a NETWORK source
//! node. Documents may leave `networkId` unset (`""` or `"-1"`); this module
//! fills the gaps by flooding forward links from each NETWORK source and
//! hands every leftover node a freshly minted id.

use super::node::{Link, Node, NodeKind};
use crate::log::my_debug;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;

/// The canonical form of an unassigned network id.
pub const UNASSIGNED: &str = "-1";

/// Canonicalizes a raw network id string.
///
/// Trims whitespace; empty and `"-1"` stay unassigned; a non-negative
/// number becomes `N<n>`; a negative number is unassigned; anything else is
/// uppercased verbatim.
pub fn canonical_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == UNASSIGNED {
        return UNASSIGNED.to_string();
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return if n >= 0 {
            format!("N{}", n)
        } else {
            UNASSIGNED.to_string()
        };
    }
    trimmed.to_ascii_uppercase()
}

/// Orders canonical network ids for execution within a scan.
///
/// Ids of the `N<k>` form run first, by their numeric suffix, so `N2` runs
/// before `N10`; any other label runs after them in lexicographic order.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (minted_index(a), minted_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn minted_index(id: &str) -> Option<u64> {
    let digits = id.strip_prefix('N')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Fills in unassigned network ids.
///
/// For each NETWORK node in document order: keep the id named by its own
/// `addr` text when usable, otherwise mint the next `N<k>`; then assign that
/// id to every still-unassigned node reachable over forward links. Nodes
/// left over after all sources are processed each receive a fresh `N<k>`.
///
/// Nodes that arrived with an explicit id keep it; the flood only fills
/// gaps. The flood traverses the full reachable set, not just one hop.
pub fn assign(nodes: &mut [Node], links: &[Link]) {
    fn mint(next: &mut usize) -> String {
        let id = format!("N{}", *next);
        *next += 1;
        id
    }

    let mut next_minted = 0usize;
    let source_ids: Vec<usize> = nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Network)
        .map(|n| n.id)
        .collect();

    for source in source_ids {
        let label = match node_by_id(nodes, source) {
            // The document already named this source's network.
            Some(node) if node.network != UNASSIGNED => node.network.clone(),
            Some(node) => {
                let own = canonical_id(&node.addr_text);
                if own == UNASSIGNED || own == "N" {
                    mint(&mut next_minted)
                } else {
                    own
                }
            }
            None => continue,
        };

        if let Some(node) = node_by_id_mut(nodes, source) {
            node.network = label.clone();
        }
        flood(nodes, links, source, &label);
    }

    for node in nodes.iter_mut() {
        if node.network == UNASSIGNED {
            let fresh = mint(&mut next_minted);
            my_debug!("[NET] node {} is unreachable, assigned {}", node.id, fresh);
            node.network = fresh;
        }
    }
}

/// Breadth-first walk over forward links, assigning `label` to every
/// unassigned node reached from `source`.
fn flood(nodes: &mut [Node], links: &[Link], source: usize, label: &str) {
    let mut queue: Vec<usize> = links
        .iter()
        .filter(|l| l.from == source)
        .map(|l| l.to)
        .collect();
    let mut visited: Vec<usize> = Vec::new();

    while let Some(id) = queue.pop() {
        if visited.contains(&id) {
            continue;
        }
        visited.push(id);
        if let Some(node) = node_by_id_mut(nodes, id) {
            if node.network == UNASSIGNED {
                node.network = label.to_string();
            }
        }
        queue.extend(links.iter().filter(|l| l.from == id).map(|l| l.to));
    }
}

fn node_by_id(nodes: &[Node], id: usize) -> Option<&Node> {
    nodes.iter().find(|n| n.id == id)
}

fn node_by_id_mut(nodes: &mut [Node], id: usize) -> Option<&mut Node> {
    nodes.iter_mut().find(|n| n.id == id)
}
