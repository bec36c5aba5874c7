//! Canonical state digest for determinism checks
//!
//! Collections are sorted before hashing so the digest depends only on what
//! is on the board, never on storage order.

use sha2::{Digest, Sha256};

use super::state::RoundState;

/// Hex SHA-256 over the outcome-relevant parts of `state`
pub fn state_digest(state: &RoundState) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_form(state).as_bytes());
    hex::encode(hasher.finalize())
}

/// The exact text fed to the hasher
pub fn canonical_form(state: &RoundState) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(state.pieces.len() + state.deflectors.len() + 8);
    parts.push(format!("phase:{}", state.phase.as_str()));

    let mut pieces: Vec<_> = state.pieces.iter().collect();
    pieces.sort_by_key(|p| p.id);
    for p in pieces {
        parts.push(format!("p{}:{}:{}:{}", p.id, p.color.as_str(), p.lane, p.jammed));
    }

    parts.push(format!("banked:{}", state.banked_count));

    let mut deflectors: Vec<_> = state.deflectors.iter().collect();
    deflectors.sort_by_key(|d| d.id);
    for d in deflectors {
        parts.push(format!("d{}:{}:{}:{}", d.id, d.row, d.slot.as_str(), d.charges));
    }

    // BTreeMap iterates in lane order
    for (lane, count) in &state.jam_counts {
        parts.push(format!("jam{}:{}", lane, count));
    }

    parts.push(format!("placed:{}", state.total_placed));
    parts.push(format!("spawned:{}", state.spawned_count));
    parts.join("|")
}
