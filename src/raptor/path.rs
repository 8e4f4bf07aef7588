use crate::raptor::allocator::LabelArena;
use crate::raptor::label::{LabelKind, McLabel};
use crate::raptor::Error;

/// Walks `back`-references from `target_label_idx` to the access-leg root,
/// returning labels in chronological (board-to-alight) order.
///
/// Unlike the single-criterion predecessor's round-indexed `parents` matrix,
/// every label already carries its own predecessor index, so backtracking
/// is a flat walk through the arena rather than a round-by-round matrix
/// lookup.
pub(crate) fn backtrack(arena: &LabelArena, target_label_idx: u32) -> Result<Vec<McLabel>, Error> {
    let mut chain = Vec::new();
    let mut current = target_label_idx;
    loop {
        let label = arena.get(current);
        chain.push(label.clone());
        if label.kind == LabelKind::Access {
            break;
        }
        current = label.back;
    }
    if chain.is_empty() {
        return Err(Error::FailedToBuildRoute);
    }
    chain.reverse();
    Ok(chain)
}
