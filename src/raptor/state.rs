use crate::raptor::label::McLabel;

/// One candidate produced by a relax step, awaiting a sequential offer to
/// its stop's [`crate::raptor::pareto::ParetoList`].
///
/// Transit and transfer relax steps generate these in parallel across
/// patterns/stops (no shared mutable state needed to produce one), then a
/// single-threaded pass applies them one at a time against the arena, since
/// [`crate::raptor::pareto::ParetoList::offer`] needs exclusive access to
/// mutate both the list and the arena it indexes into.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub label: McLabel,
}

impl Candidate {
    pub fn new(label: McLabel) -> Self {
        Self { label }
    }
}
