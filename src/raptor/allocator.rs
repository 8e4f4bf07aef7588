use crate::raptor::label::McLabel;
use crate::raptor::pareto::ParetoList;
use bitvec::prelude::*;

/// Per-search label store. `back`-references into this arena are `u32`
/// indices, never owning pointers: a label may be the predecessor of many
/// successors, which a `Box`/`Rc` back-edge cannot express without either
/// aliasing or reference counting. The whole arena is bulk-freed by
/// [`LabelArena::clear`] at the end of a search (or, in practice, just
/// dropped with the [`Allocator`] that owns it).
#[derive(Debug, Default)]
pub struct LabelArena {
    labels: Vec<McLabel>,
}

impl LabelArena {
    pub fn alloc(&mut self, label: McLabel) -> u32 {
        let idx = self.labels.len() as u32;
        self.labels.push(label);
        idx
    }

    pub fn get(&self, idx: u32) -> &McLabel {
        &self.labels[idx as usize]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }
}

/// A memory pool for one MC-Raptor search: the label arena, one
/// [`ParetoList`] per stop, and the scratch buffers the round loop reuses
/// every minute/round to avoid per-round heap churn.
///
/// Modeled on the prior single-criterion `Allocator` (same reuse-across-searches intent,
/// same `bitvec`-backed `active`/`active_mask` pattern-touch bookkeeping),
/// generalized from a scalar `Vec<Option<Time>>` best-time table to the
/// label arena + per-stop Pareto lists a multi-criteria search requires.
pub struct Allocator {
    pub(crate) arena: LabelArena,
    pub(crate) stop_labels: Vec<ParetoList>,
    /// `pattern_idx -> earliest touched stop position within it`, valid
    /// only where `active_mask` is set.
    pub(crate) active: Vec<u32>,
    pub(crate) active_mask: BitVec<usize, Lsb0>,
    /// Scratch per-stop bucket of "labels accepted in the previous
    /// round/phase", used by the transit relax step to find boarding
    /// candidates without rescanning every stop's full Pareto list.
    pub(crate) frontier_buckets: Vec<Vec<u32>>,
    /// Stop indices with a non-empty `frontier_buckets` entry, so clearing
    /// between rounds only touches what was written.
    pub(crate) touched_buckets: Vec<u32>,
    stop_count: usize,
    pattern_count: usize,
}

impl Allocator {
    pub fn new(stop_count: usize, pattern_count: usize) -> Self {
        Self {
            arena: LabelArena::default(),
            stop_labels: (0..stop_count).map(|_| ParetoList::default()).collect(),
            active: vec![u32::MAX; pattern_count],
            active_mask: bitvec![usize, Lsb0; 0; pattern_count],
            frontier_buckets: vec![Vec::new(); stop_count],
            touched_buckets: Vec::new(),
            stop_count,
            pattern_count,
        }
    }

    /// Resets all per-search state. Called once before each fresh
    /// origin/destination search; *not* called between range-RAPTOR minutes
    /// within the same search, since Pareto lists are deliberately carried
    /// forward as upper bounds for earlier departure minutes.
    pub fn reset(&mut self) {
        self.arena.clear();
        for list in self.stop_labels.iter_mut() {
            *list = ParetoList::default();
        }
        self.active.fill(u32::MAX);
        self.active_mask.fill(false);
        self.clear_frontier();
    }

    pub fn clear_frontier(&mut self) {
        for stop_idx in self.touched_buckets.drain(..) {
            self.frontier_buckets[stop_idx as usize].clear();
        }
    }

    pub fn push_frontier(&mut self, stop_idx: u32, label_idx: u32) {
        let bucket = &mut self.frontier_buckets[stop_idx as usize];
        if bucket.is_empty() {
            self.touched_buckets.push(stop_idx);
        }
        bucket.push(label_idx);
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}

/// A growable per-thread output buffer that avoids allocating until the
/// first push. Rayon's `map_init` hands one
/// of these to each worker thread so empty patterns (no candidates
/// produced) never allocate at all.
pub struct LazyBuffer<T> {
    buffer: Option<Vec<T>>,
    capacity: usize,
}

impl<T> LazyBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: None,
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if let Some(buffer) = &mut self.buffer {
            buffer.push(value);
        } else {
            let mut buffer = Vec::with_capacity(self.capacity);
            buffer.push(value);
            self.buffer = Some(buffer);
        }
    }

    pub fn swap(&mut self) -> Vec<T> {
        self.buffer.take().unwrap_or_default()
    }
}
