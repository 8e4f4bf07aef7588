use crate::fare::{self, TransferAllowance};
use crate::raptor::label::McLabel;

/// Per-stop, per-search bounded set of non-dominated labels.
///
/// Grounded in spirit on `Allocator::run_updates`'s "only accept
/// if it improves the best known value" pattern, generalized from a single
/// `Option<Time>` comparison to a four-criteria dominance check. Kept as a
/// plain `Vec` rather than a sorted structure: dominance is multi-dimensional
/// and lists stay small in practice, so an O(|list|) scan per offer is fine.
///
/// One list is shared across the whole range-RAPTOR minute loop for a given
/// stop (not reset per minute) so later-minute results act as upper bounds
/// for earlier departure minutes.
#[derive(Debug, Default, Clone)]
pub struct ParetoList {
    /// Arena indices of the surviving labels at this stop.
    entries: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted(u32),
    Rejected,
}

impl ParetoList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Offers `candidate` for insertion. Allocates it into `arena` and
    /// returns [`Offer::Accepted`] with its new index iff no surviving label
    /// dominates it; on acceptance, every label the candidate itself
    /// dominates is evicted from this list. An evicted label's arena slot is
    /// left behind rather than reclaimed, since earlier labels may still be
    /// reachable as someone else's `back` predecessor.
    pub fn offer(
        &mut self,
        candidate: McLabel,
        arena: &mut super::allocator::LabelArena,
    ) -> Result<Offer, fare::Error> {
        for &idx in &self.entries {
            let existing = arena.get(idx);
            if ties(existing, &candidate)? || strictly_dominates(existing, &candidate)? {
                return Ok(Offer::Rejected);
            }
        }

        let mut keep = Vec::with_capacity(self.entries.len());
        for &idx in &self.entries {
            let existing = arena.get(idx);
            if !strictly_dominates(&candidate, existing)? {
                keep.push(idx);
            }
        }
        self.entries = keep;

        let new_idx = arena.alloc(candidate);
        self.entries.push(new_idx);
        Ok(Offer::Accepted(new_idx))
    }
}

/// Two different, non-`None` allowance variants were compared against one
/// another. The only calculator running in a given search always produces
/// one variant, so this can only mean two calculators' output ended up in
/// the same list — a programmer error, not a routing outcome.
fn check_mismatch(a: &TransferAllowance, b: &TransferAllowance) -> Result<(), fare::Error> {
    if matches!(a, TransferAllowance::None) || matches!(b, TransferAllowance::None) {
        return Ok(());
    }
    if std::mem::discriminant(a) != std::mem::discriminant(b) {
        return Err(fare::Error::MismatchedAllowanceTypes);
    }
    Ok(())
}

/// `a` dominates `b`: arrival time, round, cumulative fare and transfer
/// allowance all at least as good, with at least one of them strictly
/// better.
fn strictly_dominates(a: &McLabel, b: &McLabel) -> Result<bool, fare::Error> {
    check_mismatch(&a.transfer_allowance, &b.transfer_allowance)?;
    let allowance_ge = a
        .transfer_allowance
        .at_least_as_good_for_all_future_redemptions(&b.transfer_allowance);
    let le = a.arrival_time <= b.arrival_time
        && a.round <= b.round
        && a.cumulative_fare <= b.cumulative_fare
        && allowance_ge;
    if !le {
        return Ok(false);
    }
    let strict = a.arrival_time < b.arrival_time
        || a.round < b.round
        || a.cumulative_fare < b.cumulative_fare
        || a.transfer_allowance != b.transfer_allowance;
    Ok(strict)
}

/// Strict equality on all four criteria. The incumbent wins this case to
/// avoid churn rather than keeping two equivalent labels side by side.
fn ties(existing: &McLabel, candidate: &McLabel) -> Result<bool, fare::Error> {
    check_mismatch(&existing.transfer_allowance, &candidate.transfer_allowance)?;
    Ok(existing.arrival_time == candidate.arrival_time
        && existing.round == candidate.round
        && existing.cumulative_fare == candidate.cumulative_fare
        && existing.transfer_allowance == candidate.transfer_allowance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare::allowance::AllowanceBase;
    use crate::raptor::allocator::LabelArena;
    use crate::raptor::label::LabelKind;
    use crate::shared::time::Time;

    fn label(arrival: u32, round: u16, fare: i64, value: i64) -> McLabel {
        McLabel {
            stop_idx: 0,
            round,
            arrival_time: Time::from_seconds(arrival),
            kind: LabelKind::Access,
            cumulative_fare: fare,
            transfer_allowance: TransferAllowance::Standard(AllowanceBase {
                value,
                count: 0,
                expiration_time: Time::from_seconds(100_000),
            }),
            back: crate::raptor::label::NO_BACK,
        }
    }

    #[test]
    fn incomparable_labels_both_survive() {
        let mut arena = LabelArena::default();
        let mut list = ParetoList::default();
        assert_eq!(
            list.offer(label(100, 0, 500, 0), &mut arena).unwrap(),
            Offer::Accepted(0)
        );
        // Later arrival, but cheaper fare: neither dominates.
        assert_eq!(
            list.offer(label(200, 0, 300, 0), &mut arena).unwrap(),
            Offer::Accepted(1)
        );
        assert_eq!(list.entries().len(), 2);
    }

    #[test]
    fn strictly_worse_label_rejected() {
        let mut arena = LabelArena::default();
        let mut list = ParetoList::default();
        list.offer(label(100, 0, 500, 0), &mut arena).unwrap();
        assert_eq!(
            list.offer(label(200, 0, 600, 0), &mut arena).unwrap(),
            Offer::Rejected
        );
        assert_eq!(list.entries().len(), 1);
    }

    #[test]
    fn strictly_better_label_evicts_incumbent() {
        let mut arena = LabelArena::default();
        let mut list = ParetoList::default();
        list.offer(label(200, 0, 600, 0), &mut arena).unwrap();
        let offer = list.offer(label(100, 0, 500, 0), &mut arena).unwrap();
        assert!(matches!(offer, Offer::Accepted(_)));
        assert_eq!(list.entries().len(), 1);
    }

    #[test]
    fn exact_tie_keeps_incumbent() {
        let mut arena = LabelArena::default();
        let mut list = ParetoList::default();
        list.offer(label(100, 0, 500, 0), &mut arena).unwrap();
        assert_eq!(
            list.offer(label(100, 0, 500, 0), &mut arena).unwrap(),
            Offer::Rejected
        );
        assert_eq!(list.entries().len(), 1);
    }
}
