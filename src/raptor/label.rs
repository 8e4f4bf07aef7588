use crate::fare::TransferAllowance;
use crate::shared::time::{Duration, Time};

/// Sentinel stored in [`McLabel::back`] for a label with no predecessor (an
/// access-leg seed at round 0).
pub const NO_BACK: u32 = u32::MAX;

/// How a label was produced. Mirrors the prior `ParentType`, but folded
/// into the label itself rather than a separate backtracking record, since
/// every `McLabel` already needs to carry this to compute the next
/// candidate's `RideContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Seeded directly from the request's access times; never produced by
    /// round expansion.
    Access,
    /// Produced by boarding `trip_idx` on `pattern_idx` at `board_stop` and
    /// riding to this label's stop.
    Transit {
        pattern_idx: u32,
        trip_idx: u32,
        board_stop: u32,
        board_time: Time,
        alight_time: Time,
    },
    /// Produced by an on-street relax step from `from_stop`.
    Transfer { from_stop: u32, transfer_time: Duration },
}

impl LabelKind {
    pub fn is_transit(&self) -> bool {
        matches!(self, LabelKind::Transit { .. })
    }
}

/// The central entity of the search: a Pareto-criteria state at one stop,
/// in one round, reached one particular way.
///
/// `back` is a `u32` arena index into the search's [`crate::raptor::allocator::Allocator`]
/// label arena, never an owning pointer. This avoids the cyclic/aliased
/// ownership a `back`-pointer graph would otherwise require, since many
/// labels may share one predecessor.
#[derive(Debug, Clone)]
pub struct McLabel {
    pub stop_idx: u32,
    /// Number of transit rides taken to reach this label; a transfer label
    /// inherits its predecessor's round unchanged, since a transfer never
    /// counts as a round switch.
    pub round: u16,
    pub arrival_time: Time,
    pub kind: LabelKind,
    pub cumulative_fare: i64,
    pub transfer_allowance: TransferAllowance,
    pub back: u32,
}

impl McLabel {
    pub fn access(stop_idx: u32, arrival_time: Time, transfer_allowance: TransferAllowance) -> Self {
        Self {
            stop_idx,
            round: 0,
            arrival_time,
            kind: LabelKind::Access,
            cumulative_fare: 0,
            transfer_allowance,
            back: NO_BACK,
        }
    }
}
