use std::sync::Arc;

use crate::shared::time::Time;

/// Fields common to every transfer allowance variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceBase {
    /// Remaining value of the transfer, in the calculator's currency units.
    pub value: i64,
    /// Remaining number of rides this allowance can cover.
    pub count: u32,
    pub expiration_time: Time,
}

impl AllowanceBase {
    pub fn fresh(expiration_time: Time) -> Self {
        Self {
            value: 0,
            count: 0,
            expiration_time,
        }
    }
}

/// MBTA CharlieCard rule-group state. `None` stands in for "this allowance
/// does not belong to the Boston calculator"; it never appears on a
/// `TransferAllowance::Boston` value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRuleGroup {
    LocalBus,
    Subway,
    ExpressBus,
    SlFree,
    LocalBusToSubway,
    OutOfSubway,
    Other,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BostonAllowance {
    pub base: AllowanceBase,
    pub rule_group: TransferRuleGroup,
    pub behind_gates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChicagoRtaAllowance {
    pub base: AllowanceBase,
    /// Day-pass threshold crossed; once true the rider rides free for the
    /// remainder of the allowance's validity.
    pub unlimited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedAgencyAllowance {
    pub base: AllowanceBase,
    pub agency_id: Arc<str>,
}

/// One LIRR or Metro-North "ticket" in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommuterRailAllowance {
    pub board_stop: Arc<str>,
    pub via_stop: Option<Arc<str>>,
    pub alight_stop: Arc<str>,
    /// Direction of the first ride on this ticket; `true` = outbound.
    pub initial_direction: bool,
    pub peak_before: bool,
    pub peak_after: bool,
    pub cumulative_fare: i64,
    pub most_recent_ticket_time: Time,
}

/// Which of the 15 enumerated post-ride states the rider's last MetroCard
/// swipe put them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetroCardState {
    LocalBus,
    Subway,
    ExpressBus,
    Nice,
    NiceOneTransfer,
    Suffolk,
    SuffolkOneTransfer,
    StatenIslandRwy,
    LocalBusToSiFerry,
    SubwayToSiFerry,
    LocalBusToSir,
    LocalBusToSirToSiFerry,
    LocalBusOrSubwayToSiFerryToSir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetroCardAllowance {
    pub base: AllowanceBase,
    pub transfer_source: MetroCardState,
    pub expiry: Time,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NycAllowance {
    pub lirr: Option<CommuterRailAllowance>,
    pub metrocard: Option<MetroCardAllowance>,
    pub in_subway_paid_area: bool,
    pub metro_north: Option<CommuterRailAllowance>,
}

/// One `fare_transfer_rules` row that could still fire on the next leg,
/// together with the absolute time past which it no longer applies.
/// `window_end` is computed once, at the leg that produced the allowance,
/// as that leg's alight time plus the rule's `duration_limit_seconds` (or
/// [`time::MAX`] for a duration-unlimited rule) — never recomputed relative
/// to the next leg's board time, since the window is anchored to the ride
/// that granted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PotentialTransferRule {
    pub rule_idx: u32,
    pub window_end: Time,
}

/// Fares-V2 potential-next-leg state: which `fare_transfer_rules` rows could
/// still fire, represented as a sparse set rather than a dense bitset since
/// the candidate count per stop is small relative to the full rule table.
///
/// `potential_as_route_leg_rules` is sorted ascending; the lowest-order entry
/// must equal the full-extent leg rule for `as_route` fares to resolve to
/// their documented behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaresV2Allowance {
    pub base: AllowanceBase,
    pub potential_transfer_rules: Arc<[PotentialTransferRule]>,
    pub as_route_networks: Arc<[Arc<str>]>,
    pub as_route_board_stop: Option<u32>,
    pub potential_as_route_leg_rules: Arc<[u32]>,
}



/// A rider's carried-forward fare state between rides.
///
/// Redesigned from an inheritance hierarchy into a tagged enum: the variant
/// set is closed (one calculator produces exactly one variant), so a plain
/// `match` replaces virtual dispatch, and each system's fields are
/// first-class instead of inherited from a shared base that only some
/// systems use meaningfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAllowance {
    /// Fresh journey start, no fare history yet.
    None,
    Standard(AllowanceBase),
    Boston(BostonAllowance),
    ChicagoRta(ChicagoRtaAllowance),
    MixedAgency(MixedAgencyAllowance),
    Nyc(NycAllowance),
    FaresV2(FaresV2Allowance),
}

impl TransferAllowance {
    pub fn base(&self) -> Option<AllowanceBase> {
        match self {
            TransferAllowance::None => None,
            TransferAllowance::Standard(b) => Some(*b),
            TransferAllowance::Boston(b) => Some(b.base),
            TransferAllowance::ChicagoRta(b) => Some(b.base),
            TransferAllowance::MixedAgency(b) => Some(b.base),
            TransferAllowance::Nyc(_) => None,
            TransferAllowance::FaresV2(b) => Some(b.base),
        }
    }

    /// Clamps `expiration_time` to the search horizon. Every variant must
    /// implement this; there is no default that silently no-ops, since an
    /// un-tightened allowance would let dominance compare expired value as
    /// if it were still usable.
    pub fn tighten_expiration(self, max_clock_time: Time) -> Self {
        match self {
            TransferAllowance::None => TransferAllowance::None,
            TransferAllowance::Standard(mut b) => {
                b.expiration_time = b.expiration_time.min(max_clock_time);
                TransferAllowance::Standard(b)
            }
            TransferAllowance::Boston(mut a) => {
                a.base.expiration_time = a.base.expiration_time.min(max_clock_time);
                TransferAllowance::Boston(a)
            }
            TransferAllowance::ChicagoRta(mut a) => {
                a.base.expiration_time = a.base.expiration_time.min(max_clock_time);
                TransferAllowance::ChicagoRta(a)
            }
            TransferAllowance::MixedAgency(mut a) => {
                a.base.expiration_time = a.base.expiration_time.min(max_clock_time);
                TransferAllowance::MixedAgency(a)
            }
            TransferAllowance::Nyc(mut a) => {
                if let Some(mc) = a.metrocard.as_mut() {
                    mc.expiry = mc.expiry.min(max_clock_time);
                }
                TransferAllowance::Nyc(a)
            }
            TransferAllowance::FaresV2(mut a) => {
                a.base.expiration_time = a.base.expiration_time.min(max_clock_time);
                TransferAllowance::FaresV2(a)
            }
        }
    }

    /// `self ⪰ other`: true when carrying `self` forward is at least as good
    /// as carrying `other` forward for every future ride the rider might
    /// take. Mismatched variants are always incomparable — offering two
    /// different allowance shapes to the same dominating list is a
    /// programmer error caught upstream in [`crate::fare::Error`].
    pub fn at_least_as_good_for_all_future_redemptions(&self, other: &Self) -> bool {
        match (self, other) {
            (TransferAllowance::None, TransferAllowance::None) => true,
            // A fresh journey (no allowance at all) is never better than one
            // that has already accrued some transfer value; carrying any
            // priced allowance forward is always at least as good as
            // carrying nothing (the `count`/`value` fields bottom out at
            // zero for a still-fresh allowance, so this never claims more
            // than the self-comparison already would).
            (_, TransferAllowance::None) => true,
            (TransferAllowance::None, _) => false,
            (TransferAllowance::Standard(a), TransferAllowance::Standard(b)) => {
                standard_dominates(a, b)
            }
            (TransferAllowance::Boston(a), TransferAllowance::Boston(b)) => {
                // Express-bus incomparability: equal value after an express
                // bus does not dominate equal value after a subway ride,
                // because the set of rides each accepts for free differs.
                a.rule_group == b.rule_group
                    && standard_dominates(&a.base, &b.base)
                    && a.behind_gates == b.behind_gates
            }
            (TransferAllowance::ChicagoRta(a), TransferAllowance::ChicagoRta(b)) => {
                if a.unlimited && !b.unlimited {
                    true
                } else if a.unlimited == b.unlimited {
                    standard_dominates(&a.base, &b.base)
                } else {
                    false
                }
            }
            (TransferAllowance::MixedAgency(a), TransferAllowance::MixedAgency(b)) => {
                a.agency_id == b.agency_id && standard_dominates(&a.base, &b.base)
            }
            (TransferAllowance::Nyc(a), TransferAllowance::Nyc(b)) => nyc_dominates(a, b),
            (TransferAllowance::FaresV2(a), TransferAllowance::FaresV2(b)) => {
                fares_v2_dominates(a, b)
            }
            _ => false,
        }
    }
}

fn standard_dominates(a: &AllowanceBase, b: &AllowanceBase) -> bool {
    a.value >= b.value && a.count >= b.count && a.expiration_time >= b.expiration_time
}

fn commuter_rail_matches(a: &CommuterRailAllowance, b: &CommuterRailAllowance) -> bool {
    a.board_stop == b.board_stop
        && a.via_stop == b.via_stop
        && a.alight_stop == b.alight_stop
        && a.initial_direction == b.initial_direction
        && a.peak_before == b.peak_before
        && a.peak_after == b.peak_after
}

fn nyc_dominates(a: &NycAllowance, b: &NycAllowance) -> bool {
    let lirr_ok = match (&a.lirr, &b.lirr) {
        (None, None) => true,
        (Some(la), Some(lb)) => {
            commuter_rail_matches(la, lb) && la.cumulative_fare <= lb.cumulative_fare
        }
        _ => false,
    };
    let mn_ok = match (&a.metro_north, &b.metro_north) {
        (None, None) => true,
        (Some(ma), Some(mb)) => commuter_rail_matches(ma, mb),
        _ => false,
    };
    let mc_ok = match (&a.metrocard, &b.metrocard) {
        (None, None) => true,
        (Some(mca), Some(mcb)) => {
            mca.transfer_source == mcb.transfer_source
                && standard_dominates(&mca.base, &mcb.base)
                && mca.expiry >= mcb.expiry
        }
        _ => false,
    };
    lirr_ok && mn_ok && mc_ok && a.in_subway_paid_area == b.in_subway_paid_area
}

fn fares_v2_dominates(a: &FaresV2Allowance, b: &FaresV2Allowance) -> bool {
    let is_superset = b.potential_transfer_rules.iter().all(|b_rule| {
        a.potential_transfer_rules
            .iter()
            .any(|a_rule| a_rule.rule_idx == b_rule.rule_idx && a_rule.window_end >= b_rule.window_end)
    });
    is_superset
        && a.as_route_networks == b.as_route_networks
        && a.as_route_board_stop == b.as_route_board_stop
        && a.potential_as_route_leg_rules == b.potential_as_route_leg_rules
        && standard_dominates(&a.base, &b.base)
}
