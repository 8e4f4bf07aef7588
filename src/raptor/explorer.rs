use std::sync::Mutex;

use rayon::prelude::*;

use crate::fare::{Error as FareError, FareCalculator, RideContext, TransferAllowance};
use crate::raptor::allocator::{Allocator, LazyBuffer};
use crate::raptor::label::{LabelKind, McLabel};
use crate::raptor::pareto::Offer;
use crate::raptor::state::Candidate;
use crate::shared::time::{self, Duration, Time};
use crate::transit_data::TransitDataProvider;

/// Minimum time a rider needs between alighting and boarding the next trip.
/// A frontier label's arrival time must clear this slack before it is
/// eligible to board, even if a trip departs at the exact alighting second.
const MIN_BOARD_SLACK: Duration = Duration::from_seconds(60);

/// The single trip currently being ridden while scanning one pattern, plus
/// enough of its boarding label to price the next alighting.
struct Boarding {
    trip_idx: u32,
    board_stop: u32,
    board_time: Time,
    origin_label_idx: u32,
    origin_round: u16,
    origin_fare: i64,
    origin_allowance: TransferAllowance,
}

/// Scans every active pattern once, generating one [`Candidate`] per stop a
/// trip improves.
///
/// At each stop position, boards the single best frontier label available
/// there (earliest arrival, ties broken by lowest cumulative fare) if it
/// beats the currently-held trip's departure. This is a disclosed
/// simplification of full McRAPTOR's "bag of concurrent boardings per
/// pattern scan": carrying every Pareto-optimal label through the scan as
/// an independent active trip would multiply the per-pattern work by the
/// bag size. Collapsing to one active boarding per scan, like a
/// single-criterion RAPTOR's scalar active trip, trades a small amount of
/// completeness (a fare-dominated-but-earlier label might shadow a
/// later-boarding, cheaper one within the same pattern scan) for bounded
/// per-round cost; `DESIGN.md` records this as an accepted simplification.
///
/// Candidate generation only reads `allocator` (the arena and frontier
/// buckets) so every active pattern can be scanned in parallel; offering
/// the results to each stop's [`crate::raptor::pareto::ParetoList`] happens
/// afterwards, sequentially, in [`apply_candidates`].
pub(crate) fn generate_transit_candidates(
    data: &TransitDataProvider,
    allocator: &Allocator,
    fare_calc: &dyn FareCalculator,
    active_services: &bitvec::vec::BitVec,
    max_clock_time: Time,
) -> Result<Vec<Candidate>, FareError> {
    let first_error: Mutex<Option<FareError>> = Mutex::new(None);

    let candidates = allocator
        .active_mask
        .iter_ones()
        .par_bridge()
        .map_init(
            || LazyBuffer::new(32),
            |buffer, pattern_idx| {
                let pattern = &data.patterns[pattern_idx];
                let start = allocator.active[pattern_idx] as usize;
                let mut boarding: Option<Boarding> = None;

                for i in start..pattern.stops.len() {
                    let stop_idx = pattern.stops[i];

                    if let Some(b) = &boarding {
                        let arrival_time = data.trip_arrival(b.trip_idx, i);
                        let route = data.route_by_trip_idx(b.trip_idx);
                        let ctx = RideContext {
                            route,
                            board_stop: &data.stops[b.board_stop as usize],
                            alight_stop: &data.stops[stop_idx as usize],
                            board_time: b.board_time,
                            alight_time: arrival_time,
                            previous_fare: b.origin_fare,
                            previous_allowance: &b.origin_allowance,
                        };
                        match fare_calc.calculate_fare(&ctx, max_clock_time) {
                            Ok(result) => {
                                let allowance =
                                    result.transfer_allowance.tighten_expiration(max_clock_time);
                                let label = McLabel {
                                    stop_idx,
                                    round: b.origin_round + 1,
                                    arrival_time,
                                    kind: LabelKind::Transit {
                                        pattern_idx: pattern_idx as u32,
                                        trip_idx: b.trip_idx,
                                        board_stop: b.board_stop,
                                        board_time: b.board_time,
                                        alight_time: arrival_time,
                                    },
                                    cumulative_fare: result.cumulative_fare,
                                    transfer_allowance: allowance,
                                    back: b.origin_label_idx,
                                };
                                buffer.push(Candidate::new(label));
                            }
                            Err(e) => {
                                let mut slot = first_error.lock().unwrap();
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                            }
                        }
                    }

                    let mut best: Option<(Time, i64, u32)> = None;
                    for &label_idx in allocator.frontier_buckets[stop_idx as usize].iter() {
                        let label = allocator.arena.get(label_idx);
                        let candidate = (label.arrival_time, label.cumulative_fare, label_idx);
                        let better = match best {
                            None => true,
                            Some((t, f, _)) => {
                                candidate.0 < t || (candidate.0 == t && candidate.1 < f)
                            }
                        };
                        if better {
                            best = Some(candidate);
                        }
                    }

                    if let Some((frontier_time, _, label_idx)) = best {
                        let current_trip_arrival = boarding
                            .as_ref()
                            .map(|b| data.trip_arrival(b.trip_idx, i))
                            .unwrap_or(time::MAX);
                        let boardable_after = frontier_time + MIN_BOARD_SLACK;
                        if frontier_time <= current_trip_arrival
                            && let Some((trip_idx, departure_time)) = super::discovery::find_earliest_trip(
                                data,
                                pattern,
                                i,
                                boardable_after,
                                active_services,
                            )
                        {
                            let origin = allocator.arena.get(label_idx);
                            boarding = Some(Boarding {
                                trip_idx,
                                board_stop: stop_idx,
                                board_time: departure_time,
                                origin_label_idx: label_idx,
                                origin_round: origin.round,
                                origin_fare: origin.cumulative_fare,
                                origin_allowance: origin.transfer_allowance.clone(),
                            });
                        }
                    }
                }
                buffer.swap()
            },
        )
        .flatten()
        .collect();

    if let Some(e) = first_error.into_inner().unwrap() {
        return Err(e);
    }
    Ok(candidates)
}

/// Relaxes every stop the transit step just improved along its footpaths.
/// Fare and transfer allowance pass through unchanged: a footpath is not a
/// ride, so no calculator call happens here.
pub(crate) fn generate_transfer_candidates(
    data: &TransitDataProvider,
    allocator: &Allocator,
    transit_accepted: &[(u32, u32)],
) -> Vec<Candidate> {
    transit_accepted
        .par_iter()
        .map_init(
            || LazyBuffer::new(8),
            |buffer, &(stop_idx, label_idx)| {
                let label = allocator.arena.get(label_idx);
                for (to_stop, transfer_time) in data.transfers_from(stop_idx) {
                    let new_label = McLabel {
                        stop_idx: to_stop,
                        round: label.round,
                        arrival_time: label.arrival_time + transfer_time,
                        kind: LabelKind::Transfer {
                            from_stop: stop_idx,
                            transfer_time,
                        },
                        cumulative_fare: label.cumulative_fare,
                        transfer_allowance: label.transfer_allowance.clone(),
                        back: label_idx,
                    };
                    buffer.push(Candidate::new(new_label));
                }
                buffer.swap()
            },
        )
        .flatten()
        .collect()
}

/// Sequentially offers every candidate to its stop's dominating list, since
/// [`crate::raptor::pareto::ParetoList::offer`] needs exclusive access to
/// both the list and the arena it allocates into. Returns the
/// `(stop_idx, label_idx)` of every accepted label for the next relax step
/// or the next round's boarding frontier.
///
/// Candidates priced above `max_fare`, or arriving after `max_arrival`, are
/// discarded before ever reaching a dominating list: a label outside the
/// request's budget or duration window is not a valid result even if it
/// would otherwise survive Pareto comparison.
pub(crate) fn apply_candidates(
    allocator: &mut Allocator,
    candidates: Vec<Candidate>,
    max_fare: i64,
    max_arrival: Time,
) -> Result<Vec<(u32, u32)>, FareError> {
    let mut accepted = Vec::new();
    for candidate in candidates {
        if candidate.label.cumulative_fare > max_fare || candidate.label.arrival_time > max_arrival {
            continue;
        }
        let stop_idx = candidate.label.stop_idx;
        let offer = allocator.stop_labels[stop_idx as usize]
            .offer(candidate.label, &mut allocator.arena)?;
        if let Offer::Accepted(label_idx) = offer {
            accepted.push((stop_idx, label_idx));
        }
    }
    Ok(accepted)
}
