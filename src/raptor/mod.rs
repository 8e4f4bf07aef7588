mod allocator;
pub(crate) mod discovery;
mod explorer;
mod itinerary;
mod label;
mod pareto;
mod path;
mod state;

pub use allocator::{Allocator, LabelArena};
pub use itinerary::{Itinerary, Leg, LegKind, RouteRef};
pub use label::{LabelKind, McLabel, NO_BACK};
pub use pareto::{Offer, ParetoList};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::fare::{self, FareCalculator, FareCalculatorConfig};
use crate::raptor::explorer::{apply_candidates, generate_transfer_candidates, generate_transit_candidates};
use crate::raptor::state::Candidate;
use crate::shared::time::{Duration, Time};
use crate::transit_data::TransitDataProvider;

#[derive(Error, Debug)]
pub enum Error {
    #[error("none of the requested access stops exist in this transit network")]
    UnresolvedOrigin,
    #[error("none of the requested egress stops exist in this transit network")]
    UnresolvedDestination,
    #[error("a route was found but its label chain failed to reconstruct")]
    FailedToBuildRoute,
    #[error("malformed request date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error(transparent)]
    Fare(#[from] fare::Error),
}

/// Everything a caller needs to run one search. `access_stops`/`egress_stops`
/// stand in for the street-network collaborator's output: a map from GTFS
/// stop id to the walking seconds it takes to reach (or, for egress, to be
/// reached from) that stop from the true origin/destination. The router
/// itself never sees a coordinate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileRequest {
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,
    pub from_time_seconds: u32,
    pub to_time_seconds: u32,
    /// Service date, `YYYY-MM-DD`.
    pub date: String,
    pub max_rides: u32,
    pub max_trip_duration_minutes: u32,
    pub max_fare: i64,
    /// GTFS `route_type` codes a journey may use; empty means every mode.
    #[serde(default)]
    pub allowed_transit_modes: Vec<i32>,
    pub walk_speed_m_per_s: f64,
    pub max_walk_time_minutes: u32,
    pub in_routing_fare_calculator: FareCalculatorConfig,
    #[serde(default)]
    pub access_stops: HashMap<String, u32>,
    #[serde(default)]
    pub egress_stops: HashMap<String, u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub request: ProfileRequest,
    pub compute_time_millis: u64,
    pub trips: Vec<Itinerary>,
    /// Set when cancellation cut the search short; `trips` still holds
    /// whatever the search had accumulated by then.
    pub partial: bool,
}

/// One multi-criteria Range-RAPTOR search between a fixed set of access and
/// egress stops.
///
/// Unlike the single-criterion predecessor's `TimeConstraint::Arrival`
/// reverse-search mode, only forward (departure-time) search is supported:
/// a profile request always produces every Pareto-optimal trip departing in
/// `[from_time_seconds, to_time_seconds)`, so "latest arrival" queries are
/// served by simply narrowing that window from the caller side.
pub struct Raptor<'a> {
    data: &'a TransitDataProvider,
    request: ProfileRequest,
    fare_calculator: Box<dyn FareCalculator>,
    cancelled: &'a AtomicBool,
}

impl<'a> Raptor<'a> {
    pub fn new(
        data: &'a TransitDataProvider,
        request: ProfileRequest,
        cancelled: &'a AtomicBool,
    ) -> Result<Self, Error> {
        let fare_calculator = request.in_routing_fare_calculator.build()?;
        Ok(Self { data, request, fare_calculator, cancelled })
    }

    pub fn solve(self) -> Result<ProfileResponse, Error> {
        let mut allocator = Allocator::new(self.data.stops.len(), self.data.patterns.len());
        self.solve_with_allocator(&mut allocator)
    }

    /// Wrapper around [`Self::solve`] for callers reusing one [`Allocator`]
    /// across many searches to avoid repeated arena/Pareto-list allocation.
    /// `allocator` must be freshly [`Allocator::reset`] before reuse.
    pub fn solve_with_allocator(self, allocator: &mut Allocator) -> Result<ProfileResponse, Error> {
        let started = std::time::Instant::now();
        let partial = self.run_search(allocator)?;
        let trips = self.collect_trips(allocator)?;
        Ok(ProfileResponse {
            compute_time_millis: started.elapsed().as_millis() as u64,
            trips,
            partial,
            request: self.request,
        })
    }

    /// Runs the full range-RAPTOR search, leaving every surviving label in
    /// `allocator`'s per-stop Pareto lists for [`Self::collect_trips`] to
    /// read back. Returns `true` if cancellation cut the search short.
    fn run_search(&self, allocator: &mut Allocator) -> Result<bool, Error> {
        let access_stops = resolve_stops(self.data, &self.request.access_stops);
        if access_stops.is_empty() {
            return Err(Error::UnresolvedOrigin);
        }
        if resolve_stops(self.data, &self.request.egress_stops).is_empty() {
            return Err(Error::UnresolvedDestination);
        }

        let naive_date = NaiveDate::parse_from_str(&self.request.date, "%Y-%m-%d")
            .map_err(|_| Error::InvalidDate(self.request.date.clone()))?;
        let date_code =
            (naive_date.year() as u32) * 10_000 + naive_date.month() * 100 + naive_date.day();
        let weekday = naive_date.weekday().num_days_from_monday() as u8;

        let active_services = self.data.active_services(date_code, weekday);
        let active_patterns = self
            .data
            .active_patterns(&active_services, &self.request.allowed_transit_modes);

        let max_rounds = self.request.max_rides as usize + 1;
        let max_fare = self.request.max_fare;
        let max_trip_duration = Duration::from_minutes(self.request.max_trip_duration_minutes);
        let initial_allowance = self.fare_calculator.initial_allowance();

        let window_end = self.request.to_time_seconds.saturating_sub(60);
        let from_time = self.request.from_time_seconds;

        if from_time > window_end {
            return Ok(false);
        }

        let mut partial = false;
        for minute in (from_time..=window_end).rev().step_by(60) {
            if self.cancelled.load(Ordering::Relaxed) {
                partial = true;
                break;
            }

            let departure_minute = Time::from_seconds(minute);
            let max_arrival = departure_minute + max_trip_duration;

            let outcome = self.run_minute(
                allocator,
                &access_stops,
                &initial_allowance,
                departure_minute,
                max_arrival,
                max_rounds,
                max_fare,
                &active_services,
                &active_patterns,
            );
            // A calculator error at one departure minute (a fare miss, an
            // inconsistent-state assertion) doesn't invalidate trips already
            // found from other minutes; it only means this minute's
            // contribution is missing, which `partial` discloses to the caller.
            if let Err(err) = outcome {
                warn!(departure_minute = minute, %err, "fare calculator error, skipping this departure minute");
                partial = true;
            }
        }

        Ok(partial)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_minute(
        &self,
        allocator: &mut Allocator,
        access_stops: &[(u32, u32)],
        initial_allowance: &fare::TransferAllowance,
        departure_minute: Time,
        max_arrival: Time,
        max_rounds: usize,
        max_fare: i64,
        active_services: &bitvec::vec::BitVec,
        active_patterns: &bitvec::vec::BitVec,
    ) -> Result<(), fare::Error> {
        let seed_candidates: Vec<Candidate> = access_stops
            .iter()
            .map(|&(stop_idx, secs)| {
                Candidate::new(McLabel::access(
                    stop_idx,
                    departure_minute + Duration::from_seconds(secs),
                    initial_allowance.clone(),
                ))
            })
            .collect();
        let seeded = apply_candidates(allocator, seed_candidates, max_fare, max_arrival)?;

        allocator.clear_frontier();
        for &(stop_idx, label_idx) in &seeded {
            allocator.push_frontier(stop_idx, label_idx);
        }
        let mut frontier_stops: Vec<u32> = seeded.iter().map(|&(stop_idx, _)| stop_idx).collect();

        let mut round = 0usize;
        while !frontier_stops.is_empty() && round < max_rounds {
            allocator.active_mask.fill(false);
            self.data.patterns_touched(
                frontier_stops.iter().copied(),
                active_patterns,
                &mut allocator.active,
                &mut allocator.active_mask,
            );
            if !allocator.active_mask.any() {
                break;
            }

            let transit_candidates = generate_transit_candidates(
                self.data,
                allocator,
                self.fare_calculator.as_ref(),
                active_services,
                max_arrival,
            )?;
            let transit_accepted = apply_candidates(allocator, transit_candidates, max_fare, max_arrival)?;

            let transfer_candidates = generate_transfer_candidates(self.data, allocator, &transit_accepted);
            let transfer_accepted = apply_candidates(allocator, transfer_candidates, max_fare, max_arrival)?;

            allocator.clear_frontier();
            let mut next_stops = Vec::with_capacity(transit_accepted.len() + transfer_accepted.len());
            for &(stop_idx, label_idx) in transit_accepted.iter().chain(transfer_accepted.iter()) {
                allocator.push_frontier(stop_idx, label_idx);
                next_stops.push(stop_idx);
            }
            frontier_stops = next_stops;
            round += 1;
        }

        Ok(())
    }

    /// Reads every non-dominated label at an egress stop back out of
    /// `allocator`, shifts its arrival time by that stop's walking time to
    /// the true destination, and re-runs Pareto comparison across the union
    /// of every egress stop: a label's own stop-local Pareto list only
    /// compares it against other labels at the *same* stop, but two labels
    /// at different egress stops need their post-walk arrival times
    /// compared directly to decide which ones are actually worth returning.
    ///
    /// The egress-shifted copies are allocated into the same arena as the
    /// search that produced them; their `back` index still points at the
    /// original, unshifted label, so [`path::backtrack`] walks through them
    /// exactly like any other label.
    fn collect_trips(&self, allocator: &mut Allocator) -> Result<Vec<Itinerary>, Error> {
        let egress_stops = resolve_stops(self.data, &self.request.egress_stops);
        let max_fare = self.request.max_fare;

        let mut final_list = ParetoList::default();
        for &(stop_idx, egress_seconds) in &egress_stops {
            let entries: Vec<u32> = allocator.stop_labels[stop_idx as usize].entries().to_vec();
            for label_idx in entries {
                let mut label = allocator.arena.get(label_idx).clone();
                if label.cumulative_fare > max_fare {
                    continue;
                }
                label.arrival_time = label.arrival_time + Duration::from_seconds(egress_seconds);
                final_list.offer(label, &mut allocator.arena)?;
            }
        }

        let mut trips = Vec::with_capacity(final_list.entries().len());
        for &label_idx in final_list.entries() {
            let chain = path::backtrack(&allocator.arena, label_idx)?;
            trips.push(Itinerary::from_chain(self.data, &chain));
        }
        trips.sort_by_key(|t| (t.departure_time_seconds, t.duration_seconds, t.fare));
        Ok(trips)
    }
}

/// Looks up every `(stop_id, seconds)` pair by GTFS id, dropping ids the
/// network doesn't recognize rather than failing the whole search on one
/// stale entry from the access/egress collaborator.
fn resolve_stops(data: &TransitDataProvider, stops: &HashMap<String, u32>) -> Vec<(u32, u32)> {
    stops
        .iter()
        .filter_map(|(id, secs)| match data.stop_by_id(id) {
            Some(stop) => Some((stop.index, *secs)),
            None => {
                warn!(stop_id = %id, "access/egress map referenced an unknown stop id");
                None
            }
        })
        .collect()
}
