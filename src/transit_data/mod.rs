mod entities;
pub mod source;

pub use entities::*;

use std::{collections::HashMap, sync::Arc};
use thiserror::Error as ThisError;

use crate::shared::time::Duration;

/// Ingestion-time data-integrity errors: a foreign key in one GTFS table
/// pointing at a row absent from another. These abort construction
/// fail-fast rather than surfacing as a panic mid-search.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("stop_times.txt references unknown stop_id {0}")]
    UnknownStop(String),
    #[error("trips.txt references unknown route_id {0}")]
    UnknownRoute(String),
    #[error("stop_times.txt references unknown trip_id {0}")]
    UnknownTrip(String),
    #[error("trips.txt references unknown service_id {0}")]
    UnknownService(String),
    #[error("malformed time value: {0}")]
    InvalidTime(String),
    #[error("malformed date value: {0}")]
    InvalidDate(String),
}

/// A read-only, date-independent view of a transit network.
///
/// A flattened relational store using `Box<[T]>` slices and index-based
/// adjacency lists instead of owned collections, optimized for RAPTOR's
/// inner loops. There is no coordinate or area concept here: access/egress
/// walking is computed by an external collaborator, so stops, not
/// geography, are the only location primitive the router knows about.
#[derive(Debug, Clone, Default)]
pub struct TransitDataProvider {
    /// Global list of all physical transit stops or stations.
    pub stops: Box<[Stop]>,
    /// High-level transit routes (e.g., "Red Line").
    pub routes: Box<[Route]>,
    /// Individual vehicle journeys occurring at specific times.
    pub trips: Box<[Trip]>,
    /// The specific arrival/departure events linking trips to stops.
    pub stop_times: Box<[StopTime]>,
    /// All known footpath transfers.
    pub transfers: Box<[Transfer]>,
    /// Patterns: groupings of trips sharing an identical stop sequence,
    /// required by RAPTOR's route-scanning optimization.
    pub patterns: Box<[Pattern]>,
    /// Calendar services (`calendar.txt` + `calendar_dates.txt` resolved).
    pub calendars: Box<[Calendar]>,

    // --- Primary key lookups ---
    pub(crate) stop_lookup: HashMap<Arc<str>, u32>,
    pub(crate) trip_lookup: HashMap<Arc<str>, u32>,
    pub(crate) route_lookup: HashMap<Arc<str>, u32>,
    pub(crate) calendar_lookup: HashMap<Arc<str>, u32>,

    // --- Relationship indices ---
    pub(crate) trip_to_stop_slice: Box<[StopTimeSlice]>,
    pub(crate) trip_to_route: Box<[u32]>,
    pub(crate) trip_to_pattern: Box<[u32]>,
    pub(crate) stop_to_transfers: Box<[Box<[u32]>]>,
    /// `stop_index -> [pattern_index, ...]`, used by round exploration to
    /// find every pattern touching a just-improved stop.
    pub(crate) stop_to_patterns: Box<[Box<[u32]>]>,
    /// `parent_station_index -> [platform_stop_index, ...]`.
    pub(crate) station_to_stops: Box<[Box<[u32]>]>,
}

impl TransitDataProvider {
    pub fn new() -> Self {
        Default::default()
    }

    // --- Primary key lookups ---

    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        self.stop_lookup.get(id).map(|idx| &self.stops[*idx as usize])
    }

    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        self.trip_lookup.get(id).map(|idx| &self.trips[*idx as usize])
    }

    pub fn route_by_id(&self, id: &str) -> Option<&Route> {
        self.route_lookup.get(id).map(|idx| &self.routes[*idx as usize])
    }

    /// Every platform/entrance belonging to the station `stop_idx` is a
    /// parent of, including `stop_idx` itself if it has no children (a
    /// standalone stop is its own trivial station).
    pub fn stops_by_station(&self, stop_idx: u32) -> Vec<&Stop> {
        let children = &self.station_to_stops[stop_idx as usize];
        if children.is_empty() {
            vec![&self.stops[stop_idx as usize]]
        } else {
            children.iter().map(|idx| &self.stops[*idx as usize]).collect()
        }
    }

    // --- Schedule access ---

    /// Efficiently retrieves the stop-time slice for a specific trip, in
    /// pattern-stop order.
    pub fn stop_times_by_trip_idx(&self, trip_idx: u32) -> &[StopTime] {
        let slice = self.trip_to_stop_slice[trip_idx as usize];
        let start = slice.start_idx as usize;
        let end = start + slice.count as usize;
        &self.stop_times[start..end]
    }

    /// `trip_departure(pattern, trip_index, stop_position)`: the departure
    /// time of `trip_idx` at the `stop_position`-th stop of its pattern.
    pub fn trip_departure(&self, trip_idx: u32, stop_position: usize) -> crate::shared::time::Time {
        self.stop_times_by_trip_idx(trip_idx)[stop_position].departure_time
    }

    /// `trip_arrival(pattern, trip_index, stop_position)`.
    pub fn trip_arrival(&self, trip_idx: u32, stop_position: usize) -> crate::shared::time::Time {
        self.stop_times_by_trip_idx(trip_idx)[stop_position].arrival_time
    }

    pub fn route_by_trip_idx(&self, trip_idx: u32) -> &Route {
        &self.routes[self.trip_to_route[trip_idx as usize] as usize]
    }

    pub fn pattern_by_trip_idx(&self, trip_idx: u32) -> &Pattern {
        &self.patterns[self.trip_to_pattern[trip_idx as usize] as usize]
    }

    // --- Transfers ---

    /// `transfers_from(stop) -> iterable<(to_stop, walk_seconds)>`.
    pub fn transfers_from(&self, stop_idx: u32) -> impl Iterator<Item = (u32, Duration)> + '_ {
        self.stop_to_transfers[stop_idx as usize].iter().map(move |transfer_idx| {
            let transfer = &self.transfers[*transfer_idx as usize];
            (transfer.to_stop_idx, transfer.min_transfer_time)
        })
    }

    /// Patterns touching any stop in `stops_just_improved`, restricted to
    /// `active_patterns` (already intersected against the search date's
    /// active services and the request's allowed mode set at search setup).
    /// Returns, for each touched pattern, the earliest stop position within
    /// it that was improved — scanning need only start there.
    ///
    /// `active`/`active_mask` are caller-owned scratch buffers sized
    /// `self.patterns.len()` (the [`crate::raptor::Allocator`]'s arena),
    /// reused across rounds rather than allocated per call: for every
    /// touched pattern, `active[pattern_idx]` ends up holding the earliest
    /// improved stop position, so scanning need only start there.
    pub fn patterns_touched(
        &self,
        stops_just_improved: impl Iterator<Item = u32>,
        active_patterns: &bitvec::vec::BitVec,
        active: &mut [u32],
        active_mask: &mut bitvec::vec::BitVec,
    ) {
        for stop_idx in stops_just_improved {
            for pattern_idx in self.stop_to_patterns[stop_idx as usize].iter().copied() {
                if !active_patterns[pattern_idx as usize] {
                    continue;
                }
                let pattern = &self.patterns[pattern_idx as usize];
                let Some(position) = pattern.stops.iter().position(|s| *s == stop_idx) else {
                    continue;
                };
                let position = position as u32;
                let idx = pattern_idx as usize;
                if !active_mask[idx] || position < active[idx] {
                    active[idx] = position;
                    active_mask.set(idx, true);
                }
            }
        }
    }

    /// Every service index active on `date` (`YYYYMMDD`, weekday `0` =
    /// Monday), computed once at search setup and reused for the whole
    /// search's range-RAPTOR minute loop.
    pub fn active_services(&self, date: u32, weekday: u8) -> bitvec::vec::BitVec {
        let mut active = bitvec::vec::BitVec::repeat(false, self.calendars.len());
        for calendar in self.calendars.iter() {
            if calendar.active_on(date, weekday) {
                active.set(calendar.index as usize, true);
            }
        }
        active
    }

    /// `skip_calendar_service(service_code) -> bool`: true when the service
    /// is not active on `active_services`.
    pub fn skip_calendar_service(&self, service_idx: u32, active_services: &bitvec::vec::BitVec) -> bool {
        !active_services[service_idx as usize]
    }

    /// Builds the dense "active on this date, in these modes" pattern
    /// bitset consulted throughout one search. Original pattern indices are
    /// preserved
    /// (this is a bitset over `self.patterns`, not a re-indexed copy) so
    /// label back-references into `pattern_idx` always resolve.
    pub fn active_patterns(&self, active_services: &bitvec::vec::BitVec, allowed_modes: &[i32]) -> bitvec::vec::BitVec {
        let mut active = bitvec::vec::BitVec::repeat(false, self.patterns.len());
        for pattern in self.patterns.iter() {
            let mode_ok = allowed_modes.is_empty()
                || allowed_modes.contains(&self.routes[pattern.route_idx as usize].route_type);
            let service_ok = pattern
                .services_active
                .iter()
                .any(|service_idx| active_services[*service_idx as usize]);
            if mode_ok && service_ok {
                active.set(pattern.index as usize, true);
            }
        }
        active
    }
}
