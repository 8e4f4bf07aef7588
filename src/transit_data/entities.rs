use std::sync::Arc;

use crate::shared::time::{Duration, Time};

/// A physical point where passengers can board or alight from a vehicle.
///
/// Unlike the original street-network-aware stop model, this carries no
/// coordinate: access/egress walking is computed by an external collaborator
/// and handed to the router as a stop -> seconds map.
#[derive(Debug, Default, Clone)]
pub struct Stop {
    /// The global internal index for this stop.
    pub index: u32,
    /// Unique external identifier for the stop.
    pub id: Arc<str>,
    /// Human-readable name (e.g., "Main St & 4th Ave").
    pub name: Arc<str>,
    /// Index of the parent station, if this stop is a platform or entrance.
    pub parent_index: Option<u32>,
    /// Fare-zone identifier, used by zone-based and flat-fare calculators.
    pub fare_zone: Option<Arc<str>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StopAccessType {
    #[default]
    Regularly,
    NoneAvailable,
    AgencyArrange,
    DriverArrange,
}

/// Individual event within a trip where a vehicle calls at a stop.
#[derive(Debug, Default, Clone)]
pub struct StopTime {
    /// Global internal index of this stop-time record.
    pub index: u32,
    /// Internal index of the parent [`Trip`].
    pub trip_idx: u32,
    /// Internal index of the associated [`Stop`].
    pub stop_idx: u32,
    /// The order of this stop within the trip (starts from 1).
    pub sequence: u16,
    /// Pointer to the full range of stop times for the parent trip.
    pub slice: StopTimeSlice,
    /// Zero-based position of this stop within its specific trip.
    pub internal_idx: u32,
    /// Scheduled arrival time (seconds since the service day's midnight).
    pub arrival_time: Time,
    /// Scheduled departure time (seconds since the service day's midnight).
    pub departure_time: Time,
    /// Destination shown to passengers when at this stop.
    pub headsign: Option<Arc<str>>,
    /// Policy for passenger boarding (Regular, No Pickup, etc.).
    pub pickup_type: StopAccessType,
    /// Policy for passenger alighting.
    pub drop_off_type: StopAccessType,
}

/// Metadata describing a contiguous range within the global `stop_times` array.
#[derive(Default, Debug, Clone, Copy)]
pub struct StopTimeSlice {
    /// The index where the trip's stop-times begin.
    pub start_idx: u32,
    /// The total number of stops in the trip.
    pub count: u32,
}

/// A connection between two points in the network, typically walking.
#[derive(Debug, Default, Clone)]
pub struct Transfer {
    pub from_stop_idx: u32,
    pub to_stop_idx: u32,
    /// The minimum time required to successfully complete this transfer.
    pub min_transfer_time: Duration,
}

/// A specific journey taken by a vehicle through a sequence of stops.
#[derive(Debug, Default, Clone)]
pub struct Trip {
    pub index: u32,
    pub id: Arc<str>,
    /// Pointer to the parent [`Route`].
    pub route_idx: u32,
    /// Pointer to the optimized [`Pattern`] used by the routing engine.
    pub pattern_idx: u32,
    /// The GTFS `service_id` this trip runs under, used for calendar filtering.
    pub service_idx: u32,
    pub headsign: Option<Arc<str>>,
    pub short_name: Option<Arc<str>>,
}

/// A grouping of trips that are displayed to riders under a single name (e.g., "Blue Line").
#[derive(Debug, Default, Clone)]
pub struct Route {
    pub index: u32,
    pub id: Arc<str>,
    pub agency_id: Arc<str>,
    pub short_name: Option<Arc<str>>,
    pub long_name: Option<Arc<str>>,
    /// Classification of the vehicle (0: Tram, 1: Subway, 3: Bus, etc.).
    pub route_type: i32,
}

/// An optimized route structure strictly for the RAPTOR algorithm.
///
/// Unlike a standard [`Route`], a `Pattern` guarantees that every trip within
/// it shares the *exact same stop sequence*. GTFS routes are split into one
/// or more patterns during ingestion (`source::gtfs::generate_patterns`).
#[derive(Debug, Default, Clone)]
pub struct Pattern {
    /// Internal index of this pattern. Stable across date filtering so label
    /// back-references always resolve, even though `patterns_touched` only
    /// walks the subset active on the search date.
    pub index: u32,
    /// Pointer back to the display-level [`Route`].
    pub route_idx: u32,
    /// List of stop indices served by this pattern in order.
    pub stops: Arc<[u32]>,
    /// List of trip indices that follow this stop sequence, sorted by
    /// departure time from the first stop.
    pub trips: Arc<[u32]>,
    /// Union of `service_idx` across every trip on this pattern; used to
    /// cheaply reject a pattern before checking individual trips.
    pub services_active: Arc<[u32]>,
}

/// A GTFS `calendar.txt` service pattern plus its `calendar_dates.txt`
/// exceptions, resolved to "is this service running on date X" queries.
#[derive(Debug, Default, Clone)]
pub struct Calendar {
    pub index: u32,
    pub service_id: Arc<str>,
    /// Bit `i` (0 = Monday) set means the service runs on that weekday.
    pub weekdays: u8,
    /// Inclusive date range, as GTFS `YYYYMMDD` integers.
    pub start_date: u32,
    pub end_date: u32,
    /// `(date, added)` exceptions from `calendar_dates.txt`, sorted by date.
    pub exceptions: Arc<[(u32, bool)]>,
}

impl Calendar {
    /// Whether this service runs on the given `YYYYMMDD` date and weekday
    /// (`0` = Monday, matching GTFS `calendar.txt` column order).
    pub fn active_on(&self, date: u32, weekday: u8) -> bool {
        if let Ok(idx) = self
            .exceptions
            .binary_search_by_key(&date, |(d, _)| *d)
        {
            return self.exceptions[idx].1;
        }
        if date < self.start_date || date > self.end_date {
            return false;
        }
        self.weekdays & (1 << weekday) != 0
    }
}
