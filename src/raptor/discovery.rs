use crate::shared::time::Time;
use crate::transit_data::{Pattern, TransitDataProvider};

/// Position of `stop_idx` within `pattern`'s stop sequence, or `None` if the
/// pattern never visits it.
pub fn index_in_pattern(pattern: &Pattern, stop_idx: u32) -> Option<u32> {
    pattern
        .stops
        .iter()
        .position(|s| *s == stop_idx)
        .map(|i| i as u32)
}

/// Finds the earliest trip in `pattern` that can still be boarded at
/// `stop_position` no earlier than `earliest_departure`, restricted to trips
/// whose service is active (`active_services[trip.service_idx]` set).
///
/// Trips within a pattern are stored sorted by departure time from their
/// first stop (`generate_patterns`'s invariant), so this scan could binary
/// search; a linear scan is kept since pattern trip counts are small and the
/// simplicity avoids a second sort key (stop `stop_position` need not track
/// the first stop's ordering once accessibility windows or frequency-based
/// schedules are introduced).
pub fn find_earliest_trip(
    data: &TransitDataProvider,
    pattern: &Pattern,
    stop_position: usize,
    earliest_departure: Time,
    active_services: &bitvec::vec::BitVec,
) -> Option<(u32, Time)> {
    let mut earliest: Option<(u32, Time)> = None;
    for &trip_idx in pattern.trips.iter() {
        let trip = &data.trips[trip_idx as usize];
        if data.skip_calendar_service(trip.service_idx, active_services) {
            continue;
        }
        let departure_time = data.trip_departure(trip_idx, stop_position);
        if departure_time < earliest_departure {
            continue;
        }
        match earliest {
            Some((_, best)) if departure_time >= best => {}
            _ => earliest = Some((trip_idx, departure_time)),
        }
    }
    earliest
}
