//! Small synthetic GTFS fixtures shared across the integration tests.
//!
//! Built directly from in-memory row structs rather than a packaged zip:
//! the networks here are small enough that hand-written rows are clearer
//! than a fixture file, and they avoid a binary test asset.

use std::collections::HashMap;

use mc_raptor::gtfs::models::{GtfsCalendar, GtfsRoute, GtfsStop, GtfsStopTime, GtfsTrip};
use mc_raptor::gtfs::GtfsData;
use mc_raptor::transit_data::TransitDataProvider;

pub fn stop(id: &str) -> GtfsStop {
    GtfsStop {
        stop_id: id.to_string(),
        stop_name: format!("{id} station"),
        parent_station: None,
        zone_id: None,
    }
}

pub fn route(id: &str, agency_id: &str, route_type: i32) -> GtfsRoute {
    GtfsRoute {
        route_id: id.to_string(),
        agency_id: agency_id.to_string(),
        route_short_name: Some(id.to_string()),
        route_long_name: None,
        route_type,
    }
}

pub fn trip(id: &str, route_id: &str, service_id: &str) -> GtfsTrip {
    GtfsTrip {
        route_id: route_id.to_string(),
        service_id: service_id.to_string(),
        trip_id: id.to_string(),
        trip_headsign: None,
        trip_short_name: None,
    }
}

pub fn stop_time(trip_id: &str, stop_id: &str, sequence: u16, arrival: &str, departure: &str) -> GtfsStopTime {
    GtfsStopTime {
        trip_id: trip_id.to_string(),
        arrival_time: arrival.to_string(),
        departure_time: departure.to_string(),
        stop_id: stop_id.to_string(),
        stop_sequence: sequence,
        stop_headsign: None,
        pickup_type: None,
        drop_off_type: None,
    }
}

/// A service active on every weekday for all of 2024. `2024-01-01` (the date
/// every test searches on) is a Monday.
pub fn daily_calendar(service_id: &str) -> GtfsCalendar {
    GtfsCalendar {
        service_id: service_id.to_string(),
        monday: 1,
        tuesday: 1,
        wednesday: 1,
        thursday: 1,
        friday: 1,
        saturday: 1,
        sunday: 1,
        start_date: "20240101".to_string(),
        end_date: "20241231".to_string(),
    }
}

pub fn build(data: GtfsData) -> TransitDataProvider {
    TransitDataProvider::from_gtfs(data).expect("fixture GTFS data should ingest cleanly")
}

pub fn stops_map(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
    pairs.iter().map(|(id, secs)| (id.to_string(), *secs)).collect()
}
