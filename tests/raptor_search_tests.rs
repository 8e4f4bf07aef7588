mod common;

use std::sync::atomic::AtomicBool;

use mc_raptor::fare::standard::StandardConfig;
use mc_raptor::fare::FareCalculatorConfig;
use mc_raptor::gtfs::GtfsData;
use mc_raptor::raptor::{ProfileRequest, Raptor};

use common::{build, daily_calendar, route, stop, stop_time, stops_map, trip};

/// Direct express route S1->S4 versus a cheaper two-leg S1->S2->S3->S4
/// alternative: the express itinerary arrives first but costs more, the
/// local itinerary arrives later for less. Neither dominates the other, so
/// both must survive to the final result.
fn pareto_network() -> GtfsData {
    GtfsData {
        stops: vec![stop("S1"), stop("S2"), stop("S3"), stop("S4")],
        routes: vec![
            route("EXPRESS", "agency", 3),
            route("LOCALA", "agency", 3),
            route("LOCALB", "agency", 3),
        ],
        trips: vec![
            trip("express1", "EXPRESS", "daily"),
            trip("locala1", "LOCALA", "daily"),
            trip("localb1", "LOCALB", "daily"),
        ],
        stop_times: vec![
            stop_time("express1", "S1", 1, "08:00:00", "08:00:00"),
            stop_time("express1", "S4", 2, "08:30:00", "08:30:00"),
            stop_time("locala1", "S1", 1, "08:00:00", "08:00:00"),
            stop_time("locala1", "S2", 2, "08:10:00", "08:10:00"),
            stop_time("locala1", "S3", 3, "08:20:00", "08:20:00"),
            stop_time("localb1", "S3", 1, "08:25:00", "08:25:00"),
            stop_time("localb1", "S4", 2, "09:00:00", "09:00:00"),
        ],
        calendar: vec![daily_calendar("daily")],
        ..Default::default()
    }
}

fn pareto_fare_config() -> FareCalculatorConfig {
    FareCalculatorConfig::Simple(StandardConfig {
        rules: vec![rule("EXPRESS", 250), rule("LOCALA", 100), rule("LOCALB", 50)],
        default_fare: 500,
    })
}

fn rule(route_id: &str, price: i64) -> mc_raptor::fare::standard::FareRuleConfig {
    mc_raptor::fare::standard::FareRuleConfig {
        route_id: Some(route_id.to_string()),
        board_zone: None,
        alight_zone: None,
        price,
        transfers: None,
        transfer_duration_seconds: None,
    }
}

fn base_request(max_fare: i64, max_trip_duration_minutes: u32) -> ProfileRequest {
    ProfileRequest {
        from_lat: 0.0,
        from_lon: 0.0,
        to_lat: 0.0,
        to_lon: 0.0,
        from_time_seconds: 28_800,
        to_time_seconds: 28_860,
        date: "2024-01-01".to_string(),
        max_rides: 2,
        max_trip_duration_minutes,
        max_fare,
        allowed_transit_modes: vec![],
        walk_speed_m_per_s: 1.3,
        max_walk_time_minutes: 10,
        in_routing_fare_calculator: pareto_fare_config(),
        access_stops: stops_map(&[("S1", 0)]),
        egress_stops: stops_map(&[("S4", 0)]),
    }
}

#[test]
fn both_pareto_optimal_itineraries_survive() {
    let data = build(pareto_network());
    let cancelled = AtomicBool::new(false);
    let request = base_request(1_000, 90);
    let response = Raptor::new(&data, request, &cancelled).unwrap().solve().unwrap();

    let mut fares: Vec<i64> = response.trips.iter().map(|t| t.fare).collect();
    fares.sort();
    assert_eq!(fares, vec![100, 250]);
    assert!(!response.partial);
}

#[test]
fn max_fare_filters_out_the_expensive_itinerary() {
    let data = build(pareto_network());
    let cancelled = AtomicBool::new(false);
    let request = base_request(200, 90);
    let response = Raptor::new(&data, request, &cancelled).unwrap().solve().unwrap();

    assert_eq!(response.trips.len(), 1);
    assert_eq!(response.trips[0].fare, 100);
}

#[test]
fn max_trip_duration_filters_out_the_slow_itinerary() {
    let data = build(pareto_network());
    let cancelled = AtomicBool::new(false);
    // The local route takes 60 minutes end to end; only the 30-minute
    // express trip fits inside a 35-minute ceiling.
    let request = base_request(1_000, 35);
    let response = Raptor::new(&data, request, &cancelled).unwrap().solve().unwrap();

    assert_eq!(response.trips.len(), 1);
    assert_eq!(response.trips[0].fare, 250);
}

#[test]
fn walk_only_journey_needs_no_ride_and_costs_nothing() {
    let data = build(pareto_network());
    let cancelled = AtomicBool::new(false);
    let mut request = base_request(1_000, 90);
    // Access and egress resolve to the same stop: no transit ride is
    // necessary to get from origin to destination.
    request.access_stops = stops_map(&[("S2", 120)]);
    request.egress_stops = stops_map(&[("S2", 30)]);

    let response = Raptor::new(&data, request, &cancelled).unwrap().solve().unwrap();

    assert_eq!(response.trips.len(), 1);
    let trip = &response.trips[0];
    assert_eq!(trip.legs.len(), 1);
    assert_eq!(trip.legs[0].kind, mc_raptor::raptor::LegKind::Transfer);
    assert_eq!(trip.legs[0].cumulative_fare, 0);
    assert_eq!(trip.fare, 0);
    assert_eq!(trip.duration_seconds, 0);
}

#[test]
fn unresolved_access_stop_is_an_error() {
    let data = build(pareto_network());
    let cancelled = AtomicBool::new(false);
    let mut request = base_request(1_000, 90);
    request.access_stops = stops_map(&[("NOWHERE", 0)]);

    let err = Raptor::new(&data, request, &cancelled).unwrap().solve().unwrap_err();
    assert!(matches!(err, mc_raptor::raptor::Error::UnresolvedOrigin));
}
