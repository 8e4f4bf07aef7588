mod common;

use std::sync::atomic::AtomicBool;

use mc_raptor::fare::bogota::BogotaConfig;
use mc_raptor::fare::boston::BostonConfig;
use mc_raptor::fare::FareCalculatorConfig;
use mc_raptor::gtfs::GtfsData;
use mc_raptor::raptor::{ProfileRequest, Raptor};

use common::{build, daily_calendar, route, stop, stop_time, stops_map, trip};

fn request(fare_calculator: FareCalculatorConfig) -> ProfileRequest {
    ProfileRequest {
        from_lat: 0.0,
        from_lon: 0.0,
        to_lat: 0.0,
        to_lon: 0.0,
        from_time_seconds: 28_800,
        to_time_seconds: 28_860,
        date: "2024-01-01".to_string(),
        max_rides: 3,
        max_trip_duration_minutes: 60,
        max_fare: 10_000,
        allowed_transit_modes: vec![],
        walk_speed_m_per_s: 1.3,
        max_walk_time_minutes: 10,
        in_routing_fare_calculator: fare_calculator,
        access_stops: stops_map(&[("S1", 0)]),
        egress_stops: stops_map(&[("S4", 0)]),
    }
}

/// Bus -> subway -> bus through a Boston-style CharlieCard network: one
/// subway fare covers the whole trip, matching the CharlieCard rule-group
/// state machine's documented local-bus/subway/local-bus chain.
#[test]
fn boston_bus_subway_bus_costs_one_subway_fare() {
    let data_raw = GtfsData {
        stops: vec![stop("S1"), stop("S2"), stop("S3"), stop("S4")],
        routes: vec![
            route("bus1", "mbta", 3),
            route("red", "mbta", 1),
            route("bus2", "mbta", 3),
        ],
        trips: vec![
            trip("bus1trip", "bus1", "daily"),
            trip("redtrip", "red", "daily"),
            trip("bus2trip", "bus2", "daily"),
        ],
        stop_times: vec![
            stop_time("bus1trip", "S1", 1, "08:00:00", "08:00:00"),
            stop_time("bus1trip", "S2", 2, "08:10:00", "08:10:00"),
            stop_time("redtrip", "S2", 1, "08:15:00", "08:15:00"),
            stop_time("redtrip", "S3", 2, "08:25:00", "08:25:00"),
            stop_time("bus2trip", "S3", 1, "08:30:00", "08:30:00"),
            stop_time("bus2trip", "S4", 2, "08:40:00", "08:40:00"),
        ],
        calendar: vec![daily_calendar("daily")],
        ..Default::default()
    };
    let data = build(data_raw);

    let mut route_fare_ids = std::collections::HashMap::new();
    route_fare_ids.insert("bus1".to_string(), "localBus".to_string());
    route_fare_ids.insert("red".to_string(), "subway".to_string());
    route_fare_ids.insert("bus2".to_string(), "localBus".to_string());

    let calculator = FareCalculatorConfig::Boston(BostonConfig {
        local_bus_fare: 170,
        subway_fare: 290,
        inner_express_bus_fare: 400,
        outer_express_bus_fare: 700,
        transfer_window_seconds: 7_200,
        route_fare_ids,
        connected_pairs: vec![],
    });

    let cancelled = AtomicBool::new(false);
    let response = Raptor::new(&data, request(calculator), &cancelled)
        .unwrap()
        .solve()
        .unwrap();

    let itinerary = response
        .trips
        .iter()
        .find(|t| t.legs.len() == 3)
        .expect("the three-leg itinerary should survive");
    assert_eq!(itinerary.fare, 290);
}

/// TPC -> TransMilenio -> TPC in Bogotá: each transfer prices from the
/// ordered transfer-fare table rather than a flat per-ride fare, so the
/// total is the sum of the base fare and both transfer fares.
#[test]
fn bogota_tpc_transmilenio_tpc_sums_three_fares() {
    let data_raw = GtfsData {
        stops: vec![stop("S1"), stop("S2"), stop("S3"), stop("S4")],
        routes: vec![
            route("tpc1", "tpc", 3),
            route("tm1", "transmilenio", 3),
            route("tpc2", "tpc", 3),
        ],
        trips: vec![
            trip("tpc1trip", "tpc1", "daily"),
            trip("tm1trip", "tm1", "daily"),
            trip("tpc2trip", "tpc2", "daily"),
        ],
        stop_times: vec![
            stop_time("tpc1trip", "S1", 1, "08:00:00", "08:00:00"),
            stop_time("tpc1trip", "S2", 2, "08:10:00", "08:10:00"),
            stop_time("tm1trip", "S2", 1, "08:15:00", "08:15:00"),
            stop_time("tm1trip", "S3", 2, "08:25:00", "08:25:00"),
            stop_time("tpc2trip", "S3", 1, "08:30:00", "08:30:00"),
            stop_time("tpc2trip", "S4", 2, "08:40:00", "08:40:00"),
        ],
        calendar: vec![daily_calendar("daily")],
        ..Default::default()
    };
    let data = build(data_raw);

    let calculator = FareCalculatorConfig::Bogota(BogotaConfig {
        tpc_agency_name: "tpc".to_string(),
        transmilenio_agency_name: "transmilenio".to_string(),
        tpc_base_fare: 2_000,
        transfer_fares: [0, 500, 1_800, 0],
    });

    let cancelled = AtomicBool::new(false);
    let response = Raptor::new(&data, request(calculator), &cancelled)
        .unwrap()
        .solve()
        .unwrap();

    let itinerary = response
        .trips
        .iter()
        .find(|t| t.legs.len() == 3)
        .expect("the three-leg itinerary should survive");
    assert_eq!(itinerary.fare, 2_000 + 500 + 1_800);
}
