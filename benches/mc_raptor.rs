use std::sync::atomic::AtomicBool;
use std::{env, hint::black_box, path::Path, time::Duration};

use criterion::{criterion_group, criterion_main, Criterion};
use mc_raptor::fare::standard::StandardConfig;
use mc_raptor::fare::FareCalculatorConfig;
use mc_raptor::gtfs::GtfsLoader;
use mc_raptor::raptor::{Allocator, ProfileRequest, Raptor};
use mc_raptor::transit_data::TransitDataProvider;

fn request(from: &str, to: &str, date: &str) -> ProfileRequest {
    ProfileRequest {
        from_lat: 0.0,
        from_lon: 0.0,
        to_lat: 0.0,
        to_lon: 0.0,
        from_time_seconds: 28_800,
        to_time_seconds: 32_400,
        date: date.to_string(),
        max_rides: 4,
        max_trip_duration_minutes: 120,
        max_fare: i64::MAX,
        allowed_transit_modes: vec![],
        walk_speed_m_per_s: 1.3,
        max_walk_time_minutes: 15,
        in_routing_fare_calculator: FareCalculatorConfig::Simple(StandardConfig::default()),
        access_stops: [(from.to_string(), 0)].into_iter().collect(),
        egress_stops: [(to.to_string(), 0)].into_iter().collect(),
    }
}

fn short_solve(data: &TransitDataProvider, allocator: &mut Allocator, from: &str, to: &str, date: &str) {
    allocator.reset();
    let cancelled = AtomicBool::new(false);
    let raptor = Raptor::new(data, request(from, to, date), &cancelled).unwrap();
    let _ = black_box(raptor.solve_with_allocator(allocator));
}

fn criterion_benchmark(c: &mut Criterion) {
    let gtfs_data_path = match env::var("GTFS_DATA_PATH") {
        Ok(path_str) => Path::new(&path_str).to_owned(),
        Err(err) => {
            println!("Missing GTFS_DATA_PATH environment variable: {err}");
            return;
        }
    };

    let gtfs_data = GtfsLoader::default()
        .from_zip(&gtfs_data_path)
        .expect("Failed to load GTFS zip")
        .load()
        .expect("Failed to parse GTFS feed");
    let data = TransitDataProvider::from_gtfs(gtfs_data).expect("Failed to build transit data");

    let mut allocator = Allocator::new(data.stops.len(), data.patterns.len());

    let Some(from) = data.stops.first() else {
        println!("GTFS feed has no stops, skipping benchmark");
        return;
    };
    let Some(to) = data.stops.last() else {
        println!("GTFS feed has no stops, skipping benchmark");
        return;
    };
    let from_id = from.id.to_string();
    let to_id = to.id.to_string();

    let mut group = c.benchmark_group("Routing");
    group.warm_up_time(Duration::from_secs(10));
    group.measurement_time(Duration::from_secs(30));

    group.bench_function("Short route solve", |b| {
        b.iter(|| short_solve(&data, &mut allocator, &from_id, &to_id, "2024-01-01"))
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
