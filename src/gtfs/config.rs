/// File names within a GTFS feed (zip or directory). Exposed so unusual
/// feeds that rename files can still be loaded without forking the loader.
#[derive(Debug, Clone)]
pub struct Config {
    pub stops_path: String,
    pub routes_path: String,
    pub trips_path: String,
    pub stop_times_path: String,
    pub transfers_path: String,
    pub calendar_path: String,
    pub calendar_dates_path: String,
    pub fare_attributes_path: String,
    pub fare_rules_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stops_path: "stops.txt".into(),
            routes_path: "routes.txt".into(),
            trips_path: "trips.txt".into(),
            stop_times_path: "stop_times.txt".into(),
            transfers_path: "transfers.txt".into(),
            calendar_path: "calendar.txt".into(),
            calendar_dates_path: "calendar_dates.txt".into(),
            fare_attributes_path: "fare_attributes.txt".into(),
            fare_rules_path: "fare_rules.txt".into(),
        }
    }
}
