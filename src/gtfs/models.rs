use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: String,
    pub parent_station: Option<String>,
    pub zone_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GtfsRoute {
    pub route_id: String,
    pub agency_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_type: i32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GtfsTrip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    pub trip_headsign: Option<String>,
    pub trip_short_name: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GtfsStopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u16,
    pub stop_headsign: Option<String>,
    pub pickup_type: Option<u8>,
    pub drop_off_type: Option<u8>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GtfsTransfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub transfer_type: u8,
    pub min_transfer_time: Option<u32>,
}

/// `calendar.txt`: one row per service pattern, weekday flags plus a date range.
#[derive(Deserialize, Debug, Clone)]
pub struct GtfsCalendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    /// `YYYYMMDD`.
    pub start_date: String,
    /// `YYYYMMDD`.
    pub end_date: String,
}

/// `calendar_dates.txt`: per-date exceptions to a `calendar.txt` service.
#[derive(Deserialize, Debug, Clone)]
pub struct GtfsCalendarDate {
    pub service_id: String,
    /// `YYYYMMDD`.
    pub date: String,
    /// 1 = service added, 2 = service removed.
    pub exception_type: u8,
}

/// `fare_attributes.txt`: the `(value, count, expiration)` triple the
/// standard calculator turns into a [`crate::fare::allowance::TransferAllowance`].
#[derive(Deserialize, Debug, Clone)]
pub struct GtfsFareAttribute {
    pub fare_id: String,
    pub price: f64,
    pub transfers: Option<u8>,
    /// Seconds a transfer remains valid for, if transfers are allowed at all.
    pub transfer_duration: Option<u32>,
}

/// `fare_rules.txt`: maps a `(route, origin_zone, destination_zone)` triple
/// (any of which may be absent = wildcard) to a `fare_id`.
#[derive(Deserialize, Debug, Clone)]
pub struct GtfsFareRule {
    pub fare_id: String,
    pub route_id: Option<String>,
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
}
