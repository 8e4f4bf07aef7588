use crate::gtfs::models::{
    GtfsCalendar, GtfsCalendarDate, GtfsFareAttribute, GtfsFareRule, GtfsRoute, GtfsStop,
    GtfsStopTime, GtfsTransfer, GtfsTrip,
};

/// Every GTFS table loaded into memory, still in raw CSV-row form.
///
/// `transit_data::source::gtfs` turns this into the indexed entities the
/// router actually runs on; nothing here is itself queryable.
#[derive(Default, Debug)]
pub struct GtfsData {
    pub stops: Vec<GtfsStop>,
    pub routes: Vec<GtfsRoute>,
    pub trips: Vec<GtfsTrip>,
    pub stop_times: Vec<GtfsStopTime>,
    pub transfers: Vec<GtfsTransfer>,
    pub calendar: Vec<GtfsCalendar>,
    pub calendar_dates: Vec<GtfsCalendarDate>,
    pub fare_attributes: Vec<GtfsFareAttribute>,
    pub fare_rules: Vec<GtfsFareRule>,
}
