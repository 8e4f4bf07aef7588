use std::{collections::HashMap, sync::Arc, time::Instant};

use tracing::debug;

use crate::{
    gtfs::{
        GtfsCalendar, GtfsCalendarDate, GtfsData, GtfsRoute, GtfsStop, GtfsStopTime, GtfsTransfer,
        GtfsTrip,
    },
    shared::time::{Duration, Time},
    transit_data::{
        Calendar, Error, Pattern, Route, Stop, StopAccessType, StopTime, StopTimeSlice,
        TransitDataProvider, Transfer, Trip,
    },
};

/// Fallback walk time used when `transfers.txt` omits `min_transfer_time`.
/// Without coordinates or a fixed walking speed to derive a precise figure
/// from, this crate falls back to a flat duration, documented as a
/// simplification in `DESIGN.md`.
const DEFAULT_TRANSFER_SECONDS: u32 = 180;

impl TransitDataProvider {
    /// Builds a [`TransitDataProvider`] from an ingested [`GtfsData`].
    ///
    /// Mirrors `Repository`'s staged-loading shape: stops, then routes, then
    /// calendars (new — required for date-scoped pattern filtering), then
    /// trips, then stop times, then transfers, and finally pattern
    /// generation, which needs every prior stage's indices.
    pub fn from_gtfs(data: GtfsData) -> Result<Self, Error> {
        let mut provider = Self::new();
        provider.load_stops(data.stops);
        provider.load_routes(data.routes);
        provider.load_calendars(data.calendar, data.calendar_dates)?;
        provider.load_trips(data.trips)?;
        provider.load_stop_times(data.stop_times)?;
        provider.load_transfers(data.transfers)?;
        provider.generate_patterns();
        Ok(provider)
    }

    fn load_stops(&mut self, gtfs_stops: Vec<GtfsStop>) {
        debug!("Loading stops...");
        let now = Instant::now();

        let mut stop_lookup: HashMap<Arc<str>, u32> = HashMap::with_capacity(gtfs_stops.len());
        let mut pending: Vec<(Stop, Option<String>)> = Vec::with_capacity(gtfs_stops.len());
        for (i, row) in gtfs_stops.into_iter().enumerate() {
            let id: Arc<str> = row.stop_id.into();
            stop_lookup.insert(id.clone(), i as u32);
            pending.push((
                Stop {
                    index: i as u32,
                    id,
                    name: row.stop_name.into(),
                    parent_index: None,
                    fare_zone: row.zone_id.map(Into::into),
                },
                row.parent_station,
            ));
        }

        let mut station_to_stops: Vec<Vec<u32>> = vec![Vec::new(); pending.len()];
        for (stop, parent_id) in pending.iter_mut() {
            let Some(parent_id) = parent_id else { continue };
            if let Some(parent_idx) = stop_lookup.get(parent_id.as_str()) {
                stop.parent_index = Some(*parent_idx);
                station_to_stops[*parent_idx as usize].push(stop.index);
            }
        }

        self.stops = pending.into_iter().map(|(stop, _)| stop).collect();
        self.stop_lookup = stop_lookup;
        self.station_to_stops = station_to_stops.into_iter().map(Into::into).collect();

        debug!("Loading {} stops took {:?}", self.stops.len(), now.elapsed());
    }

    fn load_routes(&mut self, gtfs_routes: Vec<GtfsRoute>) {
        debug!("Loading routes...");
        let now = Instant::now();

        let mut route_lookup: HashMap<Arc<str>, u32> = HashMap::with_capacity(gtfs_routes.len());
        let mut routes: Vec<Route> = Vec::with_capacity(gtfs_routes.len());
        for (i, row) in gtfs_routes.into_iter().enumerate() {
            let id: Arc<str> = row.route_id.into();
            route_lookup.insert(id.clone(), i as u32);
            routes.push(Route {
                index: i as u32,
                id,
                agency_id: row.agency_id.into(),
                short_name: row.route_short_name.map(Into::into),
                long_name: row.route_long_name.map(Into::into),
                route_type: row.route_type,
            });
        }
        self.routes = routes.into();
        self.route_lookup = route_lookup;

        debug!("Loading {} routes took {:?}", self.routes.len(), now.elapsed());
    }

    /// `calendar.txt` rows become one [`Calendar`] apiece; `calendar_dates.txt`
    /// rows either add exceptions to an existing service or, for
    /// exception-only services (valid per the GTFS reference), create a
    /// `Calendar` with an empty weekday mask that is active only on its
    /// listed dates.
    fn load_calendars(
        &mut self,
        calendar: Vec<GtfsCalendar>,
        calendar_dates: Vec<GtfsCalendarDate>,
    ) -> Result<(), Error> {
        debug!("Loading calendars...");
        let now = Instant::now();

        let mut calendar_lookup: HashMap<Arc<str>, u32> = HashMap::with_capacity(calendar.len());
        let mut calendars: Vec<Calendar> = Vec::with_capacity(calendar.len());
        for row in calendar {
            let index = calendars.len() as u32;
            let service_id: Arc<str> = row.service_id.into();
            calendar_lookup.insert(service_id.clone(), index);
            calendars.push(Calendar {
                index,
                service_id,
                weekdays: weekday_bits(&row),
                start_date: parse_date(&row.start_date)?,
                end_date: parse_date(&row.end_date)?,
                exceptions: Arc::from([]),
            });
        }

        let mut exceptions_by_service: HashMap<u32, Vec<(u32, bool)>> = HashMap::new();
        for row in calendar_dates {
            let index = match calendar_lookup.get(row.service_id.as_str()) {
                Some(idx) => *idx,
                None => {
                    let idx = calendars.len() as u32;
                    let service_id: Arc<str> = row.service_id.clone().into();
                    calendar_lookup.insert(service_id.clone(), idx);
                    calendars.push(Calendar {
                        index: idx,
                        service_id,
                        weekdays: 0,
                        start_date: 0,
                        end_date: 99_999_999,
                        exceptions: Arc::from([]),
                    });
                    idx
                }
            };
            let date = parse_date(&row.date)?;
            exceptions_by_service
                .entry(index)
                .or_default()
                .push((date, row.exception_type == 1));
        }

        for (index, mut exceptions) in exceptions_by_service {
            exceptions.sort_by_key(|(date, _)| *date);
            calendars[index as usize].exceptions = exceptions.into();
        }

        self.calendar_lookup = calendar_lookup;
        self.calendars = calendars.into();

        debug!(
            "Loading {} calendars took {:?}",
            self.calendars.len(),
            now.elapsed()
        );
        Ok(())
    }

    fn load_trips(&mut self, gtfs_trips: Vec<GtfsTrip>) -> Result<(), Error> {
        debug!("Loading trips...");
        let now = Instant::now();

        let mut trip_lookup: HashMap<Arc<str>, u32> = HashMap::with_capacity(gtfs_trips.len());
        let mut trip_to_route: Vec<u32> = Vec::with_capacity(gtfs_trips.len());
        let mut trips: Vec<Trip> = Vec::with_capacity(gtfs_trips.len());
        for (i, row) in gtfs_trips.into_iter().enumerate() {
            let route_idx = *self
                .route_lookup
                .get(row.route_id.as_str())
                .ok_or_else(|| Error::UnknownRoute(row.route_id.clone()))?;
            let service_idx = *self
                .calendar_lookup
                .get(row.service_id.as_str())
                .ok_or_else(|| Error::UnknownService(row.service_id.clone()))?;
            let id: Arc<str> = row.trip_id.into();
            trip_lookup.insert(id.clone(), i as u32);
            trip_to_route.push(route_idx);
            trips.push(Trip {
                index: i as u32,
                id,
                route_idx,
                pattern_idx: u32::MAX,
                service_idx,
                headsign: row.trip_headsign.map(Into::into),
                short_name: row.trip_short_name.map(Into::into),
            });
        }
        self.trips = trips.into();
        self.trip_lookup = trip_lookup;
        self.trip_to_route = trip_to_route.into();

        debug!("Loading {} trips took {:?}", self.trips.len(), now.elapsed());
        Ok(())
    }

    fn load_stop_times(&mut self, gtfs_stop_times: Vec<GtfsStopTime>) -> Result<(), Error> {
        debug!("Loading stop times...");
        let now = Instant::now();

        let mut by_trip: HashMap<u32, Vec<StopTime>> = HashMap::with_capacity(self.trips.len());
        for row in gtfs_stop_times {
            let trip_idx = *self
                .trip_lookup
                .get(row.trip_id.as_str())
                .ok_or_else(|| Error::UnknownTrip(row.trip_id.clone()))?;
            let stop_idx = *self
                .stop_lookup
                .get(row.stop_id.as_str())
                .ok_or_else(|| Error::UnknownStop(row.stop_id.clone()))?;
            let arrival_time = Time::from_hms(&row.arrival_time)
                .ok_or_else(|| Error::InvalidTime(row.arrival_time.clone()))?;
            let departure_time = Time::from_hms(&row.departure_time)
                .ok_or_else(|| Error::InvalidTime(row.departure_time.clone()))?;
            by_trip.entry(trip_idx).or_default().push(StopTime {
                index: u32::MAX,
                trip_idx,
                stop_idx,
                sequence: row.stop_sequence,
                slice: StopTimeSlice::default(),
                internal_idx: u32::MAX,
                arrival_time,
                departure_time,
                headsign: row.stop_headsign.map(Into::into),
                pickup_type: access_type(row.pickup_type),
                drop_off_type: access_type(row.drop_off_type),
            });
        }

        let mut trip_to_stop_slice: Vec<StopTimeSlice> =
            vec![StopTimeSlice::default(); self.trips.len()];
        let total: usize = by_trip.values().map(Vec::len).sum();
        let mut stop_times: Vec<StopTime> = Vec::with_capacity(total);
        let mut idx: u32 = 0;
        // Iterate in trip-index order (not hashmap order) so the global
        // stop_times array, and therefore every downstream index, is
        // deterministic across runs on the same feed.
        for trip in self.trips.iter() {
            let Some(mut times) = by_trip.remove(&trip.index) else {
                continue;
            };
            times.sort_by_key(|st| st.sequence);
            let slice = StopTimeSlice {
                start_idx: idx,
                count: times.len() as u32,
            };
            for (i, stop_time) in times.iter_mut().enumerate() {
                stop_time.index = slice.start_idx + i as u32;
                stop_time.internal_idx = i as u32;
                stop_time.slice = slice;
            }
            trip_to_stop_slice[trip.index as usize] = slice;
            idx += slice.count;
            stop_times.extend(times);
        }

        self.stop_times = stop_times.into();
        self.trip_to_stop_slice = trip_to_stop_slice.into();

        debug!(
            "Loading {} stop times took {:?}",
            self.stop_times.len(),
            now.elapsed()
        );
        Ok(())
    }

    fn load_transfers(&mut self, gtfs_transfers: Vec<GtfsTransfer>) -> Result<(), Error> {
        debug!("Loading transfers...");
        let now = Instant::now();

        let mut transfers: Vec<Transfer> = Vec::with_capacity(gtfs_transfers.len());
        let mut stop_to_transfers: Vec<Vec<u32>> = vec![Vec::new(); self.stops.len()];
        for row in gtfs_transfers {
            // transfer_type 3 means "transfer not possible"; the rest
            // (recommended, timed, minimum-time-needed) are all walkable.
            if row.transfer_type == 3 {
                continue;
            }
            let from_stop_idx = *self
                .stop_lookup
                .get(row.from_stop_id.as_str())
                .ok_or_else(|| Error::UnknownStop(row.from_stop_id.clone()))?;
            let to_stop_idx = *self
                .stop_lookup
                .get(row.to_stop_id.as_str())
                .ok_or_else(|| Error::UnknownStop(row.to_stop_id.clone()))?;
            let min_transfer_time =
                Duration::from_seconds(row.min_transfer_time.unwrap_or(DEFAULT_TRANSFER_SECONDS));
            stop_to_transfers[from_stop_idx as usize].push(transfers.len() as u32);
            transfers.push(Transfer {
                from_stop_idx,
                to_stop_idx,
                min_transfer_time,
            });
        }

        self.transfers = transfers.into();
        self.stop_to_transfers = stop_to_transfers.into_iter().map(Into::into).collect();

        debug!(
            "Loading {} transfers took {:?}",
            self.transfers.len(),
            now.elapsed()
        );
        Ok(())
    }

    /// Splits each [`Route`] into one or more [`Pattern`]s, one per distinct
    /// stop sequence among its trips, since every trip in a pattern must
    /// share the exact same stops. Trips within a
    /// pattern are kept sorted by departure time from the first stop, as
    /// the round explorer's earliest-boardable-trip scan assumes.
    fn generate_patterns(&mut self) {
        debug!("Generating patterns...");
        let now = Instant::now();

        let mut per_route: Vec<HashMap<Vec<u32>, Vec<u32>>> =
            vec![HashMap::new(); self.routes.len()];
        for trip in self.trips.iter() {
            let stop_times = self.stop_times_by_trip_idx(trip.index);
            let signature: Vec<u32> = stop_times.iter().map(|st| st.stop_idx).collect();
            per_route[trip.route_idx as usize]
                .entry(signature)
                .or_default()
                .push(trip.index);
        }

        let mut patterns: Vec<Pattern> = Vec::new();
        let mut stop_to_patterns: Vec<Vec<u32>> = vec![Vec::new(); self.stops.len()];
        let mut trip_to_pattern: Vec<u32> = vec![u32::MAX; self.trips.len()];

        for (route_idx, groups) in per_route.into_iter().enumerate() {
            let mut groups: Vec<(Vec<u32>, Vec<u32>)> = groups.into_iter().collect();
            // HashMap iteration order is unspecified; sort by signature so
            // pattern indices are assigned deterministically across runs.
            groups.sort_by(|a, b| a.0.cmp(&b.0));

            for (signature, mut trip_indices) in groups {
                trip_indices.sort_by_key(|trip_idx| self.trip_departure(*trip_idx, 0));

                let pattern_idx = patterns.len() as u32;
                for stop_idx in signature.iter() {
                    stop_to_patterns[*stop_idx as usize].push(pattern_idx);
                }

                let mut services_active: Vec<u32> = trip_indices
                    .iter()
                    .map(|trip_idx| self.trips[*trip_idx as usize].service_idx)
                    .collect();
                services_active.sort_unstable();
                services_active.dedup();

                for trip_idx in trip_indices.iter() {
                    trip_to_pattern[*trip_idx as usize] = pattern_idx;
                }

                patterns.push(Pattern {
                    index: pattern_idx,
                    route_idx: route_idx as u32,
                    stops: signature.into(),
                    trips: trip_indices.into(),
                    services_active: services_active.into(),
                });
            }
        }

        for trip in self.trips.iter_mut() {
            trip.pattern_idx = trip_to_pattern[trip.index as usize];
        }
        self.patterns = patterns.into();
        self.stop_to_patterns = stop_to_patterns.into_iter().map(Into::into).collect();
        self.trip_to_pattern = trip_to_pattern.into();

        debug!(
            "Generating {} patterns took {:?}",
            self.patterns.len(),
            now.elapsed()
        );
    }
}

fn weekday_bits(row: &GtfsCalendar) -> u8 {
    let days = [
        row.monday,
        row.tuesday,
        row.wednesday,
        row.thursday,
        row.friday,
        row.saturday,
        row.sunday,
    ];
    let mut bits = 0u8;
    for (i, value) in days.iter().enumerate() {
        if *value != 0 {
            bits |= 1 << i;
        }
    }
    bits
}

fn parse_date(value: &str) -> Result<u32, Error> {
    value.parse().map_err(|_| Error::InvalidDate(value.to_string()))
}

fn access_type(value: Option<u8>) -> StopAccessType {
    match value {
        Some(1) => StopAccessType::NoneAvailable,
        Some(2) => StopAccessType::AgencyArrange,
        Some(3) => StopAccessType::DriverArrange,
        _ => StopAccessType::Regularly,
    }
}
