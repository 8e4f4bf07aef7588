pub mod lirr;
pub mod metro_north;

use serde::Deserialize;
use std::sync::Arc;

use crate::fare::allowance::{
    AllowanceBase, CommuterRailAllowance, MetroCardAllowance, MetroCardState, NycAllowance,
    TransferAllowance,
};
use crate::fare::nyc::lirr::LirrTables;
use crate::fare::nyc::metro_north::MetroNorthTables;
use crate::fare::{Error, FareCalculator, FareResult, RideContext};
use crate::shared::time::{Duration, Time};

#[derive(Debug, Clone, Deserialize)]
pub struct NycConfig {
    pub lirr_agency_id: String,
    pub metro_north_agency_id: String,
    pub staten_island_railway_agency_id: String,
    pub staten_island_ferry_agency_id: String,
    pub nice_bus_routes: Vec<String>,
    pub suffolk_bus_routes: Vec<String>,
    pub express_bus_routes: Vec<String>,
    pub subway_fare: i64,
    pub local_bus_fare: i64,
    pub express_bus_fare: i64,
    pub metrocard_transfer_window_seconds: u32,
    /// `(start_seconds_of_day, end_seconds_of_day)` windows during which
    /// commuter-rail peak pricing applies.
    pub peak_windows: Vec<(u32, u32)>,
    /// How long a board/alight pair on the same commuter-rail ticket can be
    /// extended (rather than closed and re-started) via a via-fare lookup.
    pub commuter_rail_continuation_seconds: u32,
    pub lirr: LirrTables,
    pub metro_north: MetroNorthTables,
}

/// The vehicle mode a ride falls into for MetroCard transfer-rule purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardMode {
    LocalBus,
    ExpressBus,
    Subway,
    Nice,
    Suffolk,
    StatenIslandRwy,
    StatenIslandFerry,
}

/// Composite NYC calculator: LIRR and Metro-North each carry an independent
/// in-progress-ticket state, and MetroCard rides (subway, local/express bus,
/// Nice, Suffolk, SIR, SI Ferry) share a third, mutually exclusive state.
/// Riding one mode never disturbs the carried state of the other two, which
/// is why [`NycAllowance`] holds all three fields rather than picking one.
pub struct NycCalculator {
    config: NycConfig,
}

impl NycCalculator {
    pub fn new(config: NycConfig) -> Result<Self, Error> {
        if config.lirr.stop_fare_zones.is_empty() {
            return Err(Error::MalformedStaticData(
                "nyc calculator requires at least one LIRR fare zone".into(),
            ));
        }
        Ok(Self { config })
    }

    fn is_peak(&self, t: Time) -> bool {
        self.config
            .peak_windows
            .iter()
            .any(|(start, end)| t.as_seconds() >= *start && t.as_seconds() < *end)
    }

    fn card_mode(&self, ride: &RideContext) -> Option<CardMode> {
        let agency = &*ride.route.agency_id;
        let route_id = &*ride.route.id;
        if agency.eq_ignore_ascii_case(&self.config.staten_island_railway_agency_id) {
            return Some(CardMode::StatenIslandRwy);
        }
        if agency.eq_ignore_ascii_case(&self.config.staten_island_ferry_agency_id) {
            return Some(CardMode::StatenIslandFerry);
        }
        if self.config.nice_bus_routes.iter().any(|r| r == route_id) {
            return Some(CardMode::Nice);
        }
        if self.config.suffolk_bus_routes.iter().any(|r| r == route_id) {
            return Some(CardMode::Suffolk);
        }
        if self.config.express_bus_routes.iter().any(|r| r == route_id) {
            return Some(CardMode::ExpressBus);
        }
        match ride.route.route_type {
            1 | 0 => Some(CardMode::Subway),
            3 => Some(CardMode::LocalBus),
            _ => None,
        }
    }

    fn base_card_state(mode: CardMode) -> MetroCardState {
        match mode {
            CardMode::LocalBus => MetroCardState::LocalBus,
            CardMode::ExpressBus => MetroCardState::ExpressBus,
            CardMode::Subway => MetroCardState::Subway,
            CardMode::Nice => MetroCardState::Nice,
            CardMode::Suffolk => MetroCardState::Suffolk,
            CardMode::StatenIslandRwy => MetroCardState::StatenIslandRwy,
            CardMode::StatenIslandFerry => MetroCardState::LocalBusToSiFerry,
        }
    }

    fn card_fare(&self, mode: CardMode) -> i64 {
        match mode {
            CardMode::LocalBus | CardMode::Nice | CardMode::Suffolk => self.config.local_bus_fare,
            CardMode::ExpressBus => self.config.express_bus_fare,
            CardMode::Subway | CardMode::StatenIslandRwy => self.config.subway_fare,
            CardMode::StatenIslandFerry => 0,
        }
    }

    /// Free-transfer transition table for the 13 enumerated MetroCard
    /// states. Combinations with no explicit free transfer fall back to a
    /// fresh paid ride in the boarded mode's base state.
    fn card_transition(
        prev: MetroCardState,
        mode: CardMode,
    ) -> (bool, MetroCardState) {
        use CardMode::*;
        use MetroCardState as S;
        match (prev, mode) {
            (S::LocalBus, Subway) => (true, S::Subway),
            (S::Subway, LocalBus) => (true, S::LocalBus),
            (S::LocalBus, LocalBus) => (true, S::LocalBus),
            (S::Subway, Subway) => (true, S::Subway),
            (S::Nice, Subway) | (S::Subway, Nice) => (true, S::NiceOneTransfer),
            (S::Nice, LocalBus) | (S::LocalBus, Nice) => (true, S::NiceOneTransfer),
            (S::Suffolk, Subway) | (S::Subway, Suffolk) => (true, S::SuffolkOneTransfer),
            (S::Suffolk, LocalBus) | (S::LocalBus, Suffolk) => (true, S::SuffolkOneTransfer),
            (S::LocalBus, StatenIslandFerry) => (true, S::LocalBusToSiFerry),
            (S::Subway, StatenIslandFerry) => (true, S::SubwayToSiFerry),
            (S::LocalBus, StatenIslandRwy) => (true, S::LocalBusToSir),
            (S::LocalBusToSiFerry, StatenIslandRwy) => (true, S::LocalBusToSirToSiFerry),
            (S::LocalBusToSir, StatenIslandFerry) => (true, S::LocalBusToSirToSiFerry),
            (S::SubwayToSiFerry, StatenIslandRwy) => (true, S::LocalBusOrSubwayToSiFerryToSir),
            (S::StatenIslandRwy, LocalBus) => (true, S::LocalBus),
            (S::StatenIslandRwy, Subway) => (true, S::Subway),
            (S::LocalBusToSirToSiFerry, _)
            | (S::LocalBusOrSubwayToSiFerryToSir, _)
            | (S::NiceOneTransfer, _)
            | (S::SuffolkOneTransfer, _) => (false, Self::base_card_state(mode)),
            _ => (false, Self::base_card_state(mode)),
        }
    }

    fn metrocard_fare(
        &self,
        ride: &RideContext,
        prev: Option<MetroCardAllowance>,
        mode: CardMode,
        max_clock_time: Time,
    ) -> (i64, MetroCardAllowance) {
        let full_fare = self.card_fare(mode);
        let (free, next_state) = match prev {
            Some(p) if ride.board_time <= p.expiry => Self::card_transition(p.transfer_source, mode),
            _ => (false, Self::base_card_state(mode)),
        };
        let fare = if free { 0 } else { full_fare };
        let expiry = (ride.alight_time
            + Duration::from_seconds(self.config.metrocard_transfer_window_seconds))
        .min(max_clock_time);
        (
            fare,
            MetroCardAllowance {
                base: AllowanceBase {
                    value: full_fare,
                    count: 1,
                    expiration_time: expiry,
                },
                transfer_source: next_state,
                expiry,
            },
        )
    }

    fn commuter_rail_fare(
        &self,
        prev: Option<&CommuterRailAllowance>,
        board_stop_id: Arc<str>,
        alight_stop_id: Arc<str>,
        board_time: Time,
        alight_time: Time,
        direction_outbound: bool,
        peak: bool,
        table_fare: impl Fn(&str, &str, bool) -> Result<i64, Error>,
        via_fare: Option<&dyn Fn(&str, &str, &str, bool) -> Result<i64, Error>>,
    ) -> Result<(i64, CommuterRailAllowance), Error> {
        let continuation_ok = prev.is_some_and(|p| {
            p.alight_stop == board_stop_id
                && p.initial_direction == direction_outbound
                && board_time.as_seconds()
                    <= p.most_recent_ticket_time.as_seconds()
                        + self.config.commuter_rail_continuation_seconds
        });

        if continuation_ok {
            let p = prev.unwrap();
            let new_total = if let Some(via) = via_fare {
                via(&p.board_stop, &alight_stop_id, &p.alight_stop, peak)?
            } else {
                table_fare(&p.board_stop, &alight_stop_id, peak)?
            };
            let delta = (new_total - p.cumulative_fare).max(0);
            let allowance = CommuterRailAllowance {
                board_stop: p.board_stop.clone(),
                via_stop: Some(p.alight_stop.clone()),
                alight_stop: alight_stop_id,
                initial_direction: p.initial_direction,
                peak_before: p.peak_before,
                peak_after: peak,
                cumulative_fare: new_total,
                most_recent_ticket_time: alight_time,
            };
            return Ok((delta, allowance));
        }

        let fare = table_fare(&board_stop_id, &alight_stop_id, peak)?;
        let allowance = CommuterRailAllowance {
            board_stop: board_stop_id,
            via_stop: None,
            alight_stop: alight_stop_id,
            initial_direction: direction_outbound,
            peak_before: peak,
            peak_after: peak,
            cumulative_fare: fare,
            most_recent_ticket_time: alight_time,
        };
        Ok((fare, allowance))
    }
}

impl FareCalculator for NycCalculator {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error> {
        let mut state = match ride.previous_allowance {
            TransferAllowance::None => NycAllowance::default(),
            TransferAllowance::Nyc(a) => a.clone(),
            _ => return Err(Error::MismatchedAllowanceTypes),
        };

        let agency = &*ride.route.agency_id;
        let fare = if agency.eq_ignore_ascii_case(&self.config.lirr_agency_id) {
            let peak = self.is_peak(ride.board_time);
            // LIRR travels outbound when the board stop sits further from
            // Penn/Grand Central than the alight stop in the zone ordering;
            // approximated here by zone-string comparison since the zone
            // identifiers increase with distance from Manhattan.
            let direction_outbound = self.config.lirr.zone_of(&ride.board_stop.id)?
                <= self.config.lirr.zone_of(&ride.alight_stop.id)?;
            let lirr_tables = &self.config.lirr;
            let (delta, allowance) = self.commuter_rail_fare(
                state.lirr.as_ref(),
                ride.board_stop.id.clone(),
                ride.alight_stop.id.clone(),
                ride.board_time,
                ride.alight_time,
                direction_outbound,
                peak,
                |from, to, peak| lirr_tables.direct_fare(from, to, peak),
                Some(&|from, to, via, peak| lirr_tables.via_fare(from, to, via, peak)),
            )?;
            state.lirr = Some(allowance);
            delta
        } else if agency.eq_ignore_ascii_case(&self.config.metro_north_agency_id) {
            let peak = self.is_peak(ride.board_time);
            let direction_outbound = true;
            let mnr_tables = &self.config.metro_north;
            let (delta, allowance) = self.commuter_rail_fare(
                state.metro_north.as_ref(),
                ride.board_stop.id.clone(),
                ride.alight_stop.id.clone(),
                ride.board_time,
                ride.alight_time,
                direction_outbound,
                peak,
                |from, to, peak| mnr_tables.fare(from, to, peak),
                None,
            )?;
            state.metro_north = Some(allowance);
            delta
        } else {
            let mode = self
                .card_mode(ride)
                .ok_or_else(|| Error::MalformedStaticData(format!("unrecognized NYC route {}", ride.route.id)))?;
            let (delta, allowance) = self.metrocard_fare(ride, state.metrocard, mode, max_clock_time);
            state.metrocard = Some(allowance);
            state.in_subway_paid_area = mode == CardMode::Subway;
            delta
        };

        Ok(FareResult {
            cumulative_fare: ride.previous_fare + fare,
            transfer_allowance: TransferAllowance::Nyc(state).tighten_expiration(max_clock_time),
        })
    }

    fn initial_allowance(&self) -> TransferAllowance {
        TransferAllowance::Nyc(NycAllowance::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit_data::{Route, Stop};
    use std::collections::HashMap;

    fn config() -> NycConfig {
        let mut stop_fare_zones = HashMap::new();
        stop_fare_zones.insert("penn".to_string(), "1".to_string());
        stop_fare_zones.insert("jamaica".to_string(), "2".to_string());

        NycConfig {
            lirr_agency_id: "LI".to_string(),
            metro_north_agency_id: "MNR".to_string(),
            staten_island_railway_agency_id: "SIR".to_string(),
            staten_island_ferry_agency_id: "SIF".to_string(),
            nice_bus_routes: vec![],
            suffolk_bus_routes: vec![],
            express_bus_routes: vec![],
            subway_fare: 290,
            local_bus_fare: 290,
            express_bus_fare: 700,
            metrocard_transfer_window_seconds: 7200,
            peak_windows: vec![(6 * 3600, 10 * 3600)],
            commuter_rail_continuation_seconds: 3600,
            lirr: LirrTables {
                zonal_fares: vec![lirr::ZonalFare {
                    from_zone: "1".to_string(),
                    to_zone: "2".to_string(),
                    amount: 1025,
                    peak: false,
                }],
                via_fares: vec![],
                via_fare_overrides: vec![],
                stop_fare_zones,
                descendants: HashMap::new(),
            },
            metro_north: MetroNorthTables::default(),
        }
    }

    fn bus_route() -> Route {
        Route {
            id: "b1".into(),
            agency_id: "MTA Bus".into(),
            route_type: 3,
            ..Default::default()
        }
    }

    fn subway_route() -> Route {
        Route {
            id: "4".into(),
            agency_id: "NYCT Subway".into(),
            route_type: 1,
            ..Default::default()
        }
    }

    #[test]
    fn bus_then_subway_is_a_free_transfer() {
        let calc = NycCalculator::new(config()).unwrap();
        let stop = Stop::default();
        let t0 = Time::from_seconds(0);

        let r1 = calc
            .calculate_fare(
                &RideContext {
                    route: &bus_route(),
                    board_stop: &stop,
                    alight_stop: &stop,
                    board_time: t0,
                    alight_time: t0,
                    previous_fare: 0,
                    previous_allowance: &TransferAllowance::None,
                },
                Time::from_seconds(u32::MAX),
            )
            .unwrap();
        assert_eq!(r1.cumulative_fare, 290);

        let r2 = calc
            .calculate_fare(
                &RideContext {
                    route: &subway_route(),
                    board_stop: &stop,
                    alight_stop: &stop,
                    board_time: t0,
                    alight_time: t0,
                    previous_fare: r1.cumulative_fare,
                    previous_allowance: &r1.transfer_allowance,
                },
                Time::from_seconds(u32::MAX),
            )
            .unwrap();
        assert_eq!(r2.cumulative_fare, 290);
    }

    #[test]
    fn lirr_direct_ride_prices_from_zonal_table() {
        let calc = NycCalculator::new(config()).unwrap();
        let penn = Stop {
            id: "penn".into(),
            ..Default::default()
        };
        let jamaica = Stop {
            id: "jamaica".into(),
            ..Default::default()
        };
        let route = Route {
            id: "lirr1".into(),
            agency_id: "LI".into(),
            route_type: 2,
            ..Default::default()
        };
        let t = Time::from_seconds(12 * 3600);

        let r1 = calc
            .calculate_fare(
                &RideContext {
                    route: &route,
                    board_stop: &penn,
                    alight_stop: &jamaica,
                    board_time: t,
                    alight_time: t,
                    previous_fare: 0,
                    previous_allowance: &TransferAllowance::None,
                },
                Time::from_seconds(u32::MAX),
            )
            .unwrap();
        assert_eq!(r1.cumulative_fare, 1025);
    }
}
