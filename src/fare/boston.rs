use serde::Deserialize;
use std::collections::HashMap;

use crate::fare::allowance::{AllowanceBase, BostonAllowance, TransferAllowance, TransferRuleGroup};
use crate::fare::{Error, FareCalculator, FareResult, RideContext};
use crate::shared::time::{Duration, Time};

/// One of the fare-id strings in `fare_attributes.txt` that the Boston
/// calculator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareCategory {
    LocalBus,
    Subway,
    InnerExpressBus,
    OuterExpressBus,
    SlAirport,
}

impl FareCategory {
    fn rule_group(self) -> TransferRuleGroup {
        match self {
            FareCategory::LocalBus => TransferRuleGroup::LocalBus,
            FareCategory::Subway => TransferRuleGroup::Subway,
            FareCategory::InnerExpressBus | FareCategory::OuterExpressBus => {
                TransferRuleGroup::ExpressBus
            }
            FareCategory::SlAirport => TransferRuleGroup::SlFree,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BostonConfig {
    pub local_bus_fare: i64,
    pub subway_fare: i64,
    pub inner_express_bus_fare: i64,
    pub outer_express_bus_fare: i64,
    pub transfer_window_seconds: u32,
    /// Maps a GTFS `fare_id` (from `fare_attributes.txt`, referenced by
    /// `fare_rules.txt`'s `route_id` join) to its Boston fare category.
    pub route_fare_ids: HashMap<String, String>,
    /// Stop-id pairs that are "behind the gates" connected even though they
    /// don't share a parent station (e.g. Downtown Crossing Red/Orange).
    pub connected_pairs: Vec<(String, String)>,
}

/// MBTA CharlieCard calculator: the hardest single-agency state machine in
/// the set. `rule_group` and `behind_gates` on the carried
/// [`BostonAllowance`] together encode which transfers are still free.
pub struct BostonCalculator {
    config: BostonConfig,
}

impl BostonCalculator {
    pub fn new(config: BostonConfig) -> Self {
        Self { config }
    }

    fn category(&self, fare_id: &str) -> Option<FareCategory> {
        match fare_id {
            "localBus" => Some(FareCategory::LocalBus),
            "subway" => Some(FareCategory::Subway),
            "innerExpressBus" => Some(FareCategory::InnerExpressBus),
            "outerExpressBus" => Some(FareCategory::OuterExpressBus),
            "slairport" => Some(FareCategory::SlAirport),
            _ => None,
        }
    }

    fn base_fare(&self, category: FareCategory) -> i64 {
        match category {
            FareCategory::LocalBus => self.config.local_bus_fare,
            FareCategory::Subway => self.config.subway_fare,
            FareCategory::InnerExpressBus => self.config.inner_express_bus_fare,
            FareCategory::OuterExpressBus => self.config.outer_express_bus_fare,
            FareCategory::SlAirport => 0,
        }
    }

    fn behind_gates_connected(&self, ride: &RideContext) -> bool {
        let from = &*ride.board_stop.id;
        if ride.board_stop.index == ride.alight_stop.index {
            return true;
        }
        if ride.board_stop.parent_index.is_some()
            && ride.board_stop.parent_index == ride.alight_stop.parent_index
        {
            return true;
        }
        self.config
            .connected_pairs
            .iter()
            .any(|(a, b)| (a == from || b == from) && (a == &*ride.alight_stop.id || b == &*ride.alight_stop.id))
    }
}

impl FareCalculator for BostonCalculator {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error> {
        let route_fare_id = self
            .config
            .route_fare_ids
            .get(&*ride.route.id)
            .ok_or_else(|| Error::MalformedStaticData(format!("no fare_id for route {}", ride.route.id)))?;
        let category = self
            .category(route_fare_id)
            .ok_or_else(|| Error::MalformedStaticData(format!("unknown fare_id {route_fare_id}")))?;

        let prev = match ride.previous_allowance {
            TransferAllowance::None => None,
            TransferAllowance::Boston(b) => Some(*b),
            _ => return Err(Error::MismatchedAllowanceTypes),
        };

        let within_window = prev
            .map(|p| ride.board_time <= p.base.expiration_time)
            .unwrap_or(false);

        let full_fare = self.base_fare(category);

        // Behind-gates suppression: two consecutive subway rides connected
        // without leaving the paid area cost nothing extra.
        if let Some(p) = prev
            && within_window
            && p.rule_group == TransferRuleGroup::Subway
            && category == FareCategory::Subway
            && self.behind_gates_connected(ride)
        {
            let allowance = BostonAllowance {
                base: p.base,
                rule_group: TransferRuleGroup::Subway,
                behind_gates: true,
            };
            return Ok(self.finish(ride, 0, allowance, max_clock_time));
        }

        let (fare, next_group) = match (prev.map(|p| p.rule_group), category) {
            (Some(TransferRuleGroup::LocalBus), FareCategory::Subway) if within_window => {
                let covered = prev.map(|p| p.base.value).unwrap_or(0);
                (
                    (full_fare - covered).max(0),
                    TransferRuleGroup::LocalBusToSubway,
                )
            }
            (Some(TransferRuleGroup::LocalBusToSubway), FareCategory::LocalBus) if within_window => {
                (0, TransferRuleGroup::Other)
            }
            (Some(TransferRuleGroup::Subway), FareCategory::LocalBus) if within_window => {
                (0, TransferRuleGroup::LocalBus)
            }
            (Some(TransferRuleGroup::LocalBus), FareCategory::LocalBus) if within_window => {
                (0, TransferRuleGroup::LocalBus)
            }
            _ => (full_fare, category.rule_group()),
        };

        let mut allowance = BostonAllowance {
            base: AllowanceBase {
                value: full_fare,
                count: 1,
                expiration_time: ride.alight_time
                    + Duration::from_seconds(self.config.transfer_window_seconds),
            },
            rule_group: next_group,
            // Subway and Silver Line airport rides both board inside the
            // faregated area; every other category taps out at a bus farebox.
            behind_gates: matches!(category, FareCategory::Subway | FareCategory::SlAirport),
        };

        // Subway-capped bonus: leaving the paid area with a lower-value
        // allowance still grants the free subway boarding riders get without
        // tapping out.
        if allowance.behind_gates && allowance.base.value < self.config.subway_fare {
            allowance.base.value = self.config.subway_fare;
        }

        Ok(self.finish(ride, fare, allowance, max_clock_time))
    }

    fn initial_allowance(&self) -> TransferAllowance {
        TransferAllowance::None
    }
}

impl BostonCalculator {
    fn finish(
        &self,
        ride: &RideContext,
        fare: i64,
        allowance: BostonAllowance,
        max_clock_time: Time,
    ) -> FareResult {
        FareResult {
            cumulative_fare: ride.previous_fare + fare,
            transfer_allowance: TransferAllowance::Boston(allowance).tighten_expiration(max_clock_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit_data::{Route, Stop};

    fn config() -> BostonConfig {
        let mut route_fare_ids = HashMap::new();
        route_fare_ids.insert("bus1".to_string(), "localBus".to_string());
        route_fare_ids.insert("red".to_string(), "subway".to_string());
        BostonConfig {
            local_bus_fare: 170,
            subway_fare: 290,
            inner_express_bus_fare: 400,
            outer_express_bus_fare: 700,
            transfer_window_seconds: 7200,
            route_fare_ids,
            connected_pairs: vec![],
        }
    }

    fn route(id: &str) -> Route {
        Route {
            id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn bus_subway_bus_costs_one_subway_fare() {
        let calc = BostonCalculator::new(config());
        let stop = Stop::default();
        let t0 = Time::from_seconds(0);

        let r1 = calc
            .calculate_fare(
                &RideContext {
                    route: &route("bus1"),
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
        assert_eq!(r1.cumulative_fare, 170);

        let r2 = calc
            .calculate_fare(
                &RideContext {
                    route: &route("red"),
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

        let r3 = calc
            .calculate_fare(
                &RideContext {
                    route: &route("bus1"),
                    board_stop: &stop,
                    alight_stop: &stop,
                    board_time: t0,
                    alight_time: t0,
                    previous_fare: r2.cumulative_fare,
                    previous_allowance: &r2.transfer_allowance,
                },
                Time::from_seconds(u32::MAX),
            )
            .unwrap();
        assert_eq!(r3.cumulative_fare, 290);
    }
}
