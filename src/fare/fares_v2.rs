use serde::Deserialize;
use std::sync::Arc;

use crate::fare::allowance::{AllowanceBase, FaresV2Allowance, PotentialTransferRule, TransferAllowance};
use crate::fare::{Error, FareCalculator, FareResult, RideContext};
use crate::shared::time::{self, Time};

/// One `fare_leg_rules.txt` row: prices a single leg matching a
/// `(network, from_area, to_area)` triple (wildcards as `None`).
#[derive(Debug, Clone, Deserialize)]
pub struct FareLegRule {
    pub leg_group_id: String,
    pub network_id: Option<String>,
    pub from_area: Option<String>,
    pub to_area: Option<String>,
    pub amount: i64,
}

/// One `fare_transfer_rules.txt` row: overrides the fare of a leg following
/// a leg in `from_leg_group` with one in `to_leg_group`, within
/// `duration_limit_seconds` if set.
#[derive(Debug, Clone, Deserialize)]
pub struct FareTransferRule {
    pub from_leg_group_id: String,
    pub to_leg_group_id: String,
    pub amount: i64,
    pub duration_limit_seconds: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaresV2Config {
    pub leg_rules: Vec<FareLegRule>,
    pub transfer_rules: Vec<FareTransferRule>,
    pub default_leg_amount: i64,
}

/// GTFS Fares-V2: `fare_leg_rules` and `fare_transfer_rules` joined on
/// from/to leg-group identifiers. The allowance carries the set of
/// transfer-rule indices that could still fire on the next leg as a sparse
/// list rather than a dense bitset, since candidate counts are small
/// relative to the full rule table.
pub struct FaresV2Calculator {
    config: FaresV2Config,
}

fn field_matches(rule_field: Option<&str>, ride_field: Option<&str>) -> bool {
    match rule_field {
        None => true,
        Some(rule_value) => ride_field == Some(rule_value),
    }
}

impl FaresV2Calculator {
    pub fn new(config: FaresV2Config) -> Result<Self, Error> {
        if config.leg_rules.is_empty() {
            return Err(Error::MalformedStaticData(
                "fares-v2 calculator requires at least one fare_leg_rules entry".into(),
            ));
        }
        Ok(Self { config })
    }

    fn matching_leg_rule(&self, ride: &RideContext) -> Option<(usize, &FareLegRule)> {
        self.config
            .leg_rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| {
                rule.network_id.as_deref().is_none_or(|n| n == &*ride.route.agency_id)
                    && field_matches(rule.from_area.as_deref(), ride.board_stop.fare_zone.as_deref())
                    && field_matches(rule.to_area.as_deref(), ride.alight_stop.fare_zone.as_deref())
            })
            .max_by_key(|(_, rule)| {
                rule.network_id.is_some() as u8 + rule.from_area.is_some() as u8 + rule.to_area.is_some() as u8
            })
    }

    fn transfer_rules_from(&self, leg_group_id: &str, alight_time: Time) -> Vec<PotentialTransferRule> {
        self.config
            .transfer_rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.from_leg_group_id == leg_group_id)
            .map(|(i, rule)| {
                let window_end = match rule.duration_limit_seconds {
                    Some(limit) => alight_time + time::Duration::from_seconds(limit),
                    None => time::MAX,
                };
                PotentialTransferRule {
                    rule_idx: i as u32,
                    window_end,
                }
            })
            .collect()
    }
}

impl FareCalculator for FaresV2Calculator {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error> {
        let (_, leg_rule) = self
            .matching_leg_rule(ride)
            .ok_or(Error::FareNotFound)?;

        let previous = match ride.previous_allowance {
            TransferAllowance::None => None,
            TransferAllowance::FaresV2(a) => Some(a),
            _ => return Err(Error::MismatchedAllowanceTypes),
        };

        let applicable_transfer = previous.and_then(|prev| {
            prev.potential_transfer_rules.iter().find_map(|candidate| {
                let rule = &self.config.transfer_rules[candidate.rule_idx as usize];
                if rule.to_leg_group_id != leg_rule.leg_group_id {
                    return None;
                }
                if ride.board_time > candidate.window_end {
                    return None;
                }
                Some(rule.amount)
            })
        });

        let fare = applicable_transfer.unwrap_or(leg_rule.amount);
        let cumulative_fare = ride.previous_fare + fare;

        let potential_transfer_rules: Arc<[PotentialTransferRule]> =
            self.transfer_rules_from(&leg_rule.leg_group_id, ride.alight_time).into();
        let expiration_time = potential_transfer_rules
            .iter()
            .map(|r| r.window_end)
            .max()
            .unwrap_or(ride.alight_time);

        let allowance = FaresV2Allowance {
            base: AllowanceBase {
                value: fare,
                count: 1,
                expiration_time,
            },
            potential_transfer_rules,
            as_route_networks: Arc::from([]),
            as_route_board_stop: None,
            potential_as_route_leg_rules: Arc::from([]),
        };

        Ok(FareResult {
            cumulative_fare,
            transfer_allowance: TransferAllowance::FaresV2(allowance).tighten_expiration(max_clock_time),
        })
    }
}
