use std::sync::Arc;

use serde::Deserialize;

use crate::fare::allowance::{AllowanceBase, TransferAllowance};
use crate::fare::{Error, FareCalculator, FareResult, RideContext};
use crate::shared::time::Time;

/// One `fare_rules.txt` row, already resolved to the calculator's owned
/// representation. `None` on a zone field is a wildcard.
#[derive(Debug, Clone)]
pub struct FareRule {
    pub route_id: Option<Arc<str>>,
    pub board_zone: Option<Arc<str>>,
    pub alight_zone: Option<Arc<str>>,
    pub price: i64,
    pub transfers: Option<u8>,
    pub transfer_duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FareRuleConfig {
    pub route_id: Option<String>,
    pub board_zone: Option<String>,
    pub alight_zone: Option<String>,
    pub price: i64,
    pub transfers: Option<u8>,
    pub transfer_duration_seconds: Option<u32>,
}

/// Configuration for [`StandardCalculator`]: a fare-rules table (normally
/// derived from `fare_rules.txt`/`fare_attributes.txt` at ingestion time) plus
/// a fallback fare for rides matching no rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandardConfig {
    #[serde(default)]
    pub rules: Vec<FareRuleConfig>,
    #[serde(default)]
    pub default_fare: i64,
}

/// Looks up `(route, board_zone, alight_zone)` in a fare-rules table, with
/// wildcards on either zone field and longest-match-wins, falling back to a
/// flat default fare. Transfer allowance is the plain `(value, count,
/// expiration)` triple carried by every fare attribute.
pub struct StandardCalculator {
    rules: Vec<FareRule>,
    default_fare: i64,
}

impl StandardCalculator {
    pub fn new(config: StandardConfig) -> Self {
        let rules = config
            .rules
            .into_iter()
            .map(|r| FareRule {
                route_id: r.route_id.map(Into::into),
                board_zone: r.board_zone.map(Into::into),
                alight_zone: r.alight_zone.map(Into::into),
                price: r.price,
                transfers: r.transfers,
                transfer_duration_seconds: r.transfer_duration_seconds,
            })
            .collect();
        Self {
            rules,
            default_fare: config.default_fare,
        }
    }

    /// Returns the most specific matching rule: a match on all three fields
    /// beats a match with one wildcard, which beats a match with two.
    fn best_match(&self, route_id: &str, board_zone: Option<&str>, alight_zone: Option<&str>) -> Option<&FareRule> {
        self.rules
            .iter()
            .filter(|rule| {
                rule.route_id.as_deref().is_none_or(|r| r == route_id)
                    && field_matches(rule.board_zone.as_deref(), board_zone)
                    && field_matches(rule.alight_zone.as_deref(), alight_zone)
            })
            .max_by_key(|rule| {
                rule.route_id.is_some() as u8
                    + rule.board_zone.is_some() as u8
                    + rule.alight_zone.is_some() as u8
            })
    }
}

fn field_matches(rule_field: Option<&str>, ride_field: Option<&str>) -> bool {
    match rule_field {
        None => true,
        Some(rule_value) => ride_field == Some(rule_value),
    }
}

impl FareCalculator for StandardCalculator {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error> {
        let rule = self.best_match(
            &ride.route.id,
            ride.board_stop.fare_zone.as_deref(),
            ride.alight_stop.fare_zone.as_deref(),
        );

        let (price, allowance) = match rule {
            Some(rule) => {
                let expiration = rule
                    .transfer_duration_seconds
                    .map(|secs| ride.alight_time + crate::shared::time::Duration::from_seconds(secs))
                    .unwrap_or(ride.alight_time);
                (
                    rule.price,
                    AllowanceBase {
                        value: rule.price,
                        count: rule.transfers.unwrap_or(0) as u32,
                        expiration_time: expiration,
                    },
                )
            }
            None => (
                self.default_fare,
                AllowanceBase::fresh(ride.alight_time),
            ),
        };

        let cumulative_fare = ride.previous_fare.max(price);
        Ok(FareResult {
            cumulative_fare,
            transfer_allowance: TransferAllowance::Standard(allowance)
                .tighten_expiration(max_clock_time),
        })
    }
}

/// Builds a [`StandardConfig`] from GTFS `fare_attributes.txt` +
/// `fare_rules.txt` rows, joined on `fare_id`. GTFS prices are decimal
/// currency amounts (e.g. dollars); the calculators work in integer minor
/// units, so prices are converted to cents by rounding `price * 100`.
pub fn standard_config_from_gtfs(
    data: &crate::gtfs::GtfsData,
    default_fare: i64,
) -> StandardConfig {
    let attributes: std::collections::HashMap<&str, &crate::gtfs::GtfsFareAttribute> = data
        .fare_attributes
        .iter()
        .map(|attr| (attr.fare_id.as_str(), attr))
        .collect();

    let rules = data
        .fare_rules
        .iter()
        .filter_map(|rule| {
            let attribute = attributes.get(rule.fare_id.as_str())?;
            Some(FareRuleConfig {
                route_id: rule.route_id.clone(),
                board_zone: rule.origin_id.clone(),
                alight_zone: rule.destination_id.clone(),
                price: (attribute.price * 100.0).round() as i64,
                transfers: attribute.transfers,
                transfer_duration_seconds: attribute.transfer_duration,
            })
        })
        .collect();

    StandardConfig {
        rules,
        default_fare,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(route: &str, board: &str, alight: &str, price: i64) -> FareRuleConfig {
        FareRuleConfig {
            route_id: Some(route.into()),
            board_zone: Some(board.into()),
            alight_zone: Some(alight.into()),
            price,
            transfers: Some(1),
            transfer_duration_seconds: Some(7200),
        }
    }

    #[test]
    fn most_specific_rule_wins() {
        let calc = StandardCalculator::new(StandardConfig {
            rules: vec![
                FareRuleConfig {
                    route_id: None,
                    board_zone: Some("1".into()),
                    alight_zone: None,
                    price: 100,
                    transfers: None,
                    transfer_duration_seconds: None,
                },
                rule("R1", "1", "2", 250),
            ],
            default_fare: 50,
        });
        let matched = calc.best_match("R1", Some("1"), Some("2")).unwrap();
        assert_eq!(matched.price, 250);
    }

    #[test]
    fn falls_back_to_default() {
        let calc = StandardCalculator::new(StandardConfig {
            rules: vec![],
            default_fare: 275,
        });
        assert!(calc.best_match("R1", None, None).is_none());
    }
}
