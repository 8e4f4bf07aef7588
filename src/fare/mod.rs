pub mod allowance;
pub mod bogota;
pub mod boston;
pub mod chicago_rta;
pub mod fares_v2;
pub mod mixed_agency;
pub mod nyc;
pub mod standard;

pub use allowance::TransferAllowance;

use crate::shared::time::Time;
use crate::transit_data::{Route, Stop};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed static fare data: {0}")]
    MalformedStaticData(String),
    #[error("inconsistent in-routing state: {0}")]
    InconsistentState(String),
    #[error("fare not found for this ride")]
    FareNotFound,
    #[error("mismatched allowance types offered to the same dominating list")]
    MismatchedAllowanceTypes,
}

/// Everything a calculator needs to price one additional ride appended to an
/// in-progress journey. Built by the round explorer from the candidate
/// [`crate::raptor::label::McLabel`] before it is offered to a stop's
/// [`crate::raptor::pareto::ParetoList`].
pub struct RideContext<'a> {
    pub route: &'a Route,
    pub board_stop: &'a Stop,
    pub alight_stop: &'a Stop,
    pub board_time: Time,
    pub alight_time: Time,
    pub previous_fare: i64,
    pub previous_allowance: &'a TransferAllowance,
}

#[derive(Debug, Clone)]
pub struct FareResult {
    pub cumulative_fare: i64,
    pub transfer_allowance: TransferAllowance,
}

/// `calculate_fare(label, max_clock_time) -> (cumulative_fare, transfer_allowance)`.
///
/// Implementations must be deterministic given the same ride sequence, must
/// never return a fare lower than `ride.previous_fare`, and must tighten the
/// returned allowance's expiration via
/// [`TransferAllowance::tighten_expiration`] before returning it.
pub trait FareCalculator: Send + Sync {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error>;

    /// The allowance a journey starts with before any ride has been taken.
    fn initial_allowance(&self) -> TransferAllowance {
        TransferAllowance::None
    }
}

/// Tagged by `type`, matching the `in_routing_fare_calculator` config shape.
/// Consumed once at search setup to build a boxed [`FareCalculator`], never
/// re-read per label.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FareCalculatorConfig {
    Boston(boston::BostonConfig),
    Nyc(nyc::NycConfig),
    Bogota(bogota::BogotaConfig),
    #[serde(rename = "bogota-mixed")]
    BogotaMixed(mixed_agency::MixedAgencyConfig),
    #[serde(rename = "chicago-rta")]
    ChicagoRta(chicago_rta::ChicagoRtaConfig),
    #[serde(rename = "mixed-system")]
    MixedSystem(mixed_agency::MixedAgencyConfig),
    #[serde(rename = "fares-v2")]
    FaresV2(fares_v2::FaresV2Config),
    Simple(standard::StandardConfig),
}

impl FareCalculatorConfig {
    /// Builds the concrete calculator this configuration selects. Fails
    /// fast with [`Error::MalformedStaticData`] if the referenced static
    /// tables don't load.
    pub fn build(&self) -> Result<Box<dyn FareCalculator>, Error> {
        Ok(match self {
            FareCalculatorConfig::Boston(c) => Box::new(boston::BostonCalculator::new(c.clone())),
            FareCalculatorConfig::Nyc(c) => Box::new(nyc::NycCalculator::new(c.clone())?),
            FareCalculatorConfig::Bogota(c) => Box::new(bogota::BogotaCalculator::new(c.clone())),
            FareCalculatorConfig::BogotaMixed(c) | FareCalculatorConfig::MixedSystem(c) => {
                Box::new(mixed_agency::MixedAgencyCalculator::new(c.clone()))
            }
            FareCalculatorConfig::ChicagoRta(c) => {
                Box::new(chicago_rta::ChicagoRtaCalculator::new(c.clone()))
            }
            FareCalculatorConfig::FaresV2(c) => {
                Box::new(fares_v2::FaresV2Calculator::new(c.clone())?)
            }
            FareCalculatorConfig::Simple(c) => {
                Box::new(standard::StandardCalculator::new(c.clone()))
            }
        })
    }
}
