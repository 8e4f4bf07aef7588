//! `mc-raptor`: a multi-criteria Range-RAPTOR journey planner for GTFS transit
//! networks.
//!
//! Given a static GTFS feed and a pluggable in-routing fare calculator, finds
//! every Pareto-optimal itinerary between a set of access and egress stops
//! across (arrival time, number of rides, cumulative fare, transfer
//! allowance). Access/egress walking and geospatial stop lookup are left to
//! an external collaborator; this crate only knows about stops, not
//! coordinates.

pub mod fare;
pub mod gtfs;
pub mod raptor;
pub mod shared;
pub mod transit_data;
