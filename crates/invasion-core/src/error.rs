//! Error types for the simulation.

use crate::types::{AlienId, Direction};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no city details provided")]
    EmptyCityDeclaration,

    #[error("invalid directional key/value pair provided for city {city}: {pair:?}")]
    MalformedRoute { city: String, pair: String },

    #[error("invalid direction provided from city {city}: {direction:?}")]
    InvalidDirection { city: String, direction: String },

    #[error("city {origin} cannot route {direction} to {destination}: a conflicting road to {conflicting} already exists")]
    RouteConflict {
        origin: String,
        direction: Direction,
        destination: String,
        conflicting: String,
    },

    #[error("nowhere left to invade, all cities are occupied")]
    NoVacantCity,

    #[error("alien {0} has no reachable city")]
    NoReachableCity(AlienId),
}
