//! The in-memory game model: services, teams, rounds, flags and their
//! derived indices.

mod config;
mod ctf;
mod flags;
mod service;
mod states;
mod team_round;

pub use crate::ids::{ServiceName, TeamName};
pub use config::Config;
pub(crate) use config::ConfigWire;
pub use ctf::{Ctf, RoundData};
pub use flags::{FlagCaptures, FlagInfo};
pub use service::Service;
pub use states::{FlagState, ServiceState};
pub use team_round::TeamRoundData;
