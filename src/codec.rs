//! Decoding the canonical JSON input format (spec §6) into a [`crate::model::Ctf`].
//!
//! Upstream scoreboard converters and CLI front-ends are out of scope; this
//! module only understands the one canonical shape. Every nested object uses
//! `#[serde(deny_unknown_fields)]` so a typo in the input surfaces as a
//! decode error rather than silently doing nothing.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::InputDecodeError;
use crate::ids::{FlagId, ServiceName, TeamName};
use crate::model::{Config, ConfigWire, Ctf, FlagState, RoundData, Service, TeamRoundData};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CtfWire {
    services: IndexMap<ServiceName, Service>,
    teams: Vec<TeamName>,
    rounds: Vec<RoundData>,
    config: ConfigWire,
    #[serde(default)]
    flag_states: Option<Vec<IndexMap<FlagId, FlagState>>>,
}

/// Parses the canonical JSON format into a validated [`Ctf`].
pub fn from_canonical_json(input: &str) -> Result<Ctf, InputDecodeError> {
    let wire: CtfWire = serde_json::from_str(input)?;
    let config = Config::from_wire(wire.config)?;
    let ctf = Ctf::new(
        wire.services,
        wire.teams,
        wire.rounds,
        config,
        wire.flag_states,
    )?;
    Ok(ctf)
}
