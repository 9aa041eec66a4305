use serde::{Deserialize, Serialize};

use crate::error::ShapeError;

/// CTF-wide configuration.
///
/// `flag_retention` defaults to `flag_validity` when the input omits it —
/// the fill-in happens once, in [`Config::from_wire`], rather than on every
/// read (see spec §9, "Default-field decorators computing defaults from
/// other fields").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rounds during which a captured flag scores.
    pub flag_validity: i64,
    /// Rounds during which a stored flag must remain retrievable.
    pub flag_retention: i64,
    /// Warnings to surface to the user channel, verbatim.
    pub messages: Vec<String>,
}

/// The raw shape of `config` on the wire (spec §6): `flag_retention` and
/// `messages` are optional there, but always present on a constructed
/// [`Config`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigWire {
    pub flag_validity: i64,
    #[serde(default)]
    pub flag_retention: Option<i64>,
    #[serde(default)]
    pub messages: Option<Vec<String>>,
}

impl Config {
    /// Fills in `flag_retention` and `messages` defaults and validates the
    /// positivity invariants from spec §3 (`flag_validity >= 1`,
    /// `flag_retention >= 1`).
    pub(crate) fn from_wire(wire: ConfigWire) -> Result<Self, ShapeError> {
        if wire.flag_validity < 1 {
            return Err(ShapeError::InvalidFlagValidity(wire.flag_validity));
        }
        let flag_retention = wire.flag_retention.unwrap_or(wire.flag_validity);
        if flag_retention < 1 {
            return Err(ShapeError::InvalidFlagRetention(flag_retention));
        }
        Ok(Config {
            flag_validity: wire.flag_validity,
            flag_retention,
            messages: wire.messages.unwrap_or_default(),
        })
    }
}
