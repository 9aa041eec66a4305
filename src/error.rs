//! Typed error outcomes for the scoring playground.
//!
//! These are returned values, not panics: a formula that cannot evaluate a
//! given [`crate::model::Ctf`] (missing config field, unknown NOP team,
//! malformed jeopardy parameters) reports a typed reason and leaves the
//! `Ctf` reusable by other formulas.

use thiserror::Error;

/// A configured NOP team name does not appear in `teams`.
///
/// `flag_validity`/`flag_retention` are not modeled here: [`crate::model::Config`]
/// guarantees both are present (and positive) by construction, so "missing
/// required config field" for those two can only happen at decode time, where
/// it surfaces as [`InputDecodeError`] or [`ShapeError`] instead. See
/// DESIGN.md for the rationale.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("configured NOP team {0:?} is not present in the CTF's team list")]
    UnknownNopTeam(String),
}

/// A jeopardy formula parameter was supplied when the selected variant
/// forbids it, or omitted when the variant requires it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("parameter `{parameter}` is not used by jeopardy formula {formula} and must not be set")]
    Forbidden {
        parameter: &'static str,
        formula: &'static str,
    },

    #[error("parameter `{parameter}` is required by jeopardy formula {formula}")]
    Required {
        parameter: &'static str,
        formula: &'static str,
    },

    /// A [`crate::registry`] parameter blob failed to decode: unknown
    /// formula name, wrong JSON shape, or an unknown-field rejection.
    #[error("{0}")]
    Malformed(String),
}

/// A §3 invariant of the game model was violated by the input data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("flag {0} referenced by a capture or flag-state entry was never stored by any team")]
    DanglingFlagId(u32),

    #[error("flagstore {flagstore} referenced for service {service:?} is not declared on that service")]
    UnknownFlagstore { service: String, flagstore: u32 },

    #[error("rounds are not contiguous: expected {expected} round(s), found index gap at {found}")]
    NonContiguousRounds { expected: usize, found: usize },

    #[error("service {service:?} has {found} flagstore(s), but this formula requires exactly one")]
    WrongFlagstoreCount { service: String, found: usize },

    #[error("`flag_validity` must be >= 1, found {0}")]
    InvalidFlagValidity(i64),

    #[error("`flag_retention` must be >= 1, found {0}")]
    InvalidFlagRetention(i64),

    #[error("`flag_states` has {found} round(s) but `rounds` has {expected}")]
    FlagStatesLengthMismatch { expected: usize, found: usize },
}

/// Malformed JSON, or a type mismatch, while decoding the canonical input
/// format (spec §6). Only raised by [`crate::codec`].
#[derive(Error, Debug)]
pub enum InputDecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// The union of error kinds a [`crate::formulas::ScoringFormula`] can return.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}
