//! An offline replay engine for Attack/Defense CTF game logs: given a
//! recorded game (service states, stored flags, captures, round by round),
//! replays it through any of several historical scoring formulas and
//! produces a per-team scoreboard.
//!
//! The crate is organized around five pieces:
//!
//! - [`model`] — the normalized, immutable in-memory game ([`model::Ctf`]).
//! - [`estimator`] — derives per-round flag availability from service
//!   states when a game log doesn't carry it explicitly.
//! - [`score`] — the [`score::Score`]/[`score::Scoreboard`] algebra every
//!   formula accumulates into.
//! - [`formulas`] — the scoring formulas themselves
//!   ([`formulas::AtkLabV1`], [`formulas::AtkLabV2`],
//!   [`formulas::SaarCtf2024`], [`formulas::Ecsc2025`],
//!   [`formulas::Ecsc2024`]), all implementing [`formulas::ScoringFormula`].
//! - [`registry`] — discovering which formulas and data sources a build
//!   supports, and their JSON-Schema-described parameters.
//!
//! [`codec::from_canonical_json`] decodes the canonical wire format into a
//! [`model::Ctf`]; [`error`] holds the typed error outcomes every fallible
//! entry point returns instead of panicking.

pub mod codec;
pub mod error;
pub mod estimator;
pub mod formulas;
pub mod ids;
pub mod model;
pub mod registry;
pub mod score;

#[cfg(test)]
mod proptests;
