//! Scoring formulas: pure functions from a [`crate::model::Ctf`] and a set
//! of parameters to a [`crate::score::Scoreboard`].

mod atklab_v1;
mod atklab_v2;
mod ecsc2024;
mod ecsc2025;
mod jeopardy;
mod saarctf2024;
mod shared;

pub use atklab_v1::AtkLabV1;
pub use atklab_v2::{AtkLabV2, AttackerMode};
pub use ecsc2024::Ecsc2024;
pub use ecsc2025::Ecsc2025;
pub use jeopardy::JeopardyFormula;
pub use saarctf2024::SaarCtf2024;

use crate::error::FormulaError;
use crate::model::Ctf;
use crate::score::Scoreboard;

/// A scoring formula: a pure function from a [`Ctf`] to a [`Scoreboard`].
///
/// Implementations never mutate the `Ctf`; the same formula instance may be
/// evaluated against any number of `Ctf`s, including slices of one another.
pub trait ScoringFormula {
    fn evaluate(&self, ctf: &Ctf) -> Result<Scoreboard, FormulaError>;
}

pub(crate) fn resolve_nop<'a>(
    ctf: &'a Ctf,
    nop_team: &'a Option<crate::model::TeamName>,
) -> Result<Option<&'a crate::model::TeamName>, crate::error::ConfigError> {
    match nop_team {
        None => Ok(None),
        Some(name) => {
            if ctf.teams().iter().any(|t| t == name) {
                Ok(Some(name))
            } else {
                Err(crate::error::ConfigError::UnknownNopTeam(name.to_string()))
            }
        }
    }
}
