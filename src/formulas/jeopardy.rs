//! Decay functions mapping a solve count to a per-flag point value.
//!
//! The source implementation selected one of these via an enum whose
//! members wrapped closures; that doesn't carry over; instead each variant's
//! parameter requirements (`alpha`/`beta` required, forbidden, or optional
//! with a default) are checked explicitly in [`JeopardyFormula::validate`]
//! before [`JeopardyFormula::evaluate`] ever runs.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::ParameterError;

/// A choice of jeopardy-style point decay curve, as used by ATKLABv2.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, JsonSchema)]
pub enum JeopardyFormula {
    /// Fixed-team-count exponential decay, as used at DHM. `alpha` optional
    /// (default 0.705), `beta` must be unset.
    #[serde(rename = "DHM")]
    Dhm,
    /// Decaying formula used by e.g. 34C3 CTF and CSCG. `alpha` optional
    /// (default 1.206069), `beta` optional (default 11.92201).
    #[serde(rename = "CSCG")]
    Cscg,
    /// Decaying formula used by e.g. hxp CTF. `alpha` optional (default 10),
    /// `beta` optional (default 9).
    #[serde(rename = "hxp")]
    Hxp,
    /// Decaying formula used by ECSC2025. Takes no parameters.
    #[serde(rename = "ECSC2025")]
    Ecsc2025,
}

impl JeopardyFormula {
    fn name(self) -> &'static str {
        match self {
            JeopardyFormula::Dhm => "DHM",
            JeopardyFormula::Cscg => "CSCG",
            JeopardyFormula::Hxp => "hxp",
            JeopardyFormula::Ecsc2025 => "ECSC2025",
        }
    }

    /// Checks that `alpha`/`beta` match what this variant expects, ahead of
    /// evaluation, so a formula run fails fast with a precise reason.
    pub fn validate(self, alpha: Option<f64>, beta: Option<f64>) -> Result<(), ParameterError> {
        match self {
            JeopardyFormula::Dhm => {
                if beta.is_some() {
                    return Err(ParameterError::Forbidden {
                        parameter: "beta",
                        formula: self.name(),
                    });
                }
            }
            JeopardyFormula::Ecsc2025 => {
                if alpha.is_some() {
                    return Err(ParameterError::Forbidden {
                        parameter: "alpha",
                        formula: self.name(),
                    });
                }
                if beta.is_some() {
                    return Err(ParameterError::Forbidden {
                        parameter: "beta",
                        formula: self.name(),
                    });
                }
            }
            JeopardyFormula::Cscg | JeopardyFormula::Hxp => {}
        }
        Ok(())
    }

    /// Evaluates the decay curve. `solves` is a float because callers
    /// sometimes interpolate fractional attacker counts; `teams` is the
    /// total team count, used only by `DHM`.
    pub fn evaluate(
        self,
        solves: f64,
        teams: usize,
        alpha: Option<f64>,
        beta: Option<f64>,
        min_score: f64,
        max_score: f64,
    ) -> f64 {
        let teams = teams as f64;
        match self {
            JeopardyFormula::Dhm => {
                let alpha = alpha.unwrap_or(0.705);
                let exponent = ((solves - 1.0).max(0.0) / (teams - 1.0).max(1.0)).powf(alpha);
                max_score * (min_score / max_score).powf(exponent)
            }
            JeopardyFormula::Cscg => {
                let alpha = alpha.unwrap_or(1.206069);
                let beta = beta.unwrap_or(11.92201);
                min_score
                    + (max_score - min_score) / (1.0 + ((solves - 1.0).max(0.0) / beta).powf(alpha))
            }
            JeopardyFormula::Hxp => {
                let alpha = alpha.unwrap_or(10.0);
                let beta = beta.unwrap_or(9.0);
                max_score * (alpha / (beta + solves)).min(1.0)
            }
            JeopardyFormula::Ecsc2025 => {
                let _ = min_score;
                let ratio = 30.0 / (29.0 + solves.max(1.0));
                (max_score * ratio.powi(3)).floor()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dhm_rejects_beta() {
        assert!(JeopardyFormula::Dhm.validate(None, Some(1.0)).is_err());
        assert!(JeopardyFormula::Dhm.validate(Some(0.5), None).is_ok());
    }

    #[test]
    fn ecsc2025_rejects_any_parameter() {
        assert!(JeopardyFormula::Ecsc2025.validate(Some(1.0), None).is_err());
        assert!(JeopardyFormula::Ecsc2025.validate(None, None).is_ok());
    }

    #[test]
    fn ecsc2025_matches_closed_form() {
        // base=10, solves=2 -> floor(10 * (30/31)^3)
        let value = JeopardyFormula::Ecsc2025.evaluate(2.0, 10, None, None, 1.0, 10.0);
        let expected = (10.0 * (30.0_f64 / 31.0).powi(3)).floor();
        assert_eq!(value, expected);
    }

    #[test]
    fn dhm_zero_solves_gives_max_score() {
        let value = JeopardyFormula::Dhm.evaluate(0.0, 5, None, None, 1.0, 10.0);
        assert_eq!(value, 10.0);
    }
}
