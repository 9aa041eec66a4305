//! The score algebra: a combined number plus named category subscores, and
//! the scoreboard formulas produce from it.

use std::collections::HashMap;
use std::ops::{Add, Sub};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::TeamName;

/// A single team's score: one number teams are ranked by, plus an optional
/// breakdown into named categories (conventionally `"ATK"`, `"DEF"`,
/// `"SLA"`) that a scoreboard UI might render as columns.
///
/// Ordering only ever looks at `combined` — categories are informational.
/// Addition and subtraction are defined component-wise over the union of
/// both operands' category keys, treating an absent category as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub combined: f64,
    #[serde(default)]
    pub categories: HashMap<String, f64>,
}

impl Score {
    pub fn new(combined: f64, categories: HashMap<String, f64>) -> Self {
        Score {
            combined,
            categories,
        }
    }

    /// The conventional attack/defense/SLA breakdown most AD CTFs report.
    pub fn from_atk_def_sla(attack: f64, defense: f64, sla: f64) -> Self {
        Score {
            combined: attack + defense + sla,
            categories: HashMap::from([
                ("ATK".to_string(), attack),
                ("DEF".to_string(), defense),
                ("SLA".to_string(), sla),
            ]),
        }
    }

    /// All category keys used anywhere in `scoreboard`, sorted.
    pub fn categories_in(scoreboard: &Scoreboard) -> Vec<String> {
        let mut keys: Vec<String> = scoreboard
            .values()
            .flat_map(|score| score.categories.keys().cloned())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        keys.sort();
        keys
    }
}

impl Default for Score {
    /// The additive identity: zero combined, no categories.
    fn default() -> Self {
        Score {
            combined: 0.0,
            categories: HashMap::new(),
        }
    }
}

impl Add for &Score {
    type Output = Score;

    fn add(self, rhs: &Score) -> Score {
        let mut categories = self.categories.clone();
        for (key, value) in &rhs.categories {
            *categories.entry(key.clone()).or_insert(0.0) += value;
        }
        for key in self.categories.keys() {
            categories.entry(key.clone()).or_insert(0.0);
        }
        Score {
            combined: self.combined + rhs.combined,
            categories,
        }
    }
}

impl Add for Score {
    type Output = Score;

    fn add(self, rhs: Score) -> Score {
        &self + &rhs
    }
}

impl Sub for &Score {
    type Output = Score;

    fn sub(self, rhs: &Score) -> Score {
        let mut categories = self.categories.clone();
        for key in rhs.categories.keys() {
            categories.entry(key.clone()).or_insert(0.0);
        }
        for key in self.categories.keys() {
            categories.entry(key.clone()).or_insert(0.0);
        }
        for (key, value) in categories.iter_mut() {
            let rhs_value = rhs.categories.get(key).copied().unwrap_or(0.0);
            if !self.categories.contains_key(key) {
                *value = 0.0;
            }
            *value -= rhs_value;
        }
        Score {
            combined: self.combined - rhs.combined,
            categories,
        }
    }
}

impl Sub for Score {
    type Output = Score;

    fn sub(self, rhs: Score) -> Score {
        &self - &rhs
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.combined.partial_cmp(&other.combined)
    }
}

/// The final result of evaluating a [`crate::formulas::ScoringFormula`]:
/// one [`Score`] per team, in the order the formula decided to report them
/// (typically ranked, highest first).
pub type Scoreboard = IndexMap<TeamName, Score>;
