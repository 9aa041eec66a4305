//! The generalized jeopardy-based A/D formula: a configurable decay curve
//! for attack value, SLA scored from the flag-validity window, and a
//! defense term that rewards teams for not being exploited — optionally
//! crediting failed self-attacks back as attack ("defense compensation").
//!
//! Grounded on `scoring/ecsc2025.py`'s per-round windowed defense
//! computation, generalized per spec §4.4.2 with the `JeopardyFormula`
//! choice, `AttackerMode`, and `defense_compensation` toggle that the
//! source's dedicated ECSC2025 formula hardcodes.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::FormulaError;
use crate::formulas::{resolve_nop, shared, JeopardyFormula, ScoringFormula};
use crate::ids::RoundId;
use crate::model::{Ctf, FlagState, ServiceState, TeamName};
use crate::score::{Score, Scoreboard};

/// Which teams are considered "attacking" a coordinate when computing
/// defense credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum AttackerMode {
    /// Every team is always attacking.
    #[serde(rename = "Everyone")]
    Everyone,
    /// Only teams that captured at least one flag at this coordinate.
    #[serde(rename = "Successful")]
    Successful,
    /// Same as `Successful`, but the defense value is scaled up to what it
    /// would be if every team had attacked.
    #[serde(rename = "Scaled")]
    Scaled,
}

#[derive(Debug, Clone)]
pub struct AtkLabV2 {
    pub jeopardy: JeopardyFormula,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub base: f64,
    pub min: f64,
    pub attackers: AttackerMode,
    pub defense_compensation: bool,
    pub nop_team: Option<TeamName>,
}

impl AtkLabV2 {
    pub fn new(jeopardy: JeopardyFormula) -> Self {
        AtkLabV2 {
            jeopardy,
            alpha: None,
            beta: None,
            base: 10.0,
            min: 1.0,
            attackers: AttackerMode::Scaled,
            defense_compensation: true,
            nop_team: Some(TeamName::from("NOP")),
        }
    }

    fn jeopardy_value(&self, solves: f64, teams: usize) -> f64 {
        self.jeopardy
            .evaluate(solves, teams, self.alpha, self.beta, self.min, self.base)
            .max(0.0)
    }

    fn add_score(scoreboard: &mut Scoreboard, team: &TeamName, delta: Score) {
        let entry = scoreboard.entry(team.clone()).or_default();
        *entry = entry.clone() + delta;
    }
}

impl ScoringFormula for AtkLabV2 {
    fn evaluate(&self, ctf: &Ctf) -> Result<Scoreboard, FormulaError> {
        let nop = resolve_nop(ctf, &self.nop_team)?;
        self.jeopardy.validate(self.alpha, self.beta)?;

        let flag_validity = ctf.config().flag_validity.max(1) as usize;
        let flag_states = ctf.flag_states();
        let attacked = shared::attacked_teams(ctf, nop);
        let active = shared::active_teams(ctf, nop);
        let team_count = ctf.teams().len();

        let mut scoreboard = Scoreboard::new();
        for team in ctf.teams() {
            scoreboard.insert(team.clone(), Score::default());
        }

        for (round_id, round_data) in ctf.enumerate_rounds() {
            // SLA
            for (team, team_data) in round_data {
                let mut sla = 0.0;
                for (service, state) in &team_data.service_states {
                    let Some(svc) = ctf.services().get(service) else {
                        continue;
                    };
                    let flagstore_count = svc.flagstores.len();
                    let max_flags = (flag_validity * flagstore_count) as f64;
                    if max_flags == 0.0 {
                        continue;
                    }
                    let present = match state {
                        ServiceState::Ok => max_flags,
                        ServiceState::Recovering => {
                            let window_start =
                                round_id.as_usize().saturating_sub(flag_validity - 1);
                            let mut present = 0.0;
                            for flagstore in &svc.flagstores {
                                for placement in window_start..=round_id.as_usize() {
                                    let Some(placement_data) = ctf.rounds()[placement].get(team)
                                    else {
                                        continue;
                                    };
                                    let Some(by_flagstore) =
                                        placement_data.flags_stored.get(service)
                                    else {
                                        continue;
                                    };
                                    let Some(flag_id) = by_flagstore.get(flagstore) else {
                                        continue;
                                    };
                                    if flag_states[round_id.as_usize()].get(flag_id)
                                        == Some(&FlagState::Ok)
                                    {
                                        present += 1.0;
                                    }
                                }
                            }
                            present
                        }
                        _ => 0.0,
                    };
                    sla += self.base * present / max_flags * flagstore_count as f64;
                }
                Self::add_score(&mut scoreboard, team, Score::from_atk_def_sla(0.0, 0.0, sla));
            }

            // Attack
            for (team, team_data) in round_data {
                let mut attack = 0.0;
                for flag_id in &team_data.flags_captured {
                    let Some(flag) = ctf.flags().get(flag_id) else {
                        continue;
                    };
                    if &flag.owner == team {
                        continue;
                    }
                    if nop.is_some_and(|n| n == &flag.owner || n == team) {
                        continue;
                    }
                    let count = ctf
                        .flag_captures()
                        .get(flag_id)
                        .map(|c| c.total_count as f64)
                        .unwrap_or(1.0);
                    attack += self.jeopardy_value(count, team_count);
                }
                Self::add_score(
                    &mut scoreboard,
                    team,
                    Score::from_atk_def_sla(attack, 0.0, 0.0),
                );
            }

            // Defense
            for (service, flagstore) in ctf.flagstores() {
                let key = (round_id, service.clone(), *flagstore);
                let victims_of = attacked.get(&key);

                let attackers: Vec<TeamName> = match self.attackers {
                    AttackerMode::Everyone => ctf.teams().to_vec(),
                    AttackerMode::Successful | AttackerMode::Scaled => ctf
                        .teams()
                        .iter()
                        .filter(|t| {
                            victims_of
                                .and_then(|v| v.get(*t))
                                .is_some_and(|set| !set.is_empty())
                        })
                        .cloned()
                        .collect(),
                };
                if attackers.is_empty() {
                    continue;
                }

                for attacker in &attackers {
                    if nop.is_some_and(|n| n == attacker) {
                        continue;
                    }
                    let victims = victims_of.and_then(|v| v.get(attacker));
                    let victim_count = victims.map_or(0, |v| v.len()) as f64;

                    for defender in ctf.teams() {
                        if nop.is_some_and(|n| n == defender) {
                            continue;
                        }
                        if victims.is_some_and(|v| v.contains(defender)) {
                            continue;
                        }
                        let Some(defender_data) = round_data.get(defender) else {
                            continue;
                        };
                        let Some(by_flagstore) = defender_data.flags_stored.get(service) else {
                            continue;
                        };
                        let Some(flag_id) = by_flagstore.get(flagstore) else {
                            continue;
                        };

                        let mut defense = 0.0;
                        let mut max_defense = 0.0;
                        let check_end =
                            (round_id.as_usize() + flag_validity).min(ctf.rounds().len());
                        for check_round in round_id.as_usize()..check_end {
                            let active_count = active
                                .get(&RoundId::from(check_round))
                                .map_or(0, |s| s.len());
                            let max_victims = ((active_count as i64) - 1).max(1) as f64;
                            let not_exploited = max_victims - victim_count;
                            let mut value = self.jeopardy_value(not_exploited, team_count);
                            if self.attackers == AttackerMode::Scaled {
                                value *= max_victims / attackers.len() as f64;
                            }
                            value /= flag_validity as f64;

                            max_defense += value;

                            let up = ctf.rounds()[check_round].get(defender).is_some_and(|d| {
                                matches!(
                                    d.service_states.get(service),
                                    Some(ServiceState::Ok) | Some(ServiceState::Recovering)
                                )
                            });
                            if up
                                && flag_states[check_round].get(flag_id) == Some(&FlagState::Ok)
                            {
                                defense += value;
                            }
                        }

                        if self.defense_compensation && attacker == defender {
                            Self::add_score(
                                &mut scoreboard,
                                defender,
                                Score::from_atk_def_sla(max_defense, 0.0, 0.0),
                            );
                        } else if attacker != defender {
                            Self::add_score(
                                &mut scoreboard,
                                defender,
                                Score::from_atk_def_sla(0.0, defense, 0.0),
                            );
                        }
                    }
                }
            }
        }

        Ok(scoreboard)
    }
}
