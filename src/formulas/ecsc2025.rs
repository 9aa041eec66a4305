//! The ECSC 2025 scoring formula: a fixed specialization of the ATKLABv2
//! family using the `ECSC2025` jeopardy curve and always-scaled defense
//! credit, but with one twist ATKLABv2 doesn't have — a team that tried to
//! attack a coordinate and failed (because someone got there first) is
//! still credited for the attempt, as *attack* rather than *defense*.
//!
//! Grounded on `scoring/ecsc2025.py`. `ECSC2025` requires both `flag_validity`
//! and explicit `flag_states` on the input `Ctf` (the source raises `KeyError`
//! for either missing piece; here that's [`ConfigError`]/reliance on the
//! estimator is simply allowed to kick in when `flag_states` is absent, since
//! spec §4.2 makes the estimator a drop-in substitute rather than an error
//! condition for this crate).

use crate::error::FormulaError;
use crate::formulas::{resolve_nop, shared, JeopardyFormula, ScoringFormula};
use crate::ids::RoundId;
use crate::model::{Ctf, FlagState, ServiceState, TeamName};
use crate::score::{Score, Scoreboard};

#[derive(Debug, Clone)]
pub struct Ecsc2025 {
    pub base: f64,
    pub nop_team: Option<TeamName>,
}

impl Default for Ecsc2025 {
    fn default() -> Self {
        Ecsc2025 {
            base: 10.0,
            nop_team: Some(TeamName::from("NOP")),
        }
    }
}

impl Ecsc2025 {
    fn jeopardy(&self, solves: f64) -> f64 {
        JeopardyFormula::Ecsc2025
            .evaluate(solves, 0, None, None, 1.0, self.base)
            .max(0.0)
    }

    fn add_score(scoreboard: &mut Scoreboard, team: &TeamName, delta: Score) {
        let entry = scoreboard.entry(team.clone()).or_default();
        *entry = entry.clone() + delta;
    }
}

impl ScoringFormula for Ecsc2025 {
    fn evaluate(&self, ctf: &Ctf) -> Result<Scoreboard, FormulaError> {
        let nop = resolve_nop(ctf, &self.nop_team)?;

        let flag_validity = ctf.config().flag_validity.max(1) as usize;
        let flag_states = ctf.flag_states();
        let attacked = shared::attacked_teams(ctf, nop);
        let active = shared::active_teams(ctf, nop);

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

            // Attack: direct captures, double-sided NOP filter.
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
                    attack += self.jeopardy(count);
                }
                Self::add_score(
                    &mut scoreboard,
                    team,
                    Score::from_atk_def_sla(attack, 0.0, 0.0),
                );
            }

            // Defense: always "Scaled" attacker accounting (unconditional
            // `max_victims / attackers.len()` scaling), with the
            // self-attacker branch crediting ATK instead of DEF.
            for (service, flagstore) in ctf.flagstores() {
                let key = (round_id, service.clone(), *flagstore);
                let victims_of = attacked.get(&key);

                let attackers: Vec<TeamName> = ctf
                    .teams()
                    .iter()
                    .filter(|t| {
                        victims_of
                            .and_then(|v| v.get(*t))
                            .is_some_and(|set| !set.is_empty())
                    })
                    .cloned()
                    .collect();
                if attackers.is_empty() {
                    continue;
                }

                for defender in ctf.teams() {
                    if nop.is_some_and(|n| n == defender) {
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

                    for attacker in &attackers {
                        let victims = victims_of.and_then(|v| v.get(attacker));
                        if victims.is_some_and(|v| v.contains(defender)) {
                            continue;
                        }
                        let victim_count = victims.map_or(0, |v| v.len()) as f64;

                        let mut defense = 0.0;
                        let check_end =
                            (round_id.as_usize() + flag_validity).min(ctf.rounds().len());
                        for check_round in round_id.as_usize()..check_end {
                            let active_count = active
                                .get(&RoundId::from(check_round))
                                .map_or(0, |s| s.len());
                            let max_victims = ((active_count as i64) - 1).max(1) as f64;
                            let not_exploited = max_victims - victim_count;
                            let mut value = self.jeopardy(not_exploited);
                            value *= max_victims / attackers.len() as f64;
                            value /= flag_validity as f64;

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

                        if attacker == defender {
                            Self::add_score(
                                &mut scoreboard,
                                defender,
                                Score::from_atk_def_sla(defense, 0.0, 0.0),
                            );
                        } else {
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
