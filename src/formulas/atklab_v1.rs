//! The original ATKLAB scoring formula: round-local attack/defense weighted
//! by global capture counts, plus an SLA term from flag retention.
//!
//! Grounded on `scoring/atklabv1.py`; `scaling_factor` is carried as a
//! configurable field for parity with the source formula but, as in the
//! original, is never read during evaluation.

use crate::error::FormulaError;
use crate::formulas::{resolve_nop, ScoringFormula};
use crate::model::{Ctf, ServiceState, TeamName};
use crate::score::{Score, Scoreboard};

#[derive(Debug, Clone)]
pub struct AtkLabV1 {
    pub scaling_factor: f64,
    pub nop_team: Option<TeamName>,
}

impl Default for AtkLabV1 {
    fn default() -> Self {
        AtkLabV1 {
            scaling_factor: 5.0,
            nop_team: Some(TeamName::from("NOP")),
        }
    }
}

impl ScoringFormula for AtkLabV1 {
    fn evaluate(&self, ctf: &Ctf) -> Result<Scoreboard, FormulaError> {
        resolve_nop(ctf, &self.nop_team)?;
        let flag_retention = ctf.config().flag_retention as i64;

        let mut scoreboard: Scoreboard = Scoreboard::new();
        for team in ctf.teams() {
            scoreboard.insert(team.clone(), Score::default());
        }

        for (round_id, round_data) in ctf.enumerate_rounds() {
            let round_id_i = round_id.as_usize() as i64;
            for (team, team_data) in round_data {
                let mut score = Score::default();
                let mut sla = 0.0;

                for (service, state) in &team_data.service_states {
                    let max_flags = (round_id_i + 1).min(flag_retention) as f64;
                    let present = match state {
                        ServiceState::Ok => max_flags,
                        ServiceState::Recovering => {
                            let mut present = 1.0;
                            let lower = (round_id_i - flag_retention).max(0);
                            let mut previous_round = round_id_i - 2;
                            while previous_round >= lower {
                                let still_recovering = ctf.rounds()[previous_round as usize]
                                    .get(team)
                                    .and_then(|data| data.service_states.get(service))
                                    .is_some_and(|s| *s == ServiceState::Recovering);
                                if !still_recovering {
                                    break;
                                }
                                present += 1.0;
                                previous_round -= 1;
                            }
                            present.min(max_flags)
                        }
                        _ => 0.0,
                    };
                    if matches!(state, ServiceState::Ok | ServiceState::Recovering) {
                        sla += present / max_flags;
                    }
                }
                score = score + Score::from_atk_def_sla(0.0, 0.0, sla);

                let mut attack = 0.0;
                for flag_id in &team_data.flags_captured {
                    let Some(flag) = ctf.flags().get(flag_id) else {
                        continue;
                    };
                    if &flag.owner == team {
                        continue;
                    }
                    let n = ctf
                        .flag_captures()
                        .get(flag_id)
                        .map(|c| c.total_count as f64)
                        .unwrap_or(1.0);
                    attack += (1.0 + 1.0 / n) / 2.0;
                }
                score = score + Score::from_atk_def_sla(attack, 0.0, 0.0);

                let mut defense = 0.0;
                let team_count = ctf.teams().len().max(1) as f64;
                for by_flagstore in team_data.flags_stored.values() {
                    for flag_id in by_flagstore.values() {
                        let count = ctf
                            .flag_captures()
                            .get(flag_id)
                            .map(|c| c.total_count)
                            .unwrap_or(0);
                        if count > 0 {
                            defense -= (1.0 + count as f64 / team_count) / 2.0;
                        }
                    }
                }
                score = score + Score::from_atk_def_sla(0.0, defense, 0.0);

                let entry = scoreboard.entry(team.clone()).or_default();
                *entry = entry.clone() + score;
            }
        }

        Ok(scoreboard)
    }
}
