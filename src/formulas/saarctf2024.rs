//! The saarCTF 2024 scoring formula: rank-weighted jeopardy-style attack
//! value with a retroactive single-round update, and defense damage scaled
//! by the victim's own SLA at capture time.
//!
//! Grounded on `scoring/saarctf2024.py`, with the debug instrumentation and
//! hardcoded team name scrubbed; the `defense_bug` toggle and the
//! previous-round-only retroactive update are preserved verbatim per spec
//! §9's explicit "reproduce literally" guidance.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::FormulaError;
use crate::formulas::{resolve_nop, ScoringFormula};
use crate::ids::RoundId;
use crate::model::{Ctf, ServiceName, ServiceState, TeamName};
use crate::score::{Score, Scoreboard};

#[derive(Debug, Clone)]
pub struct SaarCtf2024 {
    pub off_factor: f64,
    pub def_factor: f64,
    pub sla_factor: f64,
    pub nop_team: Option<TeamName>,
    pub defense_bug: bool,
}

impl Default for SaarCtf2024 {
    fn default() -> Self {
        SaarCtf2024 {
            off_factor: 1.0,
            def_factor: 1.0,
            sla_factor: 1.0,
            nop_team: Some(TeamName::from("NOP")),
            defense_bug: true,
        }
    }
}

/// Dense ranking: teams tied on `combined` share a rank; the rank counter
/// only advances past a score that is `> 0`, so every team at or below zero
/// collapses onto the last rank reached by a positive score.
fn rank(scoreboard: &Scoreboard, teams: &[TeamName]) -> HashMap<TeamName, usize> {
    let mut ordered: Vec<(&TeamName, f64)> = teams
        .iter()
        .map(|t| (t, scoreboard.get(t).map(|s| s.combined).unwrap_or(0.0)))
        .collect();
    ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranking = HashMap::new();
    let mut counter = 1usize;
    let mut previous: Option<(usize, f64)> = None;
    for (team, combined) in ordered {
        let rank = match previous {
            Some((previous_rank, previous_score)) if previous_score == combined => previous_rank,
            _ => counter,
        };
        ranking.insert(team.clone(), rank);
        previous = Some((rank, combined));
        if combined > 0.0 {
            counter += 1;
        }
    }
    ranking
}

/// A flag's victim rank: the owner's dense rank as of the round the flag was
/// *placed*, except flags placed in round 0, which use the team count
/// instead of the (trivially all-tied-at-zero) round-0 ranking.
fn victim_rank(
    rankings: &HashMap<RoundId, HashMap<TeamName, usize>>,
    placement_round: &RoundId,
    owner: &TeamName,
    team_count: usize,
) -> f64 {
    if placement_round.as_usize() == 0 {
        return team_count.max(1) as f64;
    }
    rankings
        .get(placement_round)
        .and_then(|r| r.get(owner))
        .copied()
        .unwrap_or(team_count)
        .max(1) as f64
}

impl ScoringFormula for SaarCtf2024 {
    fn evaluate(&self, ctf: &Ctf) -> Result<Scoreboard, FormulaError> {
        let nop = resolve_nop(ctf, &self.nop_team)?;

        let mut scoreboard: Scoreboard = ctf
            .teams()
            .iter()
            .map(|t| (t.clone(), Score::default()))
            .collect();

        let mut rankings: HashMap<RoundId, HashMap<TeamName, usize>> = HashMap::new();
        let mut previous_slas: HashMap<RoundId, HashMap<(TeamName, ServiceName), f64>> =
            HashMap::new();
        let mut num_active_teams: HashMap<RoundId, usize> = HashMap::new();

        for (round_id, round_data) in ctf.enumerate_rounds() {
            rankings.insert(round_id, rank(&scoreboard, ctf.teams()));

            // SLA
            let mut sla: HashMap<(TeamName, ServiceName), f64> = HashMap::new();
            let mut active = std::collections::HashSet::new();
            for (team, team_data) in round_data {
                for (service, state) in &team_data.service_states {
                    if matches!(state, ServiceState::Ok | ServiceState::Recovering) {
                        active.insert(team.clone());
                    }
                    if *state == ServiceState::Ok {
                        *sla.entry((team.clone(), service.clone())).or_insert(0.0) +=
                            self.sla_factor;
                    }
                }
            }
            let active_count = active.len().max(1);
            num_active_teams.insert(round_id, active_count);
            let scale = (active_count as f64).sqrt();
            for team in round_data.keys() {
                for service in ctf.services().keys() {
                    let entry = sla.entry((team.clone(), service.clone())).or_insert(0.0);
                    *entry *= scale;
                }
            }
            previous_slas.insert(round_id, sla.clone());

            // Defense: every flag captured this round damages its owner,
            // by how much the global capture count shifted this round
            // (spec §4.4.3 step 4). Captures are bucketed by flag per
            // round (mirroring the source's `flag_captures[...].by[round]`
            // grouping), so a flag captured by several teams in the same
            // round is only charged once.
            let mut defense_by_owner: HashMap<TeamName, f64> = HashMap::new();
            let mut handled_this_round = std::collections::HashSet::new();
            for (_capturer, capturer_data) in round_data {
                for flag_id in &capturer_data.flags_captured {
                    if !handled_this_round.insert(*flag_id) {
                        continue;
                    }
                    let Some(flag) = ctf.flags().get(flag_id) else {
                        continue;
                    };
                    let Some(captures) = ctf.flag_captures().get(flag_id) else {
                        continue;
                    };
                    let victim_sla = previous_slas
                        .get(&flag.round_id)
                        .and_then(|s| s.get(&(flag.owner.clone(), flag.service.clone())))
                        .copied()
                        .unwrap_or(0.0);
                    let flag_rate = ctf
                        .services()
                        .get(&flag.service)
                        .map(|s| s.flag_rate())
                        .unwrap_or(1.0);
                    let team_count_at = if self.defense_bug {
                        active_count
                    } else {
                        num_active_teams.get(&flag.round_id).copied().unwrap_or(1)
                    };

                    let prev_c = captures.count_before(round_id) as f64;
                    let cur_c = captures.count_including(round_id) as f64;
                    let previous_damage = (prev_c / team_count_at as f64).powf(0.3) * victim_sla;
                    let current_damage = (cur_c / team_count_at as f64).powf(0.3) * victim_sla;
                    let delta = (previous_damage - current_damage) / flag_rate * self.def_factor;
                    *defense_by_owner.entry(flag.owner.clone()).or_insert(0.0) += delta;
                }
            }

            // Attack
            for (team, team_data) in round_data {
                let mut attack = 0.0;
                let defense = defense_by_owner.get(team).copied().unwrap_or(0.0);

                for flag_id in &team_data.flags_captured {
                    let Some(flag) = ctf.flags().get(flag_id) else {
                        continue;
                    };
                    if nop.is_some_and(|n| n == &flag.owner) {
                        continue;
                    }
                    let Some(captures) = ctf.flag_captures().get(flag_id) else {
                        continue;
                    };
                    let victim_rank = victim_rank(&rankings, &flag.round_id, &flag.owner, ctf.teams().len());
                    let flag_rate = ctf
                        .services()
                        .get(&flag.service)
                        .map(|s| s.flag_rate())
                        .unwrap_or(1.0);

                    let current_count = captures.count_including(round_id) as f64;
                    let current_value =
                        1.0 + (1.0 / current_count).sqrt() + (1.0 / victim_rank).sqrt();
                    attack += current_value / flag_rate * self.off_factor;
                }

                // Retroactive update: re-score captures made by other teams
                // in the immediately previous round as this round's new
                // global counts shift their value.
                if round_id.as_usize() > 0 {
                    let previous_round_id = RoundId::from(round_id.as_usize() - 1);
                    if let Some(previous_round_data) = ctf.rounds().get(previous_round_id.as_usize())
                    {
                        if let Some(previous_team_data) = previous_round_data.get(team) {
                            let mut already_handled = std::collections::HashSet::new();
                            for flag_id in &previous_team_data.flags_captured {
                                if !already_handled.insert(*flag_id) {
                                    continue;
                                }
                                let Some(flag) = ctf.flags().get(flag_id) else {
                                    continue;
                                };
                                if nop.is_some_and(|n| n == &flag.owner) {
                                    continue;
                                }
                                let Some(captures) = ctf.flag_captures().get(flag_id) else {
                                    continue;
                                };
                                let victim_rank = victim_rank(&rankings, &flag.round_id, &flag.owner, ctf.teams().len());
                                let flag_rate = ctf
                                    .services()
                                    .get(&flag.service)
                                    .map(|s| s.flag_rate())
                                    .unwrap_or(1.0);

                                let prev_count = captures.count_including(previous_round_id) as f64;
                                let cur_count = captures.count_including(round_id) as f64;
                                if cur_count <= prev_count {
                                    continue;
                                }
                                let previous_value =
                                    1.0 + (1.0 / prev_count).sqrt() + (1.0 / victim_rank).sqrt();
                                let current_value =
                                    1.0 + (1.0 / cur_count).sqrt() + (1.0 / victim_rank).sqrt();
                                attack += (current_value - previous_value) / flag_rate
                                    * self.off_factor;
                            }
                        }
                    }
                }

                let sla_total: f64 = ctf
                    .services()
                    .keys()
                    .map(|service| {
                        sla.get(&(team.clone(), service.clone())).copied().unwrap_or(0.0)
                    })
                    .sum();

                let entry = scoreboard.entry(team.clone()).or_default();
                *entry = entry.clone() + Score::from_atk_def_sla(attack, defense, sla_total);
            }
        }

        Ok(scoreboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FlagId, FlagStoreId};
    use crate::model::{Config, RoundData, Service, TeamRoundData};

    fn build_ctf(defense_bug_active_teams: (usize, usize)) -> Ctf {
        let mut services = IndexMap::new();
        services.insert(
            ServiceName::from("web"),
            Service {
                flagstores: vec![FlagStoreId(0)],
                flag_rate: Some(1.0),
            },
        );

        let (active0, active1) = defense_bug_active_teams;
        let teams: Vec<TeamName> = (0..active0.max(active1).max(2))
            .map(|i| TeamName::from(format!("T{i}").as_str()))
            .collect();

        let mut round0 = RoundData::new();
        for (i, team) in teams.iter().enumerate() {
            let mut states = IndexMap::new();
            states.insert(
                ServiceName::from("web"),
                if i < active0 {
                    ServiceState::Ok
                } else {
                    ServiceState::Offline
                },
            );
            let mut flags_stored = IndexMap::new();
            if i == 0 {
                let mut by_fs = IndexMap::new();
                by_fs.insert(FlagStoreId(0), FlagId(0));
                flags_stored.insert(ServiceName::from("web"), by_fs);
            }
            round0.insert(
                team.clone(),
                TeamRoundData {
                    service_states: states,
                    flags_stored,
                    flags_captured: vec![],
                },
            );
        }

        let mut round1 = RoundData::new();
        for (i, team) in teams.iter().enumerate() {
            let mut states = IndexMap::new();
            states.insert(
                ServiceName::from("web"),
                if i < active1 {
                    ServiceState::Ok
                } else {
                    ServiceState::Offline
                },
            );
            let flags_captured = if i == 1 { vec![FlagId(0)] } else { vec![] };
            round1.insert(
                team.clone(),
                TeamRoundData {
                    service_states: states,
                    flags_stored: IndexMap::new(),
                    flags_captured,
                },
            );
        }

        Ctf::new(
            services,
            teams,
            vec![round0, round1],
            Config {
                flag_validity: 2,
                flag_retention: 2,
                messages: vec![],
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn s4_defense_bug_changes_def_when_active_team_counts_differ() {
        let ctf_diff = build_ctf((2, 3));
        let mut bug_on = SaarCtf2024::default();
        bug_on.nop_team = None;
        let scoreboard_bug = bug_on.evaluate(&ctf_diff).unwrap();

        let mut bug_off = SaarCtf2024::default();
        bug_off.nop_team = None;
        bug_off.defense_bug = false;
        let scoreboard_no_bug = bug_off.evaluate(&ctf_diff).unwrap();

        let owner = TeamName::from("T0");
        assert_ne!(
            scoreboard_bug[&owner].categories["DEF"],
            scoreboard_no_bug[&owner].categories["DEF"]
        );
    }

    #[test]
    fn s4_defense_bug_is_irrelevant_when_active_team_counts_match() {
        let ctf_same = build_ctf((2, 2));
        let mut bug_on = SaarCtf2024::default();
        bug_on.nop_team = None;
        let scoreboard_bug = bug_on.evaluate(&ctf_same).unwrap();

        let mut bug_off = SaarCtf2024::default();
        bug_off.nop_team = None;
        bug_off.defense_bug = false;
        let scoreboard_no_bug = bug_off.evaluate(&ctf_same).unwrap();

        let owner = TeamName::from("T0");
        assert_eq!(
            scoreboard_bug[&owner].categories["DEF"],
            scoreboard_no_bug[&owner].categories["DEF"]
        );
    }
}
