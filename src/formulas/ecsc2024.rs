//! The ECSC 2024 scoring formula: an Elo-like per-service ledger updated
//! round by round, where attacking a better-defended team is worth more
//! than attacking a weaker one.
//!
//! Grounded on `scoring/ecsc2024.py`. Unlike the other formulas in this
//! family, ECSC2024 is not additive over `Score::default`/`Score::new`
//! deltas per round — each round's per-service `ServiceScore` ledger is a
//! deep copy of the previous round's, mutated in place, and only the final
//! round's ledger is read out into a [`Scoreboard`]. This mirrors the
//! source's `copy.deepcopy(prev_scores)` per round (spec §9, "Deep-copy of
//! per-round scoring state in ECSC2024").
//!
//! ECSC2024 does not filter the NOP team at all (spec §9): it has no
//! `nop_team` parameter, and a NOP-owned flag is scored like any other.

use indexmap::IndexMap;

use crate::error::{FormulaError, ShapeError};
use crate::formulas::ScoringFormula;
use crate::ids::RoundId;
use crate::model::{Ctf, ServiceName, ServiceState, TeamName};
use crate::score::{Score, Scoreboard};

#[derive(Debug, Clone)]
pub struct Ecsc2024 {
    pub base: f64,
    pub scale: f64,
    pub norm: f64,
    pub flag_validity: i64,
}

impl Default for Ecsc2024 {
    fn default() -> Self {
        Ecsc2024 {
            base: 5000.0,
            scale: 15.0 * 5.0_f64.sqrt(),
            norm: (5.0_f64.ln()).ln() / 12.0,
            flag_validity: 6,
        }
    }
}

/// One team's per-service running ledger: a base rating plus accumulated
/// attack/defense deltas and the up/total round counters behind the final
/// SLA factor.
#[derive(Debug, Clone, Copy)]
struct ServiceScore {
    base: f64,
    attack: f64,
    defense: f64,
    rounds: u32,
    up_rounds: u32,
}

impl ServiceScore {
    fn new(base: f64) -> Self {
        ServiceScore {
            base,
            attack: 0.0,
            defense: 0.0,
            rounds: 0,
            up_rounds: 0,
        }
    }

    fn sum(&self) -> f64 {
        self.base + self.attack - self.defense
    }

    fn score(&self) -> f64 {
        self.sum().max(0.0)
    }

    fn total(&self) -> f64 {
        if self.rounds == 0 {
            self.base
        } else {
            self.score() * self.up_rounds as f64 / self.rounds as f64
        }
    }
}

/// Every team's every service's ledger at a single point in (virtual) time:
/// either "before round 0" or "after round r".
type Ledger = IndexMap<TeamName, IndexMap<ServiceName, ServiceScore>>;

fn initial_ledger(ctf: &Ctf, base: f64) -> Ledger {
    ctf.teams()
        .iter()
        .map(|team| {
            let services = ctf
                .services()
                .keys()
                .map(|service| (service.clone(), ServiceScore::new(base)))
                .collect();
            (team.clone(), services)
        })
        .collect()
}

impl ScoringFormula for Ecsc2024 {
    fn evaluate(&self, ctf: &Ctf) -> Result<Scoreboard, FormulaError> {
        for (name, service) in ctf.services() {
            if service.flagstores.len() != 1 {
                return Err(FormulaError::Shape(ShapeError::WrongFlagstoreCount {
                    service: name.to_string(),
                    found: service.flagstores.len(),
                }));
            }
        }

        let initial = initial_ledger(ctf, self.base);
        let mut history: Vec<Ledger> = Vec::with_capacity(ctf.rounds().len());

        for (round_id, round_data) in ctf.enumerate_rounds() {
            let previous = if round_id.as_usize() == 0 {
                &initial
            } else {
                &history[round_id.as_usize() - 1]
            };
            let mut current = previous.clone();

            for (team, team_data) in round_data {
                for (service, state) in &team_data.service_states {
                    // Quirk: a RECOVERING service still counts as "up" if it
                    // wasn't possible to retrieve a flag from it recently
                    // anyway, so there was nothing for the checker to miss.
                    let can_getflag = can_getflag(ctf, team, service, round_id, self.flag_validity);
                    let up = *state == ServiceState::Ok
                        || (*state == ServiceState::Recovering && !can_getflag);
                    if let Some(entry) = current.get_mut(team).and_then(|s| s.get_mut(service)) {
                        if up {
                            entry.up_rounds += 1;
                        }
                        if *state != ServiceState::Error {
                            entry.rounds += 1;
                        }
                    }
                }

                for flag_id in &team_data.flags_captured {
                    let Some(flag) = ctf.flags().get(flag_id) else {
                        continue;
                    };
                    let related = if flag.round_id.as_usize() == 0 {
                        &initial
                    } else {
                        &history[flag.round_id.as_usize()]
                    };
                    let attacker_score = related
                        .get(team)
                        .and_then(|s| s.get(&flag.service))
                        .map(ServiceScore::score)
                        .unwrap_or(0.0);
                    let victim_score = related
                        .get(&flag.owner)
                        .and_then(|s| s.get(&flag.service))
                        .map(ServiceScore::score)
                        .unwrap_or(0.0);
                    let score_delta = attacker_score.sqrt() - victim_score.sqrt();
                    let delta = self.scale / (1.0 + (score_delta * self.norm).exp());

                    if let Some(entry) = current.get_mut(team).and_then(|s| s.get_mut(&flag.service)) {
                        entry.attack += delta;
                    }
                    if let Some(entry) = current
                        .get_mut(&flag.owner)
                        .and_then(|s| s.get_mut(&flag.service))
                    {
                        entry.defense += delta;
                    }
                }
            }

            for services in current.values_mut() {
                for service_score in services.values_mut() {
                    let sum = service_score.sum();
                    if sum < 0.0 {
                        service_score.defense += sum;
                    }
                }
            }

            history.push(current);
        }

        let mut scoreboard = Scoreboard::new();
        let Some(last) = history.last() else {
            for team in ctf.teams() {
                scoreboard.insert(
                    team.clone(),
                    Score::new(
                        self.base,
                        [
                            ("ATK".to_string(), 0.0),
                            ("DEF".to_string(), 0.0),
                            ("SLA".to_string(), 0.0),
                        ]
                        .into_iter()
                        .collect(),
                    ),
                );
            }
            return Ok(scoreboard);
        };

        for team in ctf.teams() {
            let Some(services) = last.get(team) else {
                continue;
            };
            let mut attack = 0.0;
            let mut defense = 0.0;
            let mut total = 0.0;
            let mut up_rounds = 0u32;
            let mut checked_rounds = 0u32;
            for service in ctf.services().keys() {
                let Some(service_score) = services.get(service) else {
                    continue;
                };
                attack += service_score.attack;
                defense += service_score.defense;
                total += service_score.total();
                up_rounds += service_score.up_rounds;
                checked_rounds += service_score.rounds;
            }
            let sla_factor = up_rounds as f64 / (checked_rounds.max(1)) as f64;
            scoreboard.insert(
                team.clone(),
                Score::new(
                    total,
                    [
                        ("ATK".to_string(), attack),
                        ("DEF".to_string(), -defense),
                        ("SLA".to_string(), sla_factor),
                    ]
                    .into_iter()
                    .collect(),
                ),
            );
        }

        Ok(scoreboard)
    }
}

/// True if `team` stored any flag into `service` during any round strictly
/// before `round_id`, within the `flag_validity`-round lookback window.
fn can_getflag(
    ctf: &Ctf,
    team: &TeamName,
    service: &ServiceName,
    round_id: RoundId,
    flag_validity: i64,
) -> bool {
    let round = round_id.as_usize() as i64;
    let min_related = (round - flag_validity + 1).max(0);
    for related in min_related..round {
        let Some(team_data) = ctf.rounds()[related as usize].get(team) else {
            continue;
        };
        if team_data
            .flags_stored
            .get(service)
            .is_some_and(|by_flagstore| !by_flagstore.is_empty())
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FlagId, FlagStoreId};
    use crate::model::{Config, RoundData, Service, ServiceName, TeamRoundData};

    fn service() -> Service {
        Service {
            flagstores: vec![FlagStoreId(0)],
            flag_rate: None,
        }
    }

    fn config() -> Config {
        Config {
            flag_validity: 1,
            flag_retention: 1,
            messages: vec![],
        }
    }

    #[test]
    fn rejects_services_with_more_than_one_flagstore() {
        let mut services = IndexMap::new();
        services.insert(
            ServiceName::from("web"),
            Service {
                flagstores: vec![FlagStoreId(0), FlagStoreId(1)],
                flag_rate: None,
            },
        );
        let ctf = Ctf::new(services, vec![TeamName::from("A")], vec![RoundData::new()], config(), None)
            .unwrap();
        let err = Ecsc2024::default().evaluate(&ctf).unwrap_err();
        assert!(matches!(err, FormulaError::Shape(ShapeError::WrongFlagstoreCount { .. })));
    }

    #[test]
    fn no_captures_leaves_scores_at_base_with_full_sla() {
        let mut services = IndexMap::new();
        services.insert(ServiceName::from("web"), service());
        let mut states = IndexMap::new();
        states.insert(ServiceName::from("web"), ServiceState::Ok);
        let mut round = RoundData::new();
        round.insert(
            TeamName::from("A"),
            TeamRoundData {
                service_states: states,
                flags_stored: IndexMap::new(),
                flags_captured: vec![],
            },
        );
        let ctf = Ctf::new(services, vec![TeamName::from("A")], vec![round], config(), None).unwrap();
        let scoreboard = Ecsc2024::default().evaluate(&ctf).unwrap();
        let score = &scoreboard[&TeamName::from("A")];
        assert_eq!(score.combined, Ecsc2024::default().base);
        assert_eq!(score.categories["SLA"], 1.0);
    }

    #[test]
    fn capture_awards_symmetric_attack_and_defense_deltas() {
        let mut services = IndexMap::new();
        services.insert(ServiceName::from("web"), service());
        let mut states = IndexMap::new();
        states.insert(ServiceName::from("web"), ServiceState::Ok);

        let mut flags_stored = IndexMap::new();
        let mut by_fs = IndexMap::new();
        by_fs.insert(FlagStoreId(0), FlagId(0));
        flags_stored.insert(ServiceName::from("web"), by_fs);

        let mut round0 = RoundData::new();
        round0.insert(
            TeamName::from("A"),
            TeamRoundData {
                service_states: states.clone(),
                flags_stored,
                flags_captured: vec![],
            },
        );
        round0.insert(
            TeamName::from("B"),
            TeamRoundData {
                service_states: states.clone(),
                flags_stored: IndexMap::new(),
                flags_captured: vec![],
            },
        );

        let mut round1 = RoundData::new();
        round1.insert(
            TeamName::from("A"),
            TeamRoundData {
                service_states: states.clone(),
                flags_stored: IndexMap::new(),
                flags_captured: vec![],
            },
        );
        round1.insert(
            TeamName::from("B"),
            TeamRoundData {
                service_states: states,
                flags_stored: IndexMap::new(),
                flags_captured: vec![FlagId(0)],
            },
        );

        let ctf = Ctf::new(
            services,
            vec![TeamName::from("A"), TeamName::from("B")],
            vec![round0, round1],
            config(),
            None,
        )
        .unwrap();

        let scoreboard = Ecsc2024::default().evaluate(&ctf).unwrap();
        let a = &scoreboard[&TeamName::from("A")];
        let b = &scoreboard[&TeamName::from("B")];
        assert!(a.categories["DEF"] < 0.0);
        assert!(b.categories["ATK"] > 0.0);
        assert_eq!(a.categories["DEF"].abs(), b.categories["ATK"]);
    }
}
