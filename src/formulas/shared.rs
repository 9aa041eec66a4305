//! Preprocessing shared by ATKLABv2 and ECSC2025 (spec §4.4, "Shared
//! preprocessing"): who attacked whom at each flag's deployment coordinate,
//! and which teams were actively playing each round.

use std::collections::{HashMap, HashSet};

use crate::ids::{FlagStoreId, RoundId};
use crate::model::{Ctf, ServiceName, ServiceState, TeamName};

/// `attacked_teams[(placement_round, service, flagstore)][attacker]` is the
/// set of victim teams that `attacker` stole a flag from at that
/// coordinate, across the whole game.
pub type AttackedTeams = HashMap<(RoundId, ServiceName, FlagStoreId), HashMap<TeamName, HashSet<TeamName>>>;

/// Builds [`AttackedTeams`], excluding self-captures and either side being
/// `nop_team`.
pub fn attacked_teams(ctf: &Ctf, nop_team: Option<&TeamName>) -> AttackedTeams {
    let mut attacked: AttackedTeams = HashMap::new();
    for (_round_id, round_data) in ctf.enumerate_rounds() {
        for (team, team_data) in round_data {
            for flag_id in &team_data.flags_captured {
                let Some(flag) = ctf.flags().get(flag_id) else {
                    continue;
                };
                if &flag.owner == team {
                    continue;
                }
                if nop_team.is_some_and(|nop| nop == &flag.owner || nop == team) {
                    continue;
                }
                attacked
                    .entry((flag.round_id, flag.service.clone(), flag.flagstore))
                    .or_default()
                    .entry(team.clone())
                    .or_default()
                    .insert(flag.owner.clone());
            }
        }
    }
    attacked
}

/// `active_teams[round]`: teams other than `nop_team` with at least one
/// service not `OFFLINE` this round.
pub fn active_teams(ctf: &Ctf, nop_team: Option<&TeamName>) -> HashMap<RoundId, HashSet<TeamName>> {
    let mut active: HashMap<RoundId, HashSet<TeamName>> = HashMap::new();
    for (round_id, round_data) in ctf.enumerate_rounds() {
        let mut teams = HashSet::new();
        for (team, team_data) in round_data {
            if nop_team.is_some_and(|nop| nop == team) {
                continue;
            }
            if team_data
                .service_states
                .values()
                .any(|state| *state != ServiceState::Offline)
            {
                teams.insert(team.clone());
            }
        }
        active.insert(round_id, teams);
    }
    active
}
