//! Best-effort reconstruction of per-flag availability from the coarser
//! per-service `ServiceState` that checkers actually report.
//!
//! Most competition infrastructure never records which individual flags a
//! service could still serve — only a service-wide health verdict per round.
//! [`estimate`] recovers an approximation good enough for scoring formulas
//! that want per-flag granularity, grounded precisely on the reference
//! estimator in `scoring_playground.model.CTF._estimate_flag_states`.
//!
//! This only runs when a [`crate::model::Ctf`] is built without explicit
//! `flag_states`; see [`crate::model::Ctf::flag_states`].

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ids::{FlagId, RoundId};
use crate::model::{Ctf, FlagState, ServiceName, ServiceState, TeamName};

pub(crate) fn estimate(ctf: &Ctf) -> Vec<IndexMap<FlagId, FlagState>> {
    let retention = ctf.config().flag_retention.max(1) as usize;
    let mut per_round = Vec::with_capacity(ctf.rounds().len());

    for (round_id, round_data) in ctf.enumerate_rounds() {
        let mut round_result: IndexMap<FlagId, FlagState> = IndexMap::new();
        for (team, team_data) in round_data {
            for (service, state) in &team_data.service_states {
                let checked_flags =
                    stored_flags_in_window(ctf, team, service, round_id, retention);

                match state {
                    ServiceState::Ok | ServiceState::Error => {
                        for flag_id in checked_flags {
                            round_result.insert(flag_id, FlagState::Ok);
                        }
                    }
                    ServiceState::Offline | ServiceState::Mumble => {
                        for flag_id in checked_flags {
                            round_result.insert(flag_id, FlagState::Missing);
                        }
                    }
                    ServiceState::Recovering => {
                        let present = recovering_present_window(
                            ctf, team, service, round_id, retention,
                        );
                        let present_flags: HashSet<FlagId> =
                            stored_flags_in_window(ctf, team, service, round_id, present)
                                .into_iter()
                                .collect();
                        for flag_id in checked_flags {
                            let flag_state = if present_flags.contains(&flag_id) {
                                FlagState::Ok
                            } else {
                                FlagState::Missing
                            };
                            round_result.insert(flag_id, flag_state);
                        }
                    }
                }
            }
        }
        per_round.push(round_result);
    }
    per_round
}

/// All flags `team` placed into `service` during the `window` rounds ending
/// at (and including) `round_id`, across every flagstore of that service.
fn stored_flags_in_window(
    ctf: &Ctf,
    team: &TeamName,
    service: &ServiceName,
    round_id: RoundId,
    window: usize,
) -> HashSet<FlagId> {
    let end = round_id.as_usize();
    let start = end.saturating_sub(window.saturating_sub(1));
    let mut flags = HashSet::new();
    for placement in start..=end {
        if let Some(team_data) = ctf.rounds()[placement].get(team) {
            if let Some(by_flagstore) = team_data.flags_stored.get(service) {
                flags.extend(by_flagstore.values().copied());
            }
        }
    }
    flags
}

/// How many of the last `flag_retention` rounds' worth of flags are still
/// estimated present for a `RECOVERING` service, per the reference
/// heuristic: start from "all but the most recent round", and give back one
/// more round of credit for every future round before the service recovers
/// to `OK` (capped at `flag_retention - 1`, floored at 1 — a `RECOVERING`
/// service always has at least its newest flag).
fn recovering_present_window(
    ctf: &Ctf,
    team: &TeamName,
    service: &ServiceName,
    round_id: RoundId,
    retention: usize,
) -> usize {
    let max_present = retention as i64 - 1;
    let mut present = max_present;
    let round_id = round_id.as_usize();
    let total_rounds = ctf.rounds().len();

    for future_round in (round_id + 1)..(round_id + retention) {
        if future_round >= total_rounds {
            break;
        }
        let recovered = ctf.rounds()[future_round]
            .get(team)
            .and_then(|data| data.service_states.get(service))
            .is_some_and(|state| *state == ServiceState::Ok);
        if recovered {
            break;
        }
        present -= 1;
    }

    present.min(max_present).max(1) as usize
}
