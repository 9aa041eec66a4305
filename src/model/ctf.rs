use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::ShapeError;
use crate::estimator;
use crate::ids::{FlagId, FlagStoreId, RoundId};
use crate::model::config::Config;
use crate::model::flags::{FlagCaptures, FlagInfo};
use crate::model::service::Service;
use crate::model::states::FlagState;
use crate::model::team_round::TeamRoundData;
use crate::model::{ServiceName, TeamName};

/// One round of team data, keyed by team name, in the order teams first
/// appear. Re-exported so call sites don't need to reach into `indexmap`
/// directly.
pub type RoundData = IndexMap<TeamName, TeamRoundData>;

/// The canonical, immutable in-memory game model.
///
/// Construct via [`Ctf::new`] (or [`crate::codec::from_canonical_json`] for
/// the wire format). Once built, a `Ctf` is never mutated; [`Ctf::slice`]
/// produces an independent copy over a sub-range of rounds. Derived indices
/// (`flagstores`, `flags`, `flag_captures`, `flag_states`) are computed at
/// most once and cached behind [`OnceCell`], per spec §9's "memoized
/// properties on immutable objects" guidance.
#[derive(Debug, Clone)]
pub struct Ctf {
    services: IndexMap<ServiceName, Service>,
    teams: Vec<TeamName>,
    rounds: Vec<RoundData>,
    config: Config,
    flag_states_input: Option<Vec<IndexMap<FlagId, FlagState>>>,

    flagstores_cache: OnceCell<Vec<(ServiceName, FlagStoreId)>>,
    flags_cache: OnceCell<IndexMap<FlagId, FlagInfo>>,
    flag_captures_cache: OnceCell<IndexMap<FlagId, FlagCaptures>>,
    flag_states_cache: OnceCell<Vec<IndexMap<FlagId, FlagState>>>,
}

impl Ctf {
    /// Builds a `Ctf` from already-decoded pieces, validating the §3
    /// invariants that aren't already enforced by the type system:
    /// every `flags_stored` flagstore belongs to its service, and every
    /// `FlagId` referenced by a capture or an externally supplied
    /// `flag_states` entry was actually placed by some team.
    pub fn new(
        services: IndexMap<ServiceName, Service>,
        teams: Vec<TeamName>,
        rounds: Vec<RoundData>,
        config: Config,
        flag_states: Option<Vec<IndexMap<FlagId, FlagState>>>,
    ) -> Result<Self, ShapeError> {
        for round_data in &rounds {
            for team_data in round_data.values() {
                for (service_name, by_flagstore) in &team_data.flags_stored {
                    let declared = services.get(service_name).map(|s| s.flagstores.as_slice());
                    for flagstore in by_flagstore.keys() {
                        let known = declared.is_some_and(|fs| fs.contains(flagstore));
                        if !known {
                            return Err(ShapeError::UnknownFlagstore {
                                service: service_name.to_string(),
                                flagstore: flagstore.0,
                            });
                        }
                    }
                }
            }
        }

        let flags = compute_flags(&rounds);

        for round_data in &rounds {
            for team_data in round_data.values() {
                for flag_id in &team_data.flags_captured {
                    if !flags.contains_key(flag_id) {
                        return Err(ShapeError::DanglingFlagId(flag_id.0));
                    }
                }
            }
        }

        if let Some(states) = &flag_states {
            if states.len() != rounds.len() {
                return Err(ShapeError::FlagStatesLengthMismatch {
                    expected: rounds.len(),
                    found: states.len(),
                });
            }
            for round_states in states {
                for flag_id in round_states.keys() {
                    if !flags.contains_key(flag_id) {
                        return Err(ShapeError::DanglingFlagId(flag_id.0));
                    }
                }
            }
        }

        let flags_cache = OnceCell::new();
        flags_cache.set(flags).expect("fresh cell");

        tracing::debug!(
            teams = teams.len(),
            rounds = rounds.len(),
            services = services.len(),
            "constructed CTF game model"
        );

        Ok(Ctf {
            services,
            teams,
            rounds,
            config,
            flag_states_input: flag_states,
            flagstores_cache: OnceCell::new(),
            flags_cache,
            flag_captures_cache: OnceCell::new(),
            flag_states_cache: OnceCell::new(),
        })
    }

    pub fn services(&self) -> &IndexMap<ServiceName, Service> {
        &self.services
    }

    pub fn teams(&self) -> &[TeamName] {
        &self.teams
    }

    pub fn rounds(&self) -> &[RoundData] {
        &self.rounds
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Correctly typed `enumerate()` over `rounds`.
    pub fn enumerate_rounds(&self) -> impl Iterator<Item = (RoundId, &RoundData)> {
        self.rounds
            .iter()
            .enumerate()
            .map(|(i, round)| (RoundId::from(i), round))
    }

    /// All `(service, flagstore)` pairs across every service, in the order
    /// services and flagstores were declared.
    pub fn flagstores(&self) -> &[(ServiceName, FlagStoreId)] {
        self.flagstores_cache.get_or_init(|| {
            self.services
                .iter()
                .flat_map(|(name, service)| {
                    service
                        .flagstores
                        .iter()
                        .map(move |fs| (name.clone(), *fs))
                })
                .collect()
        })
    }

    /// Every flag ever placed by the checker, keyed by its id.
    pub fn flags(&self) -> &IndexMap<FlagId, FlagInfo> {
        self.flags_cache.get_or_init(|| compute_flags(&self.rounds))
    }

    /// How often each flag was captured, and by whom, broken down by round.
    pub fn flag_captures(&self) -> &IndexMap<FlagId, FlagCaptures> {
        self.flag_captures_cache.get_or_init(|| {
            let mut captures: IndexMap<FlagId, FlagCaptures> = IndexMap::new();
            for (round_id, round_data) in self.enumerate_rounds() {
                for (team, team_data) in round_data {
                    for flag_id in &team_data.flags_captured {
                        captures
                            .entry(*flag_id)
                            .or_default()
                            .record(round_id, team.clone());
                    }
                }
            }
            captures
        })
    }

    /// Per-round, per-flag availability. If the `Ctf` was built without
    /// `flag_states`, this estimates them from `service_states` on first
    /// access (spec §4.2) and emits a one-time warning.
    pub fn flag_states(&self) -> &[IndexMap<FlagId, FlagState>] {
        self.flag_states_cache.get_or_init(|| {
            if let Some(given) = &self.flag_states_input {
                given.clone()
            } else {
                tracing::warn!(
                    "estimating flag availability from service states; this may be inaccurate"
                );
                estimator::estimate(self)
            }
        })
    }

    /// True if this `Ctf` was constructed with explicit `flag_states`
    /// (i.e. the estimator will never run for it).
    pub fn has_explicit_flag_states(&self) -> bool {
        self.flag_states_input.is_some()
    }

    /// Returns a new `Ctf` restricted to `rounds[from_round..to_round]`.
    /// Derived indices are recomputed independently for the slice.
    pub fn slice(&self, from_round: usize, to_round: usize) -> Self {
        let rounds = self.rounds[from_round..to_round].to_vec();
        let flag_states_input = self
            .flag_states_input
            .as_ref()
            .map(|states| states[from_round..to_round].to_vec());

        Ctf {
            services: self.services.clone(),
            teams: self.teams.clone(),
            rounds,
            config: self.config.clone(),
            flag_states_input,
            flagstores_cache: OnceCell::new(),
            flags_cache: OnceCell::new(),
            flag_captures_cache: OnceCell::new(),
            flag_states_cache: OnceCell::new(),
        }
    }
}

fn compute_flags(rounds: &[RoundData]) -> IndexMap<FlagId, FlagInfo> {
    let mut flags = IndexMap::new();
    for (round_index, round_data) in rounds.iter().enumerate() {
        let round_id = RoundId::from(round_index);
        for (team, team_data) in round_data {
            for (service, by_flagstore) in &team_data.flags_stored {
                for (flagstore, flag_id) in by_flagstore {
                    flags.insert(
                        *flag_id,
                        FlagInfo {
                            flag_id: *flag_id,
                            round_id,
                            owner: team.clone(),
                            service: service.clone(),
                            flagstore: *flagstore,
                        },
                    );
                }
            }
        }
    }
    flags
}
