use indexmap::IndexMap;

use crate::ids::{FlagId, FlagStoreId, RoundId};
use crate::model::ServiceName;
use crate::model::TeamName;

/// Where and when a flag was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagInfo {
    pub flag_id: FlagId,
    pub round_id: RoundId,
    pub owner: TeamName,
    pub service: ServiceName,
    pub flagstore: FlagStoreId,
}

/// How often a flag was captured, and by whom, broken down by round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagCaptures {
    pub total_count: u32,
    pub by_round: IndexMap<RoundId, Vec<TeamName>>,
}

impl FlagCaptures {
    pub(crate) fn record(&mut self, round_id: RoundId, team: TeamName) {
        self.total_count += 1;
        self.by_round.entry(round_id).or_default().push(team);
    }

    /// Number of captures strictly before `target_round_id`.
    pub fn count_before(&self, target_round_id: RoundId) -> u32 {
        self.by_round
            .iter()
            .filter(|(round, _)| **round < target_round_id)
            .map(|(_, teams)| teams.len() as u32)
            .sum()
    }

    /// Number of captures within `target_round_id` exactly.
    pub fn count_in(&self, target_round_id: RoundId) -> u32 {
        self.by_round
            .get(&target_round_id)
            .map(|teams| teams.len() as u32)
            .unwrap_or(0)
    }

    /// Number of captures up to and including `target_round_id`.
    pub fn count_including(&self, target_round_id: RoundId) -> u32 {
        self.by_round
            .iter()
            .filter(|(round, _)| **round <= target_round_id)
            .map(|(_, teams)| teams.len() as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_helpers_partition_by_round() {
        let mut captures = FlagCaptures::default();
        captures.record(RoundId(0), TeamName::from("A"));
        captures.record(RoundId(1), TeamName::from("B"));
        captures.record(RoundId(1), TeamName::from("C"));
        captures.record(RoundId(2), TeamName::from("A"));

        assert_eq!(captures.total_count, 4);
        assert_eq!(captures.count_before(RoundId(1)), 1);
        assert_eq!(captures.count_in(RoundId(1)), 2);
        assert_eq!(captures.count_including(RoundId(1)), 3);
        assert_eq!(captures.count_including(RoundId(2)), 4);
        assert_eq!(captures.count_before(RoundId(0)), 0);
    }
}
