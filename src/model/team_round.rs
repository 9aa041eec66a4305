use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{FlagId, FlagStoreId};
use crate::model::states::ServiceState;
use crate::model::ServiceName;

/// Everything recorded about one team in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamRoundData {
    /// Per-service health as reported by the checker.
    pub service_states: IndexMap<ServiceName, ServiceState>,
    /// Flags this team's checker placements deposited this round, by
    /// service and flagstore.
    pub flags_stored: IndexMap<ServiceName, IndexMap<FlagStoreId, FlagId>>,
    /// Flags this team captured this round (may contain duplicates, and may
    /// reference the team's own flags — callers filter that per formula).
    #[serde(default)]
    pub flags_captured: Vec<FlagId>,
}

impl TeamRoundData {
    /// All flags stored this round by this team, across every service and
    /// flagstore, in `flags_stored` iteration order.
    pub fn iter_stored_flags(&self) -> impl Iterator<Item = FlagId> + '_ {
        self.flags_stored
            .values()
            .flat_map(|by_flagstore| by_flagstore.values().copied())
    }
}
