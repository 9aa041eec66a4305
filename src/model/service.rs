use serde::{Deserialize, Serialize};

use crate::ids::FlagStoreId;

/// Metadata about a checker-scored service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Ordered sequence of flagstore slots this service places flags into.
    pub flagstores: Vec<FlagStoreId>,
    /// Expected number of flags placed per round across this service.
    /// Defaults to `flagstores.len()` when absent from the input.
    #[serde(default)]
    pub flag_rate: Option<f64>,
}

impl Service {
    /// The effective flag rate: the configured value, or the number of
    /// flagstores when none was given.
    pub fn flag_rate(&self) -> f64 {
        self.flag_rate.unwrap_or(self.flagstores.len() as f64)
    }
}
