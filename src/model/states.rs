use serde::{Deserialize, Serialize};

/// The state of a service, as reported by the checker for one team in one
/// round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    /// Fully healthy.
    #[serde(rename = "OK")]
    Ok,
    /// Service is up; some old flags are missing but the most recently
    /// placed one is still retrievable.
    #[serde(rename = "RECOVERING")]
    Recovering,
    /// Reachable but misbehaving.
    #[serde(rename = "MUMBLE")]
    Mumble,
    /// Unreachable.
    #[serde(rename = "OFFLINE")]
    Offline,
    /// Checker-internal fault; treat as "no information".
    #[serde(rename = "ERROR")]
    Error,
}

/// Whether a specific flag is retrievable in a given round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagState {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "MISSING")]
    Missing,
}
