//! Opaque identifiers used throughout the game model.
//!
//! `ServiceName` and `TeamName` are free-form strings taken verbatim from the
//! input data; `FlagId`, `FlagStoreId` and `RoundId` are non-negative integers
//! assigned by the checker (flags) or by position (rounds).

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v as u32)
            }
        }
    };
}

string_id!(
    /// The name of a checker-scored service, e.g. `"webshop"`.
    ServiceName
);
string_id!(
    /// The name of a competing team, e.g. `"NOP"`.
    TeamName
);
int_id!(
    /// Dense identifier assigned to every flag seen in the game, across all
    /// services and rounds.
    FlagId
);
int_id!(
    /// Identifier of a flagstore slot within a service. Scoped to the
    /// service, not globally unique.
    FlagStoreId
);
int_id!(
    /// 0-based, contiguous round index.
    RoundId
);
