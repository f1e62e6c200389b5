use serde::{Deserialize, Serialize};
use std::fmt;

/// The type a magnet declares for the data flowing through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    /// Raw or untyped data. Compatible with everything.
    Any,
    /// A compound datatype, identified by its backend primary key.
    Compound(u64),
}

impl Datatype {
    /// Maps the wire representation (`CDT_pk`, nullable) onto a datatype.
    pub fn from_pk(pk: Option<u64>) -> Self {
        match pk {
            Some(pk) => Datatype::Compound(pk),
            None => Datatype::Any,
        }
    }

    pub fn pk(&self) -> Option<u64> {
        match self {
            Datatype::Any => None,
            Datatype::Compound(pk) => Some(*pk),
        }
    }

    /// Two datatypes may be cabled together when they match, or when either side is `Any`.
    pub fn is_compatible_with(&self, other: &Datatype) -> bool {
        match (self, other) {
            (Datatype::Any, _) | (_, Datatype::Any) => true,
            (Datatype::Compound(a), Datatype::Compound(b)) => a == b,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datatype::Any => write!(f, "any"),
            Datatype::Compound(pk) => write!(f, "CDT={}", pk),
        }
    }
}
