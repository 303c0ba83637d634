use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of state change observers are told about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// A speculative value was applied and is waiting for confirmation.
    Speculative,
    /// A confirmation arrived and its authoritative value was merged.
    Confirmed,
    /// A confirmation failed and the speculative change was undone.
    RolledBack,
    /// The call was refused before anything was applied (bad key).
    Refused,
    /// The whole value was replaced with authoritative data.
    Replaced,
    /// A cell went back to its construction-time value.
    Reset,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Speculative => "speculative",
            Transition::Confirmed => "confirmed",
            Transition::RolledBack => "rolled_back",
            Transition::Refused => "refused",
            Transition::Replaced => "replaced",
            Transition::Reset => "reset",
        }
    }

    pub const ALL: [Transition; 6] = [
        Transition::Speculative,
        Transition::Confirmed,
        Transition::RolledBack,
        Transition::Refused,
        Transition::Replaced,
        Transition::Reset,
    ];
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_display() {
        for transition in Transition::ALL {
            let json = serde_json::to_string(&transition).unwrap();
            assert_eq!(json, format!("\"{}\"", transition));
        }
    }
}
