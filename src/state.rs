/// Application state machine
///
/// A small closed set of symbolic states with a fixed table of legal
/// transitions. The Model owns the current state; everything else sees it
/// only through broadcast snapshots.
use std::fmt;
use std::str::FromStr;

use crate::error::TransitionError;

/// Symbolic application states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    A,
    B,
    C,
}

impl AppState {
    /// All states, in cycle order
    pub const ALL: [AppState; 3] = [AppState::A, AppState::B, AppState::C];

    /// Wire name of the state, as carried on the "state" topic
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::A => "A",
            AppState::B => "B",
            AppState::C => "C",
        }
    }

    /// Check whether `next` is a legal successor of this state.
    ///
    /// The legal transitions are exactly A -> B, B -> C and C -> A. Every
    /// other ordered pair, including self-loops and reverse edges, is
    /// rejected.
    pub fn can_transition_to(self, next: AppState) -> bool {
        matches!(
            (self, next),
            (AppState::A, AppState::B) | (AppState::B, AppState::C) | (AppState::C, AppState::A)
        )
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::A
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppState {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(AppState::A),
            "B" => Ok(AppState::B),
            "C" => Ok(AppState::C),
            other => Err(TransitionError::UnknownState(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transition_table() {
        // Exhaustive check over all 9 ordered pairs
        for from in AppState::ALL {
            for to in AppState::ALL {
                let legal = matches!(
                    (from, to),
                    (AppState::A, AppState::B)
                        | (AppState::B, AppState::C)
                        | (AppState::C, AppState::A)
                );
                assert_eq!(
                    from.can_transition_to(to),
                    legal,
                    "transition {} -> {} misclassified",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_state_round_trip() {
        for state in AppState::ALL {
            assert_eq!(state.as_str().parse::<AppState>().unwrap(), state);
        }
    }

    #[test]
    fn test_unknown_state() {
        let err = "Z".parse::<AppState>().unwrap_err();
        assert_eq!(err, TransitionError::UnknownState("Z".to_string()));
        assert!("a".parse::<AppState>().is_err());
        assert!("".parse::<AppState>().is_err());
    }

    #[test]
    fn test_initial_state() {
        assert_eq!(AppState::default(), AppState::A);
    }
}
