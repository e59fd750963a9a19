/// Wire commands for the queue
///
/// Commands represent requests to perform actions (imperative). They travel
/// the command queue as JSON objects tagged on the "command" field, so the
/// wire shape is `{"command": "set_state", "state": "B"}` and
/// `{"command": "quit"}`.
use serde::{Deserialize, Serialize};

/// Application commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Request a transition to the named state
    SetState { state: String },

    /// Stop the command worker
    Quit,
}

impl Command {
    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::SetState { state } => format!("Set state: {state}"),
            Command::Quit => "Quit".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let cmd = Command::SetState {
            state: "B".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&cmd).unwrap(),
            r#"{"command":"set_state","state":"B"}"#
        );

        assert_eq!(
            serde_json::to_string(&Command::Quit).unwrap(),
            r#"{"command":"quit"}"#
        );
    }

    #[test]
    fn test_wire_round_trip() {
        let cmd: Command = serde_json::from_str(r#"{"command":"set_state","state":"C"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::SetState {
                state: "C".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command_fails_decode() {
        assert!(serde_json::from_str::<Command>(r#"{"command":"reboot"}"#).is_err());
    }

    #[test]
    fn test_missing_command_field_fails_decode() {
        assert!(serde_json::from_str::<Command>(r#"{"state":"B"}"#).is_err());
    }

    #[test]
    fn test_command_description() {
        let cmd = Command::SetState {
            state: "B".to_string(),
        };
        assert_eq!(cmd.description(), "Set state: B");
        assert_eq!(Command::Quit.description(), "Quit");
    }
}
