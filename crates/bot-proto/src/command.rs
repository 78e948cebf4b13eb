use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator-level command. Stateless; consumed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    ToggleLight,
    EngageAutoPatrol,
    EngageDefense,
    Analyze,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::Forward,
        Command::Backward,
        Command::Left,
        Command::Right,
        Command::Stop,
        Command::ToggleLight,
        Command::EngageAutoPatrol,
        Command::EngageDefense,
        Command::Analyze,
    ];

    /// Short operator token (`F`, `AUTO`, `DEF`, ...).
    pub fn code(self) -> &'static str {
        match self {
            Command::Forward => "F",
            Command::Backward => "B",
            Command::Left => "L",
            Command::Right => "R",
            Command::Stop => "S",
            Command::ToggleLight => "LGT",
            Command::EngageAutoPatrol => "AUTO",
            Command::EngageDefense => "DEF",
            Command::Analyze => "A",
        }
    }

    /// Token written to the robot link. Mode toggles and Analyze never reach
    /// the robot as-is.
    pub fn link_code(self) -> Option<&'static str> {
        match self {
            Command::Forward
            | Command::Backward
            | Command::Left
            | Command::Right
            | Command::Stop
            | Command::ToggleLight => Some(self.code()),
            _ => None,
        }
    }

    pub fn is_motion(self) -> bool {
        matches!(self, Command::Forward | Command::Backward | Command::Left | Command::Right)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let up = s.trim().to_ascii_uppercase();
        let cmd = match up.as_str() {
            "F" | "FORWARD" => Command::Forward,
            "B" | "BACKWARD" | "BACK" => Command::Backward,
            "L" | "LEFT" => Command::Left,
            "R" | "RIGHT" => Command::Right,
            "S" | "STOP" => Command::Stop,
            "LGT" | "LIGHT" => Command::ToggleLight,
            "AUTO" | "PATROL" => Command::EngageAutoPatrol,
            "DEF" | "DEFENSE" => Command::EngageDefense,
            "A" | "ANALYZE" => Command::Analyze,
            _ => return Err(UnknownCommand(s.trim().to_string())),
        };
        Ok(cmd)
    }
}
