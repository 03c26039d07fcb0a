//! Stage controller line protocol.
//!
//! Requests are bracketed ASCII lines; the link appends the `\n`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCommand {
    GetDeviceId,
    Home,
    QueryHomed,
    MoveTo { x: i64, y: i64 },
}

impl StageCommand {
    /// Whether the controller answers this command with a line.
    pub const fn expects_response(&self) -> bool {
        matches!(self, Self::GetDeviceId | Self::QueryHomed)
    }
}

impl fmt::Display for StageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetDeviceId => f.write_str("[getDeviceId]"),
            Self::Home => f.write_str("[homeStage]"),
            Self::QueryHomed => f.write_str("[isHomed]"),
            Self::MoveTo { x, y } => write!(f, "[moveStageTo [{x},{y}]]"),
        }
    }
}

/// Controller booleans: any response containing `true` is true.
pub fn parse_bool(response: &str) -> bool {
    response.contains("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StageCommand::GetDeviceId, "[getDeviceId]")]
    #[case(StageCommand::Home, "[homeStage]")]
    #[case(StageCommand::QueryHomed, "[isHomed]")]
    #[case(StageCommand::MoveTo { x: 120, y: -7 }, "[moveStageTo [120,-7]]")]
    fn commands_encode(#[case] cmd: StageCommand, #[case] line: &str) {
        assert_eq!(cmd.to_string(), line);
    }

    #[rstest]
    #[case("true", true)]
    #[case("  true\r", true)]
    #[case("{\"homed\":true}", true)]
    #[case("false", false)]
    #[case("", false)]
    fn booleans_parse(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(parse_bool(s), expected);
    }
}
