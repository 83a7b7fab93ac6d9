use activation_core::Msg;
use thiserror::Error;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Enable,
    Disable,
    Add(String),
    Reset,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?} (try enable, disable, add <host>, reset, status, quit)")]
    Unknown(String),
    #[error("add needs an instance host")]
    MissingInstance,
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match word.to_ascii_lowercase().as_str() {
        "enable" | "on" => Ok(Command::Enable),
        "disable" | "off" => Ok(Command::Disable),
        "add" if rest.trim().is_empty() => Err(CommandError::MissingInstance),
        // Validation belongs to the state machine, so the raw text is passed on.
        "add" => Ok(Command::Add(rest.to_string())),
        "reset" => Ok(Command::Reset),
        "status" => Ok(Command::Status),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(CommandError::Unknown(word.to_string())),
    }
}

impl Command {
    /// The state machine message for this command, if it has one.
    pub fn to_msg(&self) -> Option<Msg> {
        match self {
            Command::Enable => Some(Msg::ToggleClicked(true)),
            Command::Disable => Some(Msg::ToggleClicked(false)),
            Command::Add(instance) => Some(Msg::InstanceSubmitted(instance.clone())),
            Command::Reset => Some(Msg::InstancesReset),
            Command::Status | Command::Quit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toggles_and_aliases() {
        assert_eq!(parse_command("enable"), Ok(Command::Enable));
        assert_eq!(parse_command("  OFF "), Ok(Command::Disable));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    #[test]
    fn add_keeps_raw_argument() {
        assert_eq!(
            parse_command("add yewtu.be"),
            Ok(Command::Add("yewtu.be".to_string()))
        );
        assert_eq!(parse_command("add   "), Err(CommandError::MissingInstance));
    }

    #[test]
    fn unknown_words_are_rejected() {
        assert_eq!(
            parse_command("toggle"),
            Err(CommandError::Unknown("toggle".to_string()))
        );
    }
}
