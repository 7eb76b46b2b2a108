//! Command grammar.
//!
//! One command per line, whitespace separated, case-sensitive keywords.

use std::fmt;
use std::str::FromStr;

use gossip_engine::{NodeIndex, NodeKind};
use thiserror::Error;

/// Which neighbor sizing value is applied at spawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizingMode {
    #[default]
    Flat,
    Percent,
}

impl FromStr for SizingMode {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Flat" => Ok(SizingMode::Flat),
            "Percent" => Ok(SizingMode::Percent),
            other => Err(CommandParseError::InvalidListType(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Spawn { size: usize, kind: NodeKind },
    Broadcast,
    Unicast { node: NodeIndex },
    Kill,
    Status,
    Routines,
    /// Raw value; clamped to 1..=100 when applied.
    UpdateListPercent(i64),
    /// Raw value; floored at 1 when applied.
    UpdateListSize(i64),
    UpdateListType(SizingMode),
    Reset,
    /// Pull-interval bound in seconds.
    UpdateIntervalTime(u64),
}

impl Command {
    /// Keyword as written in command files.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Spawn { .. } => "SPAWN",
            Command::Broadcast => "BROADCAST",
            Command::Unicast { .. } => "UNICAST",
            Command::Kill => "KILL",
            Command::Status => "STATUS",
            Command::Routines => "ROUTINES",
            Command::UpdateListPercent(_) => "UPDATENLISTPERCENT",
            Command::UpdateListSize(_) => "UPDATENLISTSIZE",
            Command::UpdateListType(_) => "UPDATENLISTTYPE",
            Command::Reset => "RESET",
            Command::UpdateIntervalTime(_) => "UPDATEINTERVALTIME",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command} takes {expected} argument(s), got {found}")]
    WrongArity {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{command}: invalid number {value:?}")]
    InvalidNumber { command: &'static str, value: String },

    #[error("Unknown node type: {0} (expected PUSH or PUSH&PULL)")]
    InvalidNodeKind(String),

    #[error("Unknown neighbour list type: {0} (expected Flat or Percent)")]
    InvalidListType(String),
}

fn number<T: FromStr>(command: &'static str, value: &str) -> Result<T, CommandParseError> {
    value.parse().map_err(|_| CommandParseError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}

fn arity(command: &'static str, args: &[&str], expected: usize) -> Result<(), CommandParseError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CommandParseError::WrongArity {
            command,
            expected,
            found: args.len(),
        })
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().ok_or(CommandParseError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        let command = match keyword {
            "SPAWN" => {
                arity("SPAWN", &args, 2)?;
                let size = number("SPAWN", args[0])?;
                let kind = args[1]
                    .parse()
                    .map_err(|_| CommandParseError::InvalidNodeKind(args[1].to_string()))?;
                Command::Spawn { size, kind }
            }
            "BROADCAST" => {
                arity("BROADCAST", &args, 0)?;
                Command::Broadcast
            }
            "UNICAST" => {
                arity("UNICAST", &args, 1)?;
                Command::Unicast {
                    node: number("UNICAST", args[0])?,
                }
            }
            "KILL" => {
                arity("KILL", &args, 0)?;
                Command::Kill
            }
            "STATUS" => {
                arity("STATUS", &args, 0)?;
                Command::Status
            }
            "ROUTINES" => {
                arity("ROUTINES", &args, 0)?;
                Command::Routines
            }
            "UPDATENLISTPERCENT" => {
                arity("UPDATENLISTPERCENT", &args, 1)?;
                Command::UpdateListPercent(number("UPDATENLISTPERCENT", args[0])?)
            }
            "UPDATENLISTSIZE" => {
                arity("UPDATENLISTSIZE", &args, 1)?;
                Command::UpdateListSize(number("UPDATENLISTSIZE", args[0])?)
            }
            "UPDATENLISTTYPE" => {
                arity("UPDATENLISTTYPE", &args, 1)?;
                Command::UpdateListType(args[0].parse()?)
            }
            "RESET" => {
                arity("RESET", &args, 0)?;
                Command::Reset
            }
            "UPDATEINTERVALTIME" => {
                arity("UPDATEINTERVALTIME", &args, 1)?;
                Command::UpdateIntervalTime(number("UPDATEINTERVALTIME", args[0])?)
            }
            other => return Err(CommandParseError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spawn() {
        assert_eq!(
            "SPAWN 100 PUSH&PULL".parse(),
            Ok(Command::Spawn {
                size: 100,
                kind: NodeKind::PushPull
            })
        );
        assert_eq!(
            "  SPAWN   5  PUSH ".parse(),
            Ok(Command::Spawn {
                size: 5,
                kind: NodeKind::Push
            })
        );
    }

    #[test]
    fn test_parse_rejects_bad_node_kind() {
        assert_eq!(
            "SPAWN 5 PULL".parse::<Command>(),
            Err(CommandParseError::InvalidNodeKind("PULL".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_negative_sizes() {
        assert!(matches!(
            "SPAWN -3 PUSH".parse::<Command>(),
            Err(CommandParseError::InvalidNumber { command: "SPAWN", .. })
        ));
        assert!(matches!(
            "UNICAST -1".parse::<Command>(),
            Err(CommandParseError::InvalidNumber { command: "UNICAST", .. })
        ));
    }

    #[test]
    fn test_list_sizing_keeps_raw_values() {
        assert_eq!(
            "UPDATENLISTPERCENT 250".parse(),
            Ok(Command::UpdateListPercent(250))
        );
        assert_eq!("UPDATENLISTSIZE -4".parse(), Ok(Command::UpdateListSize(-4)));
        assert_eq!(
            "UPDATENLISTTYPE Percent".parse(),
            Ok(Command::UpdateListType(SizingMode::Percent))
        );
        assert_eq!(
            "UPDATENLISTTYPE percent".parse::<Command>(),
            Err(CommandParseError::InvalidListType("percent".to_string()))
        );
    }

    #[test]
    fn test_arity_is_checked() {
        assert_eq!(
            "BROADCAST now".parse::<Command>(),
            Err(CommandParseError::WrongArity {
                command: "BROADCAST",
                expected: 0,
                found: 1
            })
        );
        assert_eq!(
            "UNICAST".parse::<Command>(),
            Err(CommandParseError::WrongArity {
                command: "UNICAST",
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            "status".parse::<Command>(),
            Err(CommandParseError::UnknownCommand("status".to_string()))
        );
        assert_eq!("   ".parse::<Command>(), Err(CommandParseError::Empty));
    }

    #[test]
    fn test_name_round_trips_through_parser() {
        for line in [
            "BROADCAST",
            "KILL",
            "STATUS",
            "ROUTINES",
            "RESET",
            "UPDATEINTERVALTIME 10",
        ] {
            let command: Command = line.parse().unwrap();
            assert_eq!(line.split_whitespace().next(), Some(command.name()));
        }
    }
}
