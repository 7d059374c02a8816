use std::fmt;
use std::str::FromStr;

pub const USAGE: &str = "usage: prismic-migrate [clone|create|all]";

/// Phase selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Command {
    /// Download the source repository into the stage.
    Clone,
    /// Upload the stage into the destination repository.
    Create,
    #[default]
    All,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`\n{USAGE}")]
    Unknown(String),
    #[error("unexpected argument `{0}`\n{USAGE}")]
    Unexpected(String),
}

impl Command {
    /// Parse the arguments following the program name.
    pub fn from_args<I>(args: I) -> Result<Self, CommandError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let command = match args.next() {
            Some(arg) => arg.parse()?,
            None => Command::default(),
        };
        match args.next() {
            Some(extra) => Err(CommandError::Unexpected(extra)),
            None => Ok(command),
        }
    }

    pub fn clones(self) -> bool {
        matches!(self, Command::Clone | Command::All)
    }

    pub fn creates(self) -> bool {
        matches!(self, Command::Create | Command::All)
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clone" => Ok(Command::Clone),
            "create" => Ok(Command::Create),
            "all" => Ok(Command::All),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Command::Clone => "clone",
            Command::Create => "create",
            Command::All => "all",
        })
    }
}
