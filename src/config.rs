//! External command configuration.

use std::fmt;
use std::str::FromStr;

/// A program plus its fixed argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl FromStr for CommandSpec {
    type Err = String;

    /// Splits on whitespace; the first word is the program.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| "Command must not be empty".to_string())?;
        Ok(Self::new(program, words))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Commands used to talk to the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Prints the workspace map as JSON.
    pub list_command: CommandSpec,
    /// Formats the repository after manifests are rewritten.
    pub format_command: CommandSpec,
    /// Root `scripts` entry that enables the format command.
    pub format_script: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            list_command: CommandSpec::new("npx", ["yarn", "workspaces", "list", "--json"]),
            format_command: CommandSpec::new("npx", ["yarn", "pretty"]),
            format_script: "pretty".to_string(),
        }
    }
}
