use serde::Serialize;
use std::io;
use thiserror::Error;

/// Errors from reading a duration typed by the operator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("input is empty")]
    Empty,

    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error("'{0}' does not fit into a number of seconds")]
    OutOfRange(String),

    #[error("time must be greater than 0")]
    Zero,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to serialize command: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to publish command: {0}")]
    Publish(#[from] rumqttc::ClientError),
}

/// Which setting a command changes on the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Maximum pump run time
    SetMax,
    /// Pump rest time between runs
    SetDescanso,
}

impl CommandKind {
    pub fn prompt(self) -> &'static str {
        match self {
            CommandKind::SetMax => "Enter maximum pump run time (seconds): ",
            CommandKind::SetDescanso => "Enter pump rest time (seconds): ",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CommandKind::SetMax => "Maximum time",
            CommandKind::SetDescanso => "Rest time",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Command {
    pub command: CommandKind,
    #[serde(rename = "tiempo")]
    pub seconds: u32,
}

impl Command {
    pub fn new(command: CommandKind, seconds: u32) -> Self {
        Command { command, seconds }
    }

    /// Parses one line of operator input into a command.
    pub fn from_input(command: CommandKind, line: &str) -> Result<Self, InputError> {
        parse_seconds(line).map(|seconds| Command::new(command, seconds))
    }

    /// JSON body as the firmware expects it: `{"command": "set_max", "tiempo": 45}`
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut payload = Vec::with_capacity(48);
        let mut serializer = serde_json::Serializer::with_formatter(&mut payload, SpacedFormatter);
        self.serialize(&mut serializer)?;
        Ok(payload)
    }
}

/// Accepts only ASCII digits forming a number greater than zero.
/// The line terminator is stripped, any other whitespace makes the input invalid.
pub fn parse_seconds(line: &str) -> Result<u32, InputError> {
    let input = line.trim_end_matches(['\n', '\r']);
    if input.is_empty() {
        return Err(InputError::Empty);
    }
    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(InputError::NotANumber(input.to_string()));
    }
    let seconds: u32 = input
        .parse()
        .map_err(|_| InputError::OutOfRange(input.to_string()))?;
    if seconds == 0 {
        return Err(InputError::Zero);
    }
    Ok(seconds)
}

/// Single-line JSON with a space after `,` and `:`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
