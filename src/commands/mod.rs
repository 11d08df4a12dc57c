//! Operator commands sent to the device on its `cmd` topic.
//!
//! - [`command`]: the JSON command and validation of typed durations
//! - [`input`]: the shared console queue both publishers read from
//! - [`publisher`]: the interactive loop, one instance per setting

pub mod command;
pub mod input;
pub mod publisher;

pub use command::{Command, CommandError, CommandKind, InputError};
pub use publisher::CommandPublisher;
