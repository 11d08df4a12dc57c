//! Device side of the client: the consolidated state record and the router that
//! applies inbound messages to it.
//!
//! ```text
//! EventLoop ──► Router ──► DeviceState
//!                 │
//!                 └──► RouteOutcome ──► console
//! ```
//!
//! The router lives on the receive task and is the only writer of the state.

pub mod router;
pub mod state;
