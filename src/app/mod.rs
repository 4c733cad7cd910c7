//! The session layer: owns the core state and turns commands into events.

pub mod commands;
pub mod events;
pub mod proxy;
pub mod state;
pub mod tasks;

pub use events::{Command, UserEvent};
pub use proxy::EventProxy;
pub use state::Session;
pub use tasks::{run_session, spawn_session, SessionHandle};
