//! Interactive terminal front end for a hosted writing agent.
//!
//! The binary wires these pieces together: [`config`] and [`logging`] at
//! startup, then a [`session::Session`] that reads input through
//! [`input::LineEditor`] and draws responses with [`renderer::Renderer`].

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod renderer;
pub mod session;
pub mod theme;

pub use config::Config;
pub use error::{RenderError, SessionError};
pub use session::{DriverState, ExitReason, Session};
