//! PulseMind pacing controller library.
//!
//! Turns a rhythm classification and a hemodynamic surrogate score into a
//! bounded pacing command, one session at a time.  The public entry point
//! is [`PacingController::compute_pacing_decision`]; it never panics and
//! never returns an error, falling back to a no-pacing command instead.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod command;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod fsm;
pub mod input;
pub mod safety;

pub use app::commands::ControllerCommand;
pub use app::events::{ControllerEvent, ControllerStatus};
pub use app::ports::{ConfigError, ConfigPort, EventSink};
pub use app::service::PacingController;
pub use app::session::SessionRegistry;
pub use command::{DecisionResult, PacingCommand, SafetyChecks};
pub use config::ControllerConfig;
pub use control::PacingMode;
pub use error::{Error, Result};
pub use fsm::SafetyState;
pub use input::{DecisionInput, HsiTrend, RhythmClass};
