//! Inbound commands to the controller.
//!
//! These represent actions requested by the session owner (clinician
//! console, supervisory service) that the
//! [`PacingController`](super::service::PacingController) interprets.

use crate::config::ControllerConfig;

/// Commands that callers can send into the controller core.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCommand {
    /// Hot-swap the configuration.  Rejected unless it validates.
    UpdateConfig(ControllerConfig),

    /// Forget all per-session state and start again from `Normal`.
    Reset,
}
