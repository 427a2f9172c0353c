//! Application core: decision orchestration, zero I/O.
//!
//! The [`service::PacingController`] sequences the safety evaluator,
//! tracker, mode selector and synthesizers for one session.  All
//! interaction with the outside world goes through the **port traits** in
//! [`ports`], keeping this layer testable with recording mocks.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod session;
