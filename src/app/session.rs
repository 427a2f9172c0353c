//! Session registry: one controller per session.
//!
//! Each session id maps to its own [`PacingController`] behind a mutex, so
//! calls on one session are serialized while independent sessions share
//! nothing.  Every controller is built from the registry's config.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::info;
use serde_json::Value;

use crate::adapters::log_sink::LogEventSink;
use crate::command::DecisionResult;
use crate::config::ControllerConfig;
use crate::error::Result;

use super::events::ControllerStatus;
use super::ports::EventSink;
use super::service::PacingController;

pub type SharedController = Arc<Mutex<PacingController>>;

#[derive(Debug)]
pub struct SessionRegistry {
    config: ControllerConfig,
    sessions: Mutex<HashMap<String, SharedController>>,
}

impl SessionRegistry {
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// The controller for `session_id`, opened on first use.
    pub fn session(&self, session_id: &str) -> SharedController {
        let mut sessions = lock(&self.sessions);
        if let Some(existing) = sessions.get(session_id) {
            return Arc::clone(existing);
        }
        let controller = PacingController::new(self.config.clone()).unwrap_or_default();
        let shared = Arc::new(Mutex::new(controller));
        sessions.insert(session_id.to_owned(), Arc::clone(&shared));
        info!("Session {} opened ({} active)", session_id, sessions.len());
        shared
    }

    /// One decision cycle on `session_id`, logged through [`LogEventSink`].
    pub fn decide(
        &self,
        session_id: &str,
        rhythm_data: Option<&Value>,
        hsi_data: Option<&Value>,
    ) -> DecisionResult {
        self.decide_with(session_id, rhythm_data, hsi_data, Utc::now(), &mut LogEventSink::new())
    }

    pub fn decide_with(
        &self,
        session_id: &str,
        rhythm_data: Option<&Value>,
        hsi_data: Option<&Value>,
        now: DateTime<Utc>,
        sink: &mut impl EventSink,
    ) -> DecisionResult {
        let shared = self.session(session_id);
        let mut controller = lock(&shared);
        controller.decide(rhythm_data, hsi_data, now, sink)
    }

    /// Drop a session.  Returns whether it existed.
    pub fn close(&self, session_id: &str) -> bool {
        let removed = lock(&self.sessions).remove(session_id).is_some();
        if removed {
            info!("Session {} closed", session_id);
        }
        removed
    }

    pub fn status(&self, session_id: &str) -> Option<ControllerStatus> {
        let shared = lock(&self.sessions).get(session_id).map(Arc::clone)?;
        let controller = lock(&shared);
        Some(controller.status())
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

/// A panic inside one cycle must not wedge the session.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
