//! Pacing controller: the hexagonal core.
//!
//! [`PacingController`] owns one session's safety tracker, policy memory and
//! decision history.  Each call to [`PacingController::decide`] runs one
//! decision cycle:
//!
//! ```text
//!  payloads ─▶ sanitize ─▶ evaluate ─▶ track ─▶ select mode ─▶ rate / amplitude
//!                                                                     │
//!                             EventSink ◀── commit ◀── checks ◀───────┘
//! ```
//!
//! The pipeline runs against a staged copy of the tracker and reads the
//! policy memory without touching it.  Only a cycle that produces a valid
//! command is committed; anything else, including a panic, yields the
//! canonical fallback and leaves the session state exactly as it was.

use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use log::{Level, error, info, log, warn};
use serde_json::Value;

use crate::adapters::log_sink::LogEventSink;
use crate::command::{
    self, DecisionResult, PacingCommand, SafetyChecks, round_hundredths, round_tenths,
};
use crate::config::ControllerConfig;
use crate::control::rate::{self, RateAdjustment, RateDecision};
use crate::control::{PacingMode, PacingPolicyMemory, amplitude, mode};
use crate::diagnostics::{DecisionHistory, DecisionRecord};
use crate::error::{Error, InternalFault, Result};
use crate::fsm::{SafetyState, SafetyStateTracker, Transition};
use crate::input::{DecisionInput, InputSummary};
use crate::safety;

use super::commands::ControllerCommand;
use super::events::{ControllerEvent, ControllerStatus};
use super::ports::{ConfigError, ConfigPort, EventSink};

/// Confidence reported as acceptable in the safety checks.
const ACCEPTABLE_CONFIDENCE: f64 = 0.60;

// ───────────────────────────────────────────────────────────────
// Staged cycle
// ───────────────────────────────────────────────────────────────

/// Everything one cycle computed, not yet applied to the controller.
struct Staged {
    tracker: SafetyStateTracker,
    transition: Transition,
    rate: RateDecision,
    command: PacingCommand,
    summary: InputSummary,
}

/// Emergency triggers log on every cycle they fire, even while the tracker
/// already sits in `Emergency`.
fn trigger_level(state: SafetyState) -> Level {
    match state {
        SafetyState::Emergency => Level::Warn,
        _ => Level::Debug,
    }
}

// ───────────────────────────────────────────────────────────────
// PacingController
// ───────────────────────────────────────────────────────────────

/// One session's decision engine.
#[derive(Debug)]
pub struct PacingController {
    config: ControllerConfig,
    tracker: SafetyStateTracker,
    memory: PacingPolicyMemory,
    history: DecisionHistory,
    cycles: u64,
    internal_failures: u64,
}

impl PacingController {
    /// Build a controller in `Normal` with empty memory.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracker: SafetyStateTracker::new(config.recovery_cycles),
            config,
            memory: PacingPolicyMemory::new(),
            history: DecisionHistory::new(),
            cycles: 0,
            internal_failures: 0,
        })
    }

    /// Build from a stored configuration, falling back to defaults when
    /// nothing usable is stored.
    pub fn from_store(store: &impl ConfigPort) -> Self {
        let config = match store.load() {
            Ok(config) => config,
            Err(ConfigError::NotFound) => ControllerConfig::default(),
            Err(e) => {
                warn!("Stored controller config unusable ({}), using defaults", e);
                ControllerConfig::default()
            }
        };
        Self::new(config).unwrap_or_else(|_| Self::with_defaults())
    }

    fn with_defaults() -> Self {
        let config = ControllerConfig::default();
        Self {
            tracker: SafetyStateTracker::new(config.recovery_cycles),
            config,
            memory: PacingPolicyMemory::new(),
            history: DecisionHistory::new(),
            cycles: 0,
            internal_failures: 0,
        }
    }

    // ── Decision cycle ────────────────────────────────────────

    /// Entry point: one decision, logged through [`LogEventSink`], stamped
    /// with the current wall-clock time.
    pub fn compute_pacing_decision(
        &mut self,
        rhythm_data: Option<&Value>,
        hsi_data: Option<&Value>,
    ) -> DecisionResult {
        self.decide(rhythm_data, hsi_data, Utc::now(), &mut LogEventSink::new())
    }

    /// Run one decision cycle.  Never panics, never errors: failures are
    /// reported through the fallback result.
    pub fn decide(
        &mut self,
        rhythm_data: Option<&Value>,
        hsi_data: Option<&Value>,
        now: DateTime<Utc>,
        sink: &mut impl EventSink,
    ) -> DecisionResult {
        self.cycles = self.cycles.saturating_add(1);

        let staged = panic::catch_unwind(AssertUnwindSafe(|| self.stage(rhythm_data, hsi_data)))
            .unwrap_or_else(|_| Err(InternalFault::Panicked.into()));

        let result = match staged {
            Ok(staged) => self.commit(staged, now, sink),
            Err(e) => self.fall_back(e, now, sink),
        };
        self.history.record(&result);
        result
    }

    /// Compute a full cycle without mutating `self`.
    fn stage(&self, rhythm_data: Option<&Value>, hsi_data: Option<&Value>) -> Result<Staged> {
        let sanitized = DecisionInput::from_payloads(rhythm_data, hsi_data)?;
        let input = sanitized.input;
        let config = &self.config;

        let assessment = safety::assess(&input, config);
        if let Some(trigger) = assessment.trigger {
            log!(trigger_level(assessment.state), "Evaluated {}: {}", assessment.state, trigger);
        }

        let mut tracker = self.tracker.clone();
        let transition = tracker.update(assessment.state);
        let confirmed = tracker.current();

        let pacing_mode = mode::select(&input, confirmed, config);
        let rate = rate::synthesize(&input, pacing_mode, self.memory.last_rate_bpm(), config);
        let raw_amplitude = amplitude::synthesize(pacing_mode, input.hsi_score, config);

        if !rate.target_bpm.is_finite() || !raw_amplitude.is_finite() {
            return Err(InternalFault::NonFiniteOutput.into());
        }

        let target_rate_bpm = round_tenths(rate.target_bpm);
        let pacing_amplitude_ma = round_hundredths(raw_amplitude);

        let safety_checks = SafetyChecks {
            rate_within_bounds: (config.min_rate_bpm..=config.max_rate_bpm)
                .contains(&target_rate_bpm),
            amplitude_within_bounds: (config.min_amplitude_ma..=config.max_amplitude_ma)
                .contains(&pacing_amplitude_ma),
            confidence_acceptable: input.rhythm_confidence >= ACCEPTABLE_CONFIDENCE,
            hsi_acceptable: input.hsi_score >= config.hsi_emergency,
        };
        // Monitor-only emits exactly zero; every pacing mode stays in bounds.
        let amplitude_valid = match pacing_mode {
            PacingMode::MonitorOnly => pacing_amplitude_ma == 0.0,
            _ => safety_checks.amplitude_within_bounds,
        };
        if !safety_checks.rate_within_bounds || !amplitude_valid {
            return Err(InternalFault::OutputOutOfBounds.into());
        }

        let rationale = command::rationale(
            &input,
            confirmed,
            pacing_mode,
            &rate.adjustments,
            config,
        );

        let command = PacingCommand {
            pacing_enabled: pacing_mode.paces(),
            target_rate_bpm,
            pacing_amplitude_ma,
            pacing_mode,
            safety_state: confirmed,
            safety_checks,
            rationale,
        };

        Ok(Staged {
            tracker,
            transition,
            rate,
            command,
            summary: InputSummary::from(&sanitized),
        })
    }

    fn commit(&mut self, staged: Staged, now: DateTime<Utc>, sink: &mut impl EventSink) -> DecisionResult {
        let Staged {
            tracker,
            transition,
            rate,
            command,
            summary,
        } = staged;

        self.tracker = tracker;
        self.memory
            .record(command.target_rate_bpm, command.pacing_amplitude_ma);

        match transition {
            Transition::Unchanged => {}
            Transition::Degraded { from, to } | Transition::Improved { from, to } => {
                sink.emit(&ControllerEvent::SafetyStateChanged { from, to });
            }
            Transition::Improving {
                toward,
                cycles,
                required,
            } => sink.emit(&ControllerEvent::RecoveryProgress {
                toward,
                cycles,
                required,
            }),
        }

        for adjustment in &rate.adjustments {
            let event = match *adjustment {
                RateAdjustment::Limited { requested, applied } => ControllerEvent::RateLimited {
                    requested_bpm: requested,
                    applied_bpm: applied,
                },
                RateAdjustment::Clamped { requested, applied } => ControllerEvent::RateClamped {
                    requested_bpm: requested,
                    applied_bpm: applied,
                },
            };
            sink.emit(&event);
        }

        info!(
            "Pacing command: enabled={}, rate={:.1}, amp={:.2}, mode={}, state={}",
            command.pacing_enabled,
            command.target_rate_bpm,
            command.pacing_amplitude_ma,
            command.pacing_mode,
            command.safety_state,
        );

        DecisionResult::succeeded(command, summary, now)
    }

    fn fall_back(&mut self, err: Error, now: DateTime<Utc>, sink: &mut impl EventSink) -> DecisionResult {
        self.internal_failures = self.internal_failures.saturating_add(1);
        error!("Pacing decision failed, engaging fallback: {}", err);
        sink.emit(&ControllerEvent::FallbackEngaged(err));
        DecisionResult::fallback(err, now)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  An invalid config is rejected and the
    /// live one kept.
    pub fn handle_command(&mut self, cmd: ControllerCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            ControllerCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Rejected controller config: {}", e);
                    return Err(e);
                }
                self.tracker.set_recovery_cycles(new_config.recovery_cycles);
                self.config = new_config;
                info!("Controller configuration updated");
                sink.emit(&ControllerEvent::ConfigUpdated);
            }
            ControllerCommand::Reset => {
                self.tracker = SafetyStateTracker::new(self.config.recovery_cycles);
                self.memory.clear();
                self.history.clear();
                info!("Controller reset");
                sink.emit(&ControllerEvent::Reset);
            }
        }
        Ok(())
    }

    /// Validate and persist the live configuration.
    pub fn save_config(&self, store: &impl ConfigPort) -> core::result::Result<(), ConfigError> {
        store.save(&self.config)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            safety_state: self.tracker.current(),
            improvement_cycles: self.tracker.improvement_cycles(),
            recovery_cycles: self.tracker.recovery_cycles(),
            safety_violations: self.tracker.safety_violations(),
            fallback_activations: self.tracker.fallback_activations(),
            internal_failures: self.internal_failures,
            cycles: self.cycles,
            last_rate_bpm: self.memory.last_rate_bpm(),
            last_amplitude_ma: self.memory.last_amplitude_ma(),
        }
    }

    /// Recent decisions, oldest first.
    pub fn recent_decisions(&self) -> impl Iterator<Item = &DecisionRecord> {
        self.history.iter()
    }

    pub fn tracker(&self) -> &SafetyStateTracker {
        &self.tracker
    }

    pub fn memory(&self) -> &PacingPolicyMemory {
        &self.memory
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl Default for PacingController {
    fn default() -> Self {
        Self::with_defaults()
    }
}
