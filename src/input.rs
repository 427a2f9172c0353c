//! Decision input: extraction, defaulting and clamping of upstream payloads.
//!
//! The rhythm classifier and the hemodynamic scorer hand over loosely shaped
//! JSON.  This module turns those payloads into one [`DecisionInput`] per
//! cycle.  Everything downstream assumes the input is already sanitized:
//!
//! | Field               | Source                                         | Default  | Clamp      |
//! |---------------------|------------------------------------------------|----------|------------|
//! | `rhythm_class`      | `rhythm_data.rhythm_class`                     | artifact | none       |
//! | `rhythm_confidence` | `rhythm_data.confidence`                       | 0.0      | 0 – 1      |
//! | `hsi_score`         | `hsi_data.hsi_score`                           | 50.0     | 0 – 100    |
//! | `hsi_trend`         | `hsi_data.trend.trend_direction` or `trend`    | stable   | none       |
//! | `heart_rate_bpm`    | `hsi_data.input_features.heart_rate_bpm`       | 70.0     | 30 – 250   |
//!
//! Missing values and clamps are recorded as [`InputAdjustment`]s, never
//! rejected.  Infinities clamp to the nearer bound.  Values of the wrong
//! type, and NaN, are rejected as [`InputError::Malformed`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Field, InputError, Payload, Result};

const DEFAULT_CONFIDENCE: f64 = 0.0;
const DEFAULT_HSI_SCORE: f64 = 50.0;
const DEFAULT_HEART_RATE_BPM: f64 = 70.0;

const INPUT_MIN_HEART_RATE_BPM: f64 = 30.0;
const INPUT_MAX_HEART_RATE_BPM: f64 = 250.0;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Rhythm class reported by the upstream classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmClass {
    NormalSinus,
    Tachycardia,
    Bradycardia,
    Irregular,
    Artifact,
    Unknown,
}

impl RhythmClass {
    /// Parse a classifier label.  Returns `None` for labels the controller
    /// does not know.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "normal_sinus" => Some(Self::NormalSinus),
            "tachycardia" => Some(Self::Tachycardia),
            "bradycardia" => Some(Self::Bradycardia),
            "irregular" => Some(Self::Irregular),
            "artifact" => Some(Self::Artifact),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NormalSinus => "normal_sinus",
            Self::Tachycardia => "tachycardia",
            Self::Bradycardia => "bradycardia",
            Self::Irregular => "irregular",
            Self::Artifact => "artifact",
            Self::Unknown => "unknown",
        }
    }

    /// Tachycardia, bradycardia or irregular rhythm.
    pub fn is_arrhythmia(self) -> bool {
        matches!(self, Self::Tachycardia | Self::Bradycardia | Self::Irregular)
    }
}

/// Direction of the HSI trend reported by the hemodynamic scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HsiTrend {
    Improving,
    Stable,
    Declining,
}

impl HsiTrend {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "improving" => Some(Self::Improving),
            "stable" => Some(Self::Stable),
            "declining" => Some(Self::Declining),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

// ---------------------------------------------------------------------------
// Adjustments
// ---------------------------------------------------------------------------

/// A non-fatal correction applied while sanitizing one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputAdjustment {
    /// Field absent; documented default used.
    Defaulted { field: Field },
    /// Label not recognised; mapped to the fallback label.
    Unrecognised { field: Field },
    /// Numeric value outside its valid interval.
    Clamped { field: Field, from: f64, to: f64 },
}

/// At most one adjustment per field.
pub type Adjustments = heapless::Vec<InputAdjustment, 8>;

// ---------------------------------------------------------------------------
// DecisionInput
// ---------------------------------------------------------------------------

/// Sanitized inputs for one decision cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInput {
    pub rhythm_class: RhythmClass,
    pub rhythm_confidence: f64,
    pub hsi_score: f64,
    pub hsi_trend: HsiTrend,
    pub heart_rate_bpm: f64,
}

/// A [`DecisionInput`] plus the adjustments made to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedInput {
    pub input: DecisionInput,
    pub adjustments: Adjustments,
}

impl DecisionInput {
    /// Extract, default and clamp both upstream payloads.
    ///
    /// Fails only when a payload is missing or not an object, when both are
    /// empty, or when a field carries a value of the wrong type.
    pub fn from_payloads(rhythm: Option<&Value>, hsi: Option<&Value>) -> Result<SanitizedInput> {
        let rhythm = as_object(rhythm, Payload::Rhythm)?;
        let hsi = as_object(hsi, Payload::Hsi)?;
        if rhythm.is_empty() && hsi.is_empty() {
            return Err(InputError::EmptyPayloads.into());
        }

        let mut s = Sanitizer::default();

        let rhythm_class = match label(rhythm.get("rhythm_class"), Field::RhythmClass)? {
            None => {
                s.note(InputAdjustment::Defaulted { field: Field::RhythmClass });
                RhythmClass::Artifact
            }
            Some(l) => RhythmClass::from_label(l).unwrap_or_else(|| {
                s.note(InputAdjustment::Unrecognised { field: Field::RhythmClass });
                RhythmClass::Unknown
            }),
        };

        let rhythm_confidence = s.numeric(
            number(rhythm.get("confidence"), Field::RhythmConfidence)?,
            Field::RhythmConfidence,
            DEFAULT_CONFIDENCE,
            (0.0, 1.0),
        );

        let hsi_score = s.numeric(
            number(hsi.get("hsi_score"), Field::HsiScore)?,
            Field::HsiScore,
            DEFAULT_HSI_SCORE,
            (0.0, 100.0),
        );

        let hsi_trend = match trend_label(hsi.get("trend"))? {
            None => {
                s.note(InputAdjustment::Defaulted { field: Field::HsiTrend });
                HsiTrend::Stable
            }
            Some(l) => HsiTrend::from_label(l).unwrap_or_else(|| {
                s.note(InputAdjustment::Unrecognised { field: Field::HsiTrend });
                HsiTrend::Stable
            }),
        };

        let heart_rate_bpm = s.numeric(
            heart_rate(hsi)?,
            Field::HeartRate,
            DEFAULT_HEART_RATE_BPM,
            (INPUT_MIN_HEART_RATE_BPM, INPUT_MAX_HEART_RATE_BPM),
        );

        Ok(SanitizedInput {
            input: Self {
                rhythm_class,
                rhythm_confidence,
                hsi_score,
                hsi_trend,
                heart_rate_bpm,
            },
            adjustments: s.adjustments,
        })
    }
}

/// Echo of the sanitized input carried on every successful decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSummary {
    pub rhythm_class: RhythmClass,
    pub rhythm_confidence: f64,
    pub hsi_score: f64,
    pub hsi_trend: HsiTrend,
    pub heart_rate_bpm: f64,
    #[serde(default, skip_serializing_if = "no_adjustments")]
    pub adjustments: Adjustments,
}

impl From<&SanitizedInput> for InputSummary {
    fn from(s: &SanitizedInput) -> Self {
        Self {
            rhythm_class: s.input.rhythm_class,
            rhythm_confidence: s.input.rhythm_confidence,
            hsi_score: s.input.hsi_score,
            hsi_trend: s.input.hsi_trend,
            heart_rate_bpm: s.input.heart_rate_bpm,
            adjustments: s.adjustments.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

fn no_adjustments(adjustments: &Adjustments) -> bool {
    adjustments.is_empty()
}

#[derive(Default)]
struct Sanitizer {
    adjustments: Adjustments,
}

impl Sanitizer {
    fn note(&mut self, adjustment: InputAdjustment) {
        // Capacity exceeds the field count; a full buffer cannot happen.
        let _ = self.adjustments.push(adjustment);
    }

    fn numeric(&mut self, raw: Option<f64>, field: Field, default: f64, (lo, hi): (f64, f64)) -> f64 {
        let Some(value) = raw else {
            self.note(InputAdjustment::Defaulted { field });
            return default;
        };
        let clamped = value.clamp(lo, hi);
        if clamped != value {
            self.note(InputAdjustment::Clamped {
                field,
                from: value,
                to: clamped,
            });
        }
        clamped
    }
}

fn as_object(payload: Option<&Value>, which: Payload) -> Result<&Map<String, Value>> {
    match payload {
        None | Some(Value::Null) => Err(InputError::MissingPayload(which).into()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(InputError::NotAnObject(which).into()),
    }
}

/// Absent or `null` is `Ok(None)`; numbers and numeric strings parse,
/// infinities included; anything else, NaN included, is malformed.
fn number(value: Option<&Value>, field: Field) -> Result<Option<f64>> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(v) if !v.is_nan() => Ok(Some(v)),
        _ => Err(InputError::Malformed(field).into()),
    }
}

fn label(value: Option<&Value>, field: Field) -> Result<Option<&str>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(InputError::Malformed(field).into()),
    }
}

/// `trend` is either `{"trend_direction": "..."}` or a bare label.
fn trend_label(value: Option<&Value>) -> Result<Option<&str>> {
    match value {
        Some(Value::Object(trend)) => label(trend.get("trend_direction"), Field::HsiTrend),
        other => label(other, Field::HsiTrend),
    }
}

/// Prefer `input_features.heart_rate_bpm`, then a top-level `heart_rate_bpm`.
fn heart_rate(hsi: &Map<String, Value>) -> Result<Option<f64>> {
    let from_features = match hsi.get("input_features") {
        None | Some(Value::Null) => None,
        Some(Value::Object(features)) => number(features.get("heart_rate_bpm"), Field::HeartRate)?,
        Some(_) => return Err(InputError::Malformed(Field::HeartRate).into()),
    };
    match from_features {
        Some(hr) => Ok(Some(hr)),
        None => number(hsi.get("heart_rate_bpm"), Field::HeartRate),
    }
}
