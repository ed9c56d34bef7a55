use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Closed vocabulary of voice commands the pipeline understands.
///
/// `Unknown` is the no-match sentinel produced by the parser; it is never
/// executable and never part of an adapter's supported set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Stop,
    Takeoff,
    Land,
    Hover,
    ReturnHome,
    MoveLeft,
    MoveRight,
    MoveForward,
    MoveBack,
    MoveUp,
    MoveDown,
    YawLeft,
    YawRight,
    RecordStart,
    RecordStop,
    PhotoCapture,
    ZoomIn,
    ZoomOut,
    ZoomSet,
    ZoomReset,
    SpeedUp,
    SlowDown,
    SpeedSet,
    Battery,
    Altitude,
    Signal,
    Position,
    Unknown,
}

/// Intents that must go through the two-phase confirmation flow.
const CONFIRMATION_REQUIRED: &[Intent] = &[Intent::Takeoff, Intent::Land, Intent::ReturnHome];

impl Intent {
    /// Every executable intent, in declaration order.  `Unknown` is excluded.
    pub const ALL: [Intent; 27] = [
        Intent::Stop,
        Intent::Takeoff,
        Intent::Land,
        Intent::Hover,
        Intent::ReturnHome,
        Intent::MoveLeft,
        Intent::MoveRight,
        Intent::MoveForward,
        Intent::MoveBack,
        Intent::MoveUp,
        Intent::MoveDown,
        Intent::YawLeft,
        Intent::YawRight,
        Intent::RecordStart,
        Intent::RecordStop,
        Intent::PhotoCapture,
        Intent::ZoomIn,
        Intent::ZoomOut,
        Intent::ZoomSet,
        Intent::ZoomReset,
        Intent::SpeedUp,
        Intent::SlowDown,
        Intent::SpeedSet,
        Intent::Battery,
        Intent::Altitude,
        Intent::Signal,
        Intent::Position,
    ];

    /// Canonical upper-case name, e.g. `"MOVE_LEFT"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Stop => "STOP",
            Intent::Takeoff => "TAKEOFF",
            Intent::Land => "LAND",
            Intent::Hover => "HOVER",
            Intent::ReturnHome => "RETURN_HOME",
            Intent::MoveLeft => "MOVE_LEFT",
            Intent::MoveRight => "MOVE_RIGHT",
            Intent::MoveForward => "MOVE_FORWARD",
            Intent::MoveBack => "MOVE_BACK",
            Intent::MoveUp => "MOVE_UP",
            Intent::MoveDown => "MOVE_DOWN",
            Intent::YawLeft => "YAW_LEFT",
            Intent::YawRight => "YAW_RIGHT",
            Intent::RecordStart => "RECORD_START",
            Intent::RecordStop => "RECORD_STOP",
            Intent::PhotoCapture => "PHOTO_CAPTURE",
            Intent::ZoomIn => "ZOOM_IN",
            Intent::ZoomOut => "ZOOM_OUT",
            Intent::ZoomSet => "ZOOM_SET",
            Intent::ZoomReset => "ZOOM_RESET",
            Intent::SpeedUp => "SPEED_UP",
            Intent::SlowDown => "SLOW_DOWN",
            Intent::SpeedSet => "SPEED_SET",
            Intent::Battery => "BATTERY",
            Intent::Altitude => "ALTITUDE",
            Intent::Signal => "SIGNAL",
            Intent::Position => "POSITION",
            Intent::Unknown => "UNKNOWN",
        }
    }

    /// Whether this intent needs an explicit operator confirmation before
    /// it may reach the hardware.  STOP never does.
    pub fn requires_confirmation(&self) -> bool {
        CONFIRMATION_REQUIRED.contains(self)
    }

    /// The hardware capability group an adapter must support to execute
    /// this intent.  `None` for [`Intent::Unknown`].
    pub fn capability(&self) -> Option<Capability> {
        let cap = match self {
            Intent::Stop
            | Intent::Takeoff
            | Intent::Land
            | Intent::Hover
            | Intent::ReturnHome => Capability::Flight,
            Intent::MoveLeft
            | Intent::MoveRight
            | Intent::MoveForward
            | Intent::MoveBack
            | Intent::MoveUp
            | Intent::MoveDown
            | Intent::YawLeft
            | Intent::YawRight
            | Intent::SpeedUp
            | Intent::SlowDown
            | Intent::SpeedSet => Capability::Movement,
            Intent::RecordStart | Intent::RecordStop | Intent::PhotoCapture => Capability::Camera,
            Intent::ZoomIn | Intent::ZoomOut | Intent::ZoomSet | Intent::ZoomReset => {
                Capability::Zoom
            }
            Intent::Battery | Intent::Altitude | Intent::Signal | Intent::Position => {
                Capability::Status
            }
            Intent::Unknown => return None,
        };
        Some(cap)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware capability groups an adapter may or may not support.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Flight,
    Movement,
    Camera,
    Zoom,
    Status,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Flight,
        Capability::Movement,
        Capability::Camera,
        Capability::Zoom,
        Capability::Status,
    ];
}

/// Unit attached to a distance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Meters,
    Feet,
}

impl DistanceUnit {
    const FEET_TO_METERS: f64 = 0.3048;

    /// Spoken label, e.g. `"meters"`.
    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "meters",
            DistanceUnit::Feet => "feet",
        }
    }

    /// Convert `value` expressed in this unit to metres.
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Feet => value * Self::FEET_TO_METERS,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Requested speed, either a named preset or an explicit number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SpeedLevel {
    Slow,
    Medium,
    Fast,
    Numeric(f64),
}

impl fmt::Display for SpeedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedLevel::Slow => f.write_str("slow"),
            SpeedLevel::Medium => f.write_str("medium"),
            SpeedLevel::Fast => f.write_str("fast"),
            SpeedLevel::Numeric(v) => f.write_str(&format_number(*v)),
        }
    }
}

/// Optional parameters extracted from an utterance.
///
/// Every field is independently optional: `None` means the operator did not
/// say it, not that the value is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Slots {
    pub distance: Option<f64>,
    pub unit: Option<DistanceUnit>,
    pub degrees: Option<f64>,
    pub zoom_level: Option<f64>,
    pub speed_level: Option<SpeedLevel>,
}

impl Slots {
    pub fn is_empty(&self) -> bool {
        *self == Slots::default()
    }

    /// Distance converted to metres, when both value and unit are known.
    /// A bare number without a unit is taken as metres.
    pub fn distance_meters(&self) -> Option<f64> {
        self.distance
            .map(|d| self.unit.unwrap_or(DistanceUnit::Meters).to_meters(d))
    }
}

/// Output of the parser for a single utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedCommand {
    pub intent: Intent,
    /// Match confidence in `0.0..=1.0`; exactly `0.0` for [`Intent::Unknown`].
    pub confidence: f32,
    pub slots: Slots,
    /// Canonical `INTENT key=value …` string used for auditing and for
    /// matching a confirmation against its pending command.
    pub normalized_command: String,
    pub requires_confirmation: bool,
}

impl ParsedCommand {
    /// The no-match result.
    pub fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: 0.0,
            slots: Slots::default(),
            normalized_command: Intent::Unknown.as_str().to_string(),
            requires_confirmation: false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == Intent::Unknown
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Ok,
    NeedsConfirm,
    Blocked,
    RateLimited,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Ok => "OK",
            ExecutionStatus::NeedsConfirm => "NEEDS_CONFIRM",
            ExecutionStatus::Blocked => "BLOCKED",
            ExecutionStatus::RateLimited => "RATE_LIMITED",
        };
        f.write_str(s)
    }
}

/// Intent-specific payload attached to an [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionDetail {
    Flight { is_flying: bool, altitude_m: f64 },
    Moved { distance: f64, unit: DistanceUnit },
    Heading { degrees: f64 },
    Zoom { level: f64 },
    Recording { active: bool },
    Photo { count: u32 },
    Speed { meters_per_second: f64 },
    Battery { percent: u8 },
    Altitude { meters: f64 },
    Signal { percent: u8 },
    Position { x_m: f64, y_m: f64, altitude_m: f64 },
}

/// Structured result of executing an approved command on a vehicle adapter.
/// Failures are values, never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionResult {
    pub intent: Intent,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ExecutionDetail>,
}

impl ExecutionResult {
    pub fn ok(intent: Intent, message: impl Into<String>) -> Self {
        Self {
            intent,
            success: true,
            message: message.into(),
            detail: None,
        }
    }

    pub fn failed(intent: Intent, message: impl Into<String>) -> Self {
        Self {
            intent,
            success: false,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: ExecutionDetail) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// One processed utterance, as emitted to the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub normalized_command: String,
    /// `None` when the utterance never reached the policy gate.
    pub status: Option<ExecutionStatus>,
    /// `None` when nothing was dispatched to the adapter.
    pub executed: Option<bool>,
}

impl AuditRecord {
    pub fn new(session_id: &str, normalized_command: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            normalized_command: normalized_command.to_string(),
            status: None,
            executed: None,
        }
    }
}

/// Error type for caller-contract violations and connection faults.
///
/// Policy rejections and failed executions are *not* errors; they are
/// carried by [`ExecutionStatus`] and [`ExecutionResult`].
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkyError {
    #[error("Invalid session id {0:?}")]
    InvalidSession(String),

    #[error("Connection to {adapter} failed: {details}")]
    ConnectionFailed { adapter: String, details: String },

    #[error("Link fault on {link}: {details}")]
    Link { link: String, details: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}

/// Render a slot value without a trailing `.0` for whole numbers.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
